use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use crate::{captions::default_caption_tags, model::CaptionTag};

/// Command-line settings of the downloader window
#[derive(Debug, Clone, Parser)]
#[command(name = "tube_grabber", version, about = "Download a video, its audio track and captions")]
pub struct Settings {
    /// Base output folder [default: ./downloads]
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Caption tags to export, in order; `a.<lang>` selects auto-generated captions
    #[arg(long = "caption-lang", value_name = "TAG", value_delimiter = ',')]
    pub caption_langs: Vec<String>,

    /// yt-dlp executable
    #[arg(long = "yt-dlp", value_name = "PATH", default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,

    /// ffmpeg executable
    #[arg(long, value_name = "PATH", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// ffprobe executable
    #[arg(long, value_name = "PATH", default_value = "ffprobe")]
    pub ffprobe: PathBuf,

    /// Maximum log level printed to stderr
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: Level,
}

impl Settings {
    /// Output folder shown when the window opens
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("downloads")
        })
    }

    pub fn caption_tags(&self) -> Vec<CaptionTag> {
        if self.caption_langs.is_empty() {
            return default_caption_tags();
        }
        self.caption_langs
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(CaptionTag::new)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::parse_from(["tube_grabber"]);
        assert_eq!(
            settings.caption_tags(),
            vec![CaptionTag::new("a.pt"), CaptionTag::new("a.en")]
        );
        assert!(settings.output_dir().ends_with("downloads"));
        assert_eq!(settings.yt_dlp, PathBuf::from("yt-dlp"));
        assert_eq!(settings.log_level, Level::INFO);
    }

    #[test]
    fn caption_list_is_configurable() {
        let settings = Settings::parse_from([
            "tube_grabber",
            "--caption-lang",
            "en,a.es",
            "--caption-lang",
            "a.de",
            "--output-dir",
            "/srv/media",
            "--log-level",
            "debug",
        ]);
        assert_eq!(
            settings.caption_tags(),
            vec![CaptionTag::new("en"), CaptionTag::new("a.es"), CaptionTag::new("a.de")]
        );
        assert_eq!(settings.output_dir(), PathBuf::from("/srv/media"));
        assert_eq!(settings.log_level, Level::DEBUG);
    }
}
