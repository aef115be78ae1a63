use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use crate::error::JobError;

/// Represents the lifecycle of the single job the window can run
#[derive(Clone, Debug, PartialEq)]
pub enum JobStatus {
    /// No job has been started yet
    Idle,
    /// Worker is busy; input controls are disabled
    Running,
    /// Last job produced all of its artifacts
    Done,
    /// Last job stopped with an error
    Failed,
}

/// One user-initiated download-and-convert request
#[derive(Clone, Debug)]
pub struct Job {
    /// Source video URL (never empty)
    pub url: String,
    /// Folder under which `videos/`, `audios/` and `captions/` are created
    pub base_dir: PathBuf,
}

impl Job {
    /// Validates the user input; an empty URL never becomes a job.
    pub fn new(url: &str, base_dir: impl Into<PathBuf>) -> Result<Self, JobError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(JobError::EmptyUrl);
        }
        Ok(Self {
            url: url.to_owned(),
            base_dir: base_dir.into(),
        })
    }
}

/// Derived output folders of a job
#[derive(Clone, Debug, PartialEq)]
pub struct JobPaths {
    pub base: PathBuf,
    pub videos: PathBuf,
    pub audios: PathBuf,
    pub captions: PathBuf,
}

impl JobPaths {
    pub fn under(base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
            videos: base.join("videos"),
            audios: base.join("audios"),
            captions: base.join("captions"),
        }
    }
}

/// One quality option of a video
#[derive(Clone, Debug, PartialEq)]
pub struct StreamVariant {
    /// Identifier handed back to the resolver when downloading
    pub id: String,
    /// Container extension, e.g. `mp4`
    pub ext: String,
    /// Vertical resolution in pixels, if known
    pub height: Option<u32>,
    /// Size in bytes, if the site reports it up front
    pub filesize: Option<u64>,
    pub has_video: bool,
    pub has_audio: bool,
}

impl StreamVariant {
    /// Carries audio and video in a single file
    pub fn is_progressive(&self) -> bool {
        self.has_video && self.has_audio
    }
}

/// Caption language tag as used in the preference list.
///
/// `a.en` names the auto-generated English track, plain `en` the uploaded one.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptionTag(String);

impl CaptionTag {
    const AUTO_PREFIX: &'static str = "a.";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn auto(lang: &str) -> Self {
        Self(format!("{}{}", Self::AUTO_PREFIX, lang))
    }

    pub fn is_auto(&self) -> bool {
        self.0.starts_with(Self::AUTO_PREFIX)
    }

    /// Language code without the auto-generated marker; used in file names
    pub fn lang(&self) -> &str {
        self.0.strip_prefix(Self::AUTO_PREFIX).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaptionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A downloadable caption resource in one language
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionTrack {
    pub tag: CaptionTag,
    /// Where the timed-text body can be fetched from
    pub url: String,
    /// Format of the body behind `url`, e.g. `vtt`
    pub ext: String,
}

/// What the content resolver knows about a URL
#[derive(Clone, Debug)]
pub struct ResolvedContent {
    pub title: String,
    pub streams: Vec<StreamVariant>,
    /// `None` when the source exposes no captions at all
    pub captions: Option<BTreeMap<CaptionTag, CaptionTrack>>,
}

/// Raw progress of one received chunk
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkProgress {
    pub total_size: u64,
    pub bytes_remaining: u64,
}

/// Artifacts produced by a successful job
#[derive(Clone, Debug, PartialEq)]
pub struct JobReport {
    pub base_dir: PathBuf,
    pub video: PathBuf,
    pub audio: PathBuf,
    pub captions: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_url_is_rejected() {
        assert!(matches!(Job::new("", "/tmp"), Err(JobError::EmptyUrl)));
        assert!(matches!(Job::new("   ", "/tmp"), Err(JobError::EmptyUrl)));
    }

    #[test]
    fn url_is_trimmed() {
        let job = Job::new("  https://youtu.be/abc \n", "/tmp").unwrap();
        assert_eq!(job.url, "https://youtu.be/abc");
    }

    #[test]
    fn caption_tag_language() {
        assert_eq!(CaptionTag::new("a.pt").lang(), "pt");
        assert!(CaptionTag::new("a.pt").is_auto());
        assert_eq!(CaptionTag::new("en").lang(), "en");
        assert!(!CaptionTag::new("en").is_auto());
        assert_eq!(CaptionTag::auto("en"), CaptionTag::new("a.en"));
    }

    #[test]
    fn paths_are_derived_from_base() {
        let paths = JobPaths::under(Path::new("/data/out"));
        assert_eq!(paths.videos, Path::new("/data/out/videos"));
        assert_eq!(paths.audios, Path::new("/data/out/audios"));
        assert_eq!(paths.captions, Path::new("/data/out/captions"));
    }
}
