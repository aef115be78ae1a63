use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, BufReader},
    process::Command,
};
use tracing::{debug, info, warn};

use crate::{
    error::JobError,
    model::{CaptionTag, CaptionTrack, ResolvedContent, StreamVariant},
    progress::{PROGRESS_TEMPLATE, parse_progress_from_line},
    resolver::{ChunkCallback, ContentResolver},
};

/// Caption body format requested from the site
const CAPTION_FORMAT: &str = "vtt";

/// Content resolver backed by the `yt-dlp` executable
pub struct YtDlpResolver {
    binary: PathBuf,
    http: reqwest::Client,
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InfoJson {
    title: String,
    #[serde(default)]
    formats: Vec<FormatJson>,
    subtitles: Option<HashMap<String, Vec<SubtitleJson>>>,
    automatic_captions: Option<HashMap<String, Vec<SubtitleJson>>>,
}

#[derive(Debug, Deserialize)]
struct FormatJson {
    format_id: String,
    #[serde(default)]
    ext: String,
    height: Option<u32>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
    vcodec: Option<String>,
    acodec: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubtitleJson {
    ext: String,
    url: String,
}

impl From<FormatJson> for StreamVariant {
    fn from(f: FormatJson) -> Self {
        // `none` marks a missing track; an absent field means unknown, assume present
        let present = |codec: &Option<String>| codec.as_deref() != Some("none");
        Self {
            has_video: present(&f.vcodec) && f.height.is_some(),
            has_audio: present(&f.acodec),
            filesize: f.filesize.or(f.filesize_approx).map(|v| v as u64),
            id: f.format_id,
            ext: f.ext,
            height: f.height,
        }
    }
}

impl InfoJson {
    fn into_content(self) -> ResolvedContent {
        let captions = match (self.subtitles, self.automatic_captions) {
            (None, None) => None,
            (uploaded, auto) => {
                let mut tracks = BTreeMap::new();
                for (lang, entries) in uploaded.unwrap_or_default() {
                    if let Some(track) = pick_caption(CaptionTag::new(lang), entries) {
                        tracks.insert(track.tag.clone(), track);
                    }
                }
                for (lang, entries) in auto.unwrap_or_default() {
                    if let Some(track) = pick_caption(CaptionTag::auto(&lang), entries) {
                        tracks.insert(track.tag.clone(), track);
                    }
                }
                Some(tracks)
            }
        };

        ResolvedContent {
            title: self.title,
            streams: self.formats.into_iter().map(StreamVariant::from).collect(),
            captions,
        }
    }
}

fn pick_caption(tag: CaptionTag, entries: Vec<SubtitleJson>) -> Option<CaptionTrack> {
    let mut entries = entries.into_iter();
    let first = entries.next()?;
    let chosen = if first.ext == CAPTION_FORMAT {
        first
    } else {
        entries.find(|e| e.ext == CAPTION_FORMAT).unwrap_or(first)
    };
    Some(CaptionTrack {
        tag,
        url: chosen.url,
        ext: chosen.ext,
    })
}

// `-o` is an output template; a literal `%` must be doubled
fn output_template(destination: &Path) -> String {
    destination.to_string_lossy().replace('%', "%%")
}

#[async_trait]
impl ContentResolver for YtDlpResolver {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedContent, JobError> {
        debug!(binary = %self.binary.display(), url, "querying video info");
        let output = Command::new(&self.binary)
            .args(["--dump-single-json", "--no-playlist", "--no-warnings", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| JobError::Resolve(format!("could not run {}: {e}", self.binary.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(JobError::Resolve(stderr.trim().to_owned()));
        }

        let info: InfoJson = serde_json::from_slice(&output.stdout)
            .map_err(|e| JobError::Resolve(format!("unexpected yt-dlp output: {e}")))?;
        let content = info.into_content();
        info!(
            title = %content.title,
            streams = content.streams.len(),
            captions = content.captions.as_ref().map_or(0, |c| c.len()),
            "content resolved"
        );
        Ok(content)
    }

    async fn download(
        &self,
        url: &str,
        variant: &StreamVariant,
        destination: &Path,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<PathBuf, JobError> {
        let args = [
            "-f".to_owned(),
            variant.id.clone(),
            "--no-playlist".to_owned(),
            "--force-overwrites".to_owned(),
            "--newline".to_owned(),
            "--progress-template".to_owned(),
            PROGRESS_TEMPLATE.to_owned(),
            "-o".to_owned(),
            output_template(destination),
            url.to_owned(),
        ];
        debug!(?args, "spawning yt-dlp");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| JobError::Download(format!("could not run {}: {e}", self.binary.display())))?;

        let out = child
            .stdout
            .take()
            .ok_or_else(|| JobError::Download("yt-dlp stdout unavailable".into()))?;
        let mut err = child
            .stderr
            .take()
            .ok_or_else(|| JobError::Download("yt-dlp stderr unavailable".into()))?;
        let stderr_reader = tokio::spawn(async move {
            let mut text = String::new();
            let _ = err.read_to_string(&mut text).await;
            text
        });

        let mut lines = BufReader::new(out).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| JobError::Download(e.to_string()))?
        {
            match parse_progress_from_line(&line, variant.filesize) {
                Some(chunk) => on_chunk(chunk),
                None => debug!("yt-dlp> {}", line),
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| JobError::Download(e.to_string()))?;
        let stderr = stderr_reader.await.unwrap_or_default();
        if !status.success() {
            warn!(%status, "yt-dlp exited with failure");
            let detail = stderr.trim();
            return Err(JobError::Download(if detail.is_empty() {
                format!("yt-dlp exited with {status}")
            } else {
                detail.to_owned()
            }));
        }

        Ok(destination.to_path_buf())
    }

    async fn fetch_caption(&self, track: &CaptionTrack) -> Result<String, JobError> {
        let caption_err = |e: reqwest::Error| JobError::Caption(format!("{}: {e}", track.tag));
        self.http
            .get(&track.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(caption_err)?
            .text()
            .await
            .map_err(caption_err)
    }
}
