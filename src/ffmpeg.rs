use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::{
    audio::{AudioTrack, MediaBackend, Release, VideoContainer},
    error::JobError,
};

/// Media backend driving the `ffprobe` and `ffmpeg` executables
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegBackend {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: u32,
    codec_name: Option<String>,
}

struct FfmpegContainer {
    // input stays open from ffprobe until the track is written, so ffmpeg
    // reads the file ffprobe inspected; `None` once released
    file: Option<tokio::fs::File>,
    video: PathBuf,
    ffmpeg: PathBuf,
    audio_streams: Vec<FfprobeStream>,
}

struct FfmpegTrack {
    video: PathBuf,
    ffmpeg: PathBuf,
    index: u32,
}

fn transcode_err(context: &str, e: impl std::fmt::Display) -> JobError {
    JobError::Transcode(format!("{context}: {e}"))
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn open(&self, video: &Path) -> Result<Box<dyn VideoContainer>, JobError> {
        let file = tokio::fs::File::open(video)
            .await
            .map_err(|e| transcode_err(&video.display().to_string(), e))?;

        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-select_streams", "a"])
            .args(["-show_entries", "stream=index,codec_name", "-of", "json"])
            .arg(video)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| transcode_err(&format!("could not run {}", self.ffprobe.display()), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(JobError::Transcode(stderr.trim().to_owned()));
        }
        let listing: FfprobeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| transcode_err("unexpected ffprobe output", e))?;
        debug!(video = %video.display(), streams = ?listing.streams, "container opened");

        Ok(Box::new(FfmpegContainer {
            file: Some(file),
            video: video.to_path_buf(),
            ffmpeg: self.ffmpeg.clone(),
            audio_streams: listing.streams,
        }))
    }
}

impl VideoContainer for FfmpegContainer {
    fn audio(&mut self) -> Result<Box<dyn AudioTrack>, JobError> {
        let stream = self
            .audio_streams
            .first()
            .ok_or_else(|| JobError::Transcode(format!("{} has no audio stream", self.video.display())))?;
        debug!(index = stream.index, codec = ?stream.codec_name, "audio stream selected");
        Ok(Box::new(FfmpegTrack {
            video: self.video.clone(),
            ffmpeg: self.ffmpeg.clone(),
            index: stream.index,
        }))
    }
}

impl Release for FfmpegContainer {
    fn release(&mut self) {
        if self.file.take().is_some() {
            debug!(video = %self.video.display(), "container released");
        }
    }
}

#[async_trait]
impl AudioTrack for FfmpegTrack {
    async fn write_mp3(&mut self, output: &Path) -> Result<(), JobError> {
        let result = Command::new(&self.ffmpeg)
            .args(["-y", "-v", "error", "-i"])
            .arg(&self.video)
            .arg("-map")
            .arg(format!("0:{}", self.index))
            .args(["-vn", "-c:a", "libmp3lame", "-q:a", "2"])
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| transcode_err(&format!("could not run {}", self.ffmpeg.display()), e))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(JobError::Transcode(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl Release for FfmpegTrack {
    fn release(&mut self) {
        debug!(video = %self.video.display(), index = self.index, "audio track released");
    }
}
