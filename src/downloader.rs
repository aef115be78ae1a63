use std::path::PathBuf;

use tracing::info;

use crate::{
    bridge::StatusBridge,
    error::JobError,
    model::{ChunkProgress, ResolvedContent, StreamVariant},
    progress::progress_sample,
    resolver::ContentResolver,
};

/// Extension of every downloaded video
pub const VIDEO_EXT: &str = "mp4";

/// Lowest-resolution MP4 variant that carries both audio and video.
///
/// Other containers are never picked, since the file is always written as
/// `.mp4`; equal heights fall back to the smaller file.
pub fn select_lowest_resolution(streams: &[StreamVariant]) -> Option<&StreamVariant> {
    streams
        .iter()
        .filter(|s| s.is_progressive() && s.ext == VIDEO_EXT)
        .min_by_key(|s| (s.height.unwrap_or(u32::MAX), s.filesize.unwrap_or(u64::MAX)))
}

/// Downloads the lowest-resolution stream into `videos/<stem>.mp4`,
/// forwarding a progress sample for every chunk.
pub async fn spawn_download(
    resolver: &dyn ContentResolver,
    url: &str,
    content: &ResolvedContent,
    video_dir: PathBuf,
    stem: &str,
    bridge: &StatusBridge,
) -> Result<PathBuf, JobError> {
    let variant = select_lowest_resolution(&content.streams).ok_or(JobError::NoStream)?;
    let destination = video_dir.join(format!("{stem}.{VIDEO_EXT}"));
    info!(
        backend = resolver.name(),
        format = %variant.id,
        height = ?variant.height,
        destination = %destination.display(),
        "downloading lowest resolution stream"
    );

    bridge.status(format!("Downloading video: {}...", content.title));
    let on_chunk = |chunk: ChunkProgress| {
        bridge.progress(progress_sample(chunk.total_size, chunk.bytes_remaining));
    };
    let path = resolver.download(url, variant, &destination, &on_chunk).await?;
    bridge.progress(100.0);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;

    use super::*;
    use crate::{model::CaptionTrack, resolver::ChunkCallback};

    struct NoFetch;

    #[async_trait]
    impl ContentResolver for NoFetch {
        fn name(&self) -> &'static str {
            "no-fetch"
        }

        async fn resolve(&self, url: &str) -> Result<ResolvedContent, JobError> {
            Err(JobError::Resolve(url.into()))
        }

        async fn download(
            &self,
            _url: &str,
            variant: &StreamVariant,
            _destination: &Path,
            _on_chunk: ChunkCallback<'_>,
        ) -> Result<PathBuf, JobError> {
            panic!("variant {} should not be downloaded", variant.id);
        }

        async fn fetch_caption(&self, track: &CaptionTrack) -> Result<String, JobError> {
            Err(JobError::Caption(track.tag.to_string()))
        }
    }

    fn variant(id: &str, ext: &str, height: Option<u32>, size: Option<u64>, audio: bool) -> StreamVariant {
        StreamVariant {
            id: id.into(),
            ext: ext.into(),
            height,
            filesize: size,
            has_video: height.is_some(),
            has_audio: audio,
        }
    }

    #[test]
    fn picks_smallest_progressive_mp4() {
        let streams = vec![
            variant("22", "mp4", Some(720), Some(9000), true),
            variant("18", "mp4", Some(360), Some(4000), true),
            variant("160", "mp4", Some(144), Some(500), false),
            variant("140", "m4a", None, Some(100), true),
        ];
        assert_eq!(select_lowest_resolution(&streams).unwrap().id, "18");
    }

    #[test]
    fn webm_is_ignored_and_size_breaks_ties() {
        let streams = vec![
            variant("43", "webm", Some(240), Some(10), true),
            variant("a", "mp4", Some(360), Some(800), true),
            variant("b", "mp4", Some(360), Some(700), true),
        ];
        assert_eq!(select_lowest_resolution(&streams).unwrap().id, "b");
    }

    #[test]
    fn webm_only_content_has_no_stream() {
        let streams = vec![
            variant("43", "webm", Some(240), None, true),
            variant("44", "webm", Some(480), Some(900), true),
        ];
        assert!(select_lowest_resolution(&streams).is_none());
    }

    #[tokio::test]
    async fn webm_only_download_fails_without_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let content = ResolvedContent {
            title: "clip".into(),
            streams: vec![variant("43", "webm", Some(240), Some(10), true)],
            captions: None,
        };
        let (bridge, _rx) = StatusBridge::new(None);

        let result = spawn_download(
            &NoFetch,
            "https://youtu.be/abc",
            &content,
            tmp.path().to_path_buf(),
            "clip",
            &bridge,
        )
        .await;
        assert!(matches!(result, Err(JobError::NoStream)));
        assert!(!tmp.path().join("clip.mp4").exists());
    }

    #[test]
    fn nothing_progressive_means_no_stream() {
        let streams = vec![variant("160", "mp4", Some(144), None, false)];
        assert!(select_lowest_resolution(&streams).is_none());
    }
}
