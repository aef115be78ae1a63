use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{
    error::JobError,
    model::{CaptionTrack, ChunkProgress, ResolvedContent, StreamVariant},
};

/// Callback invoked for every received chunk of a stream download
pub type ChunkCallback<'a> = &'a (dyn Fn(ChunkProgress) + Send + Sync);

/// Site-facing side of the pipeline: looks content up and fetches its files.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Title, stream variants and caption tracks behind `url`
    async fn resolve(&self, url: &str) -> Result<ResolvedContent, JobError>;

    /// Downloads `variant` of `url` to exactly `destination`
    async fn download(
        &self,
        url: &str,
        variant: &StreamVariant,
        destination: &Path,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<PathBuf, JobError>;

    /// Raw timed-text body of a caption track
    async fn fetch_caption(&self, track: &CaptionTrack) -> Result<String, JobError>;
}
