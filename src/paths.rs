use std::path::Path;

use tracing::debug;

use crate::{error::JobError, model::JobPaths};

/// Stem used when a title has no characters worth keeping
const FALLBACK_STEM: &str = "video";

/// Creates `videos/`, `audios/` and `captions/` under `base` if missing.
///
/// Safe to call repeatedly; existing folders and their files are left alone.
pub async fn prepare_output_dirs(base: &Path) -> Result<JobPaths, JobError> {
    let paths = JobPaths::under(base);
    for dir in [&paths.videos, &paths.audios, &paths.captions] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| JobError::filesystem(dir, e))?;
        debug!(dir = %dir.display(), "output folder ready");
    }
    Ok(paths)
}

/// File-name stem shared by every artifact of a job.
///
/// Keeps alphanumerics, spaces, hyphens and underscores, then drops trailing
/// whitespace. Alphanumeric follows `char::is_alphanumeric`, so combining
/// marks with the Unicode `Alphabetic` property (Indic vowel signs) are kept
/// while others (a lone U+0301 accent) are dropped; a title with nothing left
/// becomes `video`.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let stem = kept.trim_end();
    if stem.is_empty() {
        FALLBACK_STEM.to_owned()
    } else {
        stem.to_owned()
    }
}
