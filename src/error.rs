use std::{io, path::PathBuf};

use thiserror::Error;

/// Everything that can stop (or, for captions, interrupt) a download job.
#[derive(Debug, Error)]
pub enum JobError {
    /// Rejected before a job is created
    #[error("please enter a video URL")]
    EmptyUrl,

    #[error("could not prepare {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not resolve content: {0}")]
    Resolve(String),

    #[error("no downloadable stream with both audio and video was found")]
    NoStream,

    #[error("download failed: {0}")]
    Download(String),

    /// Only ever reported; a missing or broken caption never aborts a job
    #[error("caption export failed: {0}")]
    Caption(String),

    #[error("audio extraction failed: {0}")]
    Transcode(String),

    #[error("background worker failed: {0}")]
    Runtime(String),
}

impl JobError {
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}
