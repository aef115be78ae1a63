use std::{
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tracing::info;

use crate::{bridge::StatusBridge, error::JobError};

/// Extension of the extracted audio track
pub const AUDIO_EXT: &str = "mp3";

/// Opens local video files for audio extraction
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn open(&self, video: &Path) -> Result<Box<dyn VideoContainer>, JobError>;
}

/// A media handle that must be released exactly once
pub trait Release: Send {
    fn release(&mut self);
}

/// An opened video file
pub trait VideoContainer: Release {
    fn audio(&mut self) -> Result<Box<dyn AudioTrack>, JobError>;
}

/// The audio component of an opened container
#[async_trait]
pub trait AudioTrack: Release {
    async fn write_mp3(&mut self, output: &Path) -> Result<(), JobError>;
}

/// Owns a handle and releases it when dropped: on success, on `?` early
/// returns, on unwinding and when the job future is dropped.
pub struct Scoped<T: Release + ?Sized>(Box<T>);

impl<T: Release + ?Sized> Scoped<T> {
    pub fn new(handle: Box<T>) -> Self {
        Self(handle)
    }
}

impl<T: Release + ?Sized> Deref for Scoped<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Release + ?Sized> DerefMut for Scoped<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Release + ?Sized> Drop for Scoped<T> {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Writes the audio of `video` to `<audio_dir>/<stem>.mp3`.
///
/// The track is released before the container, whether or not writing succeeds.
pub async fn extract_audio(
    media: &dyn MediaBackend,
    video: &Path,
    audio_dir: &Path,
    stem: &str,
    bridge: &StatusBridge,
) -> Result<PathBuf, JobError> {
    bridge.status("Extracting audio to MP3...");
    let output = audio_dir.join(format!("{stem}.{AUDIO_EXT}"));

    let mut container = Scoped::new(media.open(video).await?);
    let mut track = Scoped::new(container.audio()?);
    track.write_mp3(&output).await?;

    info!(output = %output.display(), "audio extracted");
    Ok(output)
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory media backend that counts open and released handles.

    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[derive(Clone, Default)]
    pub struct Counters {
        pub opened: Arc<AtomicUsize>,
        pub closed: Arc<AtomicUsize>,
    }

    impl Counters {
        pub fn balanced(&self) -> bool {
            self.opened.load(Ordering::SeqCst) == self.closed.load(Ordering::SeqCst)
        }
    }

    #[derive(Clone, Default)]
    pub struct FakeMedia {
        pub counters: Counters,
        pub no_audio: bool,
        pub fail_write: bool,
        pub panic_write: bool,
    }

    struct FakeContainer {
        media: FakeMedia,
    }

    struct FakeTrack {
        media: FakeMedia,
    }

    #[async_trait]
    impl MediaBackend for FakeMedia {
        async fn open(&self, video: &Path) -> Result<Box<dyn VideoContainer>, JobError> {
            if !video.exists() {
                return Err(JobError::Transcode(format!("{} not found", video.display())));
            }
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeContainer { media: self.clone() }))
        }
    }

    impl VideoContainer for FakeContainer {
        fn audio(&mut self) -> Result<Box<dyn AudioTrack>, JobError> {
            if self.media.no_audio {
                return Err(JobError::Transcode("no audio stream".into()));
            }
            self.media.counters.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeTrack { media: self.media.clone() }))
        }
    }

    impl Release for FakeContainer {
        fn release(&mut self) {
            self.media.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Release for FakeTrack {
        fn release(&mut self) {
            self.media.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl AudioTrack for FakeTrack {
        async fn write_mp3(&mut self, output: &Path) -> Result<(), JobError> {
            if self.media.panic_write {
                panic!("encoder crashed");
            }
            if self.media.fail_write {
                return Err(JobError::Transcode("corrupt media".into()));
            }
            tokio::fs::write(output, b"ID3")
                .await
                .map_err(|e| JobError::Transcode(e.to_string()))
        }
    }
}
