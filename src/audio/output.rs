use crate::audio::{buffer::DecodedAudioBuffer, error::AudioError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

const LOG_TARGET: &str = "dharma_daily::audio::output";

/// How a call to [`AudioOutput::play`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// Every frame of the buffer was played.
    Completed,
    /// A shutdown signal stopped playback early.
    Interrupted,
}

/// Trait defining an audio output device shared by all playback sessions.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Plays the whole buffer, returning early with `Interrupted` as soon as
    /// a message arrives on (or the sender drops) `shutdown_rx`.
    async fn play(
        &self,
        buffer: Arc<DecodedAudioBuffer>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<PlaybackEnd, AudioError>;

    /// Releases the underlying device. Should be called before dropping.
    async fn close(&self) -> Result<(), AudioError>;
}

/// Output that produces no sound but takes as long as the audio would.
///
/// Used when no audio device is configured (`none`) and in tests.
#[derive(Debug, Default)]
pub struct SilentOutput;

impl SilentOutput {
    pub fn new() -> Self {
        SilentOutput
    }
}

#[async_trait]
impl AudioOutput for SilentOutput {
    #[instrument(skip_all, fields(frames = buffer.frames()))]
    async fn play(
        &self,
        buffer: Arc<DecodedAudioBuffer>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<PlaybackEnd, AudioError> {
        let duration = buffer.duration();
        debug!(target: LOG_TARGET, "Silent playback for {:?}", duration);
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(PlaybackEnd::Completed),
            _ = shutdown_rx.recv() => Ok(PlaybackEnd::Interrupted),
        }
    }

    async fn close(&self) -> Result<(), AudioError> {
        Ok(())
    }
}
