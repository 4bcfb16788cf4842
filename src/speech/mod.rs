//! Narration acquisition and playback
//!
//! The [`PrefetchOrchestrator`] fetches and decodes the spoken version of the
//! current teaching once per content change. The [`PlaybackSessionManager`]
//! plays that memoized audio, keeping at most one session alive.

pub mod manager;
pub mod prefetch;
pub mod session;
pub mod state;

pub use manager::PlaybackSessionManager;
pub use prefetch::PrefetchOrchestrator;
pub use session::{FinishCallback, PlaybackSession};
pub use state::{ListenOutcome, MemoStatus, PlaybackState, ReadyAudio};

pub(crate) const SPEECH_LOG_TARGET: &str = "dharma_daily::speech";

/// Notice shown when narration cannot be played.
pub const AUDIO_FAILURE_NOTICE: &str = "Silence is golden, but audio failed to load.";
