use crate::audio::DecodedAudioBuffer;
use std::sync::Arc;

/// State of the narration player as seen by the listen control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    /// Audio is being fetched; further listen requests are ignored.
    Loading,
    Playing,
    /// Playback was stopped by the user.
    Stopped,
}

/// Result of a call to `PlaybackSessionManager::listen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenOutcome {
    /// A new playback session began.
    Started,
    /// The playing session was stopped.
    Stopped,
    /// A previous listen is still loading audio.
    Busy,
    /// The content changed while loading; the fetched audio was discarded.
    Superseded,
    /// `stop` was called while loading; nothing was played.
    Cancelled,
}

/// Observable condition of the prefetch memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoStatus {
    Empty,
    Pending,
    Ready,
    Failed,
}

/// A decoded narration together with the content generation it was made for.
#[derive(Debug, Clone)]
pub struct ReadyAudio {
    pub generation: u64,
    pub buffer: Arc<DecodedAudioBuffer>,
}
