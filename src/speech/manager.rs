use crate::audio::{AudioContext, AudioError, PlaybackEnd};
use crate::speech::prefetch::PrefetchOrchestrator;
use crate::speech::session::{FinishCallback, PlaybackSession};
use crate::speech::state::{ListenOutcome, PlaybackState};
use crate::speech::SPEECH_LOG_TARGET;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

struct SessionSlot {
    state: PlaybackState,
    session: Option<PlaybackSession>,
}

/// Single-slot narration player behind the listen control.
///
/// Holds at most one [`PlaybackSession`]; a new session is only started
/// once the previous one has fully stopped.
pub struct PlaybackSessionManager {
    context: Arc<AudioContext>,
    prefetch: Arc<PrefetchOrchestrator>,
    slot: Arc<Mutex<SessionSlot>>,
}

fn lock_slot(slot: &Mutex<SessionSlot>) -> MutexGuard<'_, SessionSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PlaybackSessionManager {
    pub fn new(context: Arc<AudioContext>, prefetch: Arc<PrefetchOrchestrator>) -> Self {
        Self {
            context,
            prefetch,
            slot: Arc::new(Mutex::new(SessionSlot {
                state: PlaybackState::Idle,
                session: None,
            })),
        }
    }

    pub fn state(&self) -> PlaybackState {
        lock_slot(&self.slot).state
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Toggles narration.
    ///
    /// Stops a playing session, ignores the request while audio is loading,
    /// and otherwise plays the memoized narration, waiting for it if it is
    /// still being fetched.
    #[instrument(skip(self))]
    pub async fn listen(&self) -> Result<ListenOutcome, AudioError> {
        let playing_session = {
            let mut slot = lock_slot(&self.slot);
            match slot.state {
                PlaybackState::Loading => {
                    debug!(target: SPEECH_LOG_TARGET, "Listen ignored; audio is still loading.");
                    return Ok(ListenOutcome::Busy);
                }
                PlaybackState::Playing => {
                    slot.state = PlaybackState::Stopped;
                    Some(slot.session.take())
                }
                PlaybackState::Idle | PlaybackState::Stopped => {
                    slot.state = PlaybackState::Loading;
                    None
                }
            }
        };

        if let Some(session) = playing_session {
            info!(target: SPEECH_LOG_TARGET, "Stopping narration on request.");
            if let Some(session) = session {
                session.stop().await;
            }
            return Ok(ListenOutcome::Stopped);
        }

        let ready = match self.prefetch.get_ready().await {
            Ok(ready) => ready,
            Err(e) => {
                warn!(target: SPEECH_LOG_TARGET, "Narration audio unavailable: {}", e);
                self.finish_loading();
                return Err(e);
            }
        };

        if ready.generation != self.prefetch.current_generation() {
            info!(target: SPEECH_LOG_TARGET, "Content changed while loading; discarding narration.");
            self.finish_loading();
            return Ok(ListenOutcome::Superseded);
        }

        let output = match self.context.output() {
            Ok(output) => output,
            Err(e) => {
                self.finish_loading();
                return Err(e);
            }
        };

        let prior = lock_slot(&self.slot).session.take();
        if let Some(prior) = prior {
            prior.stop().await;
        }

        let mut slot = lock_slot(&self.slot);
        if slot.state != PlaybackState::Loading {
            debug!(target: SPEECH_LOG_TARGET, "Playback was stopped while loading.");
            return Ok(ListenOutcome::Cancelled);
        }
        // Started under the lock so a very short narration cannot finish
        // before the slot knows about it.
        let session = PlaybackSession::start(output, ready.buffer, self.completion_callback());
        slot.session = Some(session);
        slot.state = PlaybackState::Playing;
        Ok(ListenOutcome::Started)
    }

    /// Stops any playing narration. Safe to call when idle.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let session = {
            let mut slot = lock_slot(&self.slot);
            slot.state = PlaybackState::Idle;
            slot.session.take()
        };
        if let Some(session) = session {
            session.stop().await;
        }
    }

    /// Stops playback and releases the audio output.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), AudioError> {
        self.stop().await;
        self.context.close().await
    }

    fn finish_loading(&self) {
        let mut slot = lock_slot(&self.slot);
        if slot.state == PlaybackState::Loading {
            slot.state = PlaybackState::Idle;
        }
    }

    /// Returns the slot to idle when the finishing session is still current.
    fn completion_callback(&self) -> FinishCallback {
        let slot = Arc::clone(&self.slot);
        Box::new(move |session_id: Uuid, result: Result<PlaybackEnd, AudioError>| {
            let mut slot = lock_slot(&slot);
            let is_current = slot.session.as_ref().map(PlaybackSession::id) == Some(session_id);
            if !is_current {
                debug!(target: SPEECH_LOG_TARGET, session_id = %session_id, "Ignoring completion of a replaced session.");
                return;
            }
            if let Err(e) = result {
                warn!(target: SPEECH_LOG_TARGET, session_id = %session_id, "Session ended with error: {}", e);
            }
            slot.session = None;
            slot.state = PlaybackState::Idle;
        })
    }
}
