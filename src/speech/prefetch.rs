use crate::audio::{payload, to_audio_buffer, AudioError, DecodedAudioBuffer, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};
use crate::gemini::GenerativeContentService;
use crate::speech::state::{MemoStatus, ReadyAudio};
use crate::speech::SPEECH_LOG_TARGET;
use crate::wisdom::{speech_script, WisdomRecord};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, instrument, warn};

type AcquisitionResult = Result<Arc<DecodedAudioBuffer>, AudioError>;
type AcquisitionFuture = Shared<BoxFuture<'static, AcquisitionResult>>;

enum MemoState {
    Empty,
    Pending { attempt: u64, future: AcquisitionFuture },
    Ready(Arc<DecodedAudioBuffer>),
    Failed(AudioError),
}

struct PrefetchMemo {
    /// Bumped on every content change.
    generation: u64,
    /// Bumped on every acquisition started.
    attempts: u64,
    content: Option<Arc<WisdomRecord>>,
    state: MemoState,
}

/// Fetches the narration for the current teaching ahead of the listen request.
///
/// At most one synthesis request is in flight per content generation, and
/// its result is memoized until the content changes. Results that arrive
/// after a content change are dropped.
pub struct PrefetchOrchestrator {
    service: Arc<dyn GenerativeContentService>,
    memo: Arc<Mutex<PrefetchMemo>>,
}

fn lock_memo(memo: &Mutex<PrefetchMemo>) -> MutexGuard<'_, PrefetchMemo> {
    memo.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PrefetchOrchestrator {
    pub fn new(service: Arc<dyn GenerativeContentService>) -> Self {
        Self {
            service,
            memo: Arc::new(Mutex::new(PrefetchMemo {
                generation: 0,
                attempts: 0,
                content: None,
                state: MemoState::Empty,
            })),
        }
    }

    /// Replaces the content to narrate and drops any memoized audio.
    pub fn set_content(&self, record: Arc<WisdomRecord>) {
        let mut memo = lock_memo(&self.memo);
        memo.generation += 1;
        debug!(target: SPEECH_LOG_TARGET, generation = memo.generation, term = %record.term, "Narration content changed.");
        memo.content = Some(record);
        memo.state = MemoState::Empty;
    }

    /// Forgets both the content and any memoized audio.
    pub fn clear(&self) {
        let mut memo = lock_memo(&self.memo);
        memo.generation += 1;
        memo.content = None;
        memo.state = MemoState::Empty;
    }

    pub fn current_generation(&self) -> u64 {
        lock_memo(&self.memo).generation
    }

    pub fn status(&self) -> MemoStatus {
        match lock_memo(&self.memo).state {
            MemoState::Empty => MemoStatus::Empty,
            MemoState::Pending { .. } => MemoStatus::Pending,
            MemoState::Ready(_) => MemoStatus::Ready,
            MemoState::Failed(_) => MemoStatus::Failed,
        }
    }

    /// Starts fetching the narration if nothing is memoized or in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn prefetch(&self) {
        let mut memo = lock_memo(&self.memo);
        if !matches!(memo.state, MemoState::Empty) {
            debug!(target: SPEECH_LOG_TARGET, "Prefetch skipped; narration already requested.");
            return;
        }
        if self.start_locked(&mut memo).is_none() {
            debug!(target: SPEECH_LOG_TARGET, "Prefetch skipped; no content to narrate.");
        }
    }

    /// Returns the narration for the current content, waiting for it if needed.
    ///
    /// A memoized failure is returned once and then forgotten so the next
    /// call issues a fresh request.
    #[instrument(skip(self))]
    pub async fn get_ready(&self) -> Result<ReadyAudio, AudioError> {
        let (generation, attempt, future) = {
            let mut memo = lock_memo(&self.memo);
            let generation = memo.generation;
            match &memo.state {
                MemoState::Ready(buffer) => {
                    return Ok(ReadyAudio {
                        generation,
                        buffer: Arc::clone(buffer),
                    })
                }
                MemoState::Failed(e) => {
                    let e = e.clone();
                    memo.state = MemoState::Empty;
                    return Err(e);
                }
                MemoState::Pending { attempt, future } => (generation, *attempt, future.clone()),
                MemoState::Empty => match self.start_locked(&mut memo) {
                    Some((attempt, future)) => (generation, attempt, future),
                    None => return Err(AudioError::NoContent),
                },
            }
        };

        match future.await {
            Ok(buffer) => Ok(ReadyAudio { generation, buffer }),
            Err(e) => {
                let mut memo = lock_memo(&self.memo);
                let failed_here = match &memo.state {
                    MemoState::Pending { attempt: current, .. } => *current == attempt,
                    MemoState::Failed(_) => memo.attempts == attempt,
                    _ => false,
                };
                if memo.generation == generation && failed_here {
                    memo.state = MemoState::Empty;
                }
                Err(e)
            }
        }
    }

    /// Records a new in-flight acquisition and spawns the task that drives it.
    fn start_locked(&self, memo: &mut PrefetchMemo) -> Option<(u64, AcquisitionFuture)> {
        let record = memo.content.clone()?;
        memo.attempts += 1;
        let attempt = memo.attempts;
        let generation = memo.generation;
        let future = acquire(Arc::clone(&self.service), record).boxed().shared();
        memo.state = MemoState::Pending {
            attempt,
            future: future.clone(),
        };

        info!(target: SPEECH_LOG_TARGET, generation, attempt, "Requesting narration audio.");
        let memo_handle = Arc::clone(&self.memo);
        let driver = future.clone();
        tokio::spawn(async move {
            let result = driver.await;
            store_result(&memo_handle, generation, attempt, result);
        });
        Some((attempt, future))
    }
}

/// Stores a finished acquisition unless the memo has moved on since it began.
fn store_result(memo: &Mutex<PrefetchMemo>, generation: u64, attempt: u64, result: AcquisitionResult) {
    let mut memo = lock_memo(memo);
    let still_pending = matches!(memo.state, MemoState::Pending { attempt: current, .. } if current == attempt);
    if memo.generation != generation || !still_pending {
        debug!(target: SPEECH_LOG_TARGET, generation, attempt, "Discarding narration for superseded content.");
        return;
    }
    memo.state = match result {
        Ok(buffer) => {
            debug!(target: SPEECH_LOG_TARGET, generation, frames = buffer.frames(), "Narration audio ready.");
            MemoState::Ready(buffer)
        }
        Err(e) => {
            warn!(target: SPEECH_LOG_TARGET, generation, "Narration audio failed: {}", e);
            MemoState::Failed(e)
        }
    };
}

/// Script, synthesis, decode and conversion for one teaching.
async fn acquire(service: Arc<dyn GenerativeContentService>, record: Arc<WisdomRecord>) -> AcquisitionResult {
    let script = speech_script(&record);
    let encoded = service.generate_speech(&script).await?;
    let bytes = payload::decode(&encoded)?;
    let buffer = to_audio_buffer(&bytes, SPEECH_SAMPLE_RATE, SPEECH_CHANNELS);
    if buffer.is_empty() {
        error!(target: SPEECH_LOG_TARGET, "Synthesized audio decoded to {} bytes and no frames.", bytes.len());
        return Err(AudioError::DecodeError("Synthesized audio contained no samples".to_string()));
    }
    Ok(Arc::new(buffer))
}
