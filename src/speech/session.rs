use crate::audio::{AudioError, AudioOutput, DecodedAudioBuffer, PlaybackEnd};
use crate::speech::SPEECH_LOG_TARGET;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace};
use uuid::Uuid;

/// Called once from the playback task with the session id and how it ended.
pub type FinishCallback = Box<dyn FnOnce(Uuid, Result<PlaybackEnd, AudioError>) + Send + 'static>;

/// How long `stop` waits for the playback task before aborting it.
const STOP_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// One narration playing through the shared output, on its own task.
#[derive(Debug)]
pub struct PlaybackSession {
    id: Uuid,
    task_handle: JoinHandle<()>,
    shutdown_tx: broadcast::Sender<()>,
}

impl PlaybackSession {
    /// Spawns a task playing `buffer` on `output`. Must be called from within
    /// a tokio runtime.
    #[instrument(skip_all, fields(frames = buffer.frames()))]
    pub fn start(output: Arc<dyn AudioOutput>, buffer: Arc<DecodedAudioBuffer>, on_finish: FinishCallback) -> Self {
        let id = Uuid::new_v4();
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

        info!(target: SPEECH_LOG_TARGET, session_id = %id, "Starting playback session ({:?}).", buffer.duration());
        let task_handle = tokio::spawn(async move {
            debug!(target: SPEECH_LOG_TARGET, session_id = %id, "[Playback Task] Started.");
            let result = output.play(buffer, shutdown_rx).await;
            match &result {
                Ok(PlaybackEnd::Completed) => {
                    info!(target: SPEECH_LOG_TARGET, session_id = %id, "[Playback Task] Narration finished.")
                }
                Ok(PlaybackEnd::Interrupted) => {
                    debug!(target: SPEECH_LOG_TARGET, session_id = %id, "[Playback Task] Narration interrupted.")
                }
                Err(e) => error!(target: SPEECH_LOG_TARGET, session_id = %id, "[Playback Task] Playback failed: {}", e),
            }
            on_finish(id, result);
        });

        Self {
            id,
            task_handle,
            shutdown_tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.task_handle.is_finished()
    }

    fn signal_shutdown(&self) {
        debug!(target: SPEECH_LOG_TARGET, session_id = %self.id, "Sending shutdown signal to playback task.");
        if let Err(e) = self.shutdown_tx.send(()) {
            // Expected when the task already finished.
            trace!(target: SPEECH_LOG_TARGET, session_id = %self.id, "Failed to send shutdown signal: {}", e);
        }
    }

    /// Signals the task to stop and waits for it, aborting after a timeout.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn stop(mut self) {
        self.signal_shutdown();
        tokio::select! {
            biased;
            result = &mut self.task_handle => match result {
                Ok(()) => debug!(target: SPEECH_LOG_TARGET, session_id = %self.id, "Playback task finished."),
                Err(e) if e.is_panic() => {
                    error!(target: SPEECH_LOG_TARGET, session_id = %self.id, "Playback task panicked: {:?}", e)
                }
                Err(e) => debug!(target: SPEECH_LOG_TARGET, session_id = %self.id, "Playback task ended: {:?}", e),
            },
            _ = tokio::time::sleep(STOP_TIMEOUT) => {
                error!(target: SPEECH_LOG_TARGET, session_id = %self.id, "Timeout waiting for playback task after {:?}. Aborting task.", STOP_TIMEOUT);
                self.task_handle.abort();
            }
        }
    }
}
