//! Top-level flow of a Dharma Daily session
//!
//! A session moves from the welcome screen through the breathing ritual to
//! the teaching, and owns every resource the teaching needs: the content
//! loader, the narration pipeline and the shared audio context.

use crate::audio::{bell, AudioContext, AudioError, DecodedAudioBuffer, PlaybackEnd};
use crate::gemini::GenerativeContentService;
use crate::speech::{ListenOutcome, PlaybackSessionManager, PlaybackState, PrefetchOrchestrator};
use crate::wisdom::{self, ContentLoader, LoadingState, WisdomCache, WisdomError, WisdomRecord};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};


const LOG_TARGET: &str = "dharma_daily::app";

/// Which screen the user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Welcome,
    Breathing,
    Wisdom,
}

pub struct DharmaSession {
    state: SessionState,
    service: Arc<dyn GenerativeContentService>,
    loader: ContentLoader,
    context: Arc<AudioContext>,
    prefetch: Arc<PrefetchOrchestrator>,
    playback: PlaybackSessionManager,
    bowl: Arc<DecodedAudioBuffer>,
    bowl_shutdown: Option<broadcast::Sender<()>>,
    echo: Option<String>,
}

impl DharmaSession {
    pub fn new(service: Arc<dyn GenerativeContentService>, cache: WisdomCache, context: Arc<AudioContext>) -> Self {
        let prefetch = Arc::new(PrefetchOrchestrator::new(Arc::clone(&service)));
        let playback = PlaybackSessionManager::new(Arc::clone(&context), Arc::clone(&prefetch));
        Self {
            state: SessionState::Welcome,
            loader: ContentLoader::new(Arc::clone(&service), cache),
            service,
            context,
            prefetch,
            playback,
            bowl: Arc::new(bell::default_singing_bowl()),
            bowl_shutdown: None,
            echo: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn loading_state(&self) -> LoadingState {
        self.loader.state()
    }

    pub fn wisdom(&self) -> Option<Arc<WisdomRecord>> {
        self.loader.current()
    }

    /// The last reply to the user's reflection.
    pub fn echo(&self) -> Option<&str> {
        self.echo.as_deref()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn prefetch(&self) -> &PrefetchOrchestrator {
        &self.prefetch
    }

    /// Loads the teaching and starts fetching its narration right away.
    ///
    /// Narration of the previous teaching is stopped once the new one is in.
    #[instrument(skip(self))]
    pub async fn load_wisdom(&mut self, force_new: bool) -> Result<Arc<WisdomRecord>, WisdomError> {
        let record = self.loader.load(force_new).await?;
        self.playback.stop().await;
        self.prefetch.set_content(Arc::clone(&record));
        self.prefetch.prefetch();
        Ok(record)
    }

    /// Rings the singing bowl and begins the breathing ritual.
    ///
    /// The bowl plays in the background; failing to play it is not an error.
    #[instrument(skip(self))]
    pub fn start_ritual(&mut self) {
        self.ring_bowl();
        self.state = SessionState::Breathing;
    }

    pub fn finish_breathing(&mut self) {
        debug!(target: LOG_TARGET, "Breathing complete.");
        self.state = SessionState::Wisdom;
    }

    fn ring_bowl(&mut self) {
        let output = match self.context.output() {
            Ok(output) => output,
            Err(e) => {
                warn!(target: LOG_TARGET, "Audio not supported or blocked: {}", e);
                return;
            }
        };
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        if let Some(previous) = self.bowl_shutdown.replace(shutdown_tx) {
            let _ = previous.send(());
        }
        let bowl = Arc::clone(&self.bowl);
        tokio::spawn(async move {
            match output.play(bowl, shutdown_rx).await {
                Ok(PlaybackEnd::Completed) => debug!(target: LOG_TARGET, "Singing bowl finished."),
                Ok(PlaybackEnd::Interrupted) => debug!(target: LOG_TARGET, "Singing bowl interrupted."),
                Err(e) => warn!(target: LOG_TARGET, "Singing bowl failed: {}", e),
            }
        });
    }

    /// Toggles narration of the current teaching.
    pub async fn listen(&self) -> Result<ListenOutcome, AudioError> {
        self.playback.listen().await
    }

    pub async fn stop_audio(&self) {
        self.playback.stop().await;
    }

    /// Sends the user's reflection and keeps the reply.
    ///
    /// Returns `None` for a blank reflection or when no teaching is loaded.
    #[instrument(skip(self, reflection))]
    pub async fn reflect(&mut self, reflection: &str) -> Option<String> {
        let record = self.loader.current()?;
        let echo = wisdom::handle_reflect(self.service.as_ref(), &record.term, reflection).await?;
        self.echo = Some(echo.clone());
        Some(echo)
    }

    pub fn share_text(&self) -> Option<String> {
        self.loader.current().map(|record| wisdom::share_text(&record))
    }

    /// Drops the current teaching and fetches a different one.
    #[instrument(skip(self))]
    pub async fn seek_another_path(&mut self) -> Result<Arc<WisdomRecord>, WisdomError> {
        info!(target: LOG_TARGET, "Seeking another path.");
        self.playback.stop().await;
        self.echo = None;
        self.state = SessionState::Welcome;
        self.load_wisdom(true).await
    }

    /// Stops all sound and releases the audio device.
    #[instrument(skip(self))]
    pub async fn shutdown(&mut self) -> Result<(), AudioError> {
        if let Some(bowl) = self.bowl_shutdown.take() {
            let _ = bowl.send(());
        }
        self.playback.shutdown().await
    }
}
