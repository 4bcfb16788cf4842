use crate::audio::{
    alsa_output::AlsaOutput,
    error::AudioError,
    output::{AudioOutput, SilentOutput},
};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

const LOG_TARGET: &str = "dharma_daily::audio::context";

/// Device name that selects the silent output instead of ALSA.
pub const SILENT_DEVICE: &str = "none";

/// Builds the output device when the context is first used.
pub type OutputFactory = Box<dyn Fn() -> Result<Arc<dyn AudioOutput>, AudioError> + Send + Sync>;

/// Owns the process-wide audio output.
///
/// The output is created on first use, reused by every playback, and released
/// by `close`. A closed context reopens on the next use.
pub struct AudioContext {
    factory: OutputFactory,
    output: Mutex<Option<Arc<dyn AudioOutput>>>,
}

impl AudioContext {
    pub fn new(factory: OutputFactory) -> Self {
        Self {
            factory,
            output: Mutex::new(None),
        }
    }

    /// Context for a named device; `none` selects silent playback.
    pub fn for_device(device_name: &str) -> Self {
        let device = device_name.to_string();
        Self::new(Box::new(move || {
            if device.eq_ignore_ascii_case(SILENT_DEVICE) {
                info!(target: LOG_TARGET, "Audio device '{}' selected; playback will be silent.", SILENT_DEVICE);
                Ok(Arc::new(SilentOutput::new()) as Arc<dyn AudioOutput>)
            } else {
                Ok(Arc::new(AlsaOutput::new(&device)) as Arc<dyn AudioOutput>)
            }
        }))
    }

    /// Context around an already constructed output.
    pub fn with_output(output: Arc<dyn AudioOutput>) -> Self {
        Self::new(Box::new(move || Ok(Arc::clone(&output))))
    }

    /// Returns the shared output, creating it on first use.
    pub fn output(&self) -> Result<Arc<dyn AudioOutput>, AudioError> {
        let mut guard = self
            .output
            .lock()
            .map_err(|_| AudioError::InvalidState("Audio context mutex poisoned".to_string()))?;
        if let Some(output) = guard.as_ref() {
            return Ok(Arc::clone(output));
        }
        debug!(target: LOG_TARGET, "Creating audio output on first use.");
        let output = (self.factory)()?;
        *guard = Some(Arc::clone(&output));
        Ok(output)
    }

    pub fn is_open(&self) -> bool {
        self.output.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    /// Releases the output device if it was ever created.
    #[instrument(skip(self))]
    pub async fn close(&self) -> Result<(), AudioError> {
        let output = match self.output.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => {
                warn!(target: LOG_TARGET, "Audio context mutex poisoned during close.");
                return Err(AudioError::InvalidState("Audio context mutex poisoned".to_string()));
            }
        };
        match output {
            Some(output) => {
                info!(target: LOG_TARGET, "Closing audio context.");
                output.close().await
            }
            None => {
                debug!(target: LOG_TARGET, "Audio context was never opened; nothing to close.");
                Ok(())
            }
        }
    }
}
