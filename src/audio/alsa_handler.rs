use crate::audio::error::AudioError;
use alsa::nix::errno::Errno;
use alsa::pcm::{Access, Format, HwParams, State as PcmState, PCM};
use alsa::{Direction, ValueOr};
use std::ffi::CString;
use tracing::{debug, error, info, instrument, warn};

const LOG_TARGET: &str = "dharma_daily::audio::alsa_handler";

/// Manages the ALSA PCM device for audio output.
pub struct AlsaPcmHandler {
    device_name: String,
    pcm: Option<PCM>,
    requested: Option<(u32, usize)>, // (rate, channels) requested at initialization
    actual_rate: Option<u32>,
}

impl AlsaPcmHandler {
    /// Creates a new handler for the specified ALSA device. The device is not
    /// opened until `initialize` is called.
    pub fn new(device_name: &str) -> Self {
        info!(target: LOG_TARGET, "Creating new AlsaPcmHandler for device: {}", device_name);
        AlsaPcmHandler {
            device_name: device_name.to_string(),
            pcm: None,
            requested: None,
            actual_rate: None,
        }
    }

    /// Returns true if the device is open with the given format.
    pub fn is_configured_for(&self, rate: u32, channels: usize) -> bool {
        self.pcm.is_some() && self.requested == Some((rate, channels))
    }

    /// Opens the PCM device for S16LE interleaved playback.
    /// Closes any existing PCM device first.
    #[instrument(skip(self), fields(device = %self.device_name))]
    pub fn initialize(&mut self, rate: u32, channels: usize) -> Result<(), AudioError> {
        info!(
            target: LOG_TARGET,
            "Initializing ALSA PCM device '{}' with rate={}, channels={}",
            self.device_name, rate, channels
        );

        self.close();

        let device = CString::new(self.device_name.clone())
            .map_err(|e| AudioError::InitializationError(format!("Invalid device name: {}", e)))?;

        let pcm = PCM::open(&device, Direction::Playback, false)?;

        {
            let hwp = HwParams::any(&pcm)?;
            hwp.set_access(Access::RWInterleaved)?;
            hwp.set_format(Format::s16())?;
            hwp.set_channels(channels as u32)?;

            match hwp.set_rate_near(rate, ValueOr::Nearest) {
                Ok(_) => {
                    let actual_rate = hwp.get_rate()?;
                    if actual_rate != rate {
                        warn!(
                            target: LOG_TARGET,
                            "ALSA rate negotiation: requested={}, actual={}",
                            rate, actual_rate
                        );
                    } else {
                        debug!(target: LOG_TARGET, "ALSA rate set successfully to {}", actual_rate);
                    }
                    self.actual_rate = Some(actual_rate);
                }
                Err(e) => {
                    error!(target: LOG_TARGET, "Failed to set ALSA rate near {}: {}", rate, e);
                    return Err(AudioError::AlsaError(format!(
                        "Failed to set sample rate {}: {}",
                        rate, e
                    )));
                }
            }
            pcm.hw_params(&hwp)?;
            debug!(target: LOG_TARGET, "ALSA hardware parameters applied.");

            let swp = pcm.sw_params_current()?;
            let buffer_size = hwp.get_buffer_size()?;
            let period_size = hwp.get_period_size()?;
            swp.set_start_threshold(buffer_size - period_size)?;
            pcm.sw_params(&swp)?;
            debug!(target: LOG_TARGET, "ALSA software parameters applied (buffer={}, period={}).", buffer_size, period_size);
        }

        self.pcm = Some(pcm);
        self.requested = Some((rate, channels));
        info!(target: LOG_TARGET, "ALSA initialized successfully.");
        Ok(())
    }

    /// Writes a buffer of S16LE interleaved samples, handling ALSA underruns.
    /// Returns Ok(0) if an underrun occurred and was recovered.
    pub fn write_s16_buffer(&self, buffer: &[i16]) -> Result<usize, AudioError> {
        let pcm = self.pcm.as_ref().ok_or(AudioError::InvalidState("PCM not initialized for writing".to_string()))?;
        let io = pcm.io_i16()?;

        match io.writei(buffer) {
            Ok(frames_written) => Ok(frames_written),
            Err(e) if e.errno() == Errno::EPIPE => {
                warn!(target: LOG_TARGET, "ALSA buffer underrun (EPIPE), attempting recovery...");
                match pcm.recover(libc::EPIPE, false) {
                    Ok(()) => {
                        info!(target: LOG_TARGET, "ALSA underrun recovery successful.");
                        Ok(0)
                    }
                    Err(recover_err) => {
                        error!(target: LOG_TARGET, "ALSA recovery failed: {}", recover_err);
                        Err(AudioError::AlsaError(format!("ALSA recovery failed: {}", recover_err)))
                    }
                }
            }
            Err(e) => {
                error!(target: LOG_TARGET, "ALSA write error: {}", e);
                Err(AudioError::AlsaError(e.to_string()))
            }
        }
    }

    /// Blocks until everything written so far has been played.
    pub fn drain(&self) -> Result<(), AudioError> {
        if let Some(pcm) = &self.pcm {
            if pcm.state() == PcmState::Running || pcm.state() == PcmState::Prepared {
                debug!(target: LOG_TARGET, "Draining ALSA buffer.");
                pcm.drain().map_err(|e| {
                    warn!(target: LOG_TARGET, "Error draining ALSA buffer: {}", e);
                    AudioError::from(e)
                })?;
                // Drain leaves the stream in SETUP; prepare it for the next write.
                pcm.prepare()?;
            }
        }
        Ok(())
    }

    /// Discards pending frames immediately and leaves the device ready for reuse.
    pub fn drop_pending(&self) -> Result<(), AudioError> {
        if let Some(pcm) = &self.pcm {
            if pcm.state() == PcmState::Running || pcm.state() == PcmState::Prepared {
                debug!(target: LOG_TARGET, "Dropping pending ALSA frames.");
                pcm.drop()?;
                pcm.prepare()?;
            }
        }
        Ok(())
    }

    /// Closes the ALSA PCM device if it's open, discarding pending frames.
    pub fn close(&mut self) {
        if let Some(pcm) = self.pcm.take() {
            debug!(target: LOG_TARGET, "Closing ALSA PCM device (state: {:?})...", pcm.state());
            if pcm.state() == PcmState::Running || pcm.state() == PcmState::Prepared {
                if let Err(e) = pcm.drop() {
                    warn!(target: LOG_TARGET, "Error dropping ALSA buffer during close (ignored): {}", e);
                }
            }
            debug!(target: LOG_TARGET, "ALSA PCM closed.");
        }
        self.actual_rate = None;
        self.requested = None;
    }

    /// Returns the actual sample rate negotiated with ALSA during initialization.
    pub fn get_actual_rate(&self) -> Option<u32> {
        self.actual_rate
    }
}

impl Drop for AlsaPcmHandler {
    fn drop(&mut self) {
        debug!(target: LOG_TARGET, "Dropping AlsaPcmHandler.");
        self.close();
    }
}
