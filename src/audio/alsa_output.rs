use crate::audio::{
    alsa_handler::AlsaPcmHandler,
    buffer::DecodedAudioBuffer,
    error::AudioError,
    output::{AudioOutput, PlaybackEnd},
    sample_converter,
};
use async_trait::async_trait;
use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::Mutex as TokioMutex;
use tokio::task;
use tracing::{debug, error, info, instrument, trace, warn};

const LOG_TARGET: &str = "dharma_daily::audio::alsa_output";

/// Frames handed to each blocking ALSA write.
const WRITE_CHUNK_FRAMES: usize = 4096;
/// Input chunk size for the resampler.
const RESAMPLE_CHUNK_FRAMES: usize = 1024;

/// Audio output backed by an ALSA PCM device.
///
/// The device is opened lazily on the first `play` and reopened only when
/// the buffer format changes. Concurrent `play` calls are serialized.
pub struct AlsaOutput {
    alsa_handler: Arc<Mutex<AlsaPcmHandler>>,
    play_lock: TokioMutex<()>,
}

impl AlsaOutput {
    pub fn new(device_name: &str) -> Self {
        info!(target: LOG_TARGET, "Creating ALSA output for device: {}", device_name);
        Self {
            alsa_handler: Arc::new(Mutex::new(AlsaPcmHandler::new(device_name))),
            play_lock: TokioMutex::new(()),
        }
    }

    /// Runs `f` against the locked handler on the blocking thread pool.
    async fn with_handler<F, T>(&self, f: F) -> Result<T, AudioError>
    where
        F: FnOnce(&mut AlsaPcmHandler) -> Result<T, AudioError> + Send + 'static,
        T: Send + 'static,
    {
        let handler_clone = Arc::clone(&self.alsa_handler);
        task::spawn_blocking(move || match handler_clone.lock() {
            Ok(mut handler_guard) => f(&mut handler_guard),
            Err(poisoned) => {
                error!(target: LOG_TARGET, "ALSA handler mutex poisoned: {}", poisoned);
                Err(AudioError::InvalidState("ALSA handler mutex poisoned".to_string()))
            }
        })
        .await?
    }
}

fn shutdown_requested(shutdown_rx: &mut broadcast::Receiver<()>) -> bool {
    !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty))
}

#[async_trait]
impl AudioOutput for AlsaOutput {
    #[instrument(skip_all, fields(frames = buffer.frames(), rate = buffer.sample_rate()))]
    async fn play(
        &self,
        buffer: Arc<DecodedAudioBuffer>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<PlaybackEnd, AudioError> {
        let _play_guard = self.play_lock.lock().await;

        let rate = buffer.sample_rate();
        let num_channels = buffer.channel_count();
        if buffer.is_empty() || num_channels == 0 {
            trace!(target: LOG_TARGET, "Skipping playback of empty buffer.");
            return Ok(PlaybackEnd::Completed);
        }

        let actual_rate = self
            .with_handler(move |handler| {
                if !handler.is_configured_for(rate, num_channels) {
                    handler.initialize(rate, num_channels)?;
                }
                handler.get_actual_rate().ok_or_else(|| {
                    AudioError::InitializationError("ALSA handler did not return actual rate after initialization".to_string())
                })
            })
            .await?;

        let s16_buffer = if actual_rate != rate {
            info!(target: LOG_TARGET, "Sample rate mismatch (buffer: {}, ALSA: {}). Resampling.", rate, actual_rate);
            let source = Arc::clone(&buffer);
            let resampled = task::spawn_blocking(move || resample(&source, actual_rate)).await??;
            sample_converter::to_interleaved_s16(&resampled)
        } else {
            sample_converter::to_interleaved_s16(&buffer)
        };

        let total_frames = s16_buffer.len() / num_channels;
        let mut offset = 0;

        while offset < total_frames {
            if shutdown_requested(&mut shutdown_rx) {
                info!(target: LOG_TARGET, "Shutdown signal received during ALSA write loop.");
                self.with_handler(|handler| handler.drop_pending()).await?;
                return Ok(PlaybackEnd::Interrupted);
            }

            let chunk_frames = (total_frames - offset).min(WRITE_CHUNK_FRAMES);
            let buffer_chunk = s16_buffer[offset * num_channels..(offset + chunk_frames) * num_channels].to_vec();

            match self.with_handler(move |handler| handler.write_s16_buffer(&buffer_chunk)).await {
                Ok(0) => {
                    warn!(target: LOG_TARGET, "ALSA underrun recovered, retrying write for the same chunk.");
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                }
                Ok(frames_written) => {
                    offset += frames_written.min(chunk_frames);
                    trace!(target: LOG_TARGET, "Wrote {} frames to ALSA (total {}/{})", frames_written, offset, total_frames);
                }
                Err(e) => {
                    error!(target: LOG_TARGET, "Unrecoverable ALSA write error: {}", e);
                    return Err(e);
                }
            }
        }

        debug!(target: LOG_TARGET, "All frames written, draining.");
        self.with_handler(|handler| handler.drain()).await?;
        Ok(PlaybackEnd::Completed)
    }

    #[instrument(skip(self))]
    async fn close(&self) -> Result<(), AudioError> {
        info!(target: LOG_TARGET, "Closing ALSA output.");
        self.with_handler(|handler| {
            handler.close();
            Ok(())
        })
        .await
    }
}

/// Resamples a whole buffer to `target_rate` with a sinc interpolator.
pub(crate) fn resample(buffer: &DecodedAudioBuffer, target_rate: u32) -> Result<DecodedAudioBuffer, AudioError> {
    let source_rate = buffer.sample_rate();
    let num_channels = buffer.channel_count();
    let total_frames = buffer.frames();
    if source_rate == target_rate || total_frames == 0 || num_channels == 0 {
        return Ok(buffer.clone());
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, RESAMPLE_CHUNK_FRAMES, num_channels)
        .map_err(|e| AudioError::InitializationError(format!("Failed to create resampler: {}", e)))?;

    let expected_frames = (total_frames as f64 * ratio).round() as usize;
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected_frames + RESAMPLE_CHUNK_FRAMES); num_channels];
    let append = |output: &mut Vec<Vec<f32>>, chunk: Vec<Vec<f32>>| {
        for (out_ch, chunk_ch) in output.iter_mut().zip(chunk) {
            out_ch.extend_from_slice(&chunk_ch);
        }
    };

    let mut processed = 0;
    while processed < total_frames {
        let needed = resampler.input_frames_next();
        let end = (processed + needed).min(total_frames);
        let input_chunk: Vec<&[f32]> = buffer.channels().iter().map(|ch| &ch[processed..end]).collect();
        let result = if end - processed == needed {
            resampler.process(&input_chunk, None)
        } else {
            resampler.process_partial(Some(&input_chunk), None)
        };
        let output_chunk = result.map_err(|e| AudioError::ResamplingError(e.to_string()))?;
        append(&mut output, output_chunk);
        processed = end;
    }

    let tail = resampler
        .process_partial::<Vec<f32>>(None, None)
        .map_err(|e| AudioError::ResamplingError(e.to_string()))?;
    append(&mut output, tail);

    let delay = resampler.output_delay();
    for channel in output.iter_mut() {
        channel.drain(..delay.min(channel.len()));
        channel.truncate(expected_frames);
    }

    trace!(target: LOG_TARGET, "Resampled {} frames at {} Hz into {} frames at {} Hz", total_frames, source_rate, expected_frames, target_rate);
    Ok(DecodedAudioBuffer::new(target_rate, output))
}
