use crate::audio::buffer::DecodedAudioBuffer;
use tracing::{trace, warn};

const LOG_TARGET: &str = "dharma_daily::audio::sample_converter";

/// Interprets raw bytes as interleaved S16LE samples and rescales them into
/// planar f32 channel data.
///
/// Trailing bytes that do not make up a whole frame are dropped.
pub fn to_audio_buffer(bytes: &[u8], sample_rate: u32, channel_count: usize) -> DecodedAudioBuffer {
    if channel_count == 0 {
        warn!(target: LOG_TARGET, "Requested conversion with zero channels; returning empty buffer.");
        return DecodedAudioBuffer::new(sample_rate, Vec::new());
    }

    let frame_bytes = 2 * channel_count;
    let num_frames = bytes.len() / frame_bytes;
    let dropped = bytes.len() % frame_bytes;
    if dropped != 0 {
        trace!(target: LOG_TARGET, "Dropping {} trailing bytes that do not form a whole frame", dropped);
    }

    let mut f32_vecs: Vec<Vec<f32>> = vec![vec![0.0f32; num_frames]; channel_count];
    for (frame, frame_chunk) in bytes.chunks_exact(frame_bytes).enumerate() {
        for (ch, sample_bytes) in frame_chunk.chunks_exact(2).enumerate() {
            let sample_s16 = i16::from_le_bytes([sample_bytes[0], sample_bytes[1]]);
            f32_vecs[ch][frame] = sample_s16 as f32 / 32768.0;
        }
    }

    trace!(target: LOG_TARGET, "Converted {} bytes into {} frames, {} channels at {} Hz", bytes.len(), num_frames, channel_count, sample_rate);
    DecodedAudioBuffer::new(sample_rate, f32_vecs)
}

/// Converts planar f32 channel data into an interleaved S16LE Vec.
pub fn convert_f32_vecs_to_s16(f32_vecs: &[Vec<f32>]) -> Vec<i16> {
    if f32_vecs.is_empty() || f32_vecs[0].is_empty() {
        return Vec::new();
    }

    let num_channels = f32_vecs.len();
    let num_frames = f32_vecs[0].len();
    let mut s16_vec = vec![0i16; num_frames * num_channels];

    trace!(target: LOG_TARGET, "Converting {} frames, {} channels to interleaved S16LE", num_frames, num_channels);

    for frame in 0..num_frames {
        for ch in 0..num_channels {
            match f32_vecs[ch].get(frame) {
                Some(sample_f32) => {
                    s16_vec[frame * num_channels + ch] = (sample_f32 * 32767.0).clamp(-32768.0, 32767.0) as i16;
                }
                None => {
                    warn!(target: LOG_TARGET, "Inconsistent channel lengths at frame {}, channel {}", frame, ch);
                    s16_vec[frame * num_channels + ch] = 0;
                }
            }
        }
    }

    s16_vec
}

/// Interleaves a decoded buffer into S16LE samples for an output device.
pub fn to_interleaved_s16(buffer: &DecodedAudioBuffer) -> Vec<i16> {
    convert_f32_vecs_to_s16(buffer.channels())
}
