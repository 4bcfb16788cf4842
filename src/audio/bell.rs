use crate::audio::buffer::{DecodedAudioBuffer, SPEECH_SAMPLE_RATE};
use std::f64::consts::TAU;

const START_FREQUENCY: f64 = 432.0;
const END_FREQUENCY: f64 = 108.0;
const SWEEP_SECONDS: f64 = 3.0;
const PEAK_GAIN: f64 = 0.2;
const ATTACK_SECONDS: f64 = 0.1;
const FLOOR_GAIN: f64 = 0.0001;
const DECAY_END_SECONDS: f64 = 4.0;
const TOTAL_SECONDS: f64 = 4.1;

/// Exponential interpolation between two positive values.
fn exp_ramp(from: f64, to: f64, progress: f64) -> f64 {
    from * (to / from).powf(progress.clamp(0.0, 1.0))
}

fn frequency_at(t: f64) -> f64 {
    exp_ramp(START_FREQUENCY, END_FREQUENCY, t / SWEEP_SECONDS)
}

fn gain_at(t: f64) -> f64 {
    if t < ATTACK_SECONDS {
        PEAK_GAIN * t / ATTACK_SECONDS
    } else {
        exp_ramp(PEAK_GAIN, FLOOR_GAIN, (t - ATTACK_SECONDS) / (DECAY_END_SECONDS - ATTACK_SECONDS))
    }
}

/// Synthesizes the singing bowl that opens the breathing ritual.
///
/// A sine falling from 432 Hz to 108 Hz over three seconds, with a short
/// linear attack and an exponential decay.
pub fn singing_bowl(sample_rate: u32) -> DecodedAudioBuffer {
    let rate = sample_rate as f64;
    let frames = (TOTAL_SECONDS * rate).round() as usize;
    let mut samples = Vec::with_capacity(frames);
    let mut phase = 0.0f64;
    for i in 0..frames {
        let t = i as f64 / rate;
        samples.push((phase.sin() * gain_at(t)) as f32);
        phase = (phase + TAU * frequency_at(t) / rate) % TAU;
    }
    DecodedAudioBuffer::new(sample_rate, vec![samples])
}

/// The singing bowl at the speech sample rate.
pub fn default_singing_bowl() -> DecodedAudioBuffer {
    singing_bowl(SPEECH_SAMPLE_RATE)
}
