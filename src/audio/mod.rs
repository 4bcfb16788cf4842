//! Audio decoding, synthesis and output for narrated teachings

mod alsa_handler;
pub mod alsa_output;
pub mod bell;
pub mod buffer;
pub mod context;
pub mod error;
pub mod output;
pub mod payload;
pub mod sample_converter;

pub use alsa_output::AlsaOutput;
pub use buffer::{DecodedAudioBuffer, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};
pub use context::{AudioContext, OutputFactory, SILENT_DEVICE};
pub use error::AudioError;
pub use output::{AudioOutput, PlaybackEnd, SilentOutput};
pub use payload::decode;
pub use sample_converter::to_audio_buffer;
