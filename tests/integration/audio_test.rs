//! Integration tests for audio functionality
//!
//! These tests verify the decode and playback path from an encoded
//! payload to a finished playback session.

use dharma_daily::audio::{decode, to_audio_buffer, AudioContext, AudioError, AudioOutput, PlaybackEnd, SILENT_DEVICE};
use dharma_daily::speech::PlaybackSession;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};

#[cfg(test)]
mod audio_integration_tests {
    use super::*;
    use crate::test_utils::THREE_FRAME_PAYLOAD;

    #[test]
    fn test_payload_to_buffer() -> Result<(), Box<dyn Error>> {
        let bytes = decode(&format!("data:audio/pcm;base64,{}\n", THREE_FRAME_PAYLOAD))?;
        assert_eq!(bytes, vec![0x00, 0x80, 0x00, 0x00, 0xFF, 0x7F]);

        let buffer = to_audio_buffer(&bytes, 24_000, 1);
        assert_eq!(buffer.sample_rate(), 24_000);
        assert_eq!(buffer.channel_count(), 1);
        assert_eq!(buffer.frames(), 3);
        assert_eq!(buffer.channel(0), Some(&[-1.0, 0.0, 32767.0 / 32768.0][..]));
        Ok(())
    }

    #[test]
    fn test_audio_error_handling() {
        let err = decode("***").unwrap_err();
        assert!(matches!(err, AudioError::DecodeError(_)));
        assert!(err.to_string().starts_with("Decode error"));
    }

    /// A silent context plays a decoded buffer to completion.
    #[tokio::test(start_paused = true)]
    async fn test_silent_context_plays_session() -> Result<(), Box<dyn Error>> {
        let context = AudioContext::for_device(SILENT_DEVICE);
        let buffer = Arc::new(to_audio_buffer(&vec![0u8; 48_000], 24_000, 1));
        let (tx, rx) = oneshot::channel();

        let _session = PlaybackSession::start(
            context.output()?,
            buffer,
            Box::new(move |_, result| {
                let _ = tx.send(result);
            }),
        );

        assert_eq!(rx.await?, Ok(PlaybackEnd::Completed));
        context.close().await?;
        assert!(!context.is_open());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_signal_interrupts_output() -> Result<(), Box<dyn Error>> {
        let context = AudioContext::for_device(SILENT_DEVICE);
        let output: Arc<dyn AudioOutput> = context.output()?;
        let buffer = Arc::new(to_audio_buffer(&vec![0u8; 480_000], 24_000, 1));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let play = tokio::spawn(async move { output.play(buffer, shutdown_rx).await });
        tokio::task::yield_now().await;
        shutdown_tx.send(())?;

        assert_eq!(play.await?, Ok(PlaybackEnd::Interrupted));
        Ok(())
    }

    /// Requires a real ALSA device.
    #[tokio::test]
    #[ignore]
    async fn test_alsa_default_device() -> Result<(), Box<dyn Error>> {
        let context = AudioContext::for_device("default");
        let buffer = Arc::new(dharma_daily::audio::bell::default_singing_bowl());
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let end = context.output()?.play(buffer, shutdown_rx).await?;
        assert_eq!(end, PlaybackEnd::Completed);
        context.close().await?;
        Ok(())
    }
}
