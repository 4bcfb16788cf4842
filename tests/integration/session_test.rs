//! Integration tests for a full Dharma Daily session
//!
//! These tests drive the session controller the way the terminal does,
//! with an in-memory generative service and silent audio.

use dharma_daily::app::{DharmaSession, SessionState};
use dharma_daily::audio::{AudioContext, SILENT_DEVICE};
use dharma_daily::speech::{ListenOutcome, PlaybackState};
use dharma_daily::wisdom::{today, LoadingState, WisdomCache};
use std::error::Error;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

#[cfg(test)]
mod session_integration_tests {
    use super::*;
    use crate::test_utils::{sample_record, MockContentService};

    fn new_session(service: &Arc<MockContentService>, cache: WisdomCache) -> (DharmaSession, Arc<AudioContext>) {
        let context = Arc::new(AudioContext::for_device(SILENT_DEVICE));
        let session = DharmaSession::new(Arc::clone(service) as _, cache, Arc::clone(&context));
        (session, context)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_session_flow() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let service = Arc::new(MockContentService::new(&["Anicca", "Dukkha"]));
        let (mut session, context) = new_session(&service, WisdomCache::new(dir.path().join("wisdom.json")));

        session.load_wisdom(false).await?;
        assert_eq!(session.loading_state(), LoadingState::Success);

        session.start_ritual();
        assert_eq!(session.state(), SessionState::Breathing);
        session.finish_breathing();
        assert_eq!(session.state(), SessionState::Wisdom);

        assert_eq!(session.listen().await?, ListenOutcome::Started);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(session.playback_state(), PlaybackState::Idle);
        assert_eq!(session.listen().await?, ListenOutcome::Started);
        assert_eq!(service.speech_count(), 1);

        let echo = session.reflect("I notice how fast the day passed").await;
        assert_eq!(echo.as_deref(), Some("Anicca is already within you."));

        let share = session.share_text().unwrap();
        assert_eq!(
            share,
            "Dharma Daily: Anicca\n\"Hold lightly what is passing\"\nAffirmation: I flow with change"
        );

        let next = session.seek_another_path().await?;
        assert_eq!(next.term, "Dukkha");
        assert_eq!(session.state(), SessionState::Welcome);
        assert_eq!(session.playback_state(), PlaybackState::Idle);
        assert!(session.echo().is_none());

        session.shutdown().await?;
        assert!(!context.is_open());
        Ok(())
    }

    #[tokio::test]
    async fn test_same_day_restart_uses_cache() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let cache_path = dir.path().join("wisdom.json");
        let service = Arc::new(MockContentService::new(&["Anicca", "Dukkha"]));

        let (mut first, _) = new_session(&service, WisdomCache::new(&cache_path));
        first.load_wisdom(false).await?;
        first.shutdown().await?;

        let (mut second, _) = new_session(&service, WisdomCache::new(&cache_path));
        let record = second.load_wisdom(false).await?;

        assert_eq!(record.term, "Anicca");
        assert_eq!(service.wisdom_calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_forced_refresh_skips_todays_cache() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let cache = WisdomCache::new(dir.path().join("wisdom.json"));
        cache.store(&today(), &sample_record("Metta"))?;
        let service = Arc::new(MockContentService::new(&["Sati"]));

        let (mut session, _) = new_session(&service, cache.clone());
        let record = session.load_wisdom(true).await?;

        assert_eq!(record.term, "Sati");
        assert_eq!(cache.load_for(&today()).map(|r| r.term), Some("Sati".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_audio_failure_then_recovery() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let service = Arc::new(MockContentService::new(&["Anicca"]));
        service.fail_speech.store(true, Ordering::SeqCst);
        let (mut session, _) = new_session(&service, WisdomCache::new(dir.path().join("wisdom.json")));
        session.load_wisdom(false).await?;

        assert!(session.listen().await.is_err());
        assert_eq!(session.playback_state(), PlaybackState::Idle);

        service.fail_speech.store(false, Ordering::SeqCst);
        assert_eq!(session.listen().await?, ListenOutcome::Started);
        assert!(service.speech_count() >= 2);

        session.stop_audio().await;
        assert_eq!(session.playback_state(), PlaybackState::Idle);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_refresh_stops_playing_narration() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let service = Arc::new(MockContentService::new(&["Anicca", "Dukkha"]));
        let (mut session, _) = new_session(&service, WisdomCache::new(dir.path().join("wisdom.json")));
        session.load_wisdom(false).await?;

        assert_eq!(session.listen().await?, ListenOutcome::Started);
        assert_eq!(session.playback_state(), PlaybackState::Playing);

        let record = session.load_wisdom(true).await?;

        assert_eq!(record.term, "Dukkha");
        assert_eq!(session.playback_state(), PlaybackState::Idle);
        assert_eq!(session.listen().await?, ListenOutcome::Started);
        assert_eq!(service.speech_count(), 2);
        Ok(())
    }
}
