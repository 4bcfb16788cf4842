//! Tests for the command-line interface

#[cfg(test)]
mod tests {
    use super::super::breath::{phase_message, SETTLE_DELAY};
    use super::super::cli::{render_actions, render_wisdom};
    use super::super::*;
    use crate::speech::PlaybackState;
    use crate::test_support::sample_record;
    use indicatif::ProgressBar;
    use std::time::Duration;

    fn default_args() -> Args {
        Args {
            api_key: None,
            config: None,
            audio_device: None,
            new: false,
            skip_ritual: false,
            share_file: None,
            log_json: false,
        }
    }

    #[test]
    fn test_args_parsing() {
        use clap::CommandFactory;
        let app = Args::command();
        app.debug_assert();
    }

    #[test]
    fn test_args_flags() {
        use clap::Parser;
        let args = Args::try_parse_from([
            "dharma-daily",
            "--audio-device",
            "none",
            "--new",
            "--skip-ritual",
            "--share-file",
            "/tmp/share.txt",
        ])
        .unwrap();

        assert_eq!(args.audio_device.as_deref(), Some("none"));
        assert!(args.new);
        assert!(args.skip_ritual);
        assert_eq!(args.share_file, Some(std::path::PathBuf::from("/tmp/share.txt")));
        assert!(!args.log_json);
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("l"), Command::Listen);
        assert_eq!(Command::parse(" R \n"), Command::Reflect);
        assert_eq!(Command::parse("share"), Command::Share);
        assert_eq!(Command::parse("n"), Command::NewPath);
        assert_eq!(Command::parse("t"), Command::Retry);
        assert_eq!(Command::parse("Q"), Command::Quit);
        assert_eq!(Command::parse("x"), Command::Unknown("x".to_string()));
    }

    #[test]
    fn test_render_wisdom_contains_every_section() {
        let record = sample_record("Metta");
        let text = render_wisdom(&record);
        for part in [
            "Metta",
            "Metta (original)",
            "Pali",
            "\"Loving-kindness\"",
            "Benevolent goodwill toward all beings",
            "Love that does not cling",
            "Wish a stranger well",
            "I am a source of loving-kindness",
        ] {
            assert!(text.contains(part), "missing {:?}", part);
        }
    }

    #[test]
    fn test_render_actions_follows_playback() {
        assert!(render_actions(PlaybackState::Idle).starts_with("[l] Listen to Teacher"));
        assert!(render_actions(PlaybackState::Stopped).starts_with("[l] Listen to Teacher"));
        assert!(render_actions(PlaybackState::Playing).starts_with("[l] Rest in Silence"));
        assert!(render_actions(PlaybackState::Loading).starts_with("Preparing Voice..."));
    }

    #[test]
    fn test_display_functions() {
        let cli = Cli { args: default_args() };
        let record = sample_record("Metta");
        cli.display_welcome("Mon Oct 19 2026");
        cli.display_wisdom(&record);
        cli.display_actions(PlaybackState::Idle);
        cli.display_reflection_prompt(&record);
        cli.display_echo("Be still.");
        cli.display_share("Dharma Daily: Metta");
        cli.display_notice("Silence is golden, but audio failed to load.");
        cli.display_load_error();
        let error = std::io::Error::new(std::io::ErrorKind::Other, "Test error");
        cli.display_error(&error);
    }

    #[test]
    fn test_breath_sequence() {
        let mut phases = vec![BreathPhase::Inhale];
        while let Some(next) = phases.last().and_then(|phase| phase.next()) {
            phases.push(next);
        }
        assert_eq!(
            phases,
            vec![BreathPhase::Inhale, BreathPhase::Hold, BreathPhase::Exhale, BreathPhase::Settle]
        );
        let counted: u64 = phases.iter().map(|phase| phase.seconds()).sum();
        assert_eq!(counted, 14);
    }

    #[test]
    fn test_phase_message() {
        assert_eq!(phase_message(BreathPhase::Inhale, 3), "INHALE  3  Breath in the light...");
        assert_eq!(phase_message(BreathPhase::Settle, 0), "SETTLE  Ready to receive.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_breathing_takes_sixteen_seconds() {
        let progress = ProgressBar::hidden();
        let start = tokio::time::Instant::now();

        guide_breathing(&progress).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(14) + SETTLE_DELAY);
        assert!(elapsed < Duration::from_millis(16_100));
        assert_eq!(progress.message(), "SETTLE  Ready to receive.");
    }
}
