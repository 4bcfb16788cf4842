//! The breathing ritual shown before the teaching

use indicatif::ProgressBar;
use std::time::Duration;
use tracing::debug;

const LOG_TARGET: &str = "dharma_daily::ui::breath";

/// How long the guide lingers on `Settle` before finishing.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// One step of the breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
    Settle,
}

impl BreathPhase {
    /// Counted seconds spent in the phase. `Settle` has no count.
    pub fn seconds(self) -> u64 {
        match self {
            BreathPhase::Inhale => 4,
            BreathPhase::Hold => 4,
            BreathPhase::Exhale => 6,
            BreathPhase::Settle => 0,
        }
    }

    pub fn next(self) -> Option<BreathPhase> {
        match self {
            BreathPhase::Inhale => Some(BreathPhase::Hold),
            BreathPhase::Hold => Some(BreathPhase::Exhale),
            BreathPhase::Exhale => Some(BreathPhase::Settle),
            BreathPhase::Settle => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BreathPhase::Inhale => "INHALE",
            BreathPhase::Hold => "HOLD",
            BreathPhase::Exhale => "EXHALE",
            BreathPhase::Settle => "SETTLE",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            BreathPhase::Inhale => "Breath in the light...",
            BreathPhase::Hold => "Settle in the stillness...",
            BreathPhase::Exhale => "Release all tension...",
            BreathPhase::Settle => "Ready to receive.",
        }
    }
}

/// Text shown for a phase with `remaining` seconds left on its count.
pub fn phase_message(phase: BreathPhase, remaining: u64) -> String {
    if phase.seconds() == 0 {
        format!("{}  {}", phase.label(), phase.instruction())
    } else {
        format!("{}  {}  {}", phase.label(), remaining, phase.instruction())
    }
}

/// Walks one breathing cycle, counting down each phase once per second.
///
/// Returns after the `Settle` pause, 16 seconds after it was called.
pub async fn guide_breathing(progress: &ProgressBar) {
    let mut phase = Some(BreathPhase::Inhale);
    while let Some(current) = phase {
        debug!(target: LOG_TARGET, "Breath phase: {:?}", current);
        if current == BreathPhase::Settle {
            progress.set_message(phase_message(current, 0));
            tokio::time::sleep(SETTLE_DELAY).await;
        } else {
            for remaining in (1..=current.seconds()).rev() {
                progress.set_message(phase_message(current, remaining));
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
        phase = current.next();
    }
}
