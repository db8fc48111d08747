//! Host-supplied inputs the engine treats as opaque.
//!
//! Runtime users plug in an [`ActivityClassifier`] so depletion can follow
//! what each player is doing, and a [`Clock`] so ticks can run against wall
//! time in production or a manual clock in tests and offline simulations.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use survival_core::{ActivityState, Millis, PlayerId};

/// Supplies the current activity of a player each tick.
pub trait ActivityClassifier: Send + Sync {
    fn classify(&self, player: PlayerId) -> ActivityState;
}

/// Classifier that reports the same activity for every player.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedActivity(pub ActivityState);

impl ActivityClassifier for FixedActivity {
    fn classify(&self, _player: PlayerId) -> ActivityState {
        self.0
    }
}

/// Classifier fed by the host: the last reported activity wins, unknown
/// players are idle.
#[derive(Debug, Default)]
pub struct ReportedActivity {
    activities: RwLock<HashMap<PlayerId, ActivityState>>,
}

impl ReportedActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, player: PlayerId, activity: ActivityState) {
        self.activities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(player, activity);
    }

    pub fn forget(&self, player: PlayerId) {
        self.activities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&player);
    }
}

impl ActivityClassifier for ReportedActivity {
    fn classify(&self, player: PlayerId) -> ActivityState {
        self.activities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&player)
            .copied()
            .unwrap_or_default()
    }
}

/// Source of the engine clock, in milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> Millis;
}

/// Wall clock (milliseconds since the Unix epoch).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Clock advanced explicitly by the caller.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self(AtomicU64::new(start))
    }

    pub fn advance(&self, by: Millis) -> Millis {
        self.0.fetch_add(by, Ordering::AcqRel) + by
    }

    pub fn set(&self, now: Millis) {
        self.0.store(now, Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_activity_defaults_to_idle() {
        let classifier = ReportedActivity::new();
        let player = PlayerId(1);
        assert_eq!(classifier.classify(player), ActivityState::Idle);

        classifier.report(player, ActivityState::Sprinting);
        assert_eq!(classifier.classify(player), ActivityState::Sprinting);

        classifier.forget(player);
        assert_eq!(classifier.classify(player), ActivityState::Idle);
    }

    #[test]
    fn manual_clock_only_moves_when_told() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        assert_eq!(clock.advance(500), 1_500);
        clock.set(10);
        assert_eq!(clock.now_ms(), 10);
    }
}
