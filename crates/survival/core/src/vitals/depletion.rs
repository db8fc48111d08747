//! Tick-driven stat depletion.
//!
//! Each stat depletes by one step once its adjusted interval has elapsed
//! since its last depletion:
//!
//! ```text
//! interval = base_interval / activity_multiplier / max(depletion_multiplier, floor)
//! ```
//!
//! `depletion_multiplier` is the product of the player's `debuff:*` and
//! `ability:*` entries in the depletion registry. Unlike speed, no
//! suppression applies.

use std::sync::{Arc, RwLock};

use tracing::trace;

use super::{PlayerVitals, VitalsSnapshot};
use crate::config::{ValidatedConfig, VitalsConfig};
use crate::modifiers::{ModifierRegistry, SourceCategory};
use crate::sync;
use crate::types::{Millis, PlayerId, StatKind};

const DEPLETION_CATEGORIES: [SourceCategory; 2] = [SourceCategory::Debuff, SourceCategory::Ability];

/// Stats depleted by one tick, with their new values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub depleted: Vec<(StatKind, f64)>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.depleted.is_empty()
    }

    pub fn contains(&self, stat: StatKind) -> bool {
        self.depleted.iter().any(|(depleted, _)| *depleted == stat)
    }
}

#[derive(Debug)]
pub struct DepletionEngine {
    config: RwLock<VitalsConfig>,
    modifiers: Arc<ModifierRegistry>,
}

impl DepletionEngine {
    pub fn new(config: &ValidatedConfig, modifiers: Arc<ModifierRegistry>) -> Self {
        Self {
            config: RwLock::new(config.vitals().clone()),
            modifiers,
        }
    }

    pub fn modifiers(&self) -> &Arc<ModifierRegistry> {
        &self.modifiers
    }

    pub fn new_state(&self, player: PlayerId, now: Millis) -> PlayerVitals {
        PlayerVitals::new(player, &sync::read(&self.config), now)
    }

    pub fn from_snapshot(
        &self,
        player: PlayerId,
        snapshot: &VitalsSnapshot,
        now: Millis,
    ) -> PlayerVitals {
        PlayerVitals::from_snapshot(player, snapshot, &sync::read(&self.config), now)
    }

    /// Product of the player's debuff and ability depletion entries.
    pub fn combined_depletion_multiplier(&self, player: PlayerId) -> f64 {
        self.modifiers.combined_in(player, &DEPLETION_CATEGORIES)
    }

    /// Interval after which `stat` depletes next, in milliseconds.
    pub fn adjusted_interval_ms(&self, vitals: &PlayerVitals, stat: StatKind) -> f64 {
        let config = sync::read(&self.config);
        self.interval_with(&config, vitals, stat, self.combined_depletion_multiplier(vitals.player()))
    }

    fn interval_with(
        &self,
        config: &VitalsConfig,
        vitals: &PlayerVitals,
        stat: StatKind,
        multiplier: f64,
    ) -> f64 {
        let base = *config.base_interval_ms.get(stat) as f64;
        let activity = config.activity.get(vitals.activity());
        base / activity / multiplier.max(config.min_depletion_multiplier)
    }

    /// Advances every stat of `vitals` to `now`.
    pub fn tick(&self, vitals: &mut PlayerVitals, now: Millis) -> TickReport {
        let config = sync::read(&self.config);
        let multiplier = self.combined_depletion_multiplier(vitals.player());
        let mut report = TickReport::default();

        for stat in StatKind::ALL {
            let interval = self.interval_with(&config, vitals, stat, multiplier);
            let elapsed = now.saturating_sub(vitals.stat(stat).last_depletion());
            if (elapsed as f64) < interval {
                continue;
            }
            let value = vitals.deplete(stat, config.depletion_amount, now);
            trace!(player = %vitals.player(), %stat, value, interval, "stat depleted");
            report.depleted.push((stat, value));
        }
        report
    }

    pub fn reconfigure(&self, config: &ValidatedConfig) {
        *sync::write(&self.config) = config.vitals().clone();
    }
}
