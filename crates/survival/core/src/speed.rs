//! Movement speed composition.
//!
//! ```text
//! m = debuffs
//! m *= permanent buffs      (unless a permanent floor is set and m < floor)
//! m *= temporary buffs      (only if m >= temporary floor)
//! ```
//!
//! The resulting multiplier scales the player's baseline speed, captured once
//! on the first modification and never overwritten. New speeds are pushed to
//! the presentation sink only when they move by more than the dead band.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, trace};

use crate::config::{SpeedPolicy, ValidatedConfig};
use crate::modifiers::{ModifierRegistry, SourceCategory};
use crate::presentation::{PresentationSink, VisibleEffect};
use crate::sync;
use crate::types::PlayerId;

#[derive(Clone, Copy, Debug, PartialEq)]
struct AppliedSpeed {
    baseline: f64,
    last_applied: f64,
}

#[derive(Debug)]
pub struct SpeedComposer {
    modifiers: Arc<ModifierRegistry>,
    policy: RwLock<SpeedPolicy>,
    applied: Mutex<HashMap<PlayerId, AppliedSpeed>>,
}

impl SpeedComposer {
    pub fn new(config: &ValidatedConfig, modifiers: Arc<ModifierRegistry>) -> Self {
        Self {
            modifiers,
            policy: RwLock::new(*config.speed()),
            applied: Mutex::new(HashMap::new()),
        }
    }

    pub fn modifiers(&self) -> &Arc<ModifierRegistry> {
        &self.modifiers
    }

    pub fn combined_multiplier(&self, player: PlayerId) -> f64 {
        let policy = *sync::read(&self.policy);
        let debuffs = self.modifiers.combined_in(player, &[SourceCategory::Debuff]);

        let mut multiplier = debuffs;
        if policy.permanent_buff_floor.is_none_or(|floor| debuffs >= floor) {
            multiplier *= self
                .modifiers
                .combined_in(player, &[SourceCategory::PermanentBuff]);
        }
        if multiplier >= policy.temporary_buff_floor {
            multiplier *= self
                .modifiers
                .combined_in(player, &[SourceCategory::TemporaryBuff]);
        }
        multiplier
    }

    /// Pushes `baseline × combined` to `sink` when it left the dead band.
    ///
    /// `current_speed` is the host's present speed; it becomes the baseline
    /// on the first modification and is ignored afterwards. Returns the
    /// pushed speed, if any.
    pub fn apply_speed(
        &self,
        player: PlayerId,
        current_speed: f64,
        sink: &dyn PresentationSink,
    ) -> Option<f64> {
        let dead_band = sync::read(&self.policy).dead_band;
        let multiplier = self.combined_multiplier(player);

        let mut applied = sync::lock(&self.applied);
        let state = match applied.entry(player) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(_) if (multiplier - 1.0).abs() <= dead_band => return None,
            Entry::Vacant(entry) => {
                debug!(%player, baseline = current_speed, "captured baseline speed");
                entry.insert(AppliedSpeed {
                    baseline: current_speed,
                    last_applied: current_speed,
                })
            }
        };

        let target = state.baseline * multiplier;
        if (target - state.last_applied).abs() <= dead_band * state.last_applied.abs() {
            trace!(%player, target, last = state.last_applied, "speed change within dead band");
            return None;
        }
        state.last_applied = target;
        drop(applied);

        sink.schedule_on_owner(
            player,
            VisibleEffect::Speed {
                speed: target,
                multiplier,
            },
        );
        Some(target)
    }

    pub fn baseline(&self, player: PlayerId) -> Option<f64> {
        sync::lock(&self.applied).get(&player).map(|state| state.baseline)
    }

    pub fn last_applied(&self, player: PlayerId) -> Option<f64> {
        sync::lock(&self.applied)
            .get(&player)
            .map(|state| state.last_applied)
    }

    /// Session end: clears every speed modifier of `player` and, if its speed
    /// was ever modified, pushes the captured baseline back. Returns it.
    pub fn restore_original_speed(
        &self,
        player: PlayerId,
        sink: &dyn PresentationSink,
    ) -> Option<f64> {
        self.modifiers.clear_subject(player);
        let state = sync::lock(&self.applied).remove(&player)?;
        if state.last_applied != state.baseline {
            sink.schedule_on_owner(
                player,
                VisibleEffect::Speed {
                    speed: state.baseline,
                    multiplier: 1.0,
                },
            );
        }
        debug!(%player, baseline = state.baseline, "restored original speed");
        Some(state.baseline)
    }

    pub fn reconfigure(&self, config: &ValidatedConfig) {
        *sync::write(&self.policy) = *config.speed();
    }
}
