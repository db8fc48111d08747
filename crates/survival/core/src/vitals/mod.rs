//! Per-player vital statistics and their depletion.
//!
//! [`PlayerVitals`] is the live simulation state of one player: three stat
//! values, each bounded by a capacity that abilities can raise permanently,
//! the last depletion timestamp per stat and the current activity. The
//! [`DepletionEngine`] advances it on every tick.

mod depletion;

use std::collections::BTreeMap;

use tracing::warn;

use crate::config::{PerStat, VitalsConfig};
use crate::modifiers::SourceId;
use crate::types::{ActivityState, Millis, PlayerId, StatKind};

pub use depletion::{DepletionEngine, TickReport};

/// One stat value with its capacity bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct StatValue {
    value: f64,
    base_max: f64,
    /// Capacity increases keyed by source, so re-applying is a no-op.
    capacity: BTreeMap<SourceId, f64>,
    last_depletion: Millis,
}

impl StatValue {
    fn new(base_max: f64, value: f64, now: Millis) -> Self {
        Self {
            value: value.clamp(0.0, base_max),
            base_max,
            capacity: BTreeMap::new(),
            last_depletion: now,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn max(&self) -> f64 {
        self.base_max + self.capacity.values().sum::<f64>()
    }

    /// Value as a percentage of the current max.
    pub fn percent(&self) -> f64 {
        let max = self.max();
        if max > 0.0 { self.value / max * 100.0 } else { 0.0 }
    }

    pub fn last_depletion(&self) -> Millis {
        self.last_depletion
    }

    fn clamp(&mut self) {
        self.value = self.value.clamp(0.0, self.max());
    }
}

/// Live simulation state of one player.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerVitals {
    player: PlayerId,
    stats: [StatValue; 3],
    activity: ActivityState,
}

impl PlayerVitals {
    /// Fresh state with the configured starting values.
    pub fn new(player: PlayerId, config: &VitalsConfig, now: Millis) -> Self {
        let stat = || StatValue::new(config.default_max, config.starting_value, now);
        Self {
            player,
            stats: [stat(), stat(), stat()],
            activity: ActivityState::default(),
        }
    }

    /// Rebuilds state from a snapshot, clamping anything out of bounds.
    pub fn from_snapshot(
        player: PlayerId,
        snapshot: &VitalsSnapshot,
        config: &VitalsConfig,
        now: Millis,
    ) -> Self {
        let mut vitals = Self::new(player, config, now);
        for stat in StatKind::ALL {
            let slot = vitals.stat_mut(stat);
            slot.capacity = snapshot
                .capacity
                .get(stat)
                .iter()
                .filter(|(_, delta)| delta.is_finite() && **delta > 0.0)
                .map(|(source, delta)| (source.clone(), *delta))
                .collect();
            vitals.set(stat, *snapshot.values.get(stat));
        }
        vitals
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn stat(&self, stat: StatKind) -> &StatValue {
        &self.stats[stat.index()]
    }

    fn stat_mut(&mut self, stat: StatKind) -> &mut StatValue {
        &mut self.stats[stat.index()]
    }

    pub fn value(&self, stat: StatKind) -> f64 {
        self.stat(stat).value()
    }

    pub fn max(&self, stat: StatKind) -> f64 {
        self.stat(stat).max()
    }

    pub fn percent(&self, stat: StatKind) -> f64 {
        self.stat(stat).percent()
    }

    pub fn activity(&self) -> ActivityState {
        self.activity
    }

    pub fn set_activity(&mut self, activity: ActivityState) {
        self.activity = activity;
    }

    /// Adds `amount` to `stat`, clamped at the current max. Applies
    /// immediately, independent of the tick cadence. Returns the new value.
    pub fn restore(&mut self, stat: StatKind, amount: f64) -> f64 {
        if !(amount.is_finite() && amount >= 0.0) {
            warn!(player = %self.player, %stat, amount, "ignoring invalid restore amount");
            return self.value(stat);
        }
        let slot = self.stat_mut(stat);
        slot.value = (slot.value + amount).min(slot.max());
        slot.value
    }

    /// Administrative set, clamped to `[0, max]`.
    pub fn set(&mut self, stat: StatKind, value: f64) -> f64 {
        let player = self.player;
        let slot = self.stat_mut(stat);
        if value.is_nan() {
            warn!(%player, %stat, "ignoring NaN stat value");
            return slot.value;
        }
        let max = slot.max();
        if !(0.0..=max).contains(&value) {
            warn!(%player, %stat, value, max, "clamping stat value out of bounds");
        }
        slot.value = value.clamp(0.0, max);
        slot.value
    }

    /// Permanently raises the capacity of `stat` by `delta` on behalf of
    /// `source`. Re-applying the same source is a no-op. Returns whether the
    /// capacity changed.
    pub fn raise_max(&mut self, stat: StatKind, source: SourceId, delta: f64) -> bool {
        if !(delta.is_finite() && delta > 0.0) {
            warn!(player = %self.player, %stat, %source, delta, "ignoring invalid capacity increase");
            return false;
        }
        let slot = self.stat_mut(stat);
        if slot.capacity.contains_key(&source) {
            return false;
        }
        slot.capacity.insert(source, delta);
        true
    }

    /// Removes a capacity increase (administrative ability revocation) and
    /// clamps the value to the lowered max.
    pub fn revoke_max(&mut self, stat: StatKind, source: &str) -> bool {
        let slot = self.stat_mut(stat);
        let removed = slot.capacity.remove(source).is_some();
        slot.clamp();
        removed
    }

    /// Capacity sources applied to `stat`.
    pub fn capacity_sources(&self, stat: StatKind) -> impl Iterator<Item = (&SourceId, f64)> {
        self.stat(stat)
            .capacity
            .iter()
            .map(|(source, delta)| (source, *delta))
    }

    pub(crate) fn deplete(&mut self, stat: StatKind, amount: f64, now: Millis) -> f64 {
        let slot = self.stat_mut(stat);
        slot.value = (slot.value - amount).max(0.0);
        slot.last_depletion = now;
        slot.value
    }

    pub fn view(&self) -> VitalsView {
        VitalsView {
            player: self.player,
            activity: self.activity,
            hunger: StatView::of(self.stat(StatKind::Hunger)),
            thirst: StatView::of(self.stat(StatKind::Thirst)),
            energy: StatView::of(self.stat(StatKind::Energy)),
        }
    }

    pub fn snapshot(&self) -> VitalsSnapshot {
        VitalsSnapshot {
            values: PerStat::new(
                self.value(StatKind::Hunger),
                self.value(StatKind::Thirst),
                self.value(StatKind::Energy),
            ),
            capacity: PerStat::new(
                self.stat(StatKind::Hunger).capacity.clone(),
                self.stat(StatKind::Thirst).capacity.clone(),
                self.stat(StatKind::Energy).capacity.clone(),
            ),
        }
    }
}

/// Display values of one stat.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatView {
    pub value: f64,
    pub max: f64,
    pub percent: f64,
}

impl StatView {
    fn of(stat: &StatValue) -> Self {
        Self {
            value: stat.value(),
            max: stat.max(),
            percent: stat.percent(),
        }
    }
}

/// Presentation snapshot of a player's vitals.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VitalsView {
    pub player: PlayerId,
    pub activity: ActivityState,
    pub hunger: StatView,
    pub thirst: StatView,
    pub energy: StatView,
}

impl VitalsView {
    pub fn get(&self, stat: StatKind) -> &StatView {
        match stat {
            StatKind::Hunger => &self.hunger,
            StatKind::Thirst => &self.thirst,
            StatKind::Energy => &self.energy,
        }
    }
}

/// Persisted vitals of one player.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VitalsSnapshot {
    pub values: PerStat<f64>,
    #[cfg_attr(feature = "serde", serde(default = "empty_capacity"))]
    pub capacity: PerStat<BTreeMap<SourceId, f64>>,
}

#[cfg(feature = "serde")]
fn empty_capacity() -> PerStat<BTreeMap<SourceId, f64>> {
    PerStat::new(BTreeMap::new(), BTreeMap::new(), BTreeMap::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: PlayerId = PlayerId(3);

    fn fresh() -> PlayerVitals {
        PlayerVitals::new(P, &VitalsConfig::default(), 0)
    }

    #[test]
    fn restore_clamps_at_current_max() {
        let mut vitals = fresh();
        vitals.set(StatKind::Hunger, 40.0);
        assert_eq!(vitals.restore(StatKind::Hunger, 25.0), 65.0);
        assert_eq!(vitals.restore(StatKind::Hunger, 1_000.0), 100.0);
        assert_eq!(vitals.restore(StatKind::Hunger, -3.0), 100.0);
    }

    #[test]
    fn raised_max_is_idempotent_per_source() {
        let mut vitals = fresh();
        let source = SourceId::capacity("iron_gut", StatKind::Hunger);
        assert!(vitals.raise_max(StatKind::Hunger, source.clone(), 10.0));
        assert!(!vitals.raise_max(StatKind::Hunger, source, 10.0));
        assert_eq!(vitals.max(StatKind::Hunger), 110.0);
        assert_eq!(vitals.restore(StatKind::Hunger, 50.0), 110.0);
        assert_eq!(vitals.max(StatKind::Thirst), 100.0);
    }

    #[test]
    fn revoking_capacity_clamps_value() {
        let mut vitals = fresh();
        vitals.raise_max(StatKind::Energy, SourceId::capacity("x", StatKind::Energy), 20.0);
        vitals.restore(StatKind::Energy, 20.0);
        assert_eq!(vitals.value(StatKind::Energy), 120.0);

        assert!(vitals.revoke_max(StatKind::Energy, "ability:x:energy"));
        assert_eq!(vitals.value(StatKind::Energy), 100.0);
    }

    #[test]
    fn set_clamps_and_ignores_nan() {
        let mut vitals = fresh();
        assert_eq!(vitals.set(StatKind::Thirst, -5.0), 0.0);
        assert_eq!(vitals.set(StatKind::Thirst, 250.0), 100.0);
        assert_eq!(vitals.set(StatKind::Thirst, f64::NAN), 100.0);
        assert_eq!(vitals.percent(StatKind::Thirst), 100.0);
    }

    #[test]
    fn snapshot_round_trip_keeps_capacity() {
        let mut vitals = fresh();
        vitals.raise_max(StatKind::Hunger, SourceId::capacity("a", StatKind::Hunger), 15.0);
        vitals.restore(StatKind::Hunger, 15.0);
        vitals.set(StatKind::Energy, 12.5);

        let restored =
            PlayerVitals::from_snapshot(P, &vitals.snapshot(), &VitalsConfig::default(), 500);
        assert_eq!(restored.value(StatKind::Hunger), 115.0);
        assert_eq!(restored.max(StatKind::Hunger), 115.0);
        assert_eq!(restored.value(StatKind::Energy), 12.5);
        assert_eq!(restored.stat(StatKind::Energy).last_depletion(), 500);
    }

    #[test]
    fn snapshot_values_beyond_max_are_clamped() {
        let snapshot = VitalsSnapshot {
            values: PerStat::new(500.0, -1.0, 50.0),
            capacity: PerStat::new(BTreeMap::new(), BTreeMap::new(), BTreeMap::new()),
        };
        let vitals = PlayerVitals::from_snapshot(P, &snapshot, &VitalsConfig::default(), 0);
        assert_eq!(vitals.value(StatKind::Hunger), 100.0);
        assert_eq!(vitals.value(StatKind::Thirst), 0.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn snapshot_serializes_as_json() {
        let mut vitals = fresh();
        vitals.raise_max(StatKind::Thirst, SourceId::capacity("b", StatKind::Thirst), 5.0);
        let json = serde_json::to_string(&vitals.snapshot()).unwrap();
        let back: VitalsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vitals.snapshot());
    }
}
