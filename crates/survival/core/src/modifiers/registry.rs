//! Source-keyed multiplier sets with on-demand composition.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use tracing::{trace, warn};

use super::source::{SourceCategory, SourceId};
use crate::sync;
use crate::types::PlayerId;

/// Which effect a registry composes multipliers for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ModifierDomain {
    /// Stat depletion rate (higher multiplier = faster depletion).
    Depletion,
    /// Movement speed.
    Speed,
}

/// Multipliers registered for one subject, keyed by source id.
///
/// Re-registering a source overwrites its multiplier; entries never stack.
/// The combined value is recomputed on every query since sets hold a
/// handful of entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModifierSet {
    entries: BTreeMap<SourceId, f64>,
}

impl ModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts `source`. Returns the previous multiplier, if any.
    pub fn set(&mut self, source: SourceId, multiplier: f64) -> Option<f64> {
        self.entries.insert(source, multiplier)
    }

    pub fn remove(&mut self, source: &str) -> Option<f64> {
        self.entries.remove(source)
    }

    pub fn get(&self, source: &str) -> Option<f64> {
        self.entries.get(source).copied()
    }

    /// Product of the multipliers whose source matches `filter`.
    pub fn combined(&self, filter: impl Fn(&str) -> bool) -> f64 {
        self.entries
            .iter()
            .filter(|(source, _)| filter(source.as_str()))
            .map(|(_, multiplier)| *multiplier)
            .product()
    }

    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|source, _| keep(source.as_str()));
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceId, f64)> {
        self.entries.iter().map(|(source, multiplier)| (source, *multiplier))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-player modifier sets for one [`ModifierDomain`].
///
/// Safe to share across threads. Every mutation is a single upsert or removal
/// under the write lock, so two writers touching the same source id cannot
/// interleave a read-modify-write.
#[derive(Debug)]
pub struct ModifierRegistry {
    domain: ModifierDomain,
    subjects: RwLock<HashMap<PlayerId, ModifierSet>>,
}

impl ModifierRegistry {
    pub fn new(domain: ModifierDomain) -> Self {
        Self {
            domain,
            subjects: RwLock::new(HashMap::new()),
        }
    }

    pub fn domain(&self) -> ModifierDomain {
        self.domain
    }

    /// Registers or overwrites `source` for `subject`.
    ///
    /// Non-finite and non-positive multipliers are rejected and logged; they
    /// would zero out or invert every product they take part in. Returns
    /// whether the entry was stored.
    pub fn set_modifier(&self, subject: PlayerId, source: impl Into<SourceId>, multiplier: f64) -> bool {
        let source = source.into();
        if !(multiplier.is_finite() && multiplier > 0.0) {
            warn!(
                domain = %self.domain,
                player = %subject,
                source = %source,
                multiplier,
                "rejecting invalid modifier multiplier"
            );
            return false;
        }

        let previous = sync::write(&self.subjects)
            .entry(subject)
            .or_default()
            .set(source.clone(), multiplier);
        trace!(
            domain = %self.domain,
            player = %subject,
            source = %source,
            multiplier,
            ?previous,
            "modifier set"
        );
        true
    }

    /// Removes `source` for `subject`. No-op if absent. Returns whether an
    /// entry was removed.
    pub fn clear_modifier(&self, subject: PlayerId, source: &str) -> bool {
        let mut subjects = sync::write(&self.subjects);
        let Some(set) = subjects.get_mut(&subject) else {
            return false;
        };
        let removed = set.remove(source).is_some();
        if set.is_empty() {
            subjects.remove(&subject);
        }
        removed
    }

    /// Product of every entry of `subject` matching `filter`. Absent subjects
    /// and empty selections yield the identity `1.0`.
    pub fn combined(&self, subject: PlayerId, filter: impl Fn(&str) -> bool) -> f64 {
        sync::read(&self.subjects)
            .get(&subject)
            .map_or(1.0, |set| set.combined(filter))
    }

    /// Product of the entries belonging to any of `categories`.
    pub fn combined_in(&self, subject: PlayerId, categories: &[SourceCategory]) -> f64 {
        self.combined(subject, SourceCategory::any_of(categories))
    }

    /// Product of all entries of `subject`.
    pub fn combined_all(&self, subject: PlayerId) -> f64 {
        self.combined(subject, |_| true)
    }

    pub fn multiplier(&self, subject: PlayerId, source: &str) -> Option<f64> {
        sync::read(&self.subjects)
            .get(&subject)
            .and_then(|set| set.get(source))
    }

    /// Snapshot of the entries registered for `subject`.
    pub fn entries(&self, subject: PlayerId) -> Vec<(SourceId, f64)> {
        sync::read(&self.subjects)
            .get(&subject)
            .map(|set| {
                set.iter()
                    .map(|(source, multiplier)| (source.clone(), multiplier))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Removes every entry of `category` for `subject`. Returns the count.
    pub fn clear_category(&self, subject: PlayerId, category: SourceCategory) -> usize {
        let mut subjects = sync::write(&self.subjects);
        let Some(set) = subjects.get_mut(&subject) else {
            return 0;
        };
        let removed = set.retain(|source| !category.matches(source));
        if set.is_empty() {
            subjects.remove(&subject);
        }
        removed
    }

    /// Drops all entries of `subject` (player disconnect).
    pub fn clear_subject(&self, subject: PlayerId) -> usize {
        sync::write(&self.subjects)
            .remove(&subject)
            .map_or(0, |set| set.len())
    }

    pub fn subject_count(&self) -> usize {
        sync::read(&self.subjects).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: PlayerId = PlayerId(1);

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn composition_is_order_independent() {
        let forward = ModifierRegistry::new(ModifierDomain::Depletion);
        forward.set_modifier(P, "a", 0.8);
        forward.set_modifier(P, "b", 0.9);

        let reverse = ModifierRegistry::new(ModifierDomain::Depletion);
        reverse.set_modifier(P, "b", 0.9);
        reverse.set_modifier(P, "a", 0.8);

        assert!(approx(forward.combined_all(P), 0.72));
        assert!(approx(reverse.combined_all(P), 0.72));
    }

    #[test]
    fn reregistering_overwrites_instead_of_stacking() {
        let registry = ModifierRegistry::new(ModifierDomain::Speed);
        registry.set_modifier(P, "debuff:thirst", 0.6);
        registry.set_modifier(P, "debuff:thirst", 0.6);
        assert!(approx(registry.combined_all(P), 0.6));

        registry.set_modifier(P, "debuff:thirst", 0.5);
        assert!(approx(registry.combined_all(P), 0.5));
        assert_eq!(registry.entries(P).len(), 1);
    }

    #[test]
    fn absent_subject_and_cleared_source_yield_identity() {
        let registry = ModifierRegistry::new(ModifierDomain::Speed);
        assert!(approx(registry.combined_all(PlayerId(42)), 1.0));

        registry.set_modifier(P, "debuff:hunger", 0.7);
        assert!(registry.clear_modifier(P, "debuff:hunger"));
        assert!(!registry.clear_modifier(P, "debuff:hunger"));
        assert!(approx(registry.combined_all(P), 1.0));
        assert_eq!(registry.subject_count(), 0);
    }

    #[test]
    fn category_queries_are_independent() {
        let registry = ModifierRegistry::new(ModifierDomain::Speed);
        registry.set_modifier(P, SourceId::debuff("thirst"), 0.6);
        registry.set_modifier(P, SourceId::permanent_buff("fleet_foot"), 1.1);
        registry.set_modifier(P, SourceId::temporary_buff("well_fed"), 1.2);

        assert!(approx(
            registry.combined_in(P, &[SourceCategory::Debuff]),
            0.6
        ));
        assert!(approx(
            registry.combined_in(P, &[SourceCategory::Debuff, SourceCategory::PermanentBuff]),
            0.66
        ));
        assert!(approx(
            registry.combined_in(P, &[SourceCategory::TemporaryBuff]),
            1.2
        ));
    }

    #[test]
    fn invalid_multipliers_are_rejected() {
        let registry = ModifierRegistry::new(ModifierDomain::Depletion);
        assert!(!registry.set_modifier(P, "ability:x", 0.0));
        assert!(!registry.set_modifier(P, "ability:x", -1.0));
        assert!(!registry.set_modifier(P, "ability:x", f64::NAN));
        assert!(registry.entries(P).is_empty());
    }

    #[test]
    fn clear_category_keeps_other_entries() {
        let registry = ModifierRegistry::new(ModifierDomain::Speed);
        registry.set_modifier(P, SourceId::temporary_buff("well_fed"), 1.1);
        registry.set_modifier(P, SourceId::temporary_buff("rested"), 1.05);
        registry.set_modifier(P, SourceId::debuff("hunger"), 0.8);

        assert_eq!(registry.clear_category(P, SourceCategory::TemporaryBuff), 2);
        assert!(approx(registry.combined_all(P), 0.8));
        assert_eq!(registry.clear_subject(P), 1);
    }

    #[test]
    fn concurrent_writers_on_distinct_sources_all_land() {
        let registry = ModifierRegistry::new(ModifierDomain::Depletion);
        std::thread::scope(|scope| {
            for i in 0..8 {
                let registry = &registry;
                scope.spawn(move || {
                    registry.set_modifier(P, format!("ability:{i}"), 0.9);
                });
            }
        });
        assert_eq!(registry.entries(P).len(), 8);
        assert!(approx(registry.combined_all(P), 0.9f64.powi(8)));
    }
}
