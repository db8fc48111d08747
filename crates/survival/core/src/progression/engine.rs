//! Concurrent XP accounting and level-up dispatch.
//!
//! Every (player, profession) pair owns an atomic cumulative XP counter and
//! an atomic "last processed level" marker. Awards add to the counter with a
//! single atomic update, then race to advance the marker with
//! compare-and-swap. Only the award that moves the marker fires the unlocks
//! for the levels it moved across, so concurrent awards crossing the same
//! threshold dispatch each unlock exactly once.
//!
//! Administrative operations (`set_level`, `reset_profession`) rewrite both
//! atomics and take the player's gate exclusively; awards hold it shared, so
//! a reset can never interleave with an award in flight.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, trace, warn};

use super::ability::{Ability, AbilityCatalog, AbilityId, unlock_level};
use super::curve::XpCurve;
use crate::config::ValidatedConfig;
use crate::sync;
use crate::types::{PlayerId, Profession};

/// Why an ability is being handed to the unlock sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum UnlockReason {
    /// An XP award crossed the tier level.
    LevelUp,
    /// An administrative level change granted it.
    Admin,
    /// Re-applied while restoring a snapshot.
    Restored,
}

/// Receives ability unlocks and revocations.
///
/// Implementations must be idempotent per (player, ability): restore and
/// reconfiguration paths re-send abilities the player already owns.
pub trait AbilityUnlockSink: Send + Sync {
    fn on_unlock(&self, player: PlayerId, ability: &Ability, reason: UnlockReason);

    /// Called when an administrative reset removes an owned ability.
    fn on_revoke(&self, _player: PlayerId, _ability: &Ability) {}
}

/// Sink that ignores every unlock.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUnlockSink;

impl AbilityUnlockSink for NoopUnlockSink {
    fn on_unlock(&self, _player: PlayerId, _ability: &Ability, _reason: UnlockReason) {}
}

/// Result of one XP award.
#[derive(Clone, Debug, PartialEq)]
pub struct AwardOutcome {
    pub player: PlayerId,
    pub profession: Profession,
    /// XP actually added after the multiplier and the max-level cap.
    pub granted: u64,
    pub old_level: u32,
    pub new_level: u32,
    /// Whether this award advanced the processed-level marker.
    pub won_level_up: bool,
    /// Abilities this award unlocked (empty unless `won_level_up`).
    pub unlocked: Vec<AbilityId>,
    /// The counter was already at max level; nothing was added.
    pub rejected_at_max: bool,
}

impl AwardOutcome {
    fn rejected(player: PlayerId, profession: Profession, level: u32) -> Self {
        Self {
            player,
            profession,
            granted: 0,
            old_level: level,
            new_level: level,
            won_level_up: false,
            unlocked: Vec::new(),
            rejected_at_max: true,
        }
    }

    pub fn leveled_up(&self) -> bool {
        self.new_level > self.old_level
    }
}

/// Read model of one profession track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProfessionProgress {
    pub profession: Profession,
    pub level: u32,
    pub xp: u64,
    pub xp_into_level: u64,
    /// `None` at max level.
    pub xp_to_next_level: Option<u64>,
}

/// Persisted progression of one player.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ProgressionSnapshot {
    pub xp: BTreeMap<Profession, u64>,
    pub unlocked: BTreeSet<AbilityId>,
}

#[derive(Debug, Default)]
struct ProfessionTrack {
    xp: AtomicU64,
    processed_level: AtomicU32,
}

#[derive(Debug)]
struct PlayerProgress {
    tracks: [ProfessionTrack; Profession::COUNT],
    unlocked: RwLock<BTreeSet<AbilityId>>,
    /// Shared by awards, exclusive for administrative rewrites.
    gate: RwLock<()>,
}

impl PlayerProgress {
    fn new() -> Self {
        let progress = Self {
            tracks: Default::default(),
            unlocked: RwLock::new(BTreeSet::new()),
            gate: RwLock::new(()),
        };
        for track in &progress.tracks {
            track.processed_level.store(1, Ordering::Relaxed);
        }
        progress
    }

    fn track(&self, profession: Profession) -> &ProfessionTrack {
        &self.tracks[profession.index()]
    }
}

/// Curve and tier milestones swapped as a unit on reload.
#[derive(Debug)]
struct Rules {
    curve: XpCurve,
    tier_levels: Vec<u32>,
}

impl Rules {
    fn from_config(config: &ValidatedConfig) -> Self {
        Self {
            curve: config.curve().clone(),
            tier_levels: config.progression().tier_levels.clone(),
        }
    }
}

/// Per-player profession tracks plus unlock dispatch.
pub struct ProgressionEngine {
    rules: RwLock<Arc<Rules>>,
    catalog: Arc<AbilityCatalog>,
    players: RwLock<HashMap<PlayerId, Arc<PlayerProgress>>>,
    sink: Arc<dyn AbilityUnlockSink>,
}

impl std::fmt::Debug for ProgressionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressionEngine")
            .field("abilities", &self.catalog.len())
            .field("players", &sync::read(&self.players).len())
            .finish_non_exhaustive()
    }
}

impl ProgressionEngine {
    pub fn new(
        config: &ValidatedConfig,
        catalog: Arc<AbilityCatalog>,
        sink: Arc<dyn AbilityUnlockSink>,
    ) -> Self {
        Self {
            rules: RwLock::new(Arc::new(Rules::from_config(config))),
            catalog,
            players: RwLock::new(HashMap::new()),
            sink,
        }
    }

    pub fn catalog(&self) -> &AbilityCatalog {
        &self.catalog
    }

    pub fn curve(&self) -> XpCurve {
        self.rules().curve.clone()
    }

    fn rules(&self) -> Arc<Rules> {
        Arc::clone(&sync::read(&self.rules))
    }

    fn player(&self, player: PlayerId) -> Arc<PlayerProgress> {
        if let Some(progress) = sync::read(&self.players).get(&player) {
            return Arc::clone(progress);
        }
        Arc::clone(
            sync::write(&self.players)
                .entry(player)
                .or_insert_with(|| Arc::new(PlayerProgress::new())),
        )
    }

    /// Awards gameplay XP, scaled by the profession multipliers the player
    /// owns. Negative or non-finite amounts are ignored.
    pub fn award_xp(&self, player: PlayerId, profession: Profession, amount: f64) -> AwardOutcome {
        self.award(player, profession, amount, true)
    }

    /// Administrative XP grant: unscaled, same race discipline as awards.
    pub fn add_xp(&self, player: PlayerId, profession: Profession, amount: u64) -> AwardOutcome {
        self.award(player, profession, amount as f64, false)
    }

    fn award(
        &self,
        player: PlayerId,
        profession: Profession,
        amount: f64,
        scaled: bool,
    ) -> AwardOutcome {
        let rules = self.rules();
        let curve = &rules.curve;
        let progress = self.player(player);
        let _gate = sync::read(&progress.gate);
        let track = progress.track(profession);

        let max_xp = curve.max_xp();
        let current = track.xp.load(Ordering::Acquire);
        if current >= max_xp {
            trace!(%player, %profession, "xp award ignored at max level");
            return AwardOutcome::rejected(player, profession, curve.max_level());
        }

        if !(amount.is_finite() && amount >= 0.0) {
            warn!(%player, %profession, amount, "rejecting invalid xp amount");
            let level = curve.level_of(current);
            return AwardOutcome {
                rejected_at_max: false,
                ..AwardOutcome::rejected(player, profession, level)
            };
        }

        let multiplier = if scaled {
            self.catalog
                .xp_multiplier(profession, &sync::read(&progress.unlocked))
        } else {
            1.0
        };
        let adjusted = (amount * multiplier).round() as u64;

        let Ok(old_xp) = track
            .xp
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |xp| {
                (xp < max_xp).then(|| xp.saturating_add(adjusted).min(max_xp))
            })
        else {
            return AwardOutcome::rejected(player, profession, curve.max_level());
        };
        let new_xp = old_xp.saturating_add(adjusted).min(max_xp);
        let old_level = curve.level_of(old_xp);
        let new_level = curve.level_of(new_xp);

        let mut outcome = AwardOutcome {
            player,
            profession,
            granted: new_xp - old_xp,
            old_level,
            new_level,
            won_level_up: false,
            unlocked: Vec::new(),
            rejected_at_max: false,
        };
        if new_level <= old_level {
            return outcome;
        }

        match advance_processed(track, new_level) {
            Some(from) => {
                debug!(%player, %profession, from, to = new_level, "level up");
                outcome.won_level_up = true;
                outcome.unlocked = self.dispatch_unlocks(
                    player,
                    &progress,
                    profession,
                    from,
                    new_level,
                    &rules.tier_levels,
                    UnlockReason::LevelUp,
                );
            }
            None => {
                trace!(%player, %profession, new_level, "level-up already processed by a concurrent award");
            }
        }
        outcome
    }

    /// Sets the profession to the start of `level` (clamped to the curve).
    /// Abilities above the new level are revoked, abilities up to it are
    /// granted.
    pub fn set_level(&self, player: PlayerId, profession: Profession, level: u32) -> ProfessionProgress {
        let rules = self.rules();
        let level = level.clamp(1, rules.curve.max_level());
        let progress = self.player(player);
        {
            let _gate = sync::write(&progress.gate);
            let track = progress.track(profession);
            let previous = track.processed_level.load(Ordering::Acquire);
            track
                .xp
                .store(rules.curve.xp_for_level(level), Ordering::Release);
            track.processed_level.store(level, Ordering::Release);

            self.revoke_above(player, &progress, profession, level, &rules.tier_levels);
            if level > previous {
                self.dispatch_unlocks(
                    player,
                    &progress,
                    profession,
                    previous,
                    level,
                    &rules.tier_levels,
                    UnlockReason::Admin,
                );
            }
            info!(%player, %profession, previous, level, "profession level set");
        }
        self.progress(player, profession)
    }

    /// Returns the profession to level 1 with zero XP and revokes its
    /// abilities.
    pub fn reset_profession(&self, player: PlayerId, profession: Profession) {
        let rules = self.rules();
        let progress = self.player(player);
        let _gate = sync::write(&progress.gate);
        let track = progress.track(profession);
        track.xp.store(0, Ordering::Release);
        track.processed_level.store(1, Ordering::Release);
        self.revoke_above(player, &progress, profession, 1, &rules.tier_levels);
        info!(%player, %profession, "profession reset");
    }

    pub fn progress(&self, player: PlayerId, profession: Profession) -> ProfessionProgress {
        let curve = self.rules().curve.clone();
        let xp = sync::read(&self.players)
            .get(&player)
            .map_or(0, |progress| progress.track(profession).xp.load(Ordering::Acquire));
        ProfessionProgress {
            profession,
            level: curve.level_of(xp),
            xp,
            xp_into_level: curve.xp_into_level(xp),
            xp_to_next_level: curve.xp_to_next_level(xp),
        }
    }

    pub fn level(&self, player: PlayerId, profession: Profession) -> u32 {
        self.progress(player, profession).level
    }

    pub fn unlocked(&self, player: PlayerId) -> BTreeSet<AbilityId> {
        sync::read(&self.players)
            .get(&player)
            .map(|progress| sync::read(&progress.unlocked).clone())
            .unwrap_or_default()
    }

    pub fn snapshot(&self, player: PlayerId) -> ProgressionSnapshot {
        let Some(progress) = sync::read(&self.players).get(&player).cloned() else {
            return ProgressionSnapshot::default();
        };
        let _gate = sync::read(&progress.gate);
        ProgressionSnapshot {
            xp: Profession::ALL
                .into_iter()
                .map(|profession| {
                    let xp = progress.track(profession).xp.load(Ordering::Acquire);
                    (profession, xp)
                })
                .filter(|(_, xp)| *xp > 0)
                .collect(),
            unlocked: sync::read(&progress.unlocked).clone(),
        }
    }

    /// Replaces the player's progression with `snapshot`.
    ///
    /// Processed levels are derived from XP so no level-up fires for levels
    /// already reached; owned abilities are re-sent to the sink, which
    /// applies them idempotently. Abilities the snapshot lacks but whose
    /// tier the stored XP has reached are granted as well. Abilities held
    /// before the restore that the snapshot does not grant are revoked.
    pub fn restore(&self, player: PlayerId, snapshot: &ProgressionSnapshot) {
        let rules = self.rules();
        let progress = self.player(player);
        let _gate = sync::write(&progress.gate);

        let mut owned: BTreeSet<AbilityId> = snapshot
            .unlocked
            .iter()
            .filter(|id| {
                let known = self.catalog.get(id).is_some();
                if !known {
                    warn!(%player, ability = %id, "dropping unknown ability from snapshot");
                }
                known
            })
            .cloned()
            .collect();

        for profession in Profession::ALL {
            let xp = snapshot
                .xp
                .get(&profession)
                .copied()
                .unwrap_or(0)
                .min(rules.curve.max_xp());
            let level = rules.curve.level_of(xp);
            let track = progress.track(profession);
            track.xp.store(xp, Ordering::Release);
            track.processed_level.store(level, Ordering::Release);
            owned.extend(
                self.catalog
                    .unlocked_between(profession, 0, level, &rules.tier_levels)
                    .map(|ability| ability.id.clone()),
            );
        }

        let previous = std::mem::replace(&mut *sync::write(&progress.unlocked), owned.clone());
        for id in previous.difference(&owned) {
            if let Some(ability) = self.catalog.get(id) {
                info!(%player, ability = %id, "ability revoked by restored snapshot");
                self.sink.on_revoke(player, ability);
            }
        }
        for id in &owned {
            if let Some(ability) = self.catalog.get(id) {
                self.sink.on_unlock(player, ability, UnlockReason::Restored);
            }
        }
        debug!(%player, abilities = owned.len(), "progression restored");
    }

    /// Drops the player's in-memory progression (session end).
    pub fn remove_player(&self, player: PlayerId) -> bool {
        sync::write(&self.players).remove(&player).is_some()
    }

    pub fn player_count(&self) -> usize {
        sync::read(&self.players).len()
    }

    /// Swaps in the curve and tier levels of `config`.
    ///
    /// Stored XP is kept; processed levels are re-derived from it and any
    /// tier now reached is unlocked.
    pub fn reconfigure(&self, config: &ValidatedConfig) {
        let rules = Arc::new(Rules::from_config(config));
        *sync::write(&self.rules) = Arc::clone(&rules);

        let players: Vec<_> = sync::read(&self.players)
            .iter()
            .map(|(id, progress)| (*id, Arc::clone(progress)))
            .collect();
        for (player, progress) in players {
            let _gate = sync::write(&progress.gate);
            for profession in Profession::ALL {
                let track = progress.track(profession);
                let xp = track.xp.load(Ordering::Acquire).min(rules.curve.max_xp());
                track.xp.store(xp, Ordering::Release);
                let level = rules.curve.level_of(xp);
                track.processed_level.store(level, Ordering::Release);
                self.dispatch_unlocks(
                    player,
                    &progress,
                    profession,
                    0,
                    level,
                    &rules.tier_levels,
                    UnlockReason::LevelUp,
                );
            }
        }
        info!(
            max_level = rules.curve.max_level(),
            tiers = ?rules.tier_levels,
            "progression rules reloaded"
        );
    }

    /// Records and dispatches abilities of `profession` with unlock level in
    /// `(from, to]` that the player does not own yet.
    #[allow(clippy::too_many_arguments)]
    fn dispatch_unlocks(
        &self,
        player: PlayerId,
        progress: &PlayerProgress,
        profession: Profession,
        from: u32,
        to: u32,
        tier_levels: &[u32],
        reason: UnlockReason,
    ) -> Vec<AbilityId> {
        let fresh: Vec<&Ability> = {
            let mut owned = sync::write(&progress.unlocked);
            self.catalog
                .unlocked_between(profession, from, to, tier_levels)
                .filter(|ability| owned.insert(ability.id.clone()))
                .collect()
        };
        for ability in &fresh {
            info!(%player, %profession, ability = %ability.id, tier = ability.tier, ?reason, "ability unlocked");
            self.sink.on_unlock(player, ability, reason);
        }
        fresh.into_iter().map(|ability| ability.id.clone()).collect()
    }

    fn revoke_above(
        &self,
        player: PlayerId,
        progress: &PlayerProgress,
        profession: Profession,
        level: u32,
        tier_levels: &[u32],
    ) {
        let revoked: Vec<&Ability> = {
            let mut owned = sync::write(&progress.unlocked);
            self.catalog
                .for_profession(profession)
                .filter(|ability| {
                    unlock_level(ability.tier, tier_levels).is_none_or(|unlock| unlock > level)
                })
                .filter(|ability| owned.remove(&ability.id))
                .collect()
        };
        for ability in revoked {
            info!(%player, %profession, ability = %ability.id, "ability revoked");
            self.sink.on_revoke(player, ability);
        }
    }
}

/// Moves the processed-level marker up to `target`. Returns the level it was
/// moved from when this caller performed the move, `None` when another award
/// already processed `target`.
fn advance_processed(track: &ProfessionTrack, target: u32) -> Option<u32> {
    let mut current = track.processed_level.load(Ordering::Acquire);
    while current < target {
        match track.processed_level.compare_exchange_weak(
            current,
            target,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => return Some(current),
            Err(actual) => current = actual,
        }
    }
    None
}
