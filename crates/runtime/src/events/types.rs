//! Event payloads published on each topic.

use serde::{Deserialize, Serialize};

use survival_core::{
    AbilityId, OwnerId, PlayerId, Profession, StatKind, UnlockReason, VitalsView,
};

/// Changes to a player's vital statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VitalsEvent {
    /// A tick drained one or more stats.
    Depleted {
        player: PlayerId,
        stats: Vec<StatKind>,
        view: VitalsView,
    },
    /// Consumption refilled a stat.
    Restored {
        player: PlayerId,
        stat: StatKind,
        value: f64,
    },
}

/// XP and ability changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressionEvent {
    LevelUp {
        player: PlayerId,
        profession: Profession,
        old_level: u32,
        new_level: u32,
    },
    AbilityUnlocked {
        player: PlayerId,
        ability: AbilityId,
        reason: UnlockReason,
    },
    AbilityRevoked {
        player: PlayerId,
        ability: AbilityId,
    },
    /// An administrative operation rewrote a profession track.
    AdminChanged {
        player: PlayerId,
        profession: Profession,
        level: u32,
        xp: u64,
    },
}

/// Session lifecycle and persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    Started { player: PlayerId, owner: OwnerId },
    /// The background load reconciled stored state into the live session.
    Loaded { player: PlayerId },
    /// A load arrived after the session it was started for had ended.
    LoadDiscarded { player: PlayerId, generation: u64 },
    Ended { player: PlayerId },
    Saved { players: usize, failed: usize },
}
