//! Profession XP tracks, the cumulative XP table and ability unlocks.

mod ability;
mod curve;
mod engine;

pub use ability::{Ability, AbilityCatalog, AbilityEffect, AbilityId, unlock_level};
pub use curve::{MAX_LEVEL_LIMIT, XpCurve};
pub use engine::{
    AbilityUnlockSink, AwardOutcome, NoopUnlockSink, ProfessionProgress, ProgressionEngine,
    ProgressionSnapshot, UnlockReason,
};
