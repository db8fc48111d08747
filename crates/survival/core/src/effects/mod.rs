//! Stat-driven buffs and debuffs.

mod coordinator;

pub use coordinator::EffectCoordinator;

use crate::hysteresis::{Polarity, Transition};
use crate::modifiers::SourceId;
use crate::types::{PlayerId, StatKind};

/// Every buff and debuff, each bound to one stat.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum EffectKind {
    Starving,
    Dehydrated,
    Exhausted,
    WellFed,
    Hydrated,
    Rested,
}

impl EffectKind {
    pub const DEBUFFS: [EffectKind; 3] = [
        EffectKind::Starving,
        EffectKind::Dehydrated,
        EffectKind::Exhausted,
    ];

    pub const BUFFS: [EffectKind; 3] = [EffectKind::WellFed, EffectKind::Hydrated, EffectKind::Rested];

    pub const fn debuff_for(stat: StatKind) -> Self {
        match stat {
            StatKind::Hunger => EffectKind::Starving,
            StatKind::Thirst => EffectKind::Dehydrated,
            StatKind::Energy => EffectKind::Exhausted,
        }
    }

    pub const fn buff_for(stat: StatKind) -> Self {
        match stat {
            StatKind::Hunger => EffectKind::WellFed,
            StatKind::Thirst => EffectKind::Hydrated,
            StatKind::Energy => EffectKind::Rested,
        }
    }

    pub const fn stat(self) -> StatKind {
        match self {
            EffectKind::Starving | EffectKind::WellFed => StatKind::Hunger,
            EffectKind::Dehydrated | EffectKind::Hydrated => StatKind::Thirst,
            EffectKind::Exhausted | EffectKind::Rested => StatKind::Energy,
        }
    }

    pub const fn is_debuff(self) -> bool {
        matches!(
            self,
            EffectKind::Starving | EffectKind::Dehydrated | EffectKind::Exhausted
        )
    }

    pub const fn polarity(self) -> Polarity {
        if self.is_debuff() {
            Polarity::ActivatesWhenLow
        } else {
            Polarity::ActivatesWhenHigh
        }
    }

    /// Modifier source: `debuff:<stat>` or `buff:temporary:<effect>`.
    pub fn source_id(self) -> SourceId {
        if self.is_debuff() {
            SourceId::debuff(self.stat())
        } else {
            SourceId::temporary_buff(self)
        }
    }
}

/// An effect starting or ending for a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectTransition {
    pub player: PlayerId,
    pub effect: EffectKind,
    pub change: Transition,
    /// Buff ended because a debuff became active, not because its stat fell.
    pub suppressed: bool,
}
