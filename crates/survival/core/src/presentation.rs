//! Boundary to the host's single-writer presentation contexts.
//!
//! The engine never mutates visible host state directly. Anything a player
//! can see (speed changes, stat displays, effect icons, unlock toasts) is
//! described as a [`VisibleEffect`] and handed to a [`PresentationSink`],
//! which queues it on the execution context that owns the player.

use crate::effects::EffectTransition;
use crate::progression::AbilityId;
use crate::types::{PlayerId, Profession};
use crate::vitals::VitalsView;

/// Host-visible mutation for one player.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VisibleEffect {
    /// Set the player's movement speed.
    Speed { speed: f64, multiplier: f64 },
    /// Refresh the vitals display.
    Vitals(VitalsView),
    /// A buff or debuff started or ended.
    Effect(EffectTransition),
    LevelUp { profession: Profession, level: u32 },
    AbilityUnlocked { ability: AbilityId, name: String },
}

/// Queues visible mutations on the context that owns a player.
pub trait PresentationSink: Send + Sync {
    fn schedule_on_owner(&self, player: PlayerId, effect: VisibleEffect);
}

/// Sink that drops every effect (headless simulation).
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl PresentationSink for DiscardSink {
    fn schedule_on_owner(&self, _player: PlayerId, _effect: VisibleEffect) {}
}
