//! Drives buff and debuff hysteresis from stat percentages.
//!
//! Evaluation order per player and tick:
//!
//! 1. Debuff controllers are fed first; transitions register or clear their
//!    `debuff:<stat>` entries.
//! 2. If any debuff is active, every buff is force-exited and all
//!    `buff:temporary:*` speed entries are removed. Buff controllers are not
//!    consulted at all, so no buff can be entered while a debuff holds.
//! 3. Otherwise buff controllers are fed and register or clear their
//!    `buff:temporary:<effect>` entries.

use std::sync::{Arc, RwLock};

use tracing::debug;

use super::{EffectKind, EffectTransition};
use crate::config::{EffectSpec, EffectsConfig, PerStat, ValidatedConfig};
use crate::hysteresis::{HysteresisController, Transition};
use crate::modifiers::{ModifierRegistry, SourceCategory};
use crate::sync;
use crate::types::{PlayerId, StatKind};
use crate::vitals::PlayerVitals;

#[derive(Debug)]
pub struct EffectCoordinator {
    debuffs: PerStat<HysteresisController>,
    buffs: PerStat<HysteresisController>,
    specs: RwLock<EffectsConfig>,
    depletion: Arc<ModifierRegistry>,
    speed: Arc<ModifierRegistry>,
}

impl EffectCoordinator {
    pub fn new(
        config: &ValidatedConfig,
        depletion: Arc<ModifierRegistry>,
        speed: Arc<ModifierRegistry>,
    ) -> Self {
        let controller = |kind: EffectKind| {
            let band = if kind.is_debuff() {
                config.debuff_band(kind.stat())
            } else {
                config.buff_band(kind.stat())
            };
            HysteresisController::new(kind.to_string(), band)
        };
        Self {
            debuffs: PerStat::new(
                controller(EffectKind::Starving),
                controller(EffectKind::Dehydrated),
                controller(EffectKind::Exhausted),
            ),
            buffs: PerStat::new(
                controller(EffectKind::WellFed),
                controller(EffectKind::Hydrated),
                controller(EffectKind::Rested),
            ),
            specs: RwLock::new(config.effects().clone()),
            depletion,
            speed,
        }
    }

    fn controller(&self, kind: EffectKind) -> &HysteresisController {
        let controllers = if kind.is_debuff() { &self.debuffs } else { &self.buffs };
        controllers.get(kind.stat())
    }

    fn spec(&self, kind: EffectKind) -> EffectSpec {
        let specs = sync::read(&self.specs);
        let table = if kind.is_debuff() { &specs.debuffs } else { &specs.buffs };
        *table.get(kind.stat())
    }

    /// Feeds the player's current stat percentages through every controller
    /// and applies the resulting modifier changes.
    pub fn evaluate(&self, vitals: &PlayerVitals) -> Vec<EffectTransition> {
        let player = vitals.player();
        let mut transitions = Vec::new();

        for stat in StatKind::ALL {
            let kind = EffectKind::debuff_for(stat);
            if let Some(change) = self.controller(kind).update(player, vitals.percent(stat)) {
                self.apply(player, kind, change);
                transitions.push(EffectTransition {
                    player,
                    effect: kind,
                    change,
                    suppressed: false,
                });
            }
        }

        if self.any_debuff_active(player) {
            transitions.extend(self.remove_all_buffs(player));
            return transitions;
        }

        for stat in StatKind::ALL {
            let kind = EffectKind::buff_for(stat);
            if let Some(change) = self.controller(kind).update(player, vitals.percent(stat)) {
                self.apply(player, kind, change);
                transitions.push(EffectTransition {
                    player,
                    effect: kind,
                    change,
                    suppressed: false,
                });
            }
        }
        transitions
    }

    fn apply(&self, player: PlayerId, kind: EffectKind, change: Transition) {
        let spec = self.spec(kind);
        let source = kind.source_id();
        debug!(%player, effect = %kind, ?change, "effect transition");
        match change {
            Transition::Entered => {
                if let Some(multiplier) = spec.speed_multiplier {
                    self.speed.set_modifier(player, source.clone(), multiplier);
                }
                if let Some(multiplier) = spec.depletion_multiplier.filter(|_| kind.is_debuff()) {
                    self.depletion.set_modifier(player, source, multiplier);
                }
            }
            Transition::Exited => {
                self.speed.clear_modifier(player, source.as_str());
                self.depletion.clear_modifier(player, source.as_str());
            }
        }
    }

    pub fn any_debuff_active(&self, player: PlayerId) -> bool {
        EffectKind::DEBUFFS
            .into_iter()
            .any(|kind| self.controller(kind).is_active(player))
    }

    /// Force-exits every active buff and drops all temporary speed entries.
    pub fn remove_all_buffs(&self, player: PlayerId) -> Vec<EffectTransition> {
        let exited: Vec<_> = EffectKind::BUFFS
            .into_iter()
            .filter(|kind| self.controller(*kind).force_exit(player))
            .map(|effect| EffectTransition {
                player,
                effect,
                change: Transition::Exited,
                suppressed: true,
            })
            .collect();
        self.speed
            .clear_category(player, SourceCategory::TemporaryBuff);
        if !exited.is_empty() {
            debug!(%player, count = exited.len(), "buffs suppressed by active debuff");
        }
        exited
    }

    pub fn is_active(&self, player: PlayerId, kind: EffectKind) -> bool {
        self.controller(kind).is_active(player)
    }

    /// Active effects, debuffs first.
    pub fn active_effects(&self, player: PlayerId) -> Vec<EffectKind> {
        EffectKind::DEBUFFS
            .into_iter()
            .chain(EffectKind::BUFFS)
            .filter(|kind| self.is_active(player, *kind))
            .collect()
    }

    /// Forgets every flag and effect-owned modifier of `player`.
    pub fn clear_player(&self, player: PlayerId) {
        for kind in EffectKind::DEBUFFS.into_iter().chain(EffectKind::BUFFS) {
            self.controller(kind).clear(player);
            let source = kind.source_id();
            self.speed.clear_modifier(player, source.as_str());
            self.depletion.clear_modifier(player, source.as_str());
        }
    }

    /// Swaps in new bands and multipliers. Active flags are kept and the
    /// modifiers of active effects are re-registered with the new values.
    pub fn reconfigure(&self, config: &ValidatedConfig) {
        for stat in StatKind::ALL {
            self.debuffs.get(stat).reconfigure(config.debuff_band(stat));
            self.buffs.get(stat).reconfigure(config.buff_band(stat));
        }
        *sync::write(&self.specs) = config.effects().clone();

        let mut players = Vec::new();
        for kind in EffectKind::DEBUFFS.into_iter().chain(EffectKind::BUFFS) {
            players.extend(self.controller(kind).active_subjects().into_iter().map(|p| (p, kind)));
        }
        for (player, kind) in players {
            self.apply(player, kind, Transition::Exited);
            self.apply(player, kind, Transition::Entered);
        }
    }
}
