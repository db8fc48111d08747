//! Engine policy: thresholds, curves and multipliers.
//!
//! [`SurvivalConfig`] is the raw, deserializable snapshot supplied by the
//! configuration collaborator. The engine only ever accepts a
//! [`ValidatedConfig`], which carries the derived tables (hysteresis bands,
//! cumulative XP table) built once from that snapshot. A reload builds a new
//! `ValidatedConfig`; nothing is patched in place.

use crate::error::{ConfigError, ConfigResult, require_positive, require_range};
use crate::hysteresis::{HysteresisBand, Polarity};
use crate::progression::XpCurve;
use crate::types::{ActivityState, StatKind};

/// One value per vital stat.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerStat<T> {
    pub hunger: T,
    pub thirst: T,
    pub energy: T,
}

impl<T> PerStat<T> {
    pub const fn new(hunger: T, thirst: T, energy: T) -> Self {
        Self {
            hunger,
            thirst,
            energy,
        }
    }

    pub fn get(&self, stat: StatKind) -> &T {
        match stat {
            StatKind::Hunger => &self.hunger,
            StatKind::Thirst => &self.thirst,
            StatKind::Energy => &self.energy,
        }
    }

    pub fn get_mut(&mut self, stat: StatKind) -> &mut T {
        match stat {
            StatKind::Hunger => &mut self.hunger,
            StatKind::Thirst => &mut self.thirst,
            StatKind::Energy => &mut self.energy,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(StatKind, &T) -> U) -> PerStat<U> {
        PerStat {
            hunger: f(StatKind::Hunger, &self.hunger),
            thirst: f(StatKind::Thirst, &self.thirst),
            energy: f(StatKind::Energy, &self.energy),
        }
    }
}

/// Depletion-rate scaling per activity (higher = faster depletion).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ActivityMultipliers {
    pub idle: f64,
    pub walking: f64,
    pub sprinting: f64,
    pub swimming: f64,
    pub combat: f64,
}

impl ActivityMultipliers {
    pub fn get(&self, activity: ActivityState) -> f64 {
        match activity {
            ActivityState::Idle => self.idle,
            ActivityState::Walking => self.walking,
            ActivityState::Sprinting => self.sprinting,
            ActivityState::Swimming => self.swimming,
            ActivityState::Combat => self.combat,
        }
    }
}

impl Default for ActivityMultipliers {
    fn default() -> Self {
        Self {
            idle: 1.0,
            walking: 1.25,
            sprinting: 2.0,
            swimming: 1.75,
            combat: 1.5,
        }
    }
}

/// Stat capacities and depletion cadence.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct VitalsConfig {
    /// Base capacity of every stat before ability increases.
    pub default_max: f64,
    /// Value a fresh player starts with.
    pub starting_value: f64,
    /// Amount removed per depletion step.
    pub depletion_amount: f64,
    /// Interval between depletion steps at idle with no modifiers.
    pub base_interval_ms: PerStat<u64>,
    pub activity: ActivityMultipliers,
    /// Lower bound applied to the combined depletion multiplier so a stack of
    /// strong reductions cannot stretch the interval without limit.
    pub min_depletion_multiplier: f64,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            default_max: 100.0,
            starting_value: 100.0,
            depletion_amount: 1.0,
            base_interval_ms: PerStat::new(36_000, 27_000, 45_000),
            activity: ActivityMultipliers::default(),
            min_depletion_multiplier: 0.05,
        }
    }
}

/// Thresholds (percent of current max) and side effects of one buff or debuff.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSpec {
    pub enter: f64,
    pub exit: f64,
    /// Movement speed multiplier registered while active.
    #[cfg_attr(feature = "serde", serde(default))]
    pub speed_multiplier: Option<f64>,
    /// Depletion multiplier registered while active (debuffs only).
    #[cfg_attr(feature = "serde", serde(default))]
    pub depletion_multiplier: Option<f64>,
}

impl EffectSpec {
    pub const fn new(enter: f64, exit: f64) -> Self {
        Self {
            enter,
            exit,
            speed_multiplier: None,
            depletion_multiplier: None,
        }
    }

    pub const fn with_speed(mut self, multiplier: f64) -> Self {
        self.speed_multiplier = Some(multiplier);
        self
    }

    pub const fn with_depletion(mut self, multiplier: f64) -> Self {
        self.depletion_multiplier = Some(multiplier);
        self
    }
}

/// Buff and debuff policy, one entry per stat.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct EffectsConfig {
    pub debuffs: PerStat<EffectSpec>,
    pub buffs: PerStat<EffectSpec>,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            debuffs: PerStat::new(
                EffectSpec::new(25.0, 35.0).with_speed(0.8),
                EffectSpec::new(25.0, 35.0).with_speed(0.6),
                EffectSpec::new(25.0, 35.0)
                    .with_speed(0.7)
                    .with_depletion(1.2),
            ),
            buffs: PerStat::new(
                EffectSpec::new(90.0, 80.0).with_speed(1.05),
                EffectSpec::new(90.0, 80.0).with_speed(1.05),
                EffectSpec::new(90.0, 80.0).with_speed(1.1),
            ),
        }
    }
}

/// Speed composition policy.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SpeedPolicy {
    /// Temporary buffs apply only when the debuff × permanent product is at
    /// least this value.
    pub temporary_buff_floor: f64,
    /// When set, permanent buffs apply only when the debuff product is at
    /// least this value. `None` applies them unconditionally.
    pub permanent_buff_floor: Option<f64>,
    /// Relative change below which a new speed is not pushed to the host.
    pub dead_band: f64,
}

impl Default for SpeedPolicy {
    fn default() -> Self {
        Self {
            temporary_buff_floor: 0.5,
            permanent_buff_floor: None,
            dead_band: 0.01,
        }
    }
}

/// Experience curve and ability tier milestones.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ProgressionConfig {
    /// XP needed to go from level 1 to level 2.
    pub base_xp: f64,
    /// Growth factor of each subsequent level's requirement.
    pub multiplier: f64,
    pub max_level: u32,
    /// Unlock level of each tier, tier 1 first.
    pub tier_levels: Vec<u32>,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_xp: 100.0,
            multiplier: 1.15,
            max_level: 100,
            tier_levels: vec![10, 25, 50],
        }
    }
}

/// Complete engine configuration snapshot as supplied by the host.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SurvivalConfig {
    pub vitals: VitalsConfig,
    pub effects: EffectsConfig,
    pub speed: SpeedPolicy,
    pub progression: ProgressionConfig,
}

impl SurvivalConfig {
    /// Validates every section and builds the derived tables.
    pub fn validate(self) -> ConfigResult<ValidatedConfig> {
        validate_vitals(&self.vitals)?;
        validate_speed(&self.speed)?;

        let debuff_bands = build_bands("debuff", Polarity::ActivatesWhenLow, &self.effects.debuffs)?;
        let buff_bands = build_bands("buff", Polarity::ActivatesWhenHigh, &self.effects.buffs)?;

        let progression = &self.progression;
        let curve = XpCurve::new(progression.base_xp, progression.multiplier, progression.max_level)?;
        validate_tiers(&progression.tier_levels, progression.max_level)?;

        Ok(ValidatedConfig {
            config: self,
            debuff_bands,
            buff_bands,
            curve,
        })
    }
}

/// Configuration that passed validation, with its derived tables.
#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    config: SurvivalConfig,
    debuff_bands: PerStat<HysteresisBand>,
    buff_bands: PerStat<HysteresisBand>,
    curve: XpCurve,
}

impl ValidatedConfig {
    pub fn config(&self) -> &SurvivalConfig {
        &self.config
    }

    pub fn vitals(&self) -> &VitalsConfig {
        &self.config.vitals
    }

    pub fn effects(&self) -> &EffectsConfig {
        &self.config.effects
    }

    pub fn speed(&self) -> &SpeedPolicy {
        &self.config.speed
    }

    pub fn progression(&self) -> &ProgressionConfig {
        &self.config.progression
    }

    pub fn debuff_band(&self, stat: StatKind) -> HysteresisBand {
        *self.debuff_bands.get(stat)
    }

    pub fn buff_band(&self, stat: StatKind) -> HysteresisBand {
        *self.buff_bands.get(stat)
    }

    pub fn curve(&self) -> &XpCurve {
        &self.curve
    }

    /// Unlock level of `tier` (1-based), if configured.
    pub fn tier_level(&self, tier: u8) -> Option<u32> {
        let index = usize::from(tier).checked_sub(1)?;
        self.config.progression.tier_levels.get(index).copied()
    }
}

fn validate_vitals(vitals: &VitalsConfig) -> ConfigResult<()> {
    require_positive("vitals.default_max", vitals.default_max)?;
    require_range(
        "vitals.starting_value",
        vitals.starting_value,
        0.0,
        vitals.default_max,
    )?;
    require_positive("vitals.depletion_amount", vitals.depletion_amount)?;
    require_range(
        "vitals.min_depletion_multiplier",
        vitals.min_depletion_multiplier,
        f64::MIN_POSITIVE,
        1.0,
    )?;

    for stat in StatKind::ALL {
        let interval = *vitals.base_interval_ms.get(stat);
        require_positive(format!("vitals.base_interval_ms.{stat}"), interval as f64)?;
    }

    let activity = &vitals.activity;
    for (name, value) in [
        ("idle", activity.idle),
        ("walking", activity.walking),
        ("sprinting", activity.sprinting),
        ("swimming", activity.swimming),
        ("combat", activity.combat),
    ] {
        require_positive(format!("vitals.activity.{name}"), value)?;
    }
    Ok(())
}

fn validate_speed(speed: &SpeedPolicy) -> ConfigResult<()> {
    require_positive("speed.temporary_buff_floor", speed.temporary_buff_floor)?;
    if let Some(floor) = speed.permanent_buff_floor {
        require_positive("speed.permanent_buff_floor", floor)?;
    }
    require_range("speed.dead_band", speed.dead_band, 0.0, 1.0)
}

fn build_bands(
    kind: &str,
    polarity: Polarity,
    specs: &PerStat<EffectSpec>,
) -> ConfigResult<PerStat<HysteresisBand>> {
    let mut bands = Vec::with_capacity(StatKind::ALL.len());
    for stat in StatKind::ALL {
        let spec = specs.get(stat);
        let name = format!("{kind}.{stat}");
        require_range(format!("{name}.enter"), spec.enter, 0.0, 100.0)?;
        require_range(format!("{name}.exit"), spec.exit, 0.0, 100.0)?;
        if let Some(multiplier) = spec.speed_multiplier {
            require_positive(format!("{name}.speed_multiplier"), multiplier)?;
        }
        if let Some(multiplier) = spec.depletion_multiplier {
            require_positive(format!("{name}.depletion_multiplier"), multiplier)?;
        }
        bands.push(HysteresisBand::new(&name, polarity, spec.enter, spec.exit)?);
    }
    Ok(PerStat::new(bands[0], bands[1], bands[2]))
}

fn validate_tiers(levels: &[u32], max_level: u32) -> ConfigResult<()> {
    let increasing = levels.windows(2).all(|pair| pair[0] < pair[1]);
    let in_range = levels.iter().all(|&level| (2..=max_level).contains(&level));
    if levels.is_empty() || !increasing || !in_range {
        return Err(ConfigError::TierLevels {
            levels: levels.to_vec(),
            max_level,
        });
    }
    Ok(())
}
