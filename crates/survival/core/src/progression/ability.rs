//! Static ability descriptors and the catalog that indexes them.
//!
//! Abilities are configuration, not player state. Each one belongs to a
//! profession tier and carries a list of [`AbilityEffect`]s applied once
//! when the tier's level is first reached.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::error::{ConfigError, ConfigResult, require_positive};
use crate::modifiers::{ModifierRegistry, SourceId};
use crate::types::{PlayerId, Profession, StatKind};

/// Stable identifier of an ability (`"survivalist"`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AbilityId(String);

impl AbilityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AbilityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Permanent effect granted by an ability.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityEffect {
    /// Scales XP awarded to the ability's own profession.
    XpMultiplier(f64),
    /// Registers `ability:<id>` in the depletion registry.
    DepletionModifier(f64),
    /// Registers `buff:permanent:<id>` in the speed registry.
    PermanentSpeed(f64),
    /// Raises a stat's capacity, idempotent per ability.
    CapacityIncrease { stat: StatKind, amount: f64 },
}

/// Immutable ability descriptor.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ability {
    pub id: AbilityId,
    pub name: String,
    pub profession: Profession,
    /// 1-based tier; its unlock level comes from the progression config.
    pub tier: u8,
    pub effects: Vec<AbilityEffect>,
}

impl Ability {
    pub fn new(
        id: &str,
        name: &str,
        profession: Profession,
        tier: u8,
        effects: Vec<AbilityEffect>,
    ) -> Self {
        Self {
            id: AbilityId::new(id),
            name: name.to_owned(),
            profession,
            tier,
            effects,
        }
    }

    /// Upserts the ability's depletion and speed entries for `player`.
    pub fn register_modifiers(
        &self,
        player: PlayerId,
        depletion: &ModifierRegistry,
        speed: &ModifierRegistry,
    ) {
        for effect in &self.effects {
            match *effect {
                AbilityEffect::DepletionModifier(multiplier) => {
                    depletion.set_modifier(player, SourceId::ability(&self.id), multiplier);
                }
                AbilityEffect::PermanentSpeed(multiplier) => {
                    speed.set_modifier(player, SourceId::permanent_buff(&self.id), multiplier);
                }
                AbilityEffect::XpMultiplier(_) | AbilityEffect::CapacityIncrease { .. } => {}
            }
        }
    }

    pub fn clear_modifiers(
        &self,
        player: PlayerId,
        depletion: &ModifierRegistry,
        speed: &ModifierRegistry,
    ) {
        depletion.clear_modifier(player, SourceId::ability(&self.id).as_str());
        speed.clear_modifier(player, SourceId::permanent_buff(&self.id).as_str());
    }

    /// Capacity increases with the per-stat source id they are tracked under.
    pub fn capacity_increases(&self) -> impl Iterator<Item = (StatKind, SourceId, f64)> + '_ {
        self.effects.iter().filter_map(|effect| match *effect {
            AbilityEffect::CapacityIncrease { stat, amount } => {
                Some((stat, SourceId::capacity(&self.id, stat), amount))
            }
            _ => None,
        })
    }
}

/// Validated set of abilities.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AbilityCatalog {
    abilities: Vec<Ability>,
}

impl AbilityCatalog {
    /// Builds a catalog, rejecting duplicate ids, tier 0 and non-positive
    /// effect values.
    pub fn new(abilities: Vec<Ability>) -> ConfigResult<Self> {
        let mut seen = HashSet::new();
        for ability in &abilities {
            if !seen.insert(ability.id.clone()) {
                return Err(ConfigError::DuplicateAbility(ability.id.to_string()));
            }
            if ability.tier == 0 {
                return Err(ConfigError::UnknownTier {
                    id: ability.id.to_string(),
                    tier: 0,
                    tiers: 0,
                });
            }
            for effect in &ability.effects {
                let (field, value) = match *effect {
                    AbilityEffect::XpMultiplier(v) => ("xp_multiplier", v),
                    AbilityEffect::DepletionModifier(v) => ("depletion_modifier", v),
                    AbilityEffect::PermanentSpeed(v) => ("permanent_speed", v),
                    AbilityEffect::CapacityIncrease { amount, .. } => ("capacity_increase", amount),
                };
                require_positive(format!("ability.{}.{field}", ability.id), value)?;
            }
        }
        Ok(Self { abilities })
    }

    /// Checks that every ability's tier has a configured unlock level.
    pub fn check_tiers(&self, tier_levels: &[u32]) -> ConfigResult<()> {
        match self
            .abilities
            .iter()
            .find(|ability| usize::from(ability.tier) > tier_levels.len())
        {
            Some(ability) => Err(ConfigError::UnknownTier {
                id: ability.id.to_string(),
                tier: ability.tier,
                tiers: tier_levels.len(),
            }),
            None => Ok(()),
        }
    }

    pub fn get(&self, id: &AbilityId) -> Option<&Ability> {
        self.abilities.iter().find(|ability| &ability.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ability> {
        self.abilities.iter()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    pub fn for_profession(&self, profession: Profession) -> impl Iterator<Item = &Ability> {
        self.abilities
            .iter()
            .filter(move |ability| ability.profession == profession)
    }

    /// Abilities of `profession` whose unlock level lies in `(from, to]`.
    pub fn unlocked_between<'a>(
        &'a self,
        profession: Profession,
        from: u32,
        to: u32,
        tier_levels: &'a [u32],
    ) -> impl Iterator<Item = &'a Ability> + 'a {
        self.for_profession(profession).filter(move |ability| {
            unlock_level(ability.tier, tier_levels).is_some_and(|level| level > from && level <= to)
        })
    }

    /// Product of the XP multipliers of owned `profession` abilities.
    pub fn xp_multiplier(&self, profession: Profession, owned: &BTreeSet<AbilityId>) -> f64 {
        self.for_profession(profession)
            .filter(|ability| owned.contains(&ability.id))
            .flat_map(|ability| ability.effects.iter())
            .filter_map(|effect| match effect {
                AbilityEffect::XpMultiplier(multiplier) => Some(*multiplier),
                _ => None,
            })
            .product()
    }

    /// Reference catalog: three tiers per profession, tier 1 always an XP
    /// boost for that profession.
    pub fn reference() -> Self {
        use AbilityEffect::*;
        use Profession::*;
        use StatKind::*;

        Self {
            abilities: vec![
                Ability::new("battle_trained", "Battle Trained", Combat, 1, vec![XpMultiplier(1.1)]),
                Ability::new(
                    "hardened_body",
                    "Hardened Body",
                    Combat,
                    2,
                    vec![CapacityIncrease { stat: Energy, amount: 20.0 }],
                ),
                Ability::new("relentless", "Relentless", Combat, 3, vec![PermanentSpeed(1.05)]),
                Ability::new("prospector", "Prospector", Mining, 1, vec![XpMultiplier(1.1)]),
                Ability::new(
                    "stone_stomach",
                    "Stone Stomach",
                    Mining,
                    2,
                    vec![CapacityIncrease { stat: Hunger, amount: 15.0 }],
                ),
                Ability::new("tireless", "Tireless", Mining, 3, vec![DepletionModifier(0.9)]),
                Ability::new("lumberjack", "Lumberjack", Logging, 1, vec![XpMultiplier(1.1)]),
                Ability::new(
                    "forester_stride",
                    "Forester's Stride",
                    Logging,
                    2,
                    vec![PermanentSpeed(1.05)],
                ),
                Ability::new(
                    "woodland_endurance",
                    "Woodland Endurance",
                    Logging,
                    3,
                    vec![CapacityIncrease { stat: Energy, amount: 15.0 }],
                ),
                Ability::new("green_thumb", "Green Thumb", Farming, 1, vec![XpMultiplier(1.1)]),
                Ability::new("survivalist", "Survivalist", Farming, 2, vec![DepletionModifier(0.85)]),
                Ability::new(
                    "harvest_reserves",
                    "Harvest Reserves",
                    Farming,
                    3,
                    vec![CapacityIncrease { stat: Hunger, amount: 20.0 }],
                ),
                Ability::new("apprentice_cook", "Apprentice Cook", Cooking, 1, vec![XpMultiplier(1.1)]),
                Ability::new(
                    "efficient_metabolism",
                    "Efficient Metabolism",
                    Cooking,
                    2,
                    vec![DepletionModifier(0.9)],
                ),
                Ability::new(
                    "iron_gut",
                    "Iron Gut",
                    Cooking,
                    3,
                    vec![
                        CapacityIncrease { stat: Hunger, amount: 10.0 },
                        CapacityIncrease { stat: Thirst, amount: 10.0 },
                    ],
                ),
            ],
        }
    }
}

/// Unlock level of a 1-based `tier`.
pub fn unlock_level(tier: u8, tier_levels: &[u32]) -> Option<u32> {
    usize::from(tier)
        .checked_sub(1)
        .and_then(|index| tier_levels.get(index))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIERS: [u32; 3] = [10, 25, 50];

    #[test]
    fn reference_catalog_is_valid() {
        let catalog = AbilityCatalog::new(AbilityCatalog::reference().abilities).unwrap();
        catalog.check_tiers(&TIERS).unwrap();
        assert_eq!(catalog.len(), 15);
        for profession in Profession::ALL {
            assert!(catalog.for_profession(profession).any(|a| a.tier == 1
                && matches!(a.effects[..], [AbilityEffect::XpMultiplier(_)])));
        }
    }

    #[test]
    fn unlocked_between_is_half_open() {
        let catalog = AbilityCatalog::reference();
        let ids = |from, to| -> Vec<String> {
            catalog
                .unlocked_between(Profession::Farming, from, to, &TIERS)
                .map(|a| a.id.to_string())
                .collect()
        };
        assert_eq!(ids(9, 10), vec!["green_thumb"]);
        assert!(ids(10, 24).is_empty());
        assert_eq!(ids(1, 60), vec!["green_thumb", "survivalist", "harvest_reserves"]);
    }

    #[test]
    fn duplicates_and_unknown_tiers_are_rejected() {
        let dup = vec![
            Ability::new("x", "X", Profession::Mining, 1, vec![]),
            Ability::new("x", "X", Profession::Combat, 1, vec![]),
        ];
        assert_eq!(
            AbilityCatalog::new(dup),
            Err(ConfigError::DuplicateAbility("x".into()))
        );

        let catalog =
            AbilityCatalog::new(vec![Ability::new("y", "Y", Profession::Mining, 4, vec![])]).unwrap();
        assert!(matches!(
            catalog.check_tiers(&TIERS),
            Err(ConfigError::UnknownTier { tier: 4, .. })
        ));
    }

    #[test]
    fn modifiers_register_under_namespaced_sources() {
        use crate::modifiers::ModifierDomain;

        let catalog = AbilityCatalog::reference();
        let depletion = ModifierRegistry::new(ModifierDomain::Depletion);
        let speed = ModifierRegistry::new(ModifierDomain::Speed);
        let player = PlayerId(1);

        for id in ["survivalist", "relentless"] {
            let ability = catalog.get(&AbilityId::new(id)).unwrap();
            ability.register_modifiers(player, &depletion, &speed);
            ability.register_modifiers(player, &depletion, &speed);
        }
        assert_eq!(depletion.multiplier(player, "ability:survivalist"), Some(0.85));
        assert_eq!(speed.multiplier(player, "buff:permanent:relentless"), Some(1.05));
        assert_eq!(depletion.entries(player).len(), 1);

        let iron_gut = catalog.get(&AbilityId::new("iron_gut")).unwrap();
        let sources: Vec<_> = iron_gut
            .capacity_increases()
            .map(|(_, source, _)| source.into_inner())
            .collect();
        assert_eq!(sources, vec!["ability:iron_gut:hunger", "ability:iron_gut:thirst"]);

        catalog
            .get(&AbilityId::new("survivalist"))
            .unwrap()
            .clear_modifiers(player, &depletion, &speed);
        assert_eq!(depletion.combined_all(player), 1.0);
    }

    #[test]
    fn xp_multiplier_only_counts_owned_abilities_of_the_profession() {
        let catalog = AbilityCatalog::reference();
        let mut owned = BTreeSet::new();
        assert_eq!(catalog.xp_multiplier(Profession::Mining, &owned), 1.0);

        owned.insert(AbilityId::new("prospector"));
        owned.insert(AbilityId::new("battle_trained"));
        assert!((catalog.xp_multiplier(Profession::Mining, &owned) - 1.1).abs() < 1e-9);
    }
}
