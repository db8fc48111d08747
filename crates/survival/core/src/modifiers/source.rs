//! Source identifiers for modifier entries.
//!
//! A source id is a namespaced string (`"debuff:thirst"`,
//! `"ability:survivalist"`). The registry itself never interprets it; callers
//! select entries by category prefix when composing a multiplier.

use core::borrow::Borrow;
use core::fmt;

use crate::types::StatKind;

/// Category prefixes understood by the depletion and speed composers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SourceCategory {
    /// `debuff:*` entries, always applied.
    Debuff,
    /// `ability:*` entries from unlocked abilities (depletion domain).
    Ability,
    /// `buff:permanent:*` entries from unlocked abilities (speed domain).
    PermanentBuff,
    /// `buff:temporary:*` entries from stat-driven buffs (speed domain).
    TemporaryBuff,
}

impl SourceCategory {
    pub const fn prefix(self) -> &'static str {
        match self {
            SourceCategory::Debuff => "debuff:",
            SourceCategory::Ability => "ability:",
            SourceCategory::PermanentBuff => "buff:permanent:",
            SourceCategory::TemporaryBuff => "buff:temporary:",
        }
    }

    pub fn matches(self, source: &str) -> bool {
        source.starts_with(self.prefix())
    }

    /// Predicate matching any of `categories`.
    pub fn any_of(categories: &[SourceCategory]) -> impl Fn(&str) -> bool + '_ {
        move |source| categories.iter().any(|category| category.matches(source))
    }
}

/// Owned, namespaced modifier source id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceId(String);

impl SourceId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn debuff(name: impl fmt::Display) -> Self {
        Self(format!("{}{}", SourceCategory::Debuff.prefix(), name))
    }

    pub fn ability(id: impl fmt::Display) -> Self {
        Self(format!("{}{}", SourceCategory::Ability.prefix(), id))
    }

    pub fn permanent_buff(id: impl fmt::Display) -> Self {
        Self(format!("{}{}", SourceCategory::PermanentBuff.prefix(), id))
    }

    pub fn temporary_buff(name: impl fmt::Display) -> Self {
        Self(format!("{}{}", SourceCategory::TemporaryBuff.prefix(), name))
    }

    /// Capacity sources are tracked per stat so one ability may raise several.
    pub fn capacity(id: impl fmt::Display, stat: StatKind) -> Self {
        Self(format!("ability:{id}:{stat}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn category(&self) -> Option<SourceCategory> {
        [
            SourceCategory::Debuff,
            SourceCategory::Ability,
            SourceCategory::PermanentBuff,
            SourceCategory::TemporaryBuff,
        ]
        .into_iter()
        .find(|category| category.matches(&self.0))
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl From<String> for SourceId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
