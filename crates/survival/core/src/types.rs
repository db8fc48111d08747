//! Identifiers and small value types shared by every engine component.

use core::fmt;

/// Milliseconds on the engine clock.
///
/// The engine never reads wall time itself; callers pass `now` explicitly so
/// tests and replay tools can drive it with a manual clock.
pub type Millis = u64;

/// Unique identifier of a connected player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Identifier of the single-writer context that owns a player's visible state
/// (in practice, the world the player is currently in).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OwnerId(pub u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

/// The three depleting vital statistics.
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
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum StatKind {
    Hunger,
    Thirst,
    Energy,
}

impl StatKind {
    pub const ALL: [StatKind; 3] = [StatKind::Hunger, StatKind::Thirst, StatKind::Energy];

    /// Dense index used for per-stat arrays.
    pub const fn index(self) -> usize {
        match self {
            StatKind::Hunger => 0,
            StatKind::Thirst => 1,
            StatKind::Energy => 2,
        }
    }
}

/// Movement/activity classification supplied by the host every tick.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ActivityState {
    #[default]
    Idle,
    Walking,
    Sprinting,
    Swimming,
    Combat,
}

/// Independent XP/level tracks.
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
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Profession {
    Combat,
    Mining,
    Logging,
    Farming,
    Cooking,
}

impl Profession {
    pub const COUNT: usize = 5;

    pub const ALL: [Profession; Self::COUNT] = [
        Profession::Combat,
        Profession::Mining,
        Profession::Logging,
        Profession::Farming,
        Profession::Cooking,
    ];

    pub const fn index(self) -> usize {
        match self {
            Profession::Combat => 0,
            Profession::Mining => 1,
            Profession::Logging => 2,
            Profession::Farming => 3,
            Profession::Cooking => 4,
        }
    }
}
