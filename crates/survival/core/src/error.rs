//! Configuration errors raised while validating engine policy.
//!
//! Only configuration problems are surfaced as errors by `survival-core`.
//! Runtime invariant violations (a stat outside its bounds, a non-positive
//! multiplier) are clamped or rejected locally and logged instead, and a lost
//! level-up race is an expected outcome rather than an error.

use thiserror::Error;

use crate::hysteresis::Polarity;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Reasons a configuration snapshot is rejected at load time.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error(
        "hysteresis band for {name} is not anti-flicker: polarity {polarity:?} requires exit {exit} to be {expected} enter {enter}"
    )]
    HysteresisOrdering {
        name: String,
        polarity: Polarity,
        enter: f64,
        exit: f64,
        expected: &'static str,
    },

    #[error("hysteresis band for {name} has a non-finite threshold")]
    HysteresisNotFinite { name: String },

    #[error("xp curve base must be at least 1, got {0}")]
    XpBaseTooSmall(f64),

    #[error("xp curve multiplier must be finite and >= 1.0, got {0}")]
    XpMultiplierNotMonotonic(f64),

    #[error("max level must be between 2 and {max}, got {got}")]
    MaxLevelOutOfRange { got: u32, max: u32 },

    #[error("xp curve overflows at level {level}")]
    XpCurveOverflow { level: u32 },

    #[error("{field} must be finite and > 0, got {value}")]
    NonPositive { field: String, value: f64 },

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("ability tier levels must be strictly increasing and within max level {max_level}: {levels:?}")]
    TierLevels { levels: Vec<u32>, max_level: u32 },

    #[error("duplicate ability id {0}")]
    DuplicateAbility(String),

    #[error("ability {id} references tier {tier}, but only {tiers} tiers are configured")]
    UnknownTier { id: String, tier: u8, tiers: usize },
}

/// Validates that `value` is finite and strictly positive.
pub(crate) fn require_positive(field: impl Into<String>, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive {
            field: field.into(),
            value,
        })
    }
}

/// Validates that `value` lies within `[min, max]`.
pub(crate) fn require_range(
    field: impl Into<String>,
    value: f64,
    min: f64,
    max: f64,
) -> ConfigResult<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field: field.into(),
            value,
            min,
            max,
        })
    }
}
