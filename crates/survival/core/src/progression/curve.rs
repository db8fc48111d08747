//! Precomputed cumulative XP table.
//!
//! Reaching level `n` (n >= 2) costs `round(base_xp × multiplier^(n-2))` XP
//! on top of level `n-1`, so with `base_xp = 100` the thresholds are
//! `L1 = 0`, `L2 = 100`, `L3 = 100 + 100×m`, ... The table is built once per
//! configuration and never patched; a different curve is a different table,
//! so historical levels stay derivable from stored cumulative XP.

use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};

/// Upper bound accepted for `max_level`.
pub const MAX_LEVEL_LIMIT: u32 = 1_000;

/// Immutable level ↔ cumulative XP mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct XpCurve {
    base_xp: f64,
    multiplier: f64,
    /// `thresholds[i]` is the cumulative XP needed to reach level `i + 1`.
    thresholds: Arc<[u64]>,
}

impl XpCurve {
    pub fn new(base_xp: f64, multiplier: f64, max_level: u32) -> ConfigResult<Self> {
        if !(base_xp.is_finite() && base_xp >= 1.0) {
            return Err(ConfigError::XpBaseTooSmall(base_xp));
        }
        if !(multiplier.is_finite() && multiplier >= 1.0) {
            return Err(ConfigError::XpMultiplierNotMonotonic(multiplier));
        }
        if !(2..=MAX_LEVEL_LIMIT).contains(&max_level) {
            return Err(ConfigError::MaxLevelOutOfRange {
                got: max_level,
                max: MAX_LEVEL_LIMIT,
            });
        }

        let mut thresholds = Vec::with_capacity(max_level as usize);
        thresholds.push(0u64);
        let mut cumulative = 0u64;
        for level in 2..=max_level {
            let step = base_xp * multiplier.powi(level as i32 - 2);
            // Stay well inside u64 so the counter can never wrap.
            if !step.is_finite() || step >= (u64::MAX / 4) as f64 {
                return Err(ConfigError::XpCurveOverflow { level });
            }
            let step = (step.round() as u64).max(1);
            cumulative = cumulative
                .checked_add(step)
                .filter(|total| *total < u64::MAX / 2)
                .ok_or(ConfigError::XpCurveOverflow { level })?;
            thresholds.push(cumulative);
        }

        Ok(Self {
            base_xp,
            multiplier,
            thresholds: thresholds.into(),
        })
    }

    pub fn base_xp(&self) -> f64 {
        self.base_xp
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn max_level(&self) -> u32 {
        self.thresholds.len() as u32
    }

    /// Cumulative XP required to reach `level`. Levels outside
    /// `1..=max_level` are clamped.
    pub fn xp_for_level(&self, level: u32) -> u64 {
        let index = level.clamp(1, self.max_level()) as usize - 1;
        self.thresholds[index]
    }

    /// Level reached with `xp` cumulative experience, `O(log L)`.
    pub fn level_of(&self, xp: u64) -> u32 {
        // thresholds[0] == 0, so at least one entry always matches.
        self.thresholds.partition_point(|&threshold| threshold <= xp) as u32
    }

    /// Cumulative XP at which the counter is capped.
    pub fn max_xp(&self) -> u64 {
        self.xp_for_level(self.max_level())
    }

    /// XP earned since the start of the current level.
    pub fn xp_into_level(&self, xp: u64) -> u64 {
        xp.saturating_sub(self.xp_for_level(self.level_of(xp)))
    }

    /// XP still missing for the next level, `None` at max level.
    pub fn xp_to_next_level(&self, xp: u64) -> Option<u64> {
        let level = self.level_of(xp);
        (level < self.max_level()).then(|| self.xp_for_level(level + 1) - xp)
    }

    pub fn thresholds(&self) -> &[u64] {
        &self.thresholds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> XpCurve {
        XpCurve::new(100.0, 1.15, 100).unwrap()
    }

    #[test]
    fn reference_curve_matches_documented_values() {
        let curve = reference();
        assert_eq!(curve.xp_for_level(1), 0);
        assert_eq!(curve.xp_for_level(2), 100);
        assert_eq!(curve.xp_for_level(3), 215);
        assert_eq!(curve.level_of(0), 1);
        assert_eq!(curve.level_of(99), 1);
        assert_eq!(curve.level_of(100), 2);
        assert_eq!(curve.level_of(214), 2);
        assert_eq!(curve.level_of(215), 3);
    }

    #[test]
    fn level_round_trip_holds_for_every_level() {
        let curve = reference();
        for level in 1..=curve.max_level() {
            let xp = curve.xp_for_level(level);
            assert_eq!(curve.level_of(xp), level);
            if level > 1 {
                assert_eq!(curve.level_of(xp - 1), level - 1);
            }
        }
    }

    #[test]
    fn level_is_capped_at_max() {
        let curve = XpCurve::new(10.0, 1.0, 5).unwrap();
        assert_eq!(curve.max_xp(), 40);
        assert_eq!(curve.level_of(u64::MAX), 5);
        assert_eq!(curve.xp_to_next_level(40), None);
        assert_eq!(curve.xp_to_next_level(35), Some(5));
        assert_eq!(curve.xp_into_level(35), 5);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert_eq!(
            XpCurve::new(0.5, 1.15, 10),
            Err(ConfigError::XpBaseTooSmall(0.5))
        );
        assert_eq!(
            XpCurve::new(100.0, 0.99, 10),
            Err(ConfigError::XpMultiplierNotMonotonic(0.99))
        );
        assert!(matches!(
            XpCurve::new(100.0, 1.15, 1),
            Err(ConfigError::MaxLevelOutOfRange { .. })
        ));
        assert!(matches!(
            XpCurve::new(1e12, 2.0, 1_000),
            Err(ConfigError::XpCurveOverflow { .. })
        ));
    }
}
