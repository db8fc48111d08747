//! Dual-threshold activation state machine.
//!
//! A band is entered when a reading crosses the enter threshold and left only
//! when it crosses the opposite, exit threshold. Readings oscillating between
//! the two never toggle the state.
//!
//! ```text
//! ActivatesWhenLow (debuff)         ActivatesWhenHigh (buff)
//!
//!   inactive ── r <= enter ──> active     inactive ── r >= enter ──> active
//!   active   ── r >= exit  ──> inactive   active   ── r <= exit  ──> inactive
//!
//!   requires exit > enter                 requires exit < enter
//! ```

use std::collections::HashSet;
use std::sync::{Mutex, RwLock};

use crate::error::{ConfigError, ConfigResult};
use crate::sync;
use crate::types::PlayerId;

/// Direction in which a band activates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Polarity {
    /// Debuff semantics: active while the reading is low.
    ActivatesWhenLow,
    /// Buff semantics: active while the reading is high.
    ActivatesWhenHigh,
}

/// State change reported by a controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Transition {
    Entered,
    Exited,
}

/// Validated enter/exit thresholds for one polarity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HysteresisBand {
    polarity: Polarity,
    enter: f64,
    exit: f64,
}

impl HysteresisBand {
    /// Builds a band, rejecting orderings that would allow flicker.
    pub fn new(name: &str, polarity: Polarity, enter: f64, exit: f64) -> ConfigResult<Self> {
        if !enter.is_finite() || !exit.is_finite() {
            return Err(ConfigError::HysteresisNotFinite {
                name: name.to_owned(),
            });
        }

        let (ordered, expected) = match polarity {
            Polarity::ActivatesWhenLow => (exit > enter, "strictly greater than"),
            Polarity::ActivatesWhenHigh => (exit < enter, "strictly less than"),
        };
        if !ordered {
            return Err(ConfigError::HysteresisOrdering {
                name: name.to_owned(),
                polarity,
                enter,
                exit,
                expected,
            });
        }

        Ok(Self {
            polarity,
            enter,
            exit,
        })
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn enter(&self) -> f64 {
        self.enter
    }

    pub fn exit(&self) -> f64 {
        self.exit
    }

    /// Pure transition function: given the current flag and a reading,
    /// returns the transition to take, if any.
    pub fn evaluate(&self, active: bool, reading: f64) -> Option<Transition> {
        match (self.polarity, active) {
            (Polarity::ActivatesWhenLow, false) if reading <= self.enter => {
                Some(Transition::Entered)
            }
            (Polarity::ActivatesWhenLow, true) if reading >= self.exit => Some(Transition::Exited),
            (Polarity::ActivatesWhenHigh, false) if reading >= self.enter => {
                Some(Transition::Entered)
            }
            (Polarity::ActivatesWhenHigh, true) if reading <= self.exit => Some(Transition::Exited),
            _ => None,
        }
    }
}

/// One band applied independently to many subjects.
///
/// The per-subject flag is read and written under a single lock acquisition,
/// so concurrent updates for the same subject cannot both report `Entered`.
#[derive(Debug)]
pub struct HysteresisController {
    name: String,
    band: RwLock<HysteresisBand>,
    active: Mutex<HashSet<PlayerId>>,
}

impl HysteresisController {
    pub fn new(name: impl Into<String>, band: HysteresisBand) -> Self {
        Self {
            name: name.into(),
            band: RwLock::new(band),
            active: Mutex::new(HashSet::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn band(&self) -> HysteresisBand {
        *sync::read(&self.band)
    }

    /// Feeds a reading for `subject` and applies the resulting transition.
    pub fn update(&self, subject: PlayerId, reading: f64) -> Option<Transition> {
        let band = self.band();
        let mut active = sync::lock(&self.active);
        let transition = band.evaluate(active.contains(&subject), reading)?;
        match transition {
            Transition::Entered => active.insert(subject),
            Transition::Exited => active.remove(&subject),
        };
        Some(transition)
    }

    pub fn is_active(&self, subject: PlayerId) -> bool {
        sync::lock(&self.active).contains(&subject)
    }

    /// Deactivates `subject` regardless of readings. Returns whether it was
    /// active.
    pub fn force_exit(&self, subject: PlayerId) -> bool {
        sync::lock(&self.active).remove(&subject)
    }

    /// Forgets `subject` entirely (disconnect).
    pub fn clear(&self, subject: PlayerId) {
        sync::lock(&self.active).remove(&subject);
    }

    pub fn active_count(&self) -> usize {
        sync::lock(&self.active).len()
    }

    pub fn active_subjects(&self) -> Vec<PlayerId> {
        sync::lock(&self.active).iter().copied().collect()
    }

    /// Swaps in a new band while keeping per-subject flags.
    pub fn reconfigure(&self, band: HysteresisBand) {
        *sync::write(&self.band) = band;
    }
}
