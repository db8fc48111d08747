//! Survival and progression simulation logic.
//!
//! `survival-core` holds the engine rules shared by the runtime and offline
//! tools: modifier composition, hysteresis-driven buffs and debuffs, vital
//! stat depletion, movement speed composition and the concurrent profession
//! XP engine. It performs no I/O and never reads the clock; callers supply
//! `now` and receive reports describing what changed.
pub mod config;
pub mod effects;
pub mod error;
pub mod hysteresis;
pub mod modifiers;
pub mod presentation;
pub mod progression;
pub mod speed;
pub mod types;
pub mod vitals;

mod sync;

pub use config::{
    ActivityMultipliers, EffectSpec, EffectsConfig, PerStat, ProgressionConfig, SpeedPolicy,
    SurvivalConfig, ValidatedConfig, VitalsConfig,
};
pub use effects::{EffectCoordinator, EffectKind, EffectTransition};
pub use error::{ConfigError, ConfigResult};
pub use hysteresis::{HysteresisBand, HysteresisController, Polarity, Transition};
pub use modifiers::{ModifierDomain, ModifierRegistry, ModifierSet, SourceCategory, SourceId};
pub use presentation::{DiscardSink, PresentationSink, VisibleEffect};
pub use progression::{
    Ability, AbilityCatalog, AbilityEffect, AbilityId, AbilityUnlockSink, AwardOutcome,
    NoopUnlockSink, ProfessionProgress, ProgressionEngine, ProgressionSnapshot, UnlockReason,
    XpCurve,
};
pub use speed::SpeedComposer;
pub use types::{ActivityState, Millis, OwnerId, PlayerId, Profession, StatKind};
pub use vitals::{DepletionEngine, PlayerVitals, StatView, TickReport, VitalsSnapshot, VitalsView};
