//! Transition hook system for runtime orchestration.
//!
//! Hooks run after the effect coordinator reports a buff or debuff
//! transition for a player. They are the extension point for reacting to
//! effects (achievements, analytics, host-side sounds) without touching the
//! engine itself.
//!
//! # Architecture
//!
//! - Hooks are registered in the RuntimeBuilder and sorted by priority
//! - After each tick, every transition is offered to the hooks in priority
//!   order; hooks opt in through `should_trigger()`
//! - Failures are handled according to the hook's criticality

mod callback;
mod context;
mod registry;
mod transition_log;

pub use callback::CallbackHook;
pub use context::HookContext;
pub use registry::HookRegistry;
pub use transition_log::TransitionLogHook;

use thiserror::Error;

/// Defines the criticality level of a hook for error handling.
///
/// - Critical hooks must succeed or the player's tick is aborted
/// - Important hooks log errors but allow continuation
/// - Optional hooks can fail silently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookCriticality {
    /// Hook failure aborts the remaining work of the player's tick.
    Critical,

    /// Hook failure is logged as an error; the tick continues.
    ///
    /// This is the default level.
    Important,

    /// Hook failure is logged at debug level only.
    Optional,
}

/// Failure reported by a transition hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Repository(#[from] crate::repository::RepositoryError),
}

impl HookError {
    pub fn failed(message: impl Into<String>) -> Self {
        HookError::Failed(message.into())
    }
}

/// Reaction to a buff or debuff transition.
///
/// # Execution Order
///
/// Hooks are sorted by priority (lower values execute first):
/// - Negative priorities: hooks other hooks depend on
/// - Zero: default priority for most hooks
/// - Positive priorities: optional or cosmetic hooks
pub trait TransitionHook: Send + Sync {
    /// Returns a human-readable name for this hook (used in logging).
    fn name(&self) -> &'static str;

    /// Lower values execute first.
    fn priority(&self) -> i32 {
        0
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Important
    }

    /// Whether this hook cares about the transition in `ctx`.
    fn should_trigger(&self, _ctx: &HookContext<'_>) -> bool {
        true
    }

    fn on_transition(&self, ctx: &HookContext<'_>) -> Result<(), HookError>;
}
