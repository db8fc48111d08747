//! Hook registry for managing and executing transition hooks.

use std::sync::Arc;

use tracing::{debug, error};

use super::{HookContext, HookCriticality, HookError, TransitionHook};
use crate::api::{Result, RuntimeError};

/// Registry that runs transition hooks in priority order.
#[derive(Clone)]
pub struct HookRegistry {
    hooks: Arc<[Arc<dyn TransitionHook>]>,
}

impl HookRegistry {
    /// Creates a registry; hooks are sorted by priority (lower first, stable
    /// for equal priorities).
    pub fn new(mut hooks: Vec<Arc<dyn TransitionHook>>) -> Self {
        hooks.sort_by_key(|h| h.priority());
        Self {
            hooks: hooks.into(),
        }
    }

    /// Registry with no hooks.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Creates a registry with the default set of hooks.
    ///
    /// Default hooks include:
    /// - TransitionLogHook: logs every transition (optional)
    pub fn default_hooks() -> Self {
        Self::new(vec![Arc::new(super::TransitionLogHook) as Arc<dyn TransitionHook>])
    }

    /// Returns a registry with `hook` added.
    pub fn with(&self, hook: Arc<dyn TransitionHook>) -> Self {
        let mut hooks: Vec<_> = self.hooks.iter().cloned().collect();
        hooks.push(hook);
        Self::new(hooks)
    }

    /// Offers the transition to every hook in priority order.
    ///
    /// # Error Handling
    ///
    /// - `Critical`: returns the error immediately, skipping later hooks
    /// - `Important`: logs the error and continues (default)
    /// - `Optional`: logs at debug level and continues
    pub fn dispatch(&self, ctx: &HookContext<'_>) -> Result<()> {
        for hook in self.hooks.iter() {
            if !hook.should_trigger(ctx) {
                continue;
            }
            if let Err(e) = hook.on_transition(ctx) {
                self.handle_hook_error(hook.as_ref(), e)?;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Returns an iterator over hook names and priorities (for debugging).
    pub fn hooks(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.hooks.iter().map(|h| (h.name(), h.priority()))
    }

    fn handle_hook_error(&self, hook: &dyn TransitionHook, error: HookError) -> Result<()> {
        match hook.criticality() {
            HookCriticality::Critical => {
                error!(
                    target: "runtime::hooks",
                    hook = hook.name(),
                    criticality = "critical",
                    error = %error,
                    "Critical hook failed, aborting tick"
                );
                return Err(RuntimeError::CriticalHook {
                    hook: hook.name(),
                    source: error,
                });
            }
            HookCriticality::Important => error!(
                target: "runtime::hooks",
                hook = hook.name(),
                criticality = "important",
                error = %error,
                "Hook failed, continuing"
            ),
            HookCriticality::Optional => debug!(
                target: "runtime::hooks",
                hook = hook.name(),
                criticality = "optional",
                error = %error,
                "Optional hook failed"
            ),
        }
        Ok(())
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::default_hooks()
    }
}
