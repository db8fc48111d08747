use super::{HookContext, HookCriticality, HookError, TransitionHook};

type Callback = Box<dyn Fn(&HookContext<'_>) -> Result<(), HookError> + Send + Sync>;

/// Hook backed by a closure, for wiring host reactions without a new type.
pub struct CallbackHook {
    name: &'static str,
    priority: i32,
    criticality: HookCriticality,
    callback: Callback,
}

impl CallbackHook {
    pub fn new(
        name: &'static str,
        callback: impl Fn(&HookContext<'_>) -> Result<(), HookError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            priority: 0,
            criticality: HookCriticality::Important,
            callback: Box::new(callback),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_criticality(mut self, criticality: HookCriticality) -> Self {
        self.criticality = criticality;
        self
    }
}

impl TransitionHook for CallbackHook {
    fn name(&self) -> &'static str {
        self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn criticality(&self) -> HookCriticality {
        self.criticality
    }

    fn on_transition(&self, ctx: &HookContext<'_>) -> Result<(), HookError> {
        (self.callback)(ctx)
    }
}
