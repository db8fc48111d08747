use tracing::info;

use survival_core::Transition;

use super::{HookContext, HookCriticality, HookError, TransitionHook};

/// Logs every transition at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransitionLogHook;

impl TransitionHook for TransitionLogHook {
    fn name(&self) -> &'static str {
        "transition_log"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Optional
    }

    fn on_transition(&self, ctx: &HookContext<'_>) -> Result<(), HookError> {
        let transition = ctx.transition;
        let stat = transition.effect.stat();
        let verb = match transition.change {
            Transition::Entered => "gained",
            Transition::Exited if transition.suppressed => "lost (suppressed)",
            Transition::Exited => "lost",
        };
        info!(
            target: "runtime::hooks",
            player = %transition.player,
            effect = %transition.effect,
            percent = ctx.vitals.get(stat).percent,
            "{} {} {}",
            transition.player,
            verb,
            transition.effect
        );
        Ok(())
    }
}
