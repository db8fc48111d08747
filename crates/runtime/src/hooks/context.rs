use survival_core::{EffectTransition, Millis, PlayerId, VitalsView};

/// Everything a hook can inspect about one transition.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub transition: &'a EffectTransition,
    /// Vitals right after the evaluation that produced the transition.
    pub vitals: &'a VitalsView,
    pub now: Millis,
}

impl<'a> HookContext<'a> {
    pub fn new(transition: &'a EffectTransition, vitals: &'a VitalsView, now: Millis) -> Self {
        Self {
            transition,
            vitals,
            now,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.transition.player
    }
}
