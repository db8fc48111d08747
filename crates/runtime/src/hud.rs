//! Player HUD built from independent elements.
//!
//! Each [`HudElement`] renders one line from a [`HudView`]; elements that
//! have nothing to show return `None` and are skipped. [`CompositeHud`] keeps
//! the elements in insertion order.

use std::fmt::Write as _;
use std::sync::Arc;

use survival_core::{EffectKind, ProfessionProgress, StatKind, VitalsView};

/// Data every HUD element renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct HudView {
    pub vitals: VitalsView,
    pub effects: Vec<EffectKind>,
    pub speed_multiplier: f64,
    pub professions: Vec<ProfessionProgress>,
}

/// One rendered HUD line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudLine {
    pub element: &'static str,
    pub text: String,
}

pub trait HudElement: Send + Sync {
    fn name(&self) -> &'static str;

    fn render(&self, view: &HudView) -> Option<String>;
}

/// Ordered collection of HUD elements.
#[derive(Clone, Default)]
pub struct CompositeHud {
    elements: Vec<Arc<dyn HudElement>>,
}

impl CompositeHud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vitals bars, active effects, speed and profession levels.
    pub fn standard() -> Self {
        Self::new()
            .with(VitalsBars::default())
            .with(EffectList)
            .with(SpeedReadout)
            .with(ProfessionLevels)
    }

    pub fn with(mut self, element: impl HudElement + 'static) -> Self {
        self.elements.push(Arc::new(element));
        self
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn render(&self, view: &HudView) -> Vec<HudLine> {
        self.elements
            .iter()
            .filter_map(|element| {
                element.render(view).map(|text| HudLine {
                    element: element.name(),
                    text,
                })
            })
            .collect()
    }
}

/// `hunger [#######---] 72/100` for each stat.
#[derive(Debug, Clone, Copy)]
pub struct VitalsBars {
    pub width: usize,
}

impl Default for VitalsBars {
    fn default() -> Self {
        Self { width: 10 }
    }
}

impl HudElement for VitalsBars {
    fn name(&self) -> &'static str {
        "vitals"
    }

    fn render(&self, view: &HudView) -> Option<String> {
        let mut out = String::new();
        for stat in StatKind::ALL {
            let values = view.vitals.get(stat);
            let filled = ((values.percent / 100.0) * self.width as f64).round() as usize;
            let filled = filled.min(self.width);
            if !out.is_empty() {
                out.push_str("  ");
            }
            let _ = write!(
                out,
                "{stat} [{}{}] {:.0}/{:.0}",
                "#".repeat(filled),
                "-".repeat(self.width - filled),
                values.value,
                values.max
            );
        }
        Some(out)
    }
}

/// Comma-separated active effects, debuffs first.
#[derive(Debug, Clone, Copy)]
pub struct EffectList;

impl HudElement for EffectList {
    fn name(&self) -> &'static str {
        "effects"
    }

    fn render(&self, view: &HudView) -> Option<String> {
        if view.effects.is_empty() {
            return None;
        }
        let names: Vec<_> = view.effects.iter().map(|effect| effect.to_string()).collect();
        Some(names.join(", "))
    }
}

/// Speed multiplier, hidden while unmodified.
#[derive(Debug, Clone, Copy)]
pub struct SpeedReadout;

impl HudElement for SpeedReadout {
    fn name(&self) -> &'static str {
        "speed"
    }

    fn render(&self, view: &HudView) -> Option<String> {
        ((view.speed_multiplier - 1.0).abs() > f64::EPSILON)
            .then(|| format!("speed x{:.2}", view.speed_multiplier))
    }
}

/// Levels of every profession above level 1.
#[derive(Debug, Clone, Copy)]
pub struct ProfessionLevels;

impl HudElement for ProfessionLevels {
    fn name(&self) -> &'static str {
        "professions"
    }

    fn render(&self, view: &HudView) -> Option<String> {
        let trained: Vec<_> = view
            .professions
            .iter()
            .filter(|progress| progress.level > 1)
            .map(|progress| format!("{} {}", progress.profession, progress.level))
            .collect();
        (!trained.is_empty()).then(|| trained.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survival_core::{ActivityState, PlayerId, Profession, StatView};

    fn view() -> HudView {
        let stat = |value: f64| StatView {
            value,
            max: 100.0,
            percent: value,
        };
        HudView {
            vitals: VitalsView {
                player: PlayerId(1),
                activity: ActivityState::Walking,
                hunger: stat(72.0),
                thirst: stat(20.0),
                energy: stat(100.0),
            },
            effects: vec![EffectKind::Dehydrated],
            speed_multiplier: 0.6,
            professions: vec![ProfessionProgress {
                profession: Profession::Mining,
                level: 12,
                xp: 5_000,
                xp_into_level: 10,
                xp_to_next_level: Some(90),
            }],
        }
    }

    #[test]
    fn standard_hud_renders_every_element() {
        let lines = CompositeHud::standard().render(&view());
        let elements: Vec<_> = lines.iter().map(|line| line.element).collect();
        assert_eq!(elements, vec!["vitals", "effects", "speed", "professions"]);
        assert_eq!(
            lines[0].text,
            "hunger [#######---] 72/100  thirst [##--------] 20/100  energy [##########] 100/100"
        );
        assert_eq!(lines[1].text, "dehydrated");
        assert_eq!(lines[2].text, "speed x0.60");
        assert_eq!(lines[3].text, "mining 12");
    }

    #[test]
    fn quiet_elements_are_skipped() {
        let mut calm = view();
        calm.effects.clear();
        calm.speed_multiplier = 1.0;
        calm.professions.clear();
        let lines = CompositeHud::standard().render(&calm);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].element, "vitals");
    }
}
