//! Resources and exercise side panels.
//!
//! Both panels are rebuilt from scratch each time a reply carries their block,
//! and are independent: showing one never hides the other.

use crate::payload::{ExerciseBlock, ResourceBlock, ResourceItem};

pub const BREATHE_IN: &str = "Breathe in as it expands";
pub const BREATHE_OUT: &str = "Breathe out as it contracts";

/// Optional line under a resource, in display order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceDetail {
    Website(String),
    Contact(String),
    Helpline(String),
}

impl ResourceDetail {
    pub fn label(&self) -> String {
        match self {
            ResourceDetail::Website(_) => "Visit Website".to_string(),
            ResourceDetail::Contact(contact) => format!("Contact: {}", contact),
            ResourceDetail::Helpline(helpline) => format!("Helpline: {}", helpline),
        }
    }

    /// Link target, for details that have one
    pub fn url(&self) -> Option<&str> {
        match self {
            ResourceDetail::Website(url) => Some(url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceItemView {
    pub name: String,
    pub description: String,
    pub details: Vec<ResourceDetail>,
}

impl From<&ResourceItem> for ResourceItemView {
    fn from(item: &ResourceItem) -> Self {
        let details = [
            item.website.clone().map(ResourceDetail::Website),
            item.contact.clone().map(ResourceDetail::Contact),
            item.helpline.clone().map(ResourceDetail::Helpline),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcesPanel {
    pub summary: String,
    pub items: Vec<ResourceItemView>,
}

/// Expanding/contracting circle shown next to breathing exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreathingGuide;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathPhase {
    Expand,
    Contract,
}

impl BreathingGuide {
    /// Ticks spent in each phase
    pub const PHASE_TICKS: u64 = 13;

    pub fn instructions(&self) -> [&'static str; 2] {
        [BREATHE_IN, BREATHE_OUT]
    }

    pub fn phase(&self, tick: u64) -> BreathPhase {
        if (tick / Self::PHASE_TICKS) % 2 == 0 {
            BreathPhase::Expand
        } else {
            BreathPhase::Contract
        }
    }

    /// Circle size in `0..=PHASE_TICKS`, rising while expanding
    pub fn size(&self, tick: u64) -> u64 {
        let step = tick % Self::PHASE_TICKS;
        match self.phase(tick) {
            BreathPhase::Expand => step,
            BreathPhase::Contract => Self::PHASE_TICKS - step,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExercisePanel {
    pub name: String,
    pub description: String,
    pub benefits: String,
    pub breathing_guide: Option<BreathingGuide>,
}

impl ExercisePanel {
    pub fn benefits_line(&self) -> String {
        format!("Benefits: {}", self.benefits)
    }
}

impl From<&ExerciseBlock> for ExercisePanel {
    fn from(block: &ExerciseBlock) -> Self {
        let is_breathing = [&block.name, &block.description]
            .iter()
            .any(|s| s.to_lowercase().contains("breath"));

        Self {
            name: block.name.clone(),
            description: block.description.clone(),
            benefits: block.benefits.clone(),
            breathing_guide: is_breathing.then_some(BreathingGuide),
        }
    }
}

/// The two side panels; a panel is visible iff it holds content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panels {
    resources: Option<ResourcesPanel>,
    exercise: Option<ExercisePanel>,
}

impl Panels {
    pub fn show_resources(&mut self, block: &ResourceBlock) {
        self.resources = Some(ResourcesPanel {
            summary: block.message.clone(),
            items: block.resources.iter().map(ResourceItemView::from).collect(),
        });
    }

    pub fn show_exercise(&mut self, block: &ExerciseBlock) {
        self.exercise = Some(ExercisePanel::from(block));
    }

    pub fn close_resources(&mut self) {
        self.resources = None;
    }

    pub fn close_exercise(&mut self) {
        self.exercise = None;
    }

    pub fn hide_all(&mut self) {
        self.resources = None;
        self.exercise = None;
    }

    pub fn resources(&self) -> Option<&ResourcesPanel> {
        self.resources.as_ref()
    }

    pub fn exercise(&self) -> Option<&ExercisePanel> {
        self.exercise.as_ref()
    }

    pub fn any_visible(&self) -> bool {
        self.resources.is_some() || self.exercise.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(name: &str, description: &str) -> ExerciseBlock {
        ExerciseBlock {
            name: name.to_string(),
            description: description.to_string(),
            benefits: "Reduces stress".to_string(),
        }
    }

    #[test]
    fn test_resource_details_in_fixed_order() {
        let block = ResourceBlock {
            message: "These resources can provide immediate support:".to_string(),
            resources: vec![
                ResourceItem {
                    name: "NAMI".to_string(),
                    description: "Advocacy and support".to_string(),
                    website: Some("https://www.nami.org/".to_string()),
                    contact: Some("info@nami.org".to_string()),
                    helpline: Some("1-800-950-6264".to_string()),
                },
                ResourceItem {
                    name: "Headspace".to_string(),
                    description: "Meditation app".to_string(),
                    website: None,
                    contact: None,
                    helpline: None,
                },
            ],
        };

        let mut panels = Panels::default();
        panels.show_resources(&block);
        let panel = panels.resources().unwrap();
        assert_eq!(panel.summary, "These resources can provide immediate support:");
        assert_eq!(panel.items[0].name, "NAMI");
        let labels: Vec<_> = panel.items[0].details.iter().map(|d| d.label()).collect();
        assert_eq!(
            labels,
            vec!["Visit Website", "Contact: info@nami.org", "Helpline: 1-800-950-6264"]
        );
        assert_eq!(panel.items[0].details[0].url(), Some("https://www.nami.org/"));
        assert!(panel.items[1].details.is_empty());
    }

    #[test]
    fn test_breathing_guide_from_description() {
        let panel = ExercisePanel::from(&exercise(
            "Calming Routine",
            "Try these breathing exercises before bed",
        ));
        assert_eq!(panel.breathing_guide, Some(BreathingGuide));
        assert_eq!(panel.benefits_line(), "Benefits: Reduces stress");
    }

    #[test]
    fn test_breathing_guide_case_insensitive_name() {
        let panel = ExercisePanel::from(&exercise("Box Breathing", "Inhale for 4 counts"));
        assert!(panel.breathing_guide.is_some());
    }

    #[test]
    fn test_no_breathing_guide() {
        let panel = ExercisePanel::from(&exercise("Gratitude Journal", "Write down three things"));
        assert!(panel.breathing_guide.is_none());
    }

    #[test]
    fn test_panels_are_independent() {
        let mut panels = Panels::default();
        panels.show_exercise(&exercise("Body Scan", "Notice each part of your body"));
        panels.show_resources(&ResourceBlock {
            message: "Resources".to_string(),
            resources: Vec::new(),
        });
        assert!(panels.exercise().is_some());
        assert!(panels.resources().is_some());

        panels.close_resources();
        assert!(panels.exercise().is_some());
        assert!(panels.resources().is_none());
    }

    #[test]
    fn test_breath_phases() {
        let guide = BreathingGuide;
        assert_eq!(guide.phase(0), BreathPhase::Expand);
        assert_eq!(guide.phase(BreathingGuide::PHASE_TICKS), BreathPhase::Contract);
        assert_eq!(guide.size(0), 0);
        assert_eq!(guide.size(BreathingGuide::PHASE_TICKS), BreathingGuide::PHASE_TICKS);
        assert!(guide.size(BreathingGuide::PHASE_TICKS + 5) < BreathingGuide::PHASE_TICKS);
    }
}
