//! Navigation state
//!
//! Every mode flag of the overlay in one value. Transitions are pure: the
//! controller applies a [`ModeEvent`], stores the new state and performs the
//! side effects for whatever interaction was left.

use fos_dom::NodeId;

/// Exclusive keyboard interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interaction {
    #[default]
    Browse,
    /// Arrow keys walk the options of a select
    SelectOpen { select: NodeId, option: usize },
    /// Arrow keys drive a carousel
    SliderOpen { slider: NodeId },
    /// Keys go to a focused text control
    InputEdit { input: NodeId },
}

/// Mode flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigationState {
    pub section_reading: bool,
    pub numbered_voice: bool,
    pub flow_reading: bool,
    pub panel_open: bool,
    pub interaction: Interaction,
}

/// Requested mode change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    SetSectionReading(bool),
    SetNumberedVoice(bool),
    SetFlowReading(bool),
    SetPanelOpen(bool),
    OpenSelect { select: NodeId, option: usize },
    MoveSelectOption(usize),
    OpenSlider { slider: NodeId },
    EnterInputEdit { input: NodeId },
    CloseInteraction,
    /// Everything off except the panel
    Reset,
}

/// Result of applying an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: NavigationState,
    /// Interaction that ended with this transition
    pub left: Option<Interaction>,
}

impl NavigationState {
    pub fn select_open(&self) -> bool {
        matches!(self.interaction, Interaction::SelectOpen { .. })
    }

    pub fn slider_open(&self) -> bool {
        matches!(self.interaction, Interaction::SliderOpen { .. })
    }

    pub fn input_edit(&self) -> bool {
        matches!(self.interaction, Interaction::InputEdit { .. })
    }

    /// Apply `event` without side effects
    pub fn apply(&self, event: ModeEvent) -> Transition {
        let mut next = *self;
        let previous = self.interaction;

        match event {
            ModeEvent::SetSectionReading(on) => {
                next.section_reading = on;
                if !on {
                    next.flow_reading = false;
                    next.interaction = Interaction::Browse;
                }
            }
            ModeEvent::SetNumberedVoice(on) => next.numbered_voice = on,
            ModeEvent::SetFlowReading(on) => next.flow_reading = on,
            ModeEvent::SetPanelOpen(open) => next.panel_open = open,
            ModeEvent::OpenSelect { select, option } => {
                next.interaction = Interaction::SelectOpen { select, option };
            }
            ModeEvent::MoveSelectOption(option) => {
                if let Interaction::SelectOpen { select, .. } = previous {
                    next.interaction = Interaction::SelectOpen { select, option };
                    // Moving inside the same select leaves nothing
                    return Transition { state: next, left: None };
                }
            }
            ModeEvent::OpenSlider { slider } => next.interaction = Interaction::SliderOpen { slider },
            ModeEvent::EnterInputEdit { input } => next.interaction = Interaction::InputEdit { input },
            ModeEvent::CloseInteraction => next.interaction = Interaction::Browse,
            ModeEvent::Reset => {
                next = NavigationState { panel_open: self.panel_open, ..NavigationState::default() };
            }
        }

        let left = (previous != Interaction::Browse && previous != next.interaction).then_some(previous);
        Transition { state: next, left }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(n: u32) -> NodeId {
        // Handles only need identity here
        let mut tree = fos_dom::DomTree::new();
        let mut last = tree.root();
        for _ in 0..n {
            last = tree.create_element("div");
        }
        last
    }

    #[test]
    fn test_select_replaces_input_edit() {
        let input = node(1);
        let select = node(2);
        let state = NavigationState::default().apply(ModeEvent::EnterInputEdit { input }).state;
        assert!(state.input_edit());
        let t = state.apply(ModeEvent::OpenSelect { select, option: 0 });
        assert!(t.state.select_open());
        assert!(!t.state.input_edit());
        assert_eq!(t.left, Some(Interaction::InputEdit { input }));
    }

    #[test]
    fn test_move_option_only_inside_select() {
        let select = node(3);
        let browse = NavigationState::default();
        assert_eq!(browse.apply(ModeEvent::MoveSelectOption(2)).state, browse);

        let open = browse.apply(ModeEvent::OpenSelect { select, option: 0 }).state;
        let t = open.apply(ModeEvent::MoveSelectOption(2));
        assert_eq!(t.state.interaction, Interaction::SelectOpen { select, option: 2 });
        assert_eq!(t.left, None);
    }

    #[test]
    fn test_section_off_clears_flow_and_interaction() {
        let slider = node(4);
        let state = NavigationState { section_reading: true, flow_reading: true, ..Default::default() }
            .apply(ModeEvent::OpenSlider { slider })
            .state;
        let t = state.apply(ModeEvent::SetSectionReading(false));
        assert!(!t.state.section_reading);
        assert!(!t.state.flow_reading);
        assert_eq!(t.state.interaction, Interaction::Browse);
        assert_eq!(t.left, Some(Interaction::SliderOpen { slider }));
    }

    #[test]
    fn test_reset_keeps_panel() {
        let state = NavigationState {
            section_reading: true,
            numbered_voice: true,
            flow_reading: true,
            panel_open: true,
            interaction: Interaction::Browse,
        };
        let t = state.apply(ModeEvent::Reset);
        assert_eq!(t.state, NavigationState { panel_open: true, ..Default::default() });
        assert_eq!(t.left, None);
    }

    #[test]
    fn test_at_most_one_interaction() {
        let (a, b, c) = (node(1), node(2), node(3));
        let events = [
            ModeEvent::EnterInputEdit { input: a },
            ModeEvent::OpenSlider { slider: b },
            ModeEvent::OpenSelect { select: c, option: 0 },
            ModeEvent::CloseInteraction,
        ];
        let mut state = NavigationState::default();
        for event in events {
            state = state.apply(event).state;
            let active = [state.select_open(), state.slider_open(), state.input_edit()]
                .iter()
                .filter(|b| **b)
                .count();
            assert!(active <= 1);
        }
        assert_eq!(state.interaction, Interaction::Browse);
    }
}
