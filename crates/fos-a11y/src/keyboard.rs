//! Keyboard input

use fos_dom::NodeId;

/// Keys the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Space,
    Escape,
    Tab,
    /// Anything else; passed through to the page
    Other,
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` value
    pub fn parse(key: &str) -> Self {
        match key {
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            "Enter" => Self::Enter,
            " " | "Spacebar" | "Space" => Self::Space,
            "Escape" | "Esc" => Self::Escape,
            "Tab" => Self::Tab,
            _ => Self::Other,
        }
    }

    pub fn is_arrow(self) -> bool {
        matches!(self, Self::ArrowUp | Self::ArrowDown | Self::ArrowLeft | Self::ArrowRight)
    }

    /// +1 for down / right, -1 for up / left
    pub fn step(self) -> Option<isize> {
        match self {
            Self::ArrowDown | Self::ArrowRight => Some(1),
            Self::ArrowUp | Self::ArrowLeft => Some(-1),
            _ => None,
        }
    }
}

/// Key press with the element that had native focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub target: Option<NodeId>,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self { key, target: None }
    }

    pub fn on(key: Key, target: NodeId) -> Self {
        Self { key, target: Some(target) }
    }
}

/// Whether the overlay consumed the key (`preventDefault`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
}

impl KeyOutcome {
    pub fn is_handled(self) -> bool {
        self == Self::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dom_keys() {
        assert_eq!(Key::parse("ArrowDown"), Key::ArrowDown);
        assert_eq!(Key::parse("Esc"), Key::Escape);
        assert_eq!(Key::parse(" "), Key::Space);
        assert_eq!(Key::parse("a"), Key::Other);
        assert_eq!(Key::ArrowLeft.step(), Some(-1));
        assert_eq!(Key::Enter.step(), None);
        assert!(Key::ArrowUp.is_arrow());
    }
}
