//! ARIA Support
//!
//! The roles and states the overlay reads from host markup.

use fos_dom::{DomTree, NodeId};

/// ARIA role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AriaRole {
    Button,
    Link,
    Dialog,
    AlertDialog,
    Heading,
    Region,
    Img,
    Slider,
    TextBox,
    Menu,
    Navigation,
    Presentation,
}

impl AriaRole {
    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_lowercase().as_str() {
            "button" => Self::Button,
            "link" => Self::Link,
            "dialog" => Self::Dialog,
            "alertdialog" => Self::AlertDialog,
            "heading" => Self::Heading,
            "region" => Self::Region,
            "img" => Self::Img,
            "slider" => Self::Slider,
            "textbox" => Self::TextBox,
            "menu" => Self::Menu,
            "navigation" => Self::Navigation,
            "none" | "presentation" => Self::Presentation,
            _ => return None,
        })
    }

    /// Read the `role` attribute of an element
    pub fn of(tree: &DomTree, node: NodeId) -> Option<Self> {
        tree.attr(node, "role").and_then(Self::parse)
    }

    /// Dialog-like roles that open an overlay scope
    pub fn is_dialog(&self) -> bool {
        matches!(self, Self::Dialog | Self::AlertDialog)
    }
}

/// `aria-*` boolean state set to `"true"`
pub fn is_true(tree: &DomTree, node: NodeId, attr: &str) -> bool {
    tree.attr(node, attr).is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}
