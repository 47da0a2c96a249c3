//! DOM Events
//!
//! Interaction events raised on the tree. Host page scripts drain them
//! with [`DomTree::take_events`](crate::DomTree::take_events) and react.

use crate::NodeId;

/// DOM event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEventType {
    Click,
    Focus,
    Blur,
    Change,
    Play,
    Pause,
    ScrollIntoView,
}

/// Scroll behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollBehavior {
    #[default]
    Auto,
    Smooth,
}

/// Vertical alignment for scrollIntoView
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollBlock {
    #[default]
    Start,
    Center,
    End,
    Nearest,
}

/// DOM event
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    pub event_type: DomEventType,
    pub target: NodeId,
    /// Sequence number within the tree
    pub timestamp: u64,
    pub scroll: Option<(ScrollBehavior, ScrollBlock)>,
}

impl DomEvent {
    /// Create a plain event
    pub fn new(event_type: DomEventType, target: NodeId, timestamp: u64) -> Self {
        Self { event_type, target, timestamp, scroll: None }
    }

    /// Create a scrollIntoView event
    pub fn scroll_into_view(target: NodeId, behavior: ScrollBehavior, block: ScrollBlock, timestamp: u64) -> Self {
        Self {
            event_type: DomEventType::ScrollIntoView,
            target,
            timestamp,
            scroll: Some((behavior, block)),
        }
    }

    /// Check the event type
    #[inline]
    pub fn is(&self, event_type: DomEventType) -> bool {
        self.event_type == event_type
    }
}
