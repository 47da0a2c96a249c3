//! fOS DOM - Document Object Model
//!
//! Arena-based DOM tree. Node handles are plain indices that stay valid
//! for the lifetime of the tree: removing a node only detaches it, so a
//! stale handle can always be checked with [`DomTree::is_connected`].

mod interner;
mod node;
mod tree;
mod document;
mod geometry;
mod style;
mod dom_events;
mod observer;
pub mod forms;

use std::fmt;

pub use interner::{InternedString, StringInterner};
pub use node::{Node, NodeData, ElementData, Attribute, TextData};
pub use tree::DomTree;
pub use document::Document;
pub use geometry::DOMRect;
pub use style::{ComputedStyle, Display, Visibility};
pub use dom_events::{DomEvent, DomEventType, ScrollBehavior, ScrollBlock};
pub use observer::{MutationObserver, MutationObserverInit, MutationRecord, MutationType, ObserverId};
pub use forms::{InputType, ControlState, MediaState};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check this is not the sentinel
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            write!(f, "#none")
        }
    }
}

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    #[error("Hierarchy request error")]
    HierarchyRequest,

    #[error("Node {0} is not a child of {1}")]
    NotAChild(NodeId, NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),
}

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;
