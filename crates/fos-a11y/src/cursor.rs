//! Virtual cursor
//!
//! A position over the active readable set, independent of native focus.
//! Nested overlay scopes push a frame holding the outer set and position;
//! closing the overlay pops it.

use fos_dom::NodeId;

use crate::readable::{ReadableEntry, ReadableSet};

#[derive(Debug, Clone)]
struct Frame {
    /// `None` is the unset state
    position: Option<usize>,
    set: ReadableSet,
    /// Overlay root owning this frame, `None` for the global frame
    overlay: Option<NodeId>,
}

/// Cursor with a stack of saved scopes
#[derive(Debug, Clone)]
pub struct VirtualCursor {
    current: Frame,
    saved: Vec<Frame>,
}

impl VirtualCursor {
    /// Unset cursor over `set`
    pub fn new(set: ReadableSet) -> Self {
        Self {
            current: Frame { position: None, set, overlay: None },
            saved: Vec::new(),
        }
    }

    pub fn position(&self) -> Option<usize> {
        self.current.position
    }

    pub fn set(&self) -> &ReadableSet {
        &self.current.set
    }

    /// Entry under the cursor
    pub fn current(&self) -> Option<&ReadableEntry> {
        self.current.position.and_then(|p| self.current.set.get(p))
    }

    /// Overlay of the active scope
    pub fn overlay(&self) -> Option<NodeId> {
        self.current.overlay
    }

    /// Number of saved frames
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Overlay roots of every open scope, outermost first
    pub fn overlays(&self) -> Vec<NodeId> {
        self.saved
            .iter()
            .chain(std::iter::once(&self.current))
            .filter_map(|f| f.overlay)
            .collect()
    }

    /// Overlay owning the frame below the current one
    pub fn parent_overlay(&self) -> Option<NodeId> {
        self.saved.last().and_then(|f| f.overlay)
    }

    /// Move with wraparound; from unset the cursor lands on 0
    pub fn move_by(&mut self, step: isize) -> Option<usize> {
        let len = self.current.set.len();
        if len == 0 {
            self.current.position = None;
            return None;
        }
        let next = match self.current.position {
            None => 0,
            Some(p) => (p.min(len - 1) as isize + step).rem_euclid(len as isize) as usize,
        };
        self.current.position = Some(next);
        Some(next)
    }

    /// Jump to a position; out of range leaves the cursor untouched
    pub fn move_to(&mut self, position: usize) -> Option<usize> {
        if position >= self.current.set.len() {
            return None;
        }
        self.current.position = Some(position);
        Some(position)
    }

    /// Back to the unset state
    pub fn reset(&mut self) {
        self.current.position = None;
    }

    /// Swap in a rebuilt set for the active scope, following the current node
    pub fn replace_set(&mut self, set: ReadableSet) {
        let node = self.current().map(|e| e.node);
        self.current.position = match (node.and_then(|n| set.position_of(n)), self.current.position) {
            (Some(p), _) => Some(p),
            (None, Some(p)) if p < set.len() => Some(p),
            _ => None,
        };
        self.current.set = set;
    }

    /// Push the active scope and start at 0 of the overlay's set
    pub fn enter_nested(&mut self, set: ReadableSet, overlay: NodeId) {
        let position = if set.is_empty() { None } else { Some(0) };
        let outer = std::mem::replace(&mut self.current, Frame { position, set, overlay: Some(overlay) });
        self.saved.push(outer);
        tracing::debug!("Entered scope {} at depth {}", overlay, self.saved.len());
    }

    /// Pop one scope, install the rebuilt outer set and clamp
    ///
    /// Without a saved frame the cursor lands on 0 of `rebuilt`.
    pub fn exit_nested(&mut self, rebuilt: ReadableSet) -> Option<usize> {
        let (saved, overlay) = match self.saved.pop() {
            Some(frame) => (frame.position, frame.overlay),
            None => (None, None),
        };
        let position = match saved {
            Some(p) if p < rebuilt.len() => Some(p),
            _ if rebuilt.is_empty() => None,
            _ => Some(0),
        };
        self.current = Frame { position, set: rebuilt, overlay };
        tracing::debug!("Left scope, depth {}, position {:?}", self.saved.len(), position);
        position
    }

    /// Drop every nested scope and install `global`, unset
    pub fn reset_to(&mut self, global: ReadableSet) {
        self.saved.clear();
        self.current = Frame { position: None, set: global, overlay: None };
    }
}
