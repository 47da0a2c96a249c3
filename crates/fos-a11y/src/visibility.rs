//! Eligibility predicate
//!
//! One predicate decides whether an element may be exposed to speech. It is
//! shared by the readable-set builder, read-selection and overlay titles.
//! Verdicts are cached per build pass, keyed by node; a fresh
//! [`Eligibility`] is created for every rebuild.

use std::collections::HashMap;

use fos_dom::{Document, DomTree, NodeId, Visibility};

use crate::aria;
use crate::config::OverlayConfig;

/// Region a build pass scans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanScope {
    /// Whole document minus the widget and the side menu
    Global,
    /// One overlay root; ancestor walks stop at it
    Within(NodeId),
}

impl ScanScope {
    pub fn root(self, doc: &Document) -> NodeId {
        match self {
            Self::Global => doc.body(),
            Self::Within(root) => root,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Verdict {
    excluded: bool,
    visible: bool,
}

/// Cached eligibility for one build pass
pub struct Eligibility<'a> {
    doc: &'a Document,
    config: &'a OverlayConfig,
    scope: ScanScope,
    cache: HashMap<NodeId, Verdict>,
}

impl<'a> Eligibility<'a> {
    pub fn new(doc: &'a Document, config: &'a OverlayConfig, scope: ScanScope) -> Self {
        Self { doc, config, scope, cache: HashMap::new() }
    }

    pub fn scope(&self) -> ScanScope {
        self.scope
    }

    /// Element may be read: in scope, not excluded, visible and sized
    pub fn is_eligible(&mut self, node: NodeId) -> bool {
        let doc = self.doc;
        let tree = &doc.tree;
        if !tree.is_element(node) || !tree.is_connected(node) {
            return false;
        }
        if let ScanScope::Within(root) = self.scope {
            if !tree.contains(root, node) {
                return false;
            }
        }
        let verdict = self.verdict(node);
        !verdict.excluded && verdict.visible && has_box(tree, node)
    }

    /// Opted out, hidden, or inside the widget (ignores sizing)
    pub fn is_excluded(&mut self, node: NodeId) -> bool {
        self.verdict(node).excluded
    }

    fn boundary(&self) -> NodeId {
        match self.scope {
            ScanScope::Global => NodeId::NONE,
            ScanScope::Within(root) => self.doc.tree.parent(root).unwrap_or(NodeId::NONE),
        }
    }

    fn verdict(&mut self, node: NodeId) -> Verdict {
        if let Some(v) = self.cache.get(&node) {
            return *v;
        }
        let doc = self.doc;
        let tree = &doc.tree;
        let boundary = self.boundary();

        // Collect the uncached chain, nearest first
        let mut chain = Vec::new();
        let mut inherited = Verdict { excluded: false, visible: true };
        for ancestor in std::iter::once(node).chain(tree.ancestors(node)) {
            if ancestor == boundary {
                break;
            }
            if let Some(v) = self.cache.get(&ancestor) {
                inherited = *v;
                break;
            }
            chain.push(ancestor);
        }

        for &n in chain.iter().rev() {
            inherited = Verdict {
                excluded: inherited.excluded || self.excludes_itself(tree, n),
                visible: resolve_visibility(tree, n, inherited.visible),
            };
            self.cache.insert(n, inherited);
        }
        inherited
    }

    fn excludes_itself(&self, tree: &DomTree, n: NodeId) -> bool {
        if !tree.is_element(n) {
            return false;
        }
        if tree.attr(n, &self.config.opt_out_attr).is_some_and(|v| v.trim() == "false") {
            return true;
        }
        if aria::is_true(tree, n, "aria-hidden") || tree.has_attr(n, "hidden") {
            return true;
        }
        if let Some(id) = tree.attr(n, "id") {
            if id == self.config.widget_id {
                return true;
            }
            if self.scope == ScanScope::Global && self.config.side_menu_id.as_deref() == Some(id) {
                return true;
            }
        }
        hides_subtree(tree, n)
    }
}

/// `display: none` or zero opacity removes the element and its subtree
fn hides_subtree(tree: &DomTree, n: NodeId) -> bool {
    tree.style(n).is_some_and(|s| s.is_display_none() || s.is_transparent())
}

/// Nearest explicit `visibility` wins over the inherited value
fn resolve_visibility(tree: &DomTree, n: NodeId, inherited: bool) -> bool {
    tree.style(n).and_then(|s| s.visibility).map_or(inherited, Visibility::is_visible)
}

/// Unknown layout counts as rendered
fn has_box(tree: &DomTree, node: NodeId) -> bool {
    !tree.layout_rect(node).is_some_and(|r| r.is_empty())
}

/// Rendered on screen: connected, displayed, visible, opaque, non-empty box
pub fn is_rendered(tree: &DomTree, node: NodeId) -> bool {
    if !tree.is_element(node) || !tree.is_connected(node) {
        return false;
    }
    let chain: Vec<NodeId> = std::iter::once(node).chain(tree.ancestors(node)).collect();
    if chain.iter().any(|&n| hides_subtree(tree, n)) {
        return false;
    }
    let visible = chain.iter().rev().fold(true, |inherited, &n| resolve_visibility(tree, n, inherited));
    visible && has_box(tree, node)
}

/// Node must never be spoken (selection anchors, overlay titles)
pub fn should_ignore(doc: &Document, config: &OverlayConfig, node: NodeId) -> bool {
    let target = if doc.tree.is_element(node) {
        node
    } else {
        match doc.tree.parent(node) {
            Some(p) => p,
            None => return true,
        }
    };
    Eligibility::new(doc, config, ScanScope::Global).is_excluded(target)
}
