//! Overlay detection
//!
//! Host pages open modals, collapses and menus with their own scripts and
//! emit no common event. An overlay is found by markup signature, checked in
//! a fixed priority order, and only counts while it is rendered.

use fos_dom::{Document, DomTree, MutationObserverInit, NodeId, ObserverId};

use crate::aria::{self, AriaRole};
use crate::config::OverlayConfig;
use crate::visibility::is_rendered;

/// Attributes whose change can open or close an overlay
const WATCHED_ATTRIBUTES: &[&str] = &["class", "style", "open", "hidden", "aria-hidden", "aria-expanded", "aria-modal"];

/// Signature tier of an element, lower is higher priority
fn tier(tree: &DomTree, config: &OverlayConfig, node: NodeId) -> Option<u8> {
    let class = |c: &str| tree.has_class(node, c);
    if (class("modal") && class("show"))
        || (tree.has_tag(node, "dialog") && tree.has_attr(node, "open"))
        || aria::is_true(tree, node, "aria-modal")
        || tree.has_attr(node, "data-a11y-modal")
        || class("modal")
        || class("popup")
        || class("drawer")
        || class("overlay")
        || tree.has_attr(node, "data-modal")
    {
        return Some(1);
    }
    if (class("collapse") || class("dropdown-menu")) && class("show") {
        return Some(2);
    }
    if config.side_menu_id.as_deref().is_some_and(|id| tree.attr(node, "id") == Some(id))
        && (class("active") || class("open") || aria::is_true(tree, node, "aria-expanded"))
    {
        return Some(3);
    }
    if AriaRole::of(tree, node).is_some_and(|r| r.is_dialog()) {
        return Some(4);
    }
    None
}

fn in_widget(tree: &DomTree, config: &OverlayConfig, node: NodeId) -> bool {
    tree.closest(node, |t, n| t.attr(n, "id") == Some(config.widget_id.as_str())).is_some()
}

/// Every rendered overlay, by tier then document order
pub fn opened_overlays(doc: &Document, config: &OverlayConfig) -> Vec<NodeId> {
    let tree = &doc.tree;
    let mut found: Vec<(u8, NodeId)> = tree
        .descendants(tree.root())
        .filter(|&n| tree.is_element(n))
        .filter_map(|n| tier(tree, config, n).map(|t| (t, n)))
        .filter(|&(_, n)| !in_widget(tree, config, n) && is_rendered(tree, n))
        .collect();
    // Stable sort keeps document order within a tier
    found.sort_by_key(|&(t, _)| t);
    found.into_iter().map(|(_, n)| n).collect()
}

/// Highest-priority rendered overlay
pub fn find_opened_overlay(doc: &Document, config: &OverlayConfig) -> Option<NodeId> {
    opened_overlays(doc, config).into_iter().next()
}

/// Overlay still matches a signature and is rendered
pub fn is_overlay_open(doc: &Document, config: &OverlayConfig, overlay: NodeId) -> bool {
    tier(&doc.tree, config, overlay).is_some() && is_rendered(&doc.tree, overlay)
}

/// Reactive watch over overlay roots, with a polling fallback
#[derive(Debug, Default)]
pub struct OverlayWatch {
    observer: Option<ObserverId>,
    watched: Vec<NodeId>,
    seen_generation: u64,
}

impl OverlayWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe attribute changes on `targets` and removal from their parents
    pub fn arm(&mut self, tree: &mut DomTree, targets: &[NodeId]) {
        self.disarm(tree);
        let Some((&first, rest)) = targets.split_first() else {
            return;
        };
        let observer = tree.observe(first, MutationObserverInit::attributes(WATCHED_ATTRIBUTES));
        for &target in rest {
            tree.observe_more(observer, target, MutationObserverInit::attributes(WATCHED_ATTRIBUTES));
        }
        for &target in targets {
            if let Some(parent) = tree.parent(target) {
                let removal = MutationObserverInit { child_list: true, ..MutationObserverInit::default() };
                tree.observe_more(observer, parent, removal);
            }
        }
        tracing::debug!("Watching {} overlay roots", targets.len());
        self.observer = Some(observer);
        self.watched = targets.to_vec();
        self.seen_generation = tree.generation();
    }

    pub fn disarm(&mut self, tree: &mut DomTree) {
        if let Some(observer) = self.observer.take() {
            tree.disconnect(observer);
        }
        self.watched.clear();
    }

    pub fn is_armed(&self) -> bool {
        self.observer.is_some()
    }

    pub fn watched(&self) -> &[NodeId] {
        &self.watched
    }

    /// Drain queued records; true if any arrived
    pub fn has_changes(&mut self, tree: &mut DomTree) -> bool {
        match self.observer {
            Some(observer) => !tree.take_records(observer).is_empty(),
            None => false,
        }
    }

    /// Polling fallback: the tree mutated since the last check
    pub fn generation_changed(&mut self, tree: &DomTree) -> bool {
        let current = tree.generation();
        let changed = current != self.seen_generation;
        self.seen_generation = current;
        changed
    }
}
