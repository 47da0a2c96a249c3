//! Readable-set builder
//!
//! Scans the document, or one overlay root, for candidate elements and
//! numbers the eligible ones 1..=N in document order. Sets are rebuilt
//! wholesale; an entry's node must be revalidated with
//! [`DomTree::is_connected`](fos_dom::DomTree::is_connected) before use.

use std::collections::HashSet;

use fos_dom::{Document, DomResult, DomTree, InputType, NodeId};

use crate::classifier::{BADGE_CLASS, Classifier, ElementKind};
use crate::config::OverlayConfig;
use crate::visibility::{Eligibility, ScanScope};

/// Attribute carrying the number on a badge
pub const BADGE_NUMBER_ATTR: &str = "data-a11y-number";

/// One numbered element
#[derive(Debug, Clone, PartialEq)]
pub struct ReadableEntry {
    /// 1-based; 0 is the widget toggle in numbered mode
    pub sequence: usize,
    pub node: NodeId,
    /// Description at build time
    pub text: String,
    pub kind: ElementKind,
    /// Resolved language tag of the element
    pub lang: String,
}

/// Ordered readable elements of one scope
#[derive(Debug, Clone, PartialEq)]
pub struct ReadableSet {
    scope: ScanScope,
    entries: Vec<ReadableEntry>,
}

impl ReadableSet {
    pub fn empty(scope: ScanScope) -> Self {
        Self { scope, entries: Vec::new() }
    }

    pub fn scope(&self) -> ScanScope {
        self.scope
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at a cursor position
    pub fn get(&self, position: usize) -> Option<&ReadableEntry> {
        self.entries.get(position)
    }

    pub fn entries(&self) -> &[ReadableEntry] {
        &self.entries
    }

    /// Entry by its spoken number
    pub fn by_sequence(&self, sequence: usize) -> Option<&ReadableEntry> {
        sequence.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Cursor position of a node
    pub fn position_of(&self, node: NodeId) -> Option<usize> {
        self.entries.iter().position(|e| e.node == node)
    }
}

/// Builds a [`ReadableSet`] for a scope
pub struct ReadableSetBuilder<'a> {
    doc: &'a Document,
    config: &'a OverlayConfig,
    scope: ScanScope,
}

impl<'a> ReadableSetBuilder<'a> {
    pub fn new(doc: &'a Document, config: &'a OverlayConfig) -> Self {
        Self { doc, config, scope: ScanScope::Global }
    }

    pub fn scope(mut self, scope: ScanScope) -> Self {
        self.scope = scope;
        self
    }

    /// Scan and number; identical DOM state yields an identical set
    pub fn build(&self) -> ReadableSet {
        let tree = &self.doc.tree;
        let root = self.scope.root(self.doc);
        let mut eligibility = Eligibility::new(self.doc, self.config, self.scope);
        let classifier = Classifier::new(self.doc, self.config);
        let mut visited = HashSet::new();
        let mut entries = Vec::new();

        let candidates = std::iter::once(root)
            .filter(|_| matches!(self.scope, ScanScope::Within(_)))
            .chain(tree.descendants(root));
        for node in candidates {
            if !tree.is_element(node) || !self.is_candidate(tree, node) {
                continue;
            }
            if !visited.insert(node) || !eligibility.is_eligible(node) {
                continue;
            }
            let Some(classified) = classifier.classify(node) else {
                continue;
            };
            entries.push(ReadableEntry {
                sequence: entries.len() + 1,
                node,
                text: classified.text,
                kind: classified.kind,
                lang: classifier.resolve_lang(node),
            });
        }

        tracing::debug!("Built readable set {:?}: {} entries", self.scope, entries.len());
        ReadableSet { scope: self.scope, entries }
    }

    fn is_candidate(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(tag) = tree.tag_name(node) else {
            return false;
        };
        if tree.has_class(node, BADGE_CLASS) {
            return false;
        }
        match tag {
            "p" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "button" | "a" | "textarea" | "select"
            | "table" | "fieldset" | "legend" | "audio" | "video" => return true,
            "img" => return tree.has_attr(node, "alt"),
            "input" => return InputType::parse(tree.attr(node, "type").unwrap_or("text")).is_text_like(),
            _ => {}
        }
        tree.has_attr(node, &self.config.readable_attr)
            || tree.attr(node, "role") == Some("button")
            || tree.has_class(node, "question")
            || tree.has_class(node, "quiz")
            || tree.has_class(node, "form-group")
            || tree.has_attr(node, "data-a11y-form")
            || Classifier::new(self.doc, self.config).is_slider(node)
            || (self.scope == ScanScope::Global && is_container(tree, node))
    }
}

/// Page-level containers read as a whole; never scanned inside an overlay
fn is_container(tree: &DomTree, node: NodeId) -> bool {
    ["modal-content", "card", "alert", "well"].iter().any(|c| tree.has_class(node, c))
        || matches!(tree.attr(node, "role"), Some("dialog" | "region"))
}

fn is_void(tree: &DomTree, node: NodeId) -> bool {
    matches!(
        tree.tag_name(node),
        Some("input" | "img" | "select" | "textarea" | "audio" | "video")
    )
}

fn add_badge(tree: &mut DomTree, config: &OverlayConfig, node: NodeId, number: usize) -> DomResult<()> {
    let badge = tree.create_element("div");
    tree.set_attr(badge, "class", BADGE_CLASS)?;
    tree.set_attr(badge, BADGE_NUMBER_ATTR, &number.to_string())?;
    tree.set_attr(badge, "aria-hidden", "true")?;
    let label = tree.create_text(&number.to_string());
    tree.append_child(badge, label)?;

    if is_void(tree, node) {
        let parent = tree.parent(node).ok_or(fos_dom::DomError::HierarchyRequest)?;
        let next = tree.get(node).map_or(NodeId::NONE, |n| n.next_sibling);
        tree.insert_before(parent, badge, next)?;
    } else {
        tree.append_child(node, badge)?;
    }
    tree.set_attr(node, &config.index_attr, &number.to_string())
}

/// Tag numbered elements and the widget toggle (number 0)
pub fn apply_number_badges(doc: &mut Document, config: &OverlayConfig, set: &ReadableSet) -> DomResult<()> {
    clear_number_badges(doc, config)?;
    if let Some(toggle) = doc.get_element_by_id(&config.toggle_id) {
        add_badge(&mut doc.tree, config, toggle, 0)?;
    }
    for entry in set.entries() {
        if doc.tree.is_connected(entry.node) {
            add_badge(&mut doc.tree, config, entry.node, entry.sequence)?;
        }
    }
    Ok(())
}

/// Remove every badge and index marker
pub fn clear_number_badges(doc: &mut Document, config: &OverlayConfig) -> DomResult<()> {
    let tree = &mut doc.tree;
    let root = tree.root();
    for badge in tree.find_all(root, |t, n| t.has_class(n, BADGE_CLASS)) {
        tree.detach(badge)?;
    }
    let index_attr = config.index_attr.as_str();
    for marked in tree.find_all(root, |t, n| t.has_attr(n, index_attr)) {
        tree.remove_attr(marked, index_attr)?;
    }
    Ok(())
}
