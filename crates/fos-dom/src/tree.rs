//! DOM Tree (arena-based allocation)
//!
//! Nodes are never freed. A removed node keeps its id and its own subtree,
//! it is only unlinked from its parent, so handles held elsewhere can be
//! revalidated with [`DomTree::is_connected`].

use crate::{
    ComputedStyle, DOMRect, DomError, DomEvent, DomEventType, DomResult, InternedString,
    MutationObserver, MutationObserverInit, MutationRecord, Node, NodeData, NodeId, ObserverId,
    ScrollBehavior, ScrollBlock, StringInterner,
};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    interner: StringInterner,
    /// Bumped by every mutation
    generation: u64,
    events: Vec<DomEvent>,
    event_seq: u64,
    observers: Vec<Option<MutationObserver>>,
    focused: Option<NodeId>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            interner: StringInterner::new(),
            generation: 0,
            events: Vec::new(),
            event_seq: 0,
            observers: Vec::new(),
            focused: None,
        }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut crate::ElementData> {
        self.get_mut(id)
            .ok_or(DomError::NotFound(id))?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))
    }

    /// Number of nodes ever created
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Only the document node exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Mutation counter
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// String interner
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name = self.interner.intern(&tag.to_ascii_lowercase());
        self.push(Node::element(name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text.to_string()))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::comment(text.to_string()))
    }

    // ------------------------------------------------------------------
    // Structure mutation
    // ------------------------------------------------------------------

    /// Append `child` as last child of `parent`, moving it if attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, NodeId::NONE)
    }

    /// Insert `child` before `reference`; a `NONE` reference appends
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> DomResult<()> {
        let parent_node = self.node(parent)?;
        if matches!(parent_node.data, NodeData::Text(_) | NodeData::Comment(_)) {
            return Err(DomError::HierarchyRequest);
        }
        self.node(child)?;
        if child == NodeId::ROOT || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if reference.is_valid() {
            if reference == child {
                return Err(DomError::HierarchyRequest);
            }
            if self.node(reference)?.parent != parent {
                return Err(DomError::NotAChild(reference, parent));
            }
        }

        self.unlink(child);

        let prev = if reference.is_valid() {
            self.nodes[reference.index()].prev_sibling
        } else {
            self.nodes[parent.index()].last_child
        };

        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        if reference.is_valid() {
            self.nodes[reference.index()].prev_sibling = child;
        } else {
            self.nodes[parent.index()].last_child = child;
        }

        self.notify(MutationRecord::child_list(parent, Some(child), None));
        Ok(())
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.node(child)?.parent != parent {
            return Err(DomError::NotAChild(child, parent));
        }
        self.unlink(child);
        if self.focused.is_some_and(|f| self.contains(child, f)) {
            self.focused = None;
        }
        self.notify(MutationRecord::child_list(parent, None, Some(child)));
        Ok(())
    }

    /// Remove a node from wherever it is attached
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        let parent = self.node(id)?.parent;
        if parent.is_valid() {
            self.remove_child(parent, id)?;
        }
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[id.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return;
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }
        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Parent node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Direct children in order
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).map_or(NodeId::NONE, |n| n.first_child),
        }
    }

    /// Ancestors from parent up to the document node
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id).unwrap_or(NodeId::NONE),
            budget: self.nodes.len(),
        }
    }

    /// Descendants of `root` in document order, `root` excluded
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root,
            next: self.get(root).map_or(NodeId::NONE, |n| n.first_child),
        }
    }

    /// Attached to the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        if id == NodeId::ROOT {
            return true;
        }
        self.get(id).is_some() && self.ancestors(id).any(|a| a == NodeId::ROOT)
    }

    /// `ancestor` is `node` or one of its ancestors
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Nearest inclusive ancestor element matching `pred`
    pub fn closest(&self, id: NodeId, pred: impl Fn(&DomTree, NodeId) -> bool) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.is_element(n) && pred(self, n))
    }

    /// Elements below `root` matching `pred`, in document order
    pub fn find_all(&self, root: NodeId, pred: impl Fn(&DomTree, NodeId) -> bool) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|&n| self.is_element(n) && pred(self, n))
            .collect()
    }

    /// First element below `root` matching `pred`
    pub fn find_first(&self, root: NodeId, pred: impl Fn(&DomTree, NodeId) -> bool) -> Option<NodeId> {
        self.descendants(root)
            .find(|&n| self.is_element(n) && pred(self, n))
    }

    /// First connected element with the given `id` attribute
    pub fn find_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_first(NodeId::ROOT, |t, n| t.attr(n, "id") == Some(id))
    }

    // ------------------------------------------------------------------
    // Elements and attributes
    // ------------------------------------------------------------------

    /// Is an element node
    #[inline]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_element)
    }

    /// Lowercased tag name
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        let el = self.get(id)?.as_element()?;
        Some(self.interner.get(el.name))
    }

    /// Element has the given tag
    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id) == Some(tag)
    }

    fn attr_name(&self, name: &str) -> Option<InternedString> {
        self.interner.lookup(name)
    }

    /// Attribute value
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        let name = self.attr_name(name)?;
        self.get(id)?.as_element()?.get_attr(name)
    }

    /// Attribute present
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set attribute (names are lowercased)
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let lowered = name.to_ascii_lowercase();
        let key = self.interner.intern(&lowered);
        let old = self.element_mut(id)?.set_attr(key, value.to_string());
        self.notify(MutationRecord::attribute(id, &lowered, old));
        Ok(())
    }

    /// Remove attribute, returning its old value
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        let Some(key) = self.attr_name(name) else {
            return Ok(None);
        };
        let old = self.element_mut(id)?.remove_attr(key);
        if old.is_some() {
            self.notify(MutationRecord::attribute(id, name, old.clone()));
        }
        Ok(old)
    }

    /// Tokens of the `class` attribute
    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attr(id, "class").unwrap_or("").split_ascii_whitespace()
    }

    /// Class list contains `class`
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    /// Add a class token
    pub fn add_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let mut list: Vec<&str> = self.classes(id).collect();
        list.push(class);
        let joined = list.join(" ");
        self.set_attr(id, "class", &joined)
    }

    /// Remove a class token
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        if !self.has_class(id, class) {
            return Ok(());
        }
        let joined = self
            .classes(id)
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(id, "class", &joined)
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Replace the data of a text node
    pub fn set_text(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        match &mut self.get_mut(id).ok_or(DomError::NotFound(id))?.data {
            NodeData::Text(t) => t.content = text.to_string(),
            _ => return Err(DomError::HierarchyRequest),
        }
        self.touch();
        Ok(())
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_content_where(id, |_, _| true)
    }

    /// Like `text_content` but skips element subtrees rejected by `keep`
    pub fn text_content_where(&self, id: NodeId, keep: impl Fn(&DomTree, NodeId) -> bool) -> String {
        let mut out = String::new();
        if let Some(text) = self.get(id).and_then(Node::as_text) {
            out.push_str(text);
            return out;
        }
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        while let Some(n) = stack.pop() {
            let Some(node) = self.get(n) else { continue };
            match &node.data {
                NodeData::Text(t) => out.push_str(&t.content),
                NodeData::Element(_) if keep(self, n) => {
                    let start = stack.len();
                    stack.extend(self.children(n));
                    stack[start..].reverse();
                }
                _ => {}
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Style and layout facts
    // ------------------------------------------------------------------

    /// Computed style
    pub fn style(&self, id: NodeId) -> Option<ComputedStyle> {
        self.get(id)?.as_element().map(|e| e.style)
    }

    /// Replace the computed style; observed as a `style` attribute mutation
    pub fn set_style(&mut self, id: NodeId, style: ComputedStyle) -> DomResult<()> {
        self.element_mut(id)?.style = style;
        self.notify(MutationRecord::attribute(id, "style", None));
        Ok(())
    }

    /// Rendered box
    pub fn layout_rect(&self, id: NodeId) -> Option<DOMRect> {
        self.get(id)?.as_element()?.layout
    }

    /// Record the rendered box
    pub fn set_layout_rect(&mut self, id: NodeId, rect: Option<DOMRect>) -> DomResult<()> {
        self.element_mut(id)?.layout = rect;
        self.touch();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Form controls and media
    // ------------------------------------------------------------------

    /// Current value of an input, textarea or select
    pub fn value(&self, id: NodeId) -> String {
        let Some(el) = self.get(id).and_then(Node::as_element) else {
            return String::new();
        };
        if let Some(v) = &el.control.value {
            return v.clone();
        }
        match self.tag_name(id) {
            Some("textarea") => self.text_content(id),
            Some("select") => self
                .selected_index(id)
                .and_then(|i| self.options(id).get(i).copied())
                .map(|opt| {
                    self.attr(opt, "value")
                        .map(str::to_string)
                        .unwrap_or_else(|| self.text_content(opt).trim().to_string())
                })
                .unwrap_or_default(),
            _ => self.attr(id, "value").unwrap_or("").to_string(),
        }
    }

    /// Set the dirty value
    pub fn set_value(&mut self, id: NodeId, value: &str) -> DomResult<()> {
        self.element_mut(id)?.control.value = Some(value.to_string());
        self.touch();
        Ok(())
    }

    /// `<option>` elements of a select, in order
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.find_all(select, |t, n| t.has_tag(n, "option"))
    }

    /// Selected option index, `None` for an empty select
    pub fn selected_index(&self, select: NodeId) -> Option<usize> {
        let options = self.options(select);
        if options.is_empty() {
            return None;
        }
        let explicit = self
            .get(select)
            .and_then(Node::as_element)
            .and_then(|e| e.control.selected_index);
        let index = explicit
            .or_else(|| options.iter().position(|&o| self.has_attr(o, "selected")))
            .unwrap_or(0);
        Some(index.min(options.len() - 1))
    }

    /// Select an option; clears any dirty value so `value` follows the option
    pub fn set_selected_index(&mut self, select: NodeId, index: usize) -> DomResult<()> {
        let el = self.element_mut(select)?;
        el.control.selected_index = Some(index);
        el.control.value = None;
        self.touch();
        Ok(())
    }

    /// Media paused state
    pub fn is_paused(&self, id: NodeId) -> bool {
        self.get(id)
            .and_then(Node::as_element)
            .is_none_or(|e| e.control.media.paused)
    }

    /// Play or pause; raises `Play` / `Pause`
    pub fn set_paused(&mut self, id: NodeId, paused: bool) -> DomResult<()> {
        self.element_mut(id)?.control.media.paused = paused;
        self.touch();
        let kind = if paused { DomEventType::Pause } else { DomEventType::Play };
        self.dispatch(id, kind)
    }

    /// Media duration in seconds
    pub fn duration(&self, id: NodeId) -> Option<f64> {
        self.get(id)?.as_element()?.control.media.duration
    }

    /// Record loaded media metadata
    pub fn set_duration(&mut self, id: NodeId, seconds: Option<f64>) -> DomResult<()> {
        self.element_mut(id)?.control.media.duration = seconds;
        self.touch();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Interaction events
    // ------------------------------------------------------------------

    /// Queue an event on `target`
    pub fn dispatch(&mut self, target: NodeId, event_type: DomEventType) -> DomResult<()> {
        self.node(target)?;
        self.event_seq += 1;
        self.events.push(DomEvent::new(event_type, target, self.event_seq));
        Ok(())
    }

    /// `element.click()`
    pub fn click(&mut self, id: NodeId) -> DomResult<()> {
        tracing::trace!("click {}", id);
        self.dispatch(id, DomEventType::Click)
    }

    /// `element.focus()`; blurs the previous focus
    pub fn focus(&mut self, id: NodeId) -> DomResult<()> {
        self.node(id)?;
        if let Some(prev) = self.focused.filter(|&p| p != id) {
            self.dispatch(prev, DomEventType::Blur)?;
        }
        self.focused = Some(id);
        self.dispatch(id, DomEventType::Focus)
    }

    /// `element.blur()`
    pub fn blur(&mut self, id: NodeId) -> DomResult<()> {
        if self.focused == Some(id) {
            self.focused = None;
            self.dispatch(id, DomEventType::Blur)?;
        }
        Ok(())
    }

    /// Focused element
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// `element.scrollIntoView({behavior, block})`
    pub fn scroll_into_view(&mut self, id: NodeId, behavior: ScrollBehavior, block: ScrollBlock) -> DomResult<()> {
        self.node(id)?;
        self.event_seq += 1;
        self.events.push(DomEvent::scroll_into_view(id, behavior, block, self.event_seq));
        Ok(())
    }

    /// Drain queued events
    pub fn take_events(&mut self) -> Vec<DomEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Mutation observers
    // ------------------------------------------------------------------

    /// Register a new observer on `target`
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) -> ObserverId {
        let mut observer = MutationObserver::new();
        observer.observe(target, options);
        let id = ObserverId(self.observers.len() as u32);
        self.observers.push(Some(observer));
        id
    }

    /// Add another target to an existing observer
    pub fn observe_more(&mut self, observer: ObserverId, target: NodeId, options: MutationObserverInit) {
        if let Some(Some(obs)) = self.observers.get_mut(observer.0 as usize) {
            obs.observe(target, options);
        }
    }

    /// Stop an observer; pending records are dropped
    pub fn disconnect(&mut self, observer: ObserverId) {
        if let Some(slot) = self.observers.get_mut(observer.0 as usize) {
            *slot = None;
        }
    }

    /// Drain an observer's queued records
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        match self.observers.get_mut(observer.0 as usize) {
            Some(Some(obs)) => obs.take_records(),
            _ => Vec::new(),
        }
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    fn notify(&mut self, record: MutationRecord) {
        self.touch();
        let nodes = &self.nodes;
        for observer in self.observers.iter_mut().flatten() {
            observer.offer(&record, |registered| is_ancestor(nodes, registered, record.target));
        }
    }
}

fn is_ancestor(nodes: &[Node], ancestor: NodeId, node: NodeId) -> bool {
    let mut current = node;
    for _ in 0..nodes.len() {
        if current == ancestor {
            return true;
        }
        match nodes.get(current.index()) {
            Some(n) if n.parent.is_valid() => current = n.parent,
            _ => return false,
        }
    }
    false
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        self.next = self.tree.get(current).map_or(NodeId::NONE, |n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over ancestors, bounded by the arena size
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: NodeId,
    budget: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() || self.budget == 0 {
            return None;
        }
        self.budget -= 1;
        let current = self.next;
        self.next = self.tree.get(current).map_or(NodeId::NONE, |n| n.parent);
        Some(current)
    }
}

/// Preorder iterator below a root
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        let node = self.tree.get(current)?;
        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            let mut climb = current;
            loop {
                if climb == self.root {
                    break NodeId::NONE;
                }
                let Some(n) = self.tree.get(climb) else {
                    break NodeId::NONE;
                };
                if n.next_sibling.is_valid() {
                    break n.next_sibling;
                }
                climb = n.parent;
                if !climb.is_valid() || climb == self.root {
                    break NodeId::NONE;
                }
            }
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let div = tree.create_element("DIV");
        let p = tree.create_element("p");
        let text = tree.create_text("Hello");
        tree.append_child(tree.root(), div).unwrap();
        tree.append_child(div, p).unwrap();
        tree.append_child(p, text).unwrap();
        (tree, div, p, text)
    }

    #[test]
    fn test_tag_lowercased() {
        let (tree, div, _, _) = sample();
        assert_eq!(tree.tag_name(div), Some("div"));
    }

    #[test]
    fn test_descendants_preorder() {
        let (mut tree, div, p, text) = sample();
        let span = tree.create_element("span");
        tree.append_child(div, span).unwrap();
        let order: Vec<_> = tree.descendants(tree.root()).collect();
        assert_eq!(order, vec![div, p, text, span]);
        let under_p: Vec<_> = tree.descendants(p).collect();
        assert_eq!(under_p, vec![text]);
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut tree, div, p, _) = sample();
        assert_eq!(tree.append_child(p, div), Err(DomError::HierarchyRequest));
        assert_eq!(tree.append_child(div, div), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn test_remove_keeps_handle() {
        let (mut tree, div, p, text) = sample();
        tree.remove_child(div, p).unwrap();
        assert!(!tree.is_connected(p));
        assert!(!tree.is_connected(text));
        assert_eq!(tree.text_content(p), "Hello");
        assert_eq!(tree.remove_child(div, p), Err(DomError::NotAChild(p, div)));
    }

    #[test]
    fn test_generation_bumps() {
        let (mut tree, div, _, _) = sample();
        let before = tree.generation();
        tree.set_attr(div, "class", "x").unwrap();
        assert!(tree.generation() > before);
    }

    #[test]
    fn test_class_list() {
        let (mut tree, div, _, _) = sample();
        tree.add_class(div, "modal").unwrap();
        tree.add_class(div, "show").unwrap();
        tree.add_class(div, "show").unwrap();
        assert_eq!(tree.attr(div, "class"), Some("modal show"));
        tree.remove_class(div, "modal").unwrap();
        assert_eq!(tree.attr(div, "class"), Some("show"));
    }

    #[test]
    fn test_observer_sees_attribute_change() {
        let (mut tree, div, p, _) = sample();
        let obs = tree.observe(div, MutationObserverInit::attributes(&["class"]));
        tree.set_attr(div, "class", "active").unwrap();
        tree.set_attr(p, "class", "ignored").unwrap();
        let records = tree.take_records(obs);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, div);
    }
}
