//! Comprehensive tests for fos-dom
//!
//! Tree structure, attributes, form state and events as the overlay uses them.

use fos_dom::{
    ComputedStyle, DOMRect, Document, DomEventType, DomTree, MutationObserverInit, MutationType,
    NodeId, ScrollBehavior, ScrollBlock, StringInterner, Visibility,
};

#[test]
fn test_string_interner_deduplication() {
    let mut interner = StringInterner::new();

    let id1 = interner.intern("data-a11y-index");
    let id2 = interner.intern("data-a11y-index");
    assert_eq!(id1, id2, "Same string should return same ID");

    let id3 = interner.intern("data-a11y-number");
    assert_ne!(id1, id3, "Different strings should have different IDs");
}

#[test]
fn test_dom_tree_creation() {
    let mut tree = DomTree::new();

    let div = tree.create_element("div");
    let span = tree.create_element("span");
    let text = tree.create_text("Hello, World!");

    tree.append_child(tree.root(), div).unwrap();
    tree.append_child(div, span).unwrap();
    tree.append_child(span, text).unwrap();

    assert_eq!(tree.len(), 4);

    let div_node = tree.get(div).unwrap();
    assert_eq!(div_node.parent, tree.root());
    assert_eq!(div_node.first_child, span);

    let span_node = tree.get(span).unwrap();
    assert_eq!(span_node.parent, div);
    assert_eq!(span_node.first_child, text);
}

#[test]
fn test_dom_tree_siblings() {
    let mut tree = DomTree::new();

    let div = tree.create_element("div");
    let child1 = tree.create_element("p");
    let child2 = tree.create_element("p");
    let child3 = tree.create_element("p");

    tree.append_child(tree.root(), div).unwrap();
    tree.append_child(div, child1).unwrap();
    tree.append_child(div, child3).unwrap();
    tree.insert_before(div, child2, child3).unwrap();

    let node1 = tree.get(child1).unwrap();
    assert_eq!(node1.next_sibling, child2);
    assert!(!node1.prev_sibling.is_valid());

    let children: Vec<_> = tree.children(div).collect();
    assert_eq!(children, vec![child1, child2, child3]);
}

#[test]
fn test_move_between_parents() {
    let mut tree = DomTree::new();
    let a = tree.create_element("div");
    let b = tree.create_element("div");
    let p = tree.create_element("p");
    tree.append_child(tree.root(), a).unwrap();
    tree.append_child(tree.root(), b).unwrap();
    tree.append_child(a, p).unwrap();

    tree.append_child(b, p).unwrap();

    assert_eq!(tree.children(a).count(), 0);
    assert_eq!(tree.parent(p), Some(b));
}

#[test]
fn test_text_content_where_skips_subtrees() {
    let mut tree = DomTree::new();
    let button = tree.create_element("button");
    let label = tree.create_text("Send ");
    let badge = tree.create_element("span");
    let badge_text = tree.create_text("7");
    tree.append_child(tree.root(), button).unwrap();
    tree.append_child(button, label).unwrap();
    tree.append_child(button, badge).unwrap();
    tree.append_child(badge, badge_text).unwrap();
    tree.add_class(badge, "a11y-number-badge").unwrap();

    assert_eq!(tree.text_content(button), "Send 7");
    let stripped = tree.text_content_where(button, |t, n| !t.has_class(n, "a11y-number-badge"));
    assert_eq!(stripped, "Send ");
}

#[test]
fn test_closest_and_find_all() {
    let mut doc = Document::new("https://example.com/");
    let body = doc.body();
    let tree = &mut doc.tree;
    let label = tree.create_element("label");
    let input = tree.create_element("input");
    tree.append_child(body, label).unwrap();
    tree.append_child(label, input).unwrap();

    assert_eq!(tree.closest(input, |t, n| t.has_tag(n, "label")), Some(label));
    assert_eq!(tree.closest(input, |t, n| t.has_tag(n, "form")), None);
    assert_eq!(tree.find_all(body, |t, n| t.has_tag(n, "input")), vec![input]);
}

#[test]
fn test_get_element_by_id() {
    let mut doc = Document::new("https://example.com/");
    let body = doc.body();
    let input = doc.tree.create_element("input");
    doc.tree.set_attr(input, "id", "email").unwrap();
    doc.tree.append_child(body, input).unwrap();

    assert_eq!(doc.get_element_by_id("email"), Some(input));
    doc.tree.detach(input).unwrap();
    assert_eq!(doc.get_element_by_id("email"), None);
}

// ============================================================================
// FORM CONTROLS
// ============================================================================

#[test]
fn test_input_value_falls_back_to_attribute() {
    let mut tree = DomTree::new();
    let input = tree.create_element("input");
    tree.set_attr(input, "value", "initial").unwrap();
    assert_eq!(tree.value(input), "initial");

    tree.set_value(input, "typed").unwrap();
    assert_eq!(tree.value(input), "typed");
}

#[test]
fn test_select_options_and_selection() {
    let mut tree = DomTree::new();
    let select = tree.create_element("select");
    let mut options = Vec::new();
    for (value, text) in [("es", "Español"), ("en", "English"), ("fr", "Français")] {
        let opt = tree.create_element("option");
        let label = tree.create_text(text);
        tree.set_attr(opt, "value", value).unwrap();
        tree.append_child(opt, label).unwrap();
        tree.append_child(select, opt).unwrap();
        options.push(opt);
    }

    assert_eq!(tree.options(select), options);
    assert_eq!(tree.selected_index(select), Some(0));

    tree.set_attr(options[1], "selected", "").unwrap();
    assert_eq!(tree.selected_index(select), Some(1));
    assert_eq!(tree.value(select), "en");

    tree.set_selected_index(select, 2).unwrap();
    assert_eq!(tree.value(select), "fr");
}

#[test]
fn test_empty_select() {
    let mut tree = DomTree::new();
    let select = tree.create_element("select");
    assert_eq!(tree.selected_index(select), None);
    assert_eq!(tree.value(select), "");
}

#[test]
fn test_media_state_events() {
    let mut tree = DomTree::new();
    let audio = tree.create_element("audio");
    assert!(tree.is_paused(audio));

    tree.set_paused(audio, false).unwrap();
    tree.set_duration(audio, Some(125.0)).unwrap();
    assert!(!tree.is_paused(audio));
    assert_eq!(tree.duration(audio), Some(125.0));

    let events = tree.take_events();
    assert_eq!(events.len(), 1);
    assert!(events[0].is(DomEventType::Play));
}

// ============================================================================
// EVENTS AND OBSERVERS
// ============================================================================

#[test]
fn test_focus_blur_sequence() {
    let mut tree = DomTree::new();
    let a = tree.create_element("input");
    let b = tree.create_element("input");
    tree.append_child(tree.root(), a).unwrap();
    tree.append_child(tree.root(), b).unwrap();

    tree.focus(a).unwrap();
    tree.focus(b).unwrap();
    tree.blur(b).unwrap();

    let kinds: Vec<_> = tree.take_events().iter().map(|e| (e.event_type, e.target)).collect();
    assert_eq!(
        kinds,
        vec![
            (DomEventType::Focus, a),
            (DomEventType::Blur, a),
            (DomEventType::Focus, b),
            (DomEventType::Blur, b),
        ]
    );
    assert_eq!(tree.focused(), None);
}

#[test]
fn test_scroll_into_view_recorded() {
    let mut tree = DomTree::new();
    let p = tree.create_element("p");
    tree.scroll_into_view(p, ScrollBehavior::Smooth, ScrollBlock::Center).unwrap();
    let events = tree.take_events();
    assert_eq!(events[0].scroll, Some((ScrollBehavior::Smooth, ScrollBlock::Center)));
    assert!(tree.take_events().is_empty());
}

#[test]
fn test_subtree_observer_sees_child_list() {
    let mut doc = Document::new("https://example.com/");
    let body = doc.body();
    let obs = doc.tree.observe(body, MutationObserverInit::subtree_all());

    let div = doc.tree.create_element("div");
    doc.tree.append_child(body, div).unwrap();
    let p = doc.tree.create_element("p");
    doc.tree.append_child(div, p).unwrap();

    let records = doc.tree.take_records(obs);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.mutation_type == MutationType::ChildList));
    assert_eq!(records[1].added_nodes, vec![p]);

    doc.tree.disconnect(obs);
    doc.tree.set_attr(div, "class", "x").unwrap();
    assert!(doc.tree.take_records(obs).is_empty());
}

#[test]
fn test_style_change_is_observable() {
    let mut tree = DomTree::new();
    let modal = tree.create_element("div");
    tree.append_child(tree.root(), modal).unwrap();
    let obs = tree.observe(modal, MutationObserverInit::attributes(&["style", "class"]));

    let style = ComputedStyle { visibility: Some(Visibility::Hidden), ..ComputedStyle::default() };
    tree.set_style(modal, style).unwrap();
    tree.set_layout_rect(modal, Some(DOMRect::from_xywh(0.0, 0.0, 10.0, 10.0))).unwrap();

    let records = tree.take_records(obs);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].attribute_name.as_deref(), Some("style"));
    assert_eq!(tree.style(modal).and_then(|s| s.visibility), Some(Visibility::Hidden));
}

#[test]
fn test_node_id_display() {
    assert_eq!(NodeId::ROOT.to_string(), "#0");
    assert_eq!(NodeId::NONE.to_string(), "#none");
}
