//! Page fixtures
//!
//! A page is a JSON tree of elements and text. The fixture also plays the
//! part of the page's own scripts: buttons can show or hide other elements
//! and carousel arrows move the active slide.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use fos_dom::{ComputedStyle, DOMRect, Document, DomEvent, DomEventType, DomResult, NodeId};
use serde::Deserialize;

/// Click shows the element with this id
pub const SHOW_ATTR: &str = "data-fixture-show";
/// Click hides the element with this id
pub const HIDE_ATTR: &str = "data-fixture-hide";

const ACTIVE_SLIDE: &str = "swiper-slide-active";

#[derive(Debug, Clone, Deserialize)]
pub struct PageFixture {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Vec<NodeFixture>,
}

fn default_url() -> String {
    "about:blank".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NodeFixture {
    Text(String),
    Element(ElementFixture),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementFixture {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// Shorthand for a single text child
    #[serde(default)]
    pub text: Option<String>,
    /// Start with `display: none`
    #[serde(default)]
    pub hidden: bool,
    /// Layout box as `[x, y, width, height]`
    #[serde(default)]
    pub rect: Option<[f64; 4]>,
    #[serde(default)]
    pub children: Vec<NodeFixture>,
}

impl PageFixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading page fixture {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("parsing page fixture {}", path.display()))
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the document
    pub fn build(&self) -> DomResult<Document> {
        let mut doc = Document::new(&self.url);
        if let Some(lang) = &self.lang {
            doc.tree.set_attr(doc.document_element(), "lang", lang)?;
        }
        if let Some(title) = &self.title {
            let node = doc.tree.create_element("title");
            let text = doc.tree.create_text(title);
            doc.tree.append_child(node, text)?;
            doc.tree.append_child(doc.head(), node)?;
        }
        let body = doc.body();
        for child in &self.body {
            build_node(&mut doc, body, child)?;
        }
        Ok(doc)
    }
}

fn build_node(doc: &mut Document, parent: NodeId, fixture: &NodeFixture) -> DomResult<()> {
    match fixture {
        NodeFixture::Text(text) => {
            let node = doc.tree.create_text(text);
            doc.tree.append_child(parent, node)
        }
        NodeFixture::Element(el) => {
            let node = doc.tree.create_element(&el.tag);
            for (name, value) in &el.attrs {
                doc.tree.set_attr(node, name, value)?;
            }
            if el.hidden {
                doc.tree.set_style(node, ComputedStyle::none())?;
            }
            if let Some([x, y, w, h]) = el.rect {
                doc.tree.set_layout_rect(node, Some(DOMRect::from_xywh(x, y, w, h)))?;
            }
            if let Some(text) = &el.text {
                let text = doc.tree.create_text(text);
                doc.tree.append_child(node, text)?;
            }
            for child in &el.children {
                build_node(doc, node, child)?;
            }
            doc.tree.append_child(parent, node)
        }
    }
}

/// Show or hide the element with `id`
pub fn set_shown(doc: &mut Document, id: &str, shown: bool) -> anyhow::Result<()> {
    let node = doc
        .get_element_by_id(id)
        .with_context(|| format!("no element with id `{id}`"))?;
    let style = if shown { ComputedStyle::default() } else { ComputedStyle::none() };
    doc.tree.set_style(node, style)?;
    Ok(())
}

/// Run the page's own click handlers; returns whether the page changed
pub fn react(doc: &mut Document, events: &[DomEvent]) -> DomResult<bool> {
    let mut changed = false;
    for event in events.iter().filter(|e| e.is(DomEventType::Click)) {
        let target = event.target;
        let show = doc.tree.attr(target, SHOW_ATTR).map(str::to_string);
        let hide = doc.tree.attr(target, HIDE_ATTR).map(str::to_string);
        for (id, shown) in [(show, true), (hide, false)] {
            let Some(node) = id.as_deref().and_then(|id| doc.get_element_by_id(id)) else {
                continue;
            };
            let style = if shown { ComputedStyle::default() } else { ComputedStyle::none() };
            doc.tree.set_style(node, style)?;
            tracing::debug!(%node, shown, "fixture toggled element");
            changed = true;
        }

        let step = if doc.tree.has_class(target, "swiper-button-next") {
            1
        } else if doc.tree.has_class(target, "swiper-button-prev") {
            -1
        } else {
            continue;
        };
        changed |= move_slide(doc, target, step)?;
    }
    Ok(changed)
}

/// Shift the active slide of the carousel that owns `button`
fn move_slide(doc: &mut Document, button: NodeId, step: isize) -> DomResult<bool> {
    let Some(carousel) = doc.tree.closest(button, |t, n| t.has_class(n, "swiper")) else {
        return Ok(false);
    };
    let slides = doc.tree.find_all(carousel, |t, n| t.has_class(n, "swiper-slide"));
    let Some(current) = slides.iter().position(|&s| doc.tree.has_class(s, ACTIVE_SLIDE)) else {
        return Ok(false);
    };
    let next = current as isize + step;
    if next < 0 || next as usize >= slides.len() {
        return Ok(false);
    }
    doc.tree.remove_class(slides[current], ACTIVE_SLIDE)?;
    doc.tree.add_class(slides[next as usize], ACTIVE_SLIDE)?;
    Ok(true)
}
