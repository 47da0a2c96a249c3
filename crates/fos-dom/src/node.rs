//! DOM Node
//!
//! Nodes live in the tree arena and link to each other by `NodeId`
//! instead of pointers.

use crate::{NodeId, InternedString, DOMRect, ComputedStyle, ControlState};

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if root or detached)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(name: InternedString) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(name)))
    }

    /// Create a new text node
    pub fn text(content: String) -> Self {
        Self::with_data(NodeData::Text(TextData { content }))
    }

    /// Create a comment node
    pub fn comment(content: String) -> Self {
        Self::with_data(NodeData::Comment(content))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(&t.content),
            _ => None,
        }
    }

    /// Check if node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_valid()
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element node
    Element(ElementData),
    /// Text node
    Text(TextData),
    /// Comment node
    Comment(String),
}

/// Element data
#[derive(Debug)]
pub struct ElementData {
    /// Lowercased tag name
    pub name: InternedString,
    /// Attributes in insertion order
    pub attrs: Vec<Attribute>,
    /// Style facts supplied by the layout engine
    pub style: ComputedStyle,
    /// Rendered box, `None` until laid out
    pub layout: Option<DOMRect>,
    /// Live form control / media state
    pub control: ControlState,
}

impl ElementData {
    /// Create new element data
    pub fn new(name: InternedString) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            style: ComputedStyle::default(),
            layout: None,
            control: ControlState::default(),
        }
    }

    /// Get attribute value by interned name
    pub fn get_attr(&self, name: InternedString) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set attribute, returning the previous value
    pub fn set_attr(&mut self, name: InternedString, value: String) -> Option<String> {
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => Some(std::mem::replace(&mut attr.value, value)),
            None => {
                self.attrs.push(Attribute { name, value });
                None
            }
        }
    }

    /// Remove attribute, returning its value
    pub fn remove_attr(&mut self, name: InternedString) -> Option<String> {
        let pos = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(pos).value)
    }
}

/// Attribute
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: InternedString,
    pub value: String,
}

/// Text node data
#[derive(Debug, Clone)]
pub struct TextData {
    pub content: String,
}
