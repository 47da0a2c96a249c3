//! Document - High-level document API

use url::Url;

use crate::{DomTree, NodeId};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL, `None` for `about:blank`-like documents
    url: Option<Url>,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
}

impl Document {
    /// Create a document with `<html>`, `<head>` and `<body>`
    pub fn new(url: &str) -> Self {
        let url = match Url::parse(url) {
            Ok(u) => Some(u),
            Err(e) => {
                tracing::warn!("Invalid document URL {:?}: {}", url, e);
                None
            }
        };

        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Fresh detached nodes under the document root cannot violate hierarchy rules
        let _ = tree.append_child(tree.root(), html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            url,
            html_element: html,
            head_element: head,
            body_element: body,
        }
    }

    /// Document URL
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Origin of the document URL
    pub fn origin(&self) -> Option<url::Origin> {
        self.url.as_ref().map(Url::origin)
    }

    /// Resolve an `href` against the document URL
    pub fn resolve_href(&self, href: &str) -> Option<Url> {
        match &self.url {
            Some(base) => base.join(href).ok(),
            None => Url::parse(href).ok(),
        }
    }

    /// Text of `<title>` in `<head>`
    pub fn title(&self) -> String {
        self.tree
            .children(self.head_element)
            .find(|&id| self.tree.has_tag(id, "title"))
            .map(|id| self.tree.text_content(id).trim().to_string())
            .unwrap_or_default()
    }

    /// `lang` of the root element
    pub fn lang(&self) -> Option<&str> {
        self.tree.attr(self.html_element, "lang").filter(|l| !l.is_empty())
    }

    /// Get `<html>` element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get `<head>` element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get `<body>` element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.find_element_by_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton() {
        let doc = Document::new("https://example.com/page");
        assert_eq!(doc.tree.tag_name(doc.body()), Some("body"));
        assert!(doc.tree.is_connected(doc.body()));
        assert_eq!(doc.tree.parent(doc.head()), Some(doc.document_element()));
    }

    #[test]
    fn test_resolve_relative_href() {
        let doc = Document::new("https://example.com/a/b");
        let url = doc.resolve_href("../c").unwrap();
        assert_eq!(url.as_str(), "https://example.com/c");
        assert_eq!(url.origin(), doc.origin().unwrap());
    }

    #[test]
    fn test_invalid_url() {
        let doc = Document::new("not a url");
        assert!(doc.url().is_none());
        assert!(doc.resolve_href("/x").is_none());
        assert!(doc.resolve_href("https://other.org/").is_some());
    }

    #[test]
    fn test_title() {
        let mut doc = Document::new("https://example.com/");
        let title = doc.tree.create_element("title");
        let text = doc.tree.create_text("  Home ");
        doc.tree.append_child(doc.head(), title).unwrap();
        doc.tree.append_child(title, text).unwrap();
        assert_eq!(doc.title(), "Home");
    }
}
