//! String Interner - Deduplicate strings to save memory
//!
//! Tag names ("div", "button") and attribute names ("class", "aria-hidden")
//! are stored once and referenced by ID.

use std::collections::HashMap;

/// Interned string ID - just 4 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct InternedString(pub u32);

impl InternedString {
    /// Empty string
    pub const EMPTY: InternedString = InternedString(0);
}

/// String interner for deduplicating strings
#[derive(Debug)]
pub struct StringInterner {
    strings: Vec<Box<str>>,
    map: HashMap<Box<str>, u32>,
}

impl StringInterner {
    /// Create a new string interner with common HTML strings pre-interned
    pub fn new() -> Self {
        let mut interner = Self {
            strings: Vec::with_capacity(128),
            map: HashMap::with_capacity(128),
        };

        // Index 0 is always the empty string
        interner.intern("");

        const COMMON_TAGS: &[&str] = &[
            "html", "head", "body", "div", "span", "p", "a", "img",
            "ul", "ol", "li", "table", "tr", "td", "th",
            "input", "button", "select", "option", "textarea", "label",
            "fieldset", "legend", "h1", "h2", "h3", "h4", "h5", "h6",
            "nav", "main", "section", "dialog", "video", "audio", "title",
        ];

        const COMMON_ATTRS: &[&str] = &[
            "id", "class", "href", "alt", "title", "type", "value",
            "placeholder", "required", "hidden", "lang", "role", "for",
            "aria-label", "aria-hidden", "aria-modal", "aria-expanded",
        ];

        for s in COMMON_TAGS.iter().chain(COMMON_ATTRS) {
            interner.intern(s);
        }

        interner
    }

    /// Intern a string, returning its ID
    pub fn intern(&mut self, s: &str) -> InternedString {
        if let Some(&idx) = self.map.get(s) {
            return InternedString(idx);
        }

        let idx = self.strings.len() as u32;
        self.strings.push(s.into());
        self.map.insert(s.into(), idx);
        InternedString(idx)
    }

    /// Look up a string without interning it
    pub fn lookup(&self, s: &str) -> Option<InternedString> {
        self.map.get(s).map(|&idx| InternedString(idx))
    }

    /// Get the string for an interned ID
    #[inline]
    pub fn get(&self, id: InternedString) -> &str {
        self.strings.get(id.0 as usize).map(|s| &**s).unwrap_or("")
    }

    /// Number of interned strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
