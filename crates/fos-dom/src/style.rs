//! Computed style facts
//!
//! Only the properties that decide whether an element is rendered.

/// `display` value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Display {
    #[default]
    Block,
    Inline,
    Flex,
    None,
}

/// `visibility` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
    Collapse,
}

/// Computed style of one element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    /// `None` inherits from the parent
    pub visibility: Option<Visibility>,
    pub opacity: f32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::default(),
            visibility: None,
            opacity: 1.0,
        }
    }
}

impl ComputedStyle {
    /// Hidden style (`display: none`)
    pub fn none() -> Self {
        Self { display: Display::None, ..Self::default() }
    }

    /// Check for `display: none`
    #[inline]
    pub fn is_display_none(&self) -> bool {
        self.display == Display::None
    }

    /// Check for zero opacity
    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.opacity <= 0.0
    }
}

impl Display {
    /// Parse a CSS keyword
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Some(Self::Block),
            "inline" | "inline-block" => Some(Self::Inline),
            "flex" | "grid" => Some(Self::Flex),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

impl Visibility {
    /// Parse a CSS keyword
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visible" => Some(Self::Visible),
            "hidden" => Some(Self::Hidden),
            "collapse" => Some(Self::Collapse),
            _ => None,
        }
    }

    /// Whether content is painted
    pub fn is_visible(self) -> bool {
        self == Self::Visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_shown() {
        let style = ComputedStyle::default();
        assert!(!style.is_display_none());
        assert!(!style.is_transparent());
        assert!(style.visibility.is_none());
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(Display::parse("NONE"), Some(Display::None));
        assert_eq!(Visibility::parse("hidden"), Some(Visibility::Hidden));
        assert_eq!(Visibility::parse("bogus"), None);
    }
}
