//! Form Elements Module
//!
//! Live state of form controls and media elements. Attributes (`type`,
//! `placeholder`, `required`) stay in the attribute list; this holds what
//! the user changes at runtime.

/// Input element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    #[default]
    Text,
    Email,
    Password,
    Search,
    Tel,
    Url,
    Number,
    Checkbox,
    Radio,
    Submit,
    Button,
    Hidden,
    Range,
    Date,
    File,
}

impl InputType {
    /// Parse the `type` attribute; unknown values fall back to text
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Self::Email,
            "password" => Self::Password,
            "search" => Self::Search,
            "tel" => Self::Tel,
            "url" => Self::Url,
            "number" => Self::Number,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "submit" => Self::Submit,
            "button" => Self::Button,
            "hidden" => Self::Hidden,
            "range" => Self::Range,
            "date" => Self::Date,
            "file" => Self::File,
            _ => Self::Text,
        }
    }

    /// Attribute spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Password => "password",
            Self::Search => "search",
            Self::Tel => "tel",
            Self::Url => "url",
            Self::Number => "number",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::Submit => "submit",
            Self::Button => "button",
            Self::Hidden => "hidden",
            Self::Range => "range",
            Self::Date => "date",
            Self::File => "file",
        }
    }

    /// Types that take typed text
    pub fn is_text_like(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Email | Self::Password | Self::Search
                | Self::Tel | Self::Url | Self::Number
        )
    }
}

/// Runtime state of a control
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlState {
    /// Dirty value; `None` means the `value` attribute applies
    pub value: Option<String>,
    /// Selected option of a `<select>`; `None` means the first option
    pub selected_index: Option<usize>,
    pub checked: bool,
    pub media: MediaState,
}

/// Playback state of `<audio>` / `<video>`
#[derive(Debug, Clone, PartialEq)]
pub struct MediaState {
    pub paused: bool,
    /// Seconds, `None` until metadata is loaded
    pub duration: Option<f64>,
}

impl Default for MediaState {
    fn default() -> Self {
        Self { paused: true, duration: None }
    }
}
