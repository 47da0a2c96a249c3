//! Widget Host Integration
//!
//! Everything visual (panel, highlight box, reading line, theme classes)
//! belongs to the host page. The core only calls these hooks.

use fos_dom::{DOMRect, NodeId};

/// Mode shown by the panel's toggle buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeIndicator { SectionReading, NumberedVoice, VoiceCommands, FlowReading }

/// Panel UI and page styling hooks
pub trait WidgetHost {
    /// Show the settings panel
    fn open_panel(&mut self);

    /// Hide the settings panel
    fn close_panel(&mut self);

    /// Visible notice (alert or toast)
    fn notify(&mut self, message: &str);

    /// Move the highlight box; `None` hides it
    fn highlight(&mut self, node: Option<NodeId>, rect: Option<DOMRect>);

    /// Move the reading line; `None` hides it
    fn reading_line(&mut self, y: Option<f64>);

    /// Speaking indicator on the toggle button
    fn set_speaking_indicator(&mut self, speaking: bool);

    /// Font size class by name (`small`, `medium`, `large`, `xlarge`)
    fn apply_font_size(&mut self, size: &str);

    fn apply_theme(&mut self, theme: &str);

    fn apply_cursor_size(&mut self, size: &str);

    fn set_dyslexia(&mut self, on: bool);

    /// Reflect a mode toggle in the panel
    fn mode_changed(&mut self, mode: ModeIndicator, on: bool);
}

/// Host for pages without a panel
#[derive(Debug, Default)]
pub struct NullHost;

impl NullHost {
    pub fn new() -> Self { Self }
}

impl WidgetHost for NullHost {
    fn open_panel(&mut self) {}
    fn close_panel(&mut self) {}
    fn notify(&mut self, message: &str) { tracing::info!("{}", message); }
    fn highlight(&mut self, _node: Option<NodeId>, _rect: Option<DOMRect>) {}
    fn reading_line(&mut self, _y: Option<f64>) {}
    fn set_speaking_indicator(&mut self, _speaking: bool) {}
    fn apply_font_size(&mut self, _size: &str) {}
    fn apply_theme(&mut self, _theme: &str) {}
    fn apply_cursor_size(&mut self, _size: &str) {}
    fn set_dyslexia(&mut self, _on: bool) {}
    fn mode_changed(&mut self, _mode: ModeIndicator, _on: bool) {}
}
