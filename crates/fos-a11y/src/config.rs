//! Overlay configuration and persisted preferences

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::A11yResult;

/// Storage key of the persisted preference blob
pub const STORAGE_KEY: &str = "a11y-preferences";

/// Static configuration of one overlay instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Language of spoken messages and fallback utterance tag
    pub default_lang: String,
    /// Root of the overlay's own panel, never read
    pub widget_id: String,
    /// Floating toggle button, addressed as number 0
    pub toggle_id: String,
    /// Persistent side menu treated as an overlay when open
    pub side_menu_id: Option<String>,
    /// Element opts out when this attribute is `"false"`
    pub opt_out_attr: String,
    pub lang_attr: String,
    /// Opts an arbitrary element into the readable set
    pub readable_attr: String,
    /// Marker written on numbered elements
    pub index_attr: String,
    pub timings: Timings,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            default_lang: "es-ES".into(),
            widget_id: "accessibility-widget".into(),
            toggle_id: "a11y-toggle-btn".into(),
            side_menu_id: None,
            opt_out_attr: "data-a11y-read".into(),
            lang_attr: "data-a11y-lang".into(),
            readable_attr: "data-a11y-readable".into(),
            index_attr: "data-a11y-index".into(),
            timings: Timings::default(),
        }
    }
}

impl OverlayConfig {
    /// Parse from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> A11yResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Delays of the event loop, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Between cancel and speak
    pub settle_ms: u64,
    /// After a click, before looking for an opened overlay
    pub activation_detect_ms: u64,
    pub overlay_poll_ms: u64,
    /// Reading the active slide after entering slider mode
    pub slide_read_ms: u64,
    /// Reading the active slide after a next / prev click
    pub slide_nav_read_ms: u64,
    pub recognition_restart_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            settle_ms: 100,
            activation_detect_ms: 300,
            overlay_poll_ms: 500,
            slide_read_ms: 500,
            slide_nav_read_ms: 300,
            recognition_restart_ms: 250,
        }
    }
}

impl Timings {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn activation_detect(&self) -> Duration {
        Duration::from_millis(self.activation_detect_ms)
    }

    pub fn overlay_poll(&self) -> Duration {
        Duration::from_millis(self.overlay_poll_ms)
    }

    pub fn slide_read(&self) -> Duration {
        Duration::from_millis(self.slide_read_ms)
    }

    pub fn slide_nav_read(&self) -> Duration {
        Duration::from_millis(self.slide_nav_read_ms)
    }

    pub fn recognition_restart(&self) -> Duration {
        Duration::from_millis(self.recognition_restart_ms)
    }
}

/// Key-value persistence (localStorage in a browser)
pub trait PreferenceStore {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// User preferences persisted between visits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub font_size: String,
    pub theme: String,
    pub cursor_size: String,
    pub reading_rate: f32,
    pub dyslexia_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            font_size: "medium".into(),
            theme: "default".into(),
            cursor_size: "default".into(),
            reading_rate: 1.0,
            dyslexia_mode: false,
        }
    }
}

impl Preferences {
    /// Load from the store; a corrupt blob yields defaults
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let Some(raw) = store.load(STORAGE_KEY) else {
            return Self::default();
        };
        match serde_json::from_str::<Self>(&raw) {
            Ok(mut prefs) => {
                if !(prefs.reading_rate.is_finite() && prefs.reading_rate > 0.0) {
                    prefs.reading_rate = 1.0;
                }
                prefs
            }
            Err(e) => {
                tracing::warn!("Ignoring stored preferences: {}", e);
                Self::default()
            }
        }
    }

    /// Persist to the store
    pub fn save(&self, store: &mut dyn PreferenceStore) -> A11yResult<()> {
        let json = serde_json::to_string(self)?;
        store.save(STORAGE_KEY, &json);
        Ok(())
    }
}
