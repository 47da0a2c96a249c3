//! fOS Accessibility Overlay
//!
//! Virtual navigation and readable-content indexing for an accessibility
//! overlay injected into arbitrary pages.
//!
//! Features:
//! - Readable-set building with a single eligibility predicate
//! - Element classification into spoken descriptions (Spanish / English)
//! - Overlay (modal, collapse, side menu) detection with scope stacking
//! - Virtual cursor with wraparound and nested-scope restore
//! - Interruptible speech pipeline with settle delay and sequential reading
//! - Continuous voice commands with numbered element addressing
//! - Keyboard mode controller (section reading, select, slider, input edit)

pub mod aria;
pub mod i18n;
pub mod config;
pub mod visibility;
pub mod classifier;
pub mod readable;
pub mod overlay;
pub mod cursor;
pub mod scheduler;
pub mod speech;
pub mod recognition;
pub mod voice;
pub mod state;
pub mod keyboard;
pub mod host;
pub mod controller;
pub mod recording;

pub use aria::AriaRole;
pub use i18n::{Language, ValueHint};
pub use config::{OverlayConfig, Timings, Preferences, PreferenceStore, STORAGE_KEY};
pub use visibility::{Eligibility, ScanScope, is_rendered, should_ignore};
pub use classifier::{Classifier, Classified, ElementKind};
pub use readable::{ReadableEntry, ReadableSet, ReadableSetBuilder, apply_number_badges, clear_number_badges};
pub use overlay::{OverlayWatch, find_opened_overlay, opened_overlays, is_overlay_open};
pub use cursor::VirtualCursor;
pub use scheduler::{Scheduler, Task, TimerId};
pub use speech::{
    SpeechEngine, SpeechEvent, SpeechPipeline, PipelineEvent, SequenceItem,
    Utterance, UtteranceId, Voice, VoiceResolver, PrefixVoiceResolver,
};
pub use recognition::{RecognitionEngine, RecognitionEvent, RecognitionSession, RecognitionState, SessionOutput};
pub use voice::{VoiceCommand, interpret};
pub use state::{NavigationState, Interaction, ModeEvent, Transition};
pub use keyboard::{Key, KeyEvent, KeyOutcome};
pub use host::{WidgetHost, NullHost, ModeIndicator};
pub use controller::{ModeController, Collaborators};

/// Accessibility overlay error
#[derive(Debug, thiserror::Error)]
pub enum A11yError {
    #[error("Speech synthesis is not available")]
    SpeechUnavailable,

    #[error("Speech recognition is not available")]
    RecognitionUnavailable,

    #[error("Recognition engine error: {0}")]
    Recognition(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("DOM error: {0}")]
    Dom(#[from] fos_dom::DomError),
}

/// Result type for overlay operations
pub type A11yResult<T> = Result<T, A11yError>;
