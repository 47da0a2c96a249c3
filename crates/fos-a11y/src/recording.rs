//! Recording collaborators
//!
//! In-memory engines, host and store that log every call. Clones share
//! state, so a test keeps one handle and gives the other to the controller.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use fos_dom::{DOMRect, NodeId};

use crate::config::PreferenceStore;
use crate::host::{ModeIndicator, WidgetHost};
use crate::recognition::RecognitionEngine;
use crate::speech::{SpeechEngine, Utterance, Voice};
use crate::{A11yError, A11yResult};

// ============================================================================
// Speech
// ============================================================================

#[derive(Debug)]
struct SpeechLog {
    available: bool,
    voices: Vec<Voice>,
    spoken: Vec<Utterance>,
    cancels: usize,
}

/// Speech engine that records utterances instead of playing them
#[derive(Debug, Clone)]
pub struct RecordingSpeech {
    log: Rc<RefCell<SpeechLog>>,
}

impl Default for RecordingSpeech {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSpeech {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(SpeechLog {
                available: true,
                voices: Vec::new(),
                spoken: Vec::new(),
                cancels: 0,
            })),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.log.borrow_mut().available = available;
    }

    pub fn set_voices(&self, voices: Vec<Voice>) {
        self.log.borrow_mut().voices = voices;
    }

    /// Every utterance handed to the engine, oldest first
    pub fn spoken(&self) -> Vec<Utterance> {
        self.log.borrow().spoken.clone()
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.log.borrow().spoken.iter().map(|u| u.text.clone()).collect()
    }

    pub fn last(&self) -> Option<Utterance> {
        self.log.borrow().spoken.last().cloned()
    }

    pub fn cancel_count(&self) -> usize {
        self.log.borrow().cancels
    }

    pub fn clear(&self) {
        self.log.borrow_mut().spoken.clear();
    }
}

impl SpeechEngine for RecordingSpeech {
    fn is_available(&self) -> bool {
        self.log.borrow().available
    }

    fn voices(&self) -> Vec<Voice> {
        self.log.borrow().voices.clone()
    }

    fn speak(&mut self, utterance: &Utterance) {
        self.log.borrow_mut().spoken.push(utterance.clone());
    }

    fn cancel(&mut self) {
        self.log.borrow_mut().cancels += 1;
    }
}

// ============================================================================
// Recognition
// ============================================================================

#[derive(Debug, Default)]
struct RecognitionLog {
    unavailable: bool,
    starts: usize,
    stops: usize,
    langs: Vec<String>,
    fail_next: Option<String>,
}

/// Recognition engine driven by the test
///
/// Transcripts are fed to the controller as `RecognitionEvent`s; this only
/// counts starts and stops.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRecognition {
    log: Rc<RefCell<RecognitionLog>>,
}

impl ScriptedRecognition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.log.borrow_mut().unavailable = !available;
    }

    /// The next `start` fails with `reason`
    pub fn fail_next_start(&self, reason: &str) {
        self.log.borrow_mut().fail_next = Some(reason.to_string());
    }

    pub fn start_count(&self) -> usize {
        self.log.borrow().starts
    }

    pub fn stop_count(&self) -> usize {
        self.log.borrow().stops
    }

    /// Language of every started session
    pub fn langs(&self) -> Vec<String> {
        self.log.borrow().langs.clone()
    }
}

impl RecognitionEngine for ScriptedRecognition {
    fn is_available(&self) -> bool {
        !self.log.borrow().unavailable
    }

    fn start(&mut self, lang: &str) -> A11yResult<()> {
        let mut log = self.log.borrow_mut();
        if let Some(reason) = log.fail_next.take() {
            return Err(A11yError::Recognition(reason));
        }
        log.starts += 1;
        log.langs.push(lang.to_string());
        Ok(())
    }

    fn stop(&mut self) {
        self.log.borrow_mut().stops += 1;
    }
}

// ============================================================================
// Host
// ============================================================================

#[derive(Debug, Default)]
struct HostLog {
    panel_open: bool,
    notices: Vec<String>,
    highlight: Option<NodeId>,
    highlights: Vec<Option<NodeId>>,
    reading_line: Option<f64>,
    speaking: bool,
    font_size: Option<String>,
    theme: Option<String>,
    cursor_size: Option<String>,
    dyslexia: bool,
    modes: HashMap<ModeIndicator, bool>,
}

/// Widget host that remembers what it was told
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    log: Rc<RefCell<HostLog>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_panel_open(&self) -> bool {
        self.log.borrow().panel_open
    }

    pub fn notices(&self) -> Vec<String> {
        self.log.borrow().notices.clone()
    }

    /// Currently highlighted node
    pub fn highlighted(&self) -> Option<NodeId> {
        self.log.borrow().highlight
    }

    /// Every highlight call, in order
    pub fn highlight_history(&self) -> Vec<Option<NodeId>> {
        self.log.borrow().highlights.clone()
    }

    pub fn reading_line(&self) -> Option<f64> {
        self.log.borrow().reading_line
    }

    pub fn is_speaking(&self) -> bool {
        self.log.borrow().speaking
    }

    pub fn font_size(&self) -> Option<String> {
        self.log.borrow().font_size.clone()
    }

    pub fn theme(&self) -> Option<String> {
        self.log.borrow().theme.clone()
    }

    pub fn cursor_size(&self) -> Option<String> {
        self.log.borrow().cursor_size.clone()
    }

    pub fn dyslexia(&self) -> bool {
        self.log.borrow().dyslexia
    }

    pub fn mode(&self, mode: ModeIndicator) -> bool {
        self.log.borrow().modes.get(&mode).copied().unwrap_or(false)
    }
}

impl WidgetHost for RecordingHost {
    fn open_panel(&mut self) {
        self.log.borrow_mut().panel_open = true;
    }

    fn close_panel(&mut self) {
        self.log.borrow_mut().panel_open = false;
    }

    fn notify(&mut self, message: &str) {
        self.log.borrow_mut().notices.push(message.to_string());
    }

    fn highlight(&mut self, node: Option<NodeId>, _rect: Option<DOMRect>) {
        let mut log = self.log.borrow_mut();
        log.highlight = node;
        log.highlights.push(node);
    }

    fn reading_line(&mut self, y: Option<f64>) {
        self.log.borrow_mut().reading_line = y;
    }

    fn set_speaking_indicator(&mut self, speaking: bool) {
        self.log.borrow_mut().speaking = speaking;
    }

    fn apply_font_size(&mut self, size: &str) {
        self.log.borrow_mut().font_size = Some(size.to_string());
    }

    fn apply_theme(&mut self, theme: &str) {
        self.log.borrow_mut().theme = Some(theme.to_string());
    }

    fn apply_cursor_size(&mut self, size: &str) {
        self.log.borrow_mut().cursor_size = Some(size.to_string());
    }

    fn set_dyslexia(&mut self, on: bool) {
        self.log.borrow_mut().dyslexia = on;
    }

    fn mode_changed(&mut self, mode: ModeIndicator, on: bool) {
        self.log.borrow_mut().modes.insert(mode, on);
    }
}

// ============================================================================
// Preferences
// ============================================================================

/// Shared in-memory key-value store
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    map: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self, key: &str) -> Option<String> {
        self.get(key)
    }

    fn save(&mut self, key: &str, value: &str) {
        self.map.borrow_mut().insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.map.borrow_mut().remove(key);
    }
}
