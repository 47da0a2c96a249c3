//! Console collaborators
//!
//! Speech goes to stdout, the panel is a set of log lines, and the
//! recognizer hears whatever the script says. Engine callbacks are queued
//! here and fed back by the session loop.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use fos_a11y::{
    A11yResult, ModeIndicator, RecognitionEngine, SpeechEngine, Utterance, Voice, WidgetHost,
};
use fos_dom::{DOMRect, NodeId};

// ============================================================================
// Speech
// ============================================================================

#[derive(Debug, Default)]
struct SpeechQueue {
    delivered: VecDeque<Utterance>,
    cancelled: bool,
}

/// Prints each utterance as it is delivered
#[derive(Debug, Clone, Default)]
pub struct ConsoleSpeech {
    queue: Rc<RefCell<SpeechQueue>>,
}

impl ConsoleSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Utterances delivered since the last call
    pub fn take_delivered(&self) -> Vec<Utterance> {
        self.queue.borrow_mut().delivered.drain(..).collect()
    }

    /// Whether `cancel` ran since the last call
    pub fn take_cancelled(&self) -> bool {
        std::mem::take(&mut self.queue.borrow_mut().cancelled)
    }
}

impl SpeechEngine for ConsoleSpeech {
    fn voices(&self) -> Vec<Voice> {
        vec![
            Voice { name: "Console (es)".into(), lang: "es-ES".into() },
            Voice { name: "Console (en)".into(), lang: "en-US".into() },
        ]
    }

    fn speak(&mut self, utterance: &Utterance) {
        println!("[{}] {}", utterance.lang, utterance.text);
        self.queue.borrow_mut().delivered.push_back(utterance.clone());
    }

    fn cancel(&mut self) {
        let mut queue = self.queue.borrow_mut();
        queue.delivered.clear();
        queue.cancelled = true;
    }
}

/// Simulated playback time of an utterance
pub fn speaking_time_ms(utterance: &Utterance) -> u64 {
    const PER_WORD_MS: f32 = 300.0;
    let words = utterance.text.split_whitespace().count().max(1) as f32;
    let rate = if utterance.rate > 0.0 { utterance.rate } else { 1.0 };
    (words * PER_WORD_MS / rate) as u64
}

// ============================================================================
// Recognition
// ============================================================================

/// Engine-side lifecycle the session loop reports back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionSignal {
    Started,
    Ended,
}

/// Recognizer fed by the script's `say` steps
#[derive(Debug, Clone, Default)]
pub struct ConsoleRecognition {
    signals: Rc<RefCell<VecDeque<RecognitionSignal>>>,
}

impl ConsoleRecognition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_signals(&self) -> Vec<RecognitionSignal> {
        self.signals.borrow_mut().drain(..).collect()
    }
}

impl RecognitionEngine for ConsoleRecognition {
    fn start(&mut self, lang: &str) -> A11yResult<()> {
        tracing::info!("Listening ({})", lang);
        self.signals.borrow_mut().push_back(RecognitionSignal::Started);
        Ok(())
    }

    fn stop(&mut self) {
        tracing::info!("Stopped listening");
        self.signals.borrow_mut().push_back(RecognitionSignal::Ended);
    }
}

// ============================================================================
// Host
// ============================================================================

/// Panel and page styling reported as log lines
#[derive(Debug, Default)]
pub struct ConsoleHost;

impl WidgetHost for ConsoleHost {
    fn open_panel(&mut self) {
        tracing::info!("Panel opened");
    }

    fn close_panel(&mut self) {
        tracing::info!("Panel closed");
    }

    fn notify(&mut self, message: &str) {
        println!("(!) {}", message);
    }

    fn highlight(&mut self, node: Option<NodeId>, rect: Option<DOMRect>) {
        match (node, rect) {
            (Some(node), Some(r)) => {
                tracing::debug!("Highlight {} at {}x{}+{}+{}", node, r.width, r.height, r.x, r.y)
            }
            (Some(node), None) => tracing::debug!("Highlight {}", node),
            (None, _) => tracing::debug!("Highlight hidden"),
        }
    }

    fn reading_line(&mut self, y: Option<f64>) {
        tracing::trace!("Reading line {:?}", y);
    }

    fn set_speaking_indicator(&mut self, speaking: bool) {
        tracing::trace!("Speaking indicator {}", speaking);
    }

    fn apply_font_size(&mut self, size: &str) {
        tracing::info!("Font size: {}", size);
    }

    fn apply_theme(&mut self, theme: &str) {
        tracing::info!("Theme: {}", theme);
    }

    fn apply_cursor_size(&mut self, size: &str) {
        tracing::info!("Cursor size: {}", size);
    }

    fn set_dyslexia(&mut self, on: bool) {
        tracing::info!("Dyslexia font: {}", on);
    }

    fn mode_changed(&mut self, mode: ModeIndicator, on: bool) {
        tracing::info!("{:?}: {}", mode, if on { "on" } else { "off" });
    }
}
