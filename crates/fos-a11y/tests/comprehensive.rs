//! Comprehensive tests for fos-a11y
//!
//! End-to-end flows through the mode controller with recording engines.

use std::time::Duration;

use fos_a11y::recording::{MemoryPreferenceStore, RecordingHost, RecordingSpeech, ScriptedRecognition};
use fos_a11y::{
    Classifier, Collaborators, Key, KeyEvent, KeyOutcome, ModeController, ModeIndicator, NavigationState,
    OverlayConfig, ReadableSetBuilder, RecognitionEvent, SpeechEvent, STORAGE_KEY,
};
use fos_dom::{ComputedStyle, Document, DomEventType, NodeId};

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    doc: Document,
    ctl: ModeController,
    speech: RecordingSpeech,
    recog: ScriptedRecognition,
    host: RecordingHost,
    store: MemoryPreferenceStore,
}

impl Harness {
    fn new(doc: Document) -> Self {
        let speech = RecordingSpeech::new();
        let recog = ScriptedRecognition::new();
        let host = RecordingHost::new();
        let store = MemoryPreferenceStore::new();
        let ctl = ModeController::new(
            OverlayConfig::default(),
            Collaborators::new()
                .with_speech(speech.clone())
                .with_recognition(recog.clone())
                .with_host(host.clone())
                .with_store(store.clone()),
        );
        Self { doc, ctl, speech, recog, host, store }
    }

    fn wait(&mut self, ms: u64) {
        let until = self.ctl.now() + Duration::from_millis(ms);
        self.ctl.advance(&mut self.doc, until);
    }

    fn key(&mut self, key: Key) -> KeyOutcome {
        self.ctl.handle_key(&mut self.doc, KeyEvent::new(key))
    }

    fn hear(&mut self, transcript: &str) {
        let event = RecognitionEvent::Result { transcript: transcript.to_string(), is_final: true };
        self.ctl.on_recognition_event(&mut self.doc, event);
    }

    fn last_spoken(&self) -> String {
        self.speech.last().map(|u| u.text).unwrap_or_default()
    }

    fn clicked(&mut self) -> Vec<NodeId> {
        self.doc
            .tree
            .take_events()
            .into_iter()
            .filter(|e| e.is(DomEventType::Click))
            .map(|e| e.target)
            .collect()
    }
}

fn page() -> Document {
    Document::new("https://example.com/")
}

fn add(doc: &mut Document, parent: NodeId, tag: &str, text: &str) -> NodeId {
    let el = doc.tree.create_element(tag);
    doc.tree.append_child(parent, el).unwrap();
    if !text.is_empty() {
        let t = doc.tree.create_text(text);
        doc.tree.append_child(el, t).unwrap();
    }
    el
}

/// Markup whitespace between siblings
fn gap(doc: &mut Document, parent: NodeId) {
    let t = doc.tree.create_text("\n  ");
    doc.tree.append_child(parent, t).unwrap();
}

fn add_with(doc: &mut Document, parent: NodeId, tag: &str, text: &str, attrs: &[(&str, &str)]) -> NodeId {
    let el = add(doc, parent, tag, text);
    for (name, value) in attrs {
        doc.tree.set_attr(el, name, value).unwrap();
    }
    el
}

// ============================================================================
// Readable set and cursor
// ============================================================================

#[test]
fn test_three_headings_scenario() {
    let mut doc = page();
    let body = doc.body();
    let intro = add(&mut doc, body, "h1", "Intro");
    add(&mut doc, body, "h1", "Details");
    add(&mut doc, body, "h1", "Contact");

    let config = OverlayConfig::default();
    let set = ReadableSetBuilder::new(&doc, &config).build();
    let listed: Vec<(usize, &str)> = set.entries().iter().map(|e| (e.sequence, e.text.as_str())).collect();
    assert_eq!(
        listed,
        vec![
            (1, "Encabezado nivel 1. Intro"),
            (2, "Encabezado nivel 1. Details"),
            (3, "Encabezado nivel 1. Contact"),
        ]
    );

    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    for _ in 0..4 {
        assert!(h.key(Key::ArrowDown).is_handled());
    }
    h.wait(200);
    assert_eq!(h.ctl.cursor().position(), Some(0));
    assert_eq!(h.ctl.cursor().current().map(|e| e.node), Some(intro));
    assert_eq!(h.last_spoken(), "Encabezado nivel 1. Intro");
    assert_eq!(h.host.highlighted(), Some(intro));
}

#[test]
fn test_email_input_description() {
    let mut doc = page();
    let body = doc.body();
    add_with(&mut doc, body, "label", "Email address", &[("for", "email")]);
    let input = add_with(
        &mut doc,
        body,
        "input",
        "",
        &[("type", "email"), ("id", "email"), ("placeholder", "you@example.com")],
    );

    let config = OverlayConfig::default();
    let classified = Classifier::new(&doc, &config).classify(input).unwrap();
    assert_eq!(classified.text, "Entrada de email: Email address. Pista: you@example.com");
}

#[test]
fn test_wraparound_through_controller() {
    let mut doc = page();
    let body = doc.body();
    for text in ["Uno", "Dos", "Tres"] {
        add(&mut doc, body, "p", text);
    }
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);

    assert_eq!(h.ctl.move_cursor(&mut h.doc, 1), Some(0));
    assert_eq!(h.ctl.move_cursor(&mut h.doc, -1), Some(2));
    for _ in 0..3 {
        h.ctl.move_cursor(&mut h.doc, 1);
    }
    assert_eq!(h.ctl.cursor().position(), Some(2));
}

#[test]
fn test_single_audible_utterance() {
    let mut doc = page();
    let body = doc.body();
    add(&mut doc, body, "p", "Primero");
    add(&mut doc, body, "p", "Segundo");
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);

    h.key(Key::ArrowDown);
    h.key(Key::ArrowDown);
    h.wait(500);
    assert_eq!(h.speech.spoken_texts(), vec!["Segundo".to_string()]);
    assert!(h.speech.cancel_count() >= 2);
}

// ============================================================================
// Overlays
// ============================================================================

struct ModalPage {
    doc: Document,
    opener: NodeId,
    modal: NodeId,
    close: NodeId,
}

fn modal_page() -> ModalPage {
    let mut doc = page();
    let body = doc.body();
    add(&mut doc, body, "h1", "Inicio");
    let opener = add(&mut doc, body, "button", "Abrir");
    add(&mut doc, body, "p", "Texto de la página");
    let modal = add_with(&mut doc, body, "div", "", &[("class", "modal")]);
    doc.tree.set_style(modal, ComputedStyle::none()).unwrap();
    add(&mut doc, modal, "h2", "Aviso");
    gap(&mut doc, modal);
    add(&mut doc, modal, "p", "Contenido del aviso");
    gap(&mut doc, modal);
    let close = add_with(&mut doc, modal, "button", "Cerrar", &[("class", "close")]);
    ModalPage { doc, opener, modal, close }
}

#[test]
fn test_modal_scope_entered_and_restored() {
    let ModalPage { doc, opener, modal, close } = modal_page();
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    assert_eq!(h.ctl.cursor().set().len(), 3);

    h.key(Key::ArrowDown);
    h.key(Key::ArrowDown);
    assert_eq!(h.ctl.cursor().current().map(|e| e.node), Some(opener));
    assert!(h.key(Key::Enter).is_handled());
    assert!(h.clicked().contains(&opener));

    // Page script reacts to the click
    h.doc.tree.set_style(modal, ComputedStyle::default()).unwrap();
    h.wait(1000);
    assert_eq!(h.ctl.cursor().depth(), 1);
    assert_eq!(h.ctl.cursor().overlay(), Some(modal));
    assert_eq!(h.ctl.cursor().position(), Some(0));
    assert_eq!(h.ctl.cursor().set().len(), 3);
    assert_eq!(h.last_spoken(), "Aviso. Contenido del aviso Cerrar");

    assert!(h.key(Key::Escape).is_handled());
    assert!(h.clicked().contains(&close));
    h.doc.tree.set_style(modal, ComputedStyle::none()).unwrap();
    h.wait(1000);

    assert_eq!(h.ctl.cursor().depth(), 0);
    assert_eq!(h.ctl.cursor().position(), Some(1));
    assert_eq!(h.last_spoken(), "Botón: Abrir");
    assert_eq!(h.host.highlighted(), Some(opener));
}

#[test]
fn test_modal_detected_by_polling() {
    let ModalPage { doc, modal, .. } = modal_page();
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);

    h.doc.tree.set_style(modal, ComputedStyle::default()).unwrap();
    h.wait(600);
    assert_eq!(h.ctl.cursor().overlay(), Some(modal));
}

// ============================================================================
// Interaction modes
// ============================================================================

#[test]
fn test_input_edit_flow() {
    let mut doc = page();
    let body = doc.body();
    add_with(&mut doc, body, "label", "Email address", &[("for", "email")]);
    let input = add_with(
        &mut doc,
        body,
        "input",
        "",
        &[("type", "email"), ("id", "email"), ("placeholder", "you@example.com")],
    );
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    h.key(Key::ArrowDown);
    assert!(h.key(Key::Enter).is_handled());
    h.wait(200);

    assert!(h.ctl.state().input_edit());
    assert_eq!(h.doc.tree.focused(), Some(input));
    assert!(h.doc.tree.has_class(input, "a11y-input-edit-mode"));
    assert_eq!(
        h.last_spoken(),
        "Modo edición activado. Email address. Entrada de email. Pista: you@example.com. Presiona Escape para salir."
    );

    // Typing belongs to the control
    assert_eq!(h.key(Key::ArrowDown), KeyOutcome::Ignored);
    assert_eq!(h.key(Key::Other), KeyOutcome::Ignored);

    h.doc.tree.set_value(input, "ana@example.com").unwrap();
    assert!(h.key(Key::Escape).is_handled());
    h.wait(200);
    assert!(!h.ctl.state().input_edit());
    assert_eq!(h.doc.tree.focused(), None);
    assert!(!h.doc.tree.has_class(input, "a11y-input-edit-mode"));
    assert_eq!(h.last_spoken(), "Modo edición cerrado. Valor guardado: ana@example.com. Regresando a navegación.");
}

struct SliderPage {
    doc: Document,
    slides: Vec<NodeId>,
    next: NodeId,
}

fn slider_page() -> SliderPage {
    let mut doc = page();
    let body = doc.body();
    let slider = add_with(&mut doc, body, "div", "", &[("class", "swiper")]);
    let first = add_with(&mut doc, slider, "div", "", &[("class", "swiper-slide swiper-slide-active")]);
    add(&mut doc, first, "p", "Primera");
    let second = add_with(&mut doc, slider, "div", "", &[("class", "swiper-slide")]);
    add(&mut doc, second, "p", "Segunda");
    let next = add_with(&mut doc, slider, "div", "", &[("class", "swiper-button-next")]);
    add_with(&mut doc, slider, "div", "", &[("class", "swiper-button-prev swiper-button-disabled")]);
    SliderPage { doc, slides: vec![first, second], next }
}

#[test]
fn test_slider_flow() {
    let SliderPage { doc, slides, next } = slider_page();
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    h.key(Key::ArrowDown);
    h.wait(200);
    assert_eq!(h.last_spoken(), "Carrusel. 2 diapositivas. Presiona Enter para navegar.");

    assert!(h.key(Key::Enter).is_handled());
    assert!(h.ctl.state().slider_open());
    h.wait(1000);
    assert_eq!(h.last_spoken(), "Diapositiva 1 de 2. Primera");

    // Previous control is disabled
    assert!(h.key(Key::ArrowLeft).is_handled());
    assert!(h.clicked().is_empty());

    assert!(h.key(Key::ArrowRight).is_handled());
    assert_eq!(h.clicked(), vec![next]);
    h.doc.tree.remove_class(slides[0], "swiper-slide-active").unwrap();
    h.doc.tree.add_class(slides[1], "swiper-slide-active").unwrap();
    h.wait(1000);
    assert_eq!(h.last_spoken(), "Diapositiva 2 de 2. Segunda");

    assert!(h.key(Key::Escape).is_handled());
    h.wait(200);
    assert!(!h.ctl.state().slider_open());
    assert_eq!(h.last_spoken(), "Saliste del modo de navegación de diapositivas.");
}

#[test]
fn test_slide_control_replaces_slider_mode() {
    let mut doc = page();
    let body = doc.body();
    let slider = add_with(&mut doc, body, "div", "", &[("class", "carousel")]);
    let slide = add_with(&mut doc, slider, "div", "", &[("class", "carousel-item active")]);
    let select = add_with(&mut doc, slide, "select", "", &[("aria-label", "Talla")]);
    add(&mut doc, select, "option", "S");
    add(&mut doc, select, "option", "M");

    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    h.key(Key::ArrowDown);
    h.key(Key::Enter);
    assert!(h.ctl.state().slider_open());
    h.key(Key::Enter);

    let state = h.ctl.state();
    assert!(state.select_open());
    assert!(!state.slider_open());
    assert!(!state.input_edit());

    h.wait(1000);
    assert!(h.last_spoken().starts_with("Lista desplegable abierta. Opción 1 de 2. S."));
}

// ============================================================================
// Voice
// ============================================================================

fn five_buttons() -> (Document, Vec<NodeId>) {
    let mut doc = page();
    let body = doc.body();
    let buttons = ["Uno", "Dos", "Tres", "Cuatro", "Cinco"]
        .iter()
        .map(|t| add(&mut doc, body, "button", t))
        .collect();
    (doc, buttons)
}

#[test]
fn test_numbered_voice_dispatch() {
    let (doc, buttons) = five_buttons();
    let mut h = Harness::new(doc);
    assert!(h.ctl.toggle_numbered_voice(&mut h.doc));
    assert_eq!(h.ctl.numbered_set().map(|s| s.len()), Some(5));
    assert!(h.host.mode(ModeIndicator::NumberedVoice));
    let root = h.doc.tree.root();
    assert_eq!(h.doc.tree.find_all(root, |t, n| t.has_attr(n, "data-a11y-index")).len(), 5);

    h.hear("cinco");
    assert_eq!(h.clicked(), vec![buttons[4]]);
    h.wait(1000);
    assert_eq!(h.last_spoken(), "Botón: Cinco");

    h.hear("five");
    assert_eq!(h.clicked(), vec![buttons[4]]);
    h.wait(1000);

    let state: NavigationState = *h.ctl.state();
    let position = h.ctl.cursor().position();
    h.hear("quince");
    h.wait(200);
    assert_eq!(h.last_spoken(), "Elemento 15 no encontrado.");
    assert!(h.clicked().is_empty());
    assert_eq!(*h.ctl.state(), state);
    assert_eq!(h.ctl.cursor().position(), position);

    h.hear("fifteen");
    h.wait(200);
    assert_eq!(h.last_spoken(), "Elemento 15 no encontrado.");
    assert!(h.ctl.state().numbered_voice);
}

#[test]
fn test_voice_zero_toggles_panel_and_deactivate() {
    let (doc, _) = five_buttons();
    let mut h = Harness::new(doc);
    h.ctl.toggle_numbered_voice(&mut h.doc);

    h.hear("cero");
    assert!(h.host.is_panel_open());
    h.hear("cerrar");
    assert!(!h.host.is_panel_open());

    h.hear("desactivar");
    assert!(!h.ctl.state().numbered_voice);
    assert!(h.ctl.numbered_set().is_none());
    let root = h.doc.tree.root();
    assert!(h.doc.tree.find_all(root, |t, n| t.has_attr(n, "data-a11y-index")).is_empty());
    assert_eq!(h.recog.stop_count(), 1);
}

#[test]
fn test_voice_commands_phrases() {
    let mut doc = page();
    let body = doc.body();
    add(&mut doc, body, "p", "Uno");
    add(&mut doc, body, "p", "Dos");
    let mut h = Harness::new(doc);
    assert!(h.ctl.toggle_voice_commands());

    h.hear("siguiente");
    assert_eq!(h.ctl.cursor().position(), Some(0));
    h.hear("next");
    assert_eq!(h.ctl.cursor().position(), Some(1));
    h.hear("anterior");
    assert_eq!(h.ctl.cursor().position(), Some(0));

    h.hear("aumentar texto");
    assert_eq!(h.host.font_size().as_deref(), Some("large"));
    assert_eq!(h.ctl.preferences().font_size, "large");

    h.hear("abrir accesibilidad");
    assert!(h.host.is_panel_open());
}

#[test]
fn test_recognition_restarts_until_stopped() {
    let (doc, _) = five_buttons();
    let mut h = Harness::new(doc);
    h.ctl.toggle_numbered_voice(&mut h.doc);
    assert_eq!(h.recog.start_count(), 1);
    assert_eq!(h.recog.langs(), vec!["es-ES".to_string()]);

    h.ctl.on_recognition_event(&mut h.doc, RecognitionEvent::Started);
    h.ctl.on_recognition_event(&mut h.doc, RecognitionEvent::Ended);
    h.wait(300);
    assert_eq!(h.recog.start_count(), 2);

    h.ctl.toggle_numbered_voice(&mut h.doc);
    h.ctl.on_recognition_event(&mut h.doc, RecognitionEvent::Ended);
    h.wait(300);
    assert_eq!(h.recog.start_count(), 2);
}

// ============================================================================
// Reading
// ============================================================================

#[test]
fn test_read_page_follows_cursor() {
    let mut doc = page();
    let body = doc.body();
    let paragraphs: Vec<NodeId> = ["A", "B", "C"].iter().map(|t| add(&mut doc, body, "p", t)).collect();
    let mut h = Harness::new(doc);

    h.ctl.read_page(&mut h.doc);
    assert!(h.ctl.state().flow_reading);
    assert!(h.host.mode(ModeIndicator::FlowReading));
    h.wait(200);

    for (i, &p) in paragraphs.iter().enumerate() {
        let id = h.speech.last().unwrap().id;
        h.ctl.on_speech_event(&mut h.doc, SpeechEvent::Started(id));
        assert!(h.host.is_speaking());
        assert_eq!(h.host.highlighted(), Some(p));
        assert_eq!(h.ctl.cursor().position(), Some(i));
        h.ctl.on_speech_event(&mut h.doc, SpeechEvent::Ended(id));
    }

    assert_eq!(h.speech.spoken_texts(), vec!["A".to_string(), "B".to_string(), "C".to_string()]);
    assert!(!h.ctl.state().flow_reading);
    assert!(!h.host.is_speaking());
    assert_eq!(h.host.highlighted(), None);
}

#[test]
fn test_stop_interrupts_reading() {
    let mut doc = page();
    let body = doc.body();
    add(&mut doc, body, "p", "A");
    add(&mut doc, body, "p", "B");
    let mut h = Harness::new(doc);
    h.ctl.read_page(&mut h.doc);
    h.wait(200);
    let id = h.speech.last().unwrap().id;
    h.ctl.on_speech_event(&mut h.doc, SpeechEvent::Started(id));

    h.ctl.stop(&mut h.doc);
    assert!(!h.ctl.state().flow_reading);
    assert!(!h.ctl.is_speaking());

    // Late end of the cancelled utterance starts nothing
    h.ctl.on_speech_event(&mut h.doc, SpeechEvent::Ended(id));
    assert_eq!(h.speech.spoken_texts(), vec!["A".to_string()]);
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn test_preferences_restored_on_start() {
    let store = MemoryPreferenceStore::new();
    {
        let mut first = ModeController::new(
            OverlayConfig::default(),
            Collaborators::new().with_store(store.clone()),
        );
        first.set_theme("high-contrast");
        first.set_dyslexia(true);
        first.set_reading_rate(0.8);
    }
    let host = RecordingHost::new();
    let second = ModeController::new(
        OverlayConfig::default(),
        Collaborators::new().with_store(store.clone()).with_host(host.clone()),
    );
    assert_eq!(second.preferences().theme, "high-contrast");
    assert!((second.preferences().reading_rate - 0.8).abs() < f32::EPSILON);
    assert_eq!(host.theme().as_deref(), Some("high-contrast"));
    assert!(host.dyslexia());
}

#[test]
fn test_reset_all() {
    let (doc, buttons) = five_buttons();
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    h.ctl.toggle_numbered_voice(&mut h.doc);
    h.ctl.toggle_voice_commands();
    h.ctl.set_cursor_size("large");
    h.ctl.open_panel();
    h.doc.tree.add_class(buttons[0], "a11y-input-edit-mode").unwrap();

    h.ctl.reset_all(&mut h.doc);

    let state = h.ctl.state();
    assert!(!state.section_reading && !state.numbered_voice && !state.flow_reading);
    assert!(state.panel_open);
    assert_eq!(h.ctl.cursor().position(), None);
    assert!(h.ctl.numbered_set().is_none());
    assert!(!h.ctl.voice_commands_enabled());
    assert!(!h.doc.tree.has_class(buttons[0], "a11y-input-edit-mode"));
    let root = h.doc.tree.root();
    assert!(h.doc.tree.find_all(root, |t, n| t.has_attr(n, "data-a11y-index")).is_empty());
    assert_eq!(h.store.get(STORAGE_KEY), None);
    assert_eq!(h.host.cursor_size().as_deref(), Some("default"));
    assert!(!h.host.mode(ModeIndicator::SectionReading));
    assert!(!h.host.mode(ModeIndicator::NumberedVoice));
    assert!(!h.host.mode(ModeIndicator::VoiceCommands));
    assert_eq!(h.ctl.next_due(), None);
}
