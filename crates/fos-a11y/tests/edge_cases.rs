//! Edge case tests for fos-a11y
//!
//! Mutating pages, missing engines and boundary positions.

use std::time::Duration;

use fos_a11y::recording::{RecordingHost, RecordingSpeech, ScriptedRecognition};
use fos_a11y::{
    apply_number_badges, Collaborators, Key, KeyEvent, KeyOutcome, ModeController, ModeIndicator,
    OverlayConfig, ReadableSetBuilder, RecognitionEvent, SpeechEvent, UtteranceId,
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
}

impl Harness {
    fn new(doc: Document) -> Self {
        let speech = RecordingSpeech::new();
        let recog = ScriptedRecognition::new();
        let host = RecordingHost::new();
        let ctl = ModeController::new(
            OverlayConfig::default(),
            Collaborators::new()
                .with_speech(speech.clone())
                .with_recognition(recog.clone())
                .with_host(host.clone()),
        );
        Self { doc, ctl, speech, recog, host }
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

    fn current(&self) -> Option<NodeId> {
        self.ctl.cursor().current().map(|e| e.node)
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

fn add_with(doc: &mut Document, parent: NodeId, tag: &str, text: &str, attrs: &[(&str, &str)]) -> NodeId {
    let el = add(doc, parent, tag, text);
    for (name, value) in attrs {
        doc.tree.set_attr(el, name, value).unwrap();
    }
    el
}

fn paragraphs(texts: &[&str]) -> (Document, Vec<NodeId>) {
    let mut doc = page();
    let body = doc.body();
    let nodes = texts.iter().map(|t| add(&mut doc, body, "p", t)).collect();
    (doc, nodes)
}

// ============================================================================
// Cursor under mutation
// ============================================================================

#[test]
fn test_removed_entry_skipped() {
    let (doc, p) = paragraphs(&["Uno", "Dos", "Tres"]);
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    h.key(Key::ArrowDown);
    assert_eq!(h.current(), Some(p[0]));

    h.doc.tree.detach(p[1]).unwrap();
    h.key(Key::ArrowDown);
    h.wait(200);
    assert_eq!(h.current(), Some(p[2]));
    assert_eq!(h.ctl.cursor().set().len(), 2);
    assert_eq!(h.last_spoken(), "Tres");
}

#[test]
fn test_enter_on_removed_entry_moves_on() {
    let (doc, p) = paragraphs(&["Uno", "Dos"]);
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    h.key(Key::ArrowDown);
    h.doc.tree.detach(p[0]).unwrap();

    assert!(h.key(Key::Enter).is_handled());
    h.wait(200);
    assert_eq!(h.current(), Some(p[1]));
    assert_eq!(h.last_spoken(), "Dos");
}

#[test]
fn test_empty_page() {
    let mut h = Harness::new(page());
    h.ctl.set_section_reading(&mut h.doc, true);
    assert_eq!(h.ctl.move_cursor(&mut h.doc, 1), None);
    assert!(h.key(Key::ArrowDown).is_handled());
    assert_eq!(h.ctl.cursor().position(), None);

    h.ctl.read_page(&mut h.doc);
    assert!(!h.ctl.state().flow_reading);
    assert_eq!(h.host.notices(), vec!["No se encontró texto para leer.".to_string()]);
    assert!(h.speech.spoken().is_empty());
}

#[test]
fn test_idempotent_rebuild_ignores_badges() {
    let mut doc = page();
    let body = doc.body();
    add(&mut doc, body, "h2", "Título");
    add(&mut doc, body, "button", "Enviar");
    add_with(&mut doc, body, "input", "", &[("type", "text"), ("aria-label", "Nombre")]);
    let config = OverlayConfig::default();

    let first = ReadableSetBuilder::new(&doc, &config).build();
    let second = ReadableSetBuilder::new(&doc, &config).build();
    assert_eq!(first, second);

    apply_number_badges(&mut doc, &config, &first).unwrap();
    let badged = ReadableSetBuilder::new(&doc, &config).build();
    assert_eq!(first, badged);
}

#[test]
fn test_excluded_content_not_numbered() {
    let mut doc = page();
    let body = doc.body();
    let widget = add_with(&mut doc, body, "div", "", &[("id", "accessibility-widget")]);
    add(&mut doc, widget, "button", "Panel");
    add_with(&mut doc, body, "p", "Oculto", &[("aria-hidden", "true")]);
    add_with(&mut doc, body, "p", "No leer", &[("data-a11y-read", "false")]);
    let hidden = add(&mut doc, body, "p", "Invisible");
    doc.tree.set_style(hidden, ComputedStyle::none()).unwrap();
    let kept = add(&mut doc, body, "p", "Visible");

    let mut h = Harness::new(doc);
    assert!(h.ctl.toggle_numbered_voice(&mut h.doc));
    let set = h.ctl.numbered_set().unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.by_sequence(1).map(|e| e.node), Some(kept));
}

// ============================================================================
// Overlay scopes
// ============================================================================

fn hidden_modal(doc: &mut Document, parent: NodeId, text: &str) -> NodeId {
    let modal = add_with(doc, parent, "div", "", &[("class", "modal")]);
    doc.tree.set_style(modal, ComputedStyle::none()).unwrap();
    add(doc, modal, "p", text);
    modal
}

#[test]
fn test_scope_exit_clamps_when_global_shrank() {
    let mut doc = page();
    let body = doc.body();
    let a = add(&mut doc, body, "p", "A");
    let b = add(&mut doc, body, "p", "B");
    let opener = add(&mut doc, body, "button", "Abrir");
    let modal = hidden_modal(&mut doc, body, "Dentro");

    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    for _ in 0..3 {
        h.key(Key::ArrowDown);
    }
    assert_eq!(h.current(), Some(opener));
    h.key(Key::Enter);
    h.doc.tree.set_style(modal, ComputedStyle::default()).unwrap();
    h.wait(400);
    assert_eq!(h.ctl.cursor().depth(), 1);

    h.doc.tree.detach(a).unwrap();
    h.doc.tree.detach(b).unwrap();
    h.doc.tree.set_style(modal, ComputedStyle::none()).unwrap();
    h.wait(600);

    assert_eq!(h.ctl.cursor().depth(), 0);
    assert_eq!(h.ctl.cursor().set().len(), 1);
    assert_eq!(h.ctl.cursor().position(), Some(0));
    assert_eq!(h.current(), Some(opener));
}

#[test]
fn test_nested_overlays_unwind_one_level() {
    let mut doc = page();
    let body = doc.body();
    add(&mut doc, body, "p", "Fuera");
    let outer = hidden_modal(&mut doc, body, "Primero");
    let inner = hidden_modal(&mut doc, body, "Segundo");

    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    h.doc.tree.set_style(outer, ComputedStyle::default()).unwrap();
    h.wait(600);
    assert_eq!(h.ctl.cursor().overlay(), Some(outer));

    h.doc.tree.set_style(inner, ComputedStyle::default()).unwrap();
    h.wait(600);
    assert_eq!(h.ctl.cursor().depth(), 2);
    assert_eq!(h.ctl.cursor().overlay(), Some(inner));

    h.doc.tree.set_style(inner, ComputedStyle::none()).unwrap();
    h.wait(600);
    assert_eq!(h.ctl.cursor().depth(), 1);
    assert_eq!(h.ctl.cursor().overlay(), Some(outer));
    assert_eq!(h.last_spoken(), "Primero");
}

#[test]
fn test_watched_overlay_close_seen_without_polling() {
    let mut doc = page();
    let body = doc.body();
    add(&mut doc, body, "p", "Fuera");
    let modal = hidden_modal(&mut doc, body, "Dentro");

    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    h.doc.tree.set_style(modal, ComputedStyle::default()).unwrap();
    h.wait(600);
    assert_eq!(h.ctl.cursor().depth(), 1);

    // Removal from the parent is observed directly
    h.doc.tree.detach(modal).unwrap();
    h.ctl.on_dom_mutations(&mut h.doc);
    assert_eq!(h.ctl.cursor().depth(), 0);
}

#[test]
fn test_escape_without_overlay_or_panel_ignored() {
    let (doc, _) = paragraphs(&["Uno"]);
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    assert_eq!(h.key(Key::Escape), KeyOutcome::Ignored);
}

#[test]
fn test_section_reading_off_stops_polling() {
    let (doc, _) = paragraphs(&["Uno"]);
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    assert!(h.ctl.next_due().is_some());
    h.ctl.set_section_reading(&mut h.doc, false);
    assert_eq!(h.ctl.next_due(), None);
    assert_eq!(h.ctl.cursor().position(), None);
}

// ============================================================================
// Interaction modes
// ============================================================================

#[test]
fn test_select_options_wrap() {
    let mut doc = page();
    let body = doc.body();
    let select = add(&mut doc, body, "select", "");
    add(&mut doc, select, "option", "S");
    add(&mut doc, select, "option", "M");
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    h.key(Key::ArrowDown);
    h.key(Key::Enter);

    h.key(Key::ArrowDown);
    h.key(Key::ArrowDown);
    h.wait(200);
    assert_eq!(h.last_spoken(), "Opción 1 de 2. S");

    // Unhandled keys reach the page
    assert_eq!(h.key(Key::Tab), KeyOutcome::Ignored);
    assert!(h.ctl.state().select_open());
}

#[test]
fn test_voice_edit_reads_hint_not_value() {
    let mut doc = page();
    let body = doc.body();
    let input = add_with(
        &mut doc,
        body,
        "input",
        "",
        &[("type", "text"), ("value", "secreto"), ("placeholder", "Nombre")],
    );
    let mut h = Harness::new(doc);
    h.ctl.toggle_numbered_voice(&mut h.doc);
    h.hear("uno");
    h.wait(200);

    assert!(h.ctl.state().input_edit());
    assert_eq!(h.doc.tree.focused(), Some(input));
    assert_eq!(h.last_spoken(), "Pista: Nombre");
    assert!(h.speech.spoken_texts().iter().all(|t| !t.contains("secreto")));
}

#[test]
fn test_voice_edit_without_placeholder_is_silent() {
    let mut doc = page();
    let body = doc.body();
    add_with(&mut doc, body, "input", "", &[("type", "text"), ("value", "secreto")]);
    let mut h = Harness::new(doc);
    h.ctl.toggle_numbered_voice(&mut h.doc);
    h.hear("uno");
    h.wait(200);
    assert!(h.ctl.state().input_edit());
    assert!(h.speech.spoken().is_empty());
}

fn carousel(controls: &[&str]) -> Document {
    let mut doc = page();
    let body = doc.body();
    let slider = add_with(&mut doc, body, "div", "", &[("class", "carousel")]);
    let slide = add_with(&mut doc, slider, "div", "", &[("class", "carousel-item active")]);
    for tag in controls {
        add(&mut doc, slide, tag, "Acción");
    }
    add(&mut doc, body, "p", "Después");
    doc
}

#[test]
fn test_slide_with_many_controls() {
    let mut h = Harness::new(carousel(&["button", "a"]));
    h.ctl.set_section_reading(&mut h.doc, true);
    h.key(Key::ArrowDown);
    h.key(Key::Enter);
    h.key(Key::Enter);
    h.wait(200);
    assert_eq!(
        h.last_spoken(),
        "Hay 2 elementos interactivos en esta diapositiva. Use Tab para navegar entre ellos."
    );
    assert!(h.ctl.state().slider_open());
}

#[test]
fn test_slide_without_controls() {
    let mut h = Harness::new(carousel(&[]));
    h.ctl.set_section_reading(&mut h.doc, true);
    h.key(Key::ArrowDown);
    h.key(Key::Enter);
    h.key(Key::Enter);
    h.wait(200);
    assert_eq!(h.last_spoken(), "No hay elementos interactivos en esta diapositiva.");
}

#[test]
fn test_single_slide_button_clicked() {
    let mut h = Harness::new(carousel(&["button"]));
    h.ctl.set_section_reading(&mut h.doc, true);
    h.key(Key::ArrowDown);
    h.key(Key::Enter);
    h.doc.tree.take_events();
    h.key(Key::Enter);
    assert!(h.doc.tree.take_events().iter().any(|e| e.is(DomEventType::Click)));
}

#[test]
fn test_tab_leaves_slider_and_moves_on() {
    let mut h = Harness::new(carousel(&[]));
    h.ctl.set_section_reading(&mut h.doc, true);
    h.key(Key::ArrowDown);
    h.key(Key::Enter);
    assert!(h.key(Key::Tab).is_handled());
    h.wait(1000);
    assert!(!h.ctl.state().slider_open());
    assert_eq!(h.last_spoken(), "Después");
}

#[test]
fn test_long_slide_text_truncated() {
    let mut doc = page();
    let body = doc.body();
    let slider = add_with(&mut doc, body, "div", "", &[("class", "swiper")]);
    let slide = add_with(&mut doc, slider, "div", "", &[("class", "swiper-slide swiper-slide-active")]);
    add(&mut doc, slide, "p", &"a".repeat(400));

    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    h.key(Key::ArrowDown);
    h.key(Key::Enter);
    h.wait(1000);
    let spoken = h.last_spoken();
    let expected = format!("Diapositiva 1 de 1. {}...", "a".repeat(300));
    assert_eq!(spoken, expected);
}

#[test]
fn test_arrows_pass_through_outside_section_reading() {
    let mut h = Harness::new(carousel(&[]));
    assert_eq!(h.key(Key::ArrowRight), KeyOutcome::Ignored);
    assert_eq!(h.key(Key::Enter), KeyOutcome::Ignored);
}

// ============================================================================
// Engines
// ============================================================================

#[test]
fn test_missing_speech_engine_notice_once() {
    let (mut doc, _) = paragraphs(&["Uno", "Dos"]);
    let host = RecordingHost::new();
    let mut ctl = ModeController::new(OverlayConfig::default(), Collaborators::new().with_host(host.clone()));
    ctl.set_section_reading(&mut doc, true);
    ctl.move_cursor(&mut doc, 1);
    ctl.read_page(&mut doc);
    ctl.move_cursor(&mut doc, 1);
    assert_eq!(host.notices(), vec!["Tu navegador no soporta TTS.".to_string()]);
    assert!(!ctl.state().flow_reading);
}

#[test]
fn test_recognition_start_failure_keeps_mode_off() {
    let (doc, _) = paragraphs(&["Uno"]);
    let mut h = Harness::new(doc);
    h.recog.fail_next_start("not-allowed");
    assert!(!h.ctl.toggle_numbered_voice(&mut h.doc));
    assert!(!h.ctl.state().numbered_voice);
    assert!(h.host.notices().is_empty());

    assert!(h.ctl.toggle_numbered_voice(&mut h.doc));
    assert_eq!(h.recog.start_count(), 1);
}

#[test]
fn test_voice_commands_keep_recognition_alive() {
    let (doc, _) = paragraphs(&["Uno"]);
    let mut h = Harness::new(doc);
    h.ctl.toggle_voice_commands();
    h.ctl.toggle_numbered_voice(&mut h.doc);
    h.ctl.toggle_numbered_voice(&mut h.doc);
    assert_eq!(h.recog.stop_count(), 0);
    assert!(h.ctl.recognition_state() != fos_a11y::RecognitionState::Idle);
}

#[test]
fn test_interim_results_ignored() {
    let (doc, _) = paragraphs(&["Uno"]);
    let mut h = Harness::new(doc);
    h.ctl.toggle_voice_commands();
    let interim = RecognitionEvent::Result { transcript: "abrir accesibilidad".into(), is_final: false };
    h.ctl.on_recognition_event(&mut h.doc, interim);
    assert!(!h.host.is_panel_open());
}

#[test]
fn test_stale_speech_events_ignored() {
    let (doc, _) = paragraphs(&["Uno"]);
    let mut h = Harness::new(doc);
    h.ctl.on_speech_event(&mut h.doc, SpeechEvent::Started(UtteranceId(999)));
    assert!(!h.host.is_speaking());
    assert!(!h.ctl.is_speaking());
}

#[test]
fn test_cursor_move_ends_page_reading() {
    let (doc, p) = paragraphs(&["A", "B", "C"]);
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    h.ctl.read_page(&mut h.doc);
    h.wait(200);
    let first = h.speech.last().unwrap().id;
    h.ctl.on_speech_event(&mut h.doc, SpeechEvent::Started(first));
    assert!(h.ctl.state().flow_reading);
    assert_eq!(h.current(), Some(p[0]));

    h.key(Key::ArrowDown);
    assert!(!h.ctl.state().flow_reading);
    assert!(!h.host.mode(ModeIndicator::FlowReading));

    h.wait(200);
    let second = h.speech.last().unwrap().id;
    h.ctl.on_speech_event(&mut h.doc, SpeechEvent::Started(second));
    h.ctl.on_speech_event(&mut h.doc, SpeechEvent::Ended(second));
    h.ctl.on_speech_event(&mut h.doc, SpeechEvent::Ended(first));
    h.wait(2000);

    assert_eq!(h.current(), Some(p[1]));
    assert_eq!(h.speech.spoken_texts(), vec!["A".to_string(), "B".to_string()]);
    assert!(!h.ctl.state().flow_reading);
}

#[test]
fn test_focus_announce_skips_widget() {
    let mut doc = page();
    let body = doc.body();
    let widget = add_with(&mut doc, body, "div", "", &[("id", "accessibility-widget")]);
    let inside = add(&mut doc, widget, "button", "Panel");
    let link = add_with(&mut doc, body, "a", "", &[("href", "/inicio"), ("aria-label", "Inicio")]);
    let mut h = Harness::new(doc);

    h.ctl.announce_focus(&h.doc, inside);
    h.ctl.announce_focus(&h.doc, link);
    h.wait(200);
    assert_eq!(h.speech.spoken_texts(), vec!["Enlace: Inicio".to_string()]);
}

#[test]
fn test_toggle_key_ignored_in_section_reading() {
    let mut doc = page();
    let body = doc.body();
    let toggle = add_with(&mut doc, body, "div", "", &[("id", "a11y-toggle-btn")]);
    let mut h = Harness::new(doc);
    h.ctl.set_section_reading(&mut h.doc, true);
    let outcome = h.ctl.handle_key(&mut h.doc, KeyEvent::on(Key::Enter, toggle));
    assert_eq!(outcome, KeyOutcome::Ignored);
    assert!(!h.host.is_panel_open());
}
