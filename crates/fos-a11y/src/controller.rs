//! Mode controller
//!
//! Sole owner of the [`NavigationState`]. Keyboard events, voice
//! transcripts, engine callbacks and timers all enter here. Every failure
//! is recovered at this boundary as a log line or a user notice; nothing
//! propagates to the host page.

use std::collections::HashSet;
use std::time::Duration;

use fos_dom::{Document, DomEventType, DomResult, DomTree, InputType, NodeId, ScrollBehavior, ScrollBlock};

use crate::aria;
use crate::classifier::{Classifier, ElementKind};
use crate::config::{OverlayConfig, PreferenceStore, Preferences, STORAGE_KEY};
use crate::cursor::VirtualCursor;
use crate::host::{ModeIndicator, NullHost, WidgetHost};
use crate::i18n::{Language, ValueHint};
use crate::keyboard::{Key, KeyEvent, KeyOutcome};
use crate::overlay::{self, OverlayWatch};
use crate::readable::{self, ReadableSet, ReadableSetBuilder};
use crate::recognition::{RecognitionEngine, RecognitionEvent, RecognitionSession, RecognitionState, SessionOutput};
use crate::recording::MemoryPreferenceStore;
use crate::scheduler::{Scheduler, Task};
use crate::speech::{
    PipelineEvent, PrefixVoiceResolver, SequenceItem, SpeechEngine, SpeechEvent, SpeechPipeline, VoiceResolver,
};
use crate::state::{Interaction, ModeEvent, NavigationState};
use crate::visibility::{ScanScope, should_ignore};
use crate::voice::{self, VoiceCommand};
use crate::A11yError;

/// Class marking the control that owns the keyboard
const EDIT_MARKER: &str = "a11y-input-edit-mode";

/// Characters of slide text read after the position
const SLIDE_TEXT_LIMIT: usize = 300;

/// Everything the controller talks to
pub struct Collaborators {
    pub speech: Option<Box<dyn SpeechEngine>>,
    pub recognition: Option<Box<dyn RecognitionEngine>>,
    pub host: Box<dyn WidgetHost>,
    pub store: Box<dyn PreferenceStore>,
    pub resolver: Box<dyn VoiceResolver>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            speech: None,
            recognition: None,
            host: Box::new(NullHost::new()),
            store: Box::new(MemoryPreferenceStore::new()),
            resolver: Box::new(PrefixVoiceResolver),
        }
    }
}

impl Collaborators {
    /// No engines, a silent host and an in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_speech(mut self, engine: impl SpeechEngine + 'static) -> Self {
        self.speech = Some(Box::new(engine));
        self
    }

    pub fn with_recognition(mut self, engine: impl RecognitionEngine + 'static) -> Self {
        self.recognition = Some(Box::new(engine));
        self
    }

    pub fn with_host(mut self, host: impl WidgetHost + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    pub fn with_store(mut self, store: impl PreferenceStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_resolver(mut self, resolver: impl VoiceResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }
}

/// Capability notices shown at most once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Notice {
    Speech,
    Recognition,
}

/// How an entry was activated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Keyboard,
    Voice,
}

/// What Enter does on the single control of a slide
#[derive(Debug, Clone, Copy)]
enum SlideAction {
    Edit,
    Select,
    Click,
}

/// Central dispatcher of the overlay
pub struct ModeController {
    config: OverlayConfig,
    lang: Language,
    state: NavigationState,
    cursor: VirtualCursor,
    /// Set addressed by spoken numbers while numbered voice mode is on
    numbered: Option<ReadableSet>,
    voice_commands: bool,
    speech: SpeechPipeline,
    recognition: RecognitionSession,
    scheduler: Scheduler,
    watch: OverlayWatch,
    /// Overlays rendered at the last check
    known_open: Vec<NodeId>,
    host: Box<dyn WidgetHost>,
    store: Box<dyn PreferenceStore>,
    prefs: Preferences,
    shown: HashSet<Notice>,
}

impl ModeController {
    /// Create a controller and apply stored preferences to the host
    pub fn new(config: OverlayConfig, collaborators: Collaborators) -> Self {
        let Collaborators { speech, recognition, mut host, store, resolver } = collaborators;
        let prefs = Preferences::load(store.as_ref());
        let mut speech = SpeechPipeline::new(speech, resolver);
        speech.set_rate(prefs.reading_rate);

        host.apply_font_size(&prefs.font_size);
        host.apply_theme(&prefs.theme);
        host.apply_cursor_size(&prefs.cursor_size);
        host.set_dyslexia(prefs.dyslexia_mode);

        let lang = Language::from_tag(&config.default_lang);
        tracing::info!("Accessibility overlay ready ({}, speech: {})", config.default_lang, speech.is_available());

        Self {
            recognition: RecognitionSession::new(recognition, &config.default_lang),
            config,
            lang,
            state: NavigationState::default(),
            cursor: VirtualCursor::new(ReadableSet::empty(ScanScope::Global)),
            numbered: None,
            voice_commands: false,
            speech,
            scheduler: Scheduler::new(),
            watch: OverlayWatch::new(),
            known_open: Vec::new(),
            host,
            store,
            prefs,
            shown: HashSet::new(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn cursor(&self) -> &VirtualCursor {
        &self.cursor
    }

    /// Set behind the number badges, `None` outside numbered voice mode
    pub fn numbered_set(&self) -> Option<&ReadableSet> {
        self.numbered.as_ref()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn is_speaking(&self) -> bool {
        self.speech.is_speaking()
    }

    pub fn recognition_state(&self) -> RecognitionState {
        self.recognition.state()
    }

    pub fn voice_commands_enabled(&self) -> bool {
        self.voice_commands
    }

    /// Virtual time of the event loop
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// When the next timer fires
    pub fn next_due(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    // ------------------------------------------------------------------
    // Event loop entry points
    // ------------------------------------------------------------------

    /// Run every timer due at or before `now`
    pub fn advance(&mut self, doc: &mut Document, now: Duration) {
        while let Some(task) = self.scheduler.pop_due(now) {
            self.run_task(doc, task);
        }
        self.scheduler.set_now(now);
    }

    fn run_task(&mut self, doc: &mut Document, task: Task) {
        tracing::trace!("Timer fired: {:?}", task);
        match task {
            Task::DeliverUtterance(id) => self.speech.deliver(id),
            Task::DetectOverlay { before } => {
                if self.state.section_reading {
                    self.sync_overlays(doc, Some(before));
                }
                if self.state.numbered_voice {
                    self.refresh_numbered(doc);
                }
            }
            Task::PollOverlay => {
                if !self.state.section_reading {
                    return;
                }
                if self.watch.generation_changed(&doc.tree) {
                    self.sync_overlays(doc, None);
                }
                self.schedule_poll();
            }
            Task::ReadSlide { slider } => self.read_slide(doc, slider),
            Task::RestartRecognition => {
                if let Err(e) = self.recognition.restart() {
                    self.recover(e);
                }
            }
        }
    }

    /// Host callback after page scripts mutated the document
    pub fn on_dom_mutations(&mut self, doc: &mut Document) {
        if self.state.section_reading && self.watch.has_changes(&mut doc.tree) {
            tracing::debug!("Watched overlay changed");
            self.sync_overlays(doc, None);
        }
    }

    /// Speech engine callback
    pub fn on_speech_event(&mut self, doc: &mut Document, event: SpeechEvent) {
        for event in self.speech.on_event(event) {
            match event {
                PipelineEvent::Started(_) => self.host.set_speaking_indicator(true),
                PipelineEvent::Finished(_) => self.host.set_speaking_indicator(false),
                PipelineEvent::ItemStarted { node: Some(node), .. } => self.follow_reading(doc, node),
                PipelineEvent::ItemStarted { node: None, .. } => {}
                PipelineEvent::SequenceDone => {
                    tracing::info!("Page reading finished");
                    self.transition(doc, ModeEvent::SetFlowReading(false));
                    self.hide_highlight();
                }
            }
        }
    }

    /// Recognition engine callback
    pub fn on_recognition_event(&mut self, doc: &mut Document, event: RecognitionEvent) {
        match self.recognition.on_event(event) {
            Some(SessionOutput::Transcript(transcript)) => self.handle_transcript(doc, &transcript),
            Some(SessionOutput::RestartNeeded) => {
                self.scheduler
                    .schedule(self.config.timings.recognition_restart(), Task::RestartRecognition);
            }
            None => {}
        }
    }

    // ------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------

    /// Dispatch one key press; `Handled` means the page must not see it
    pub fn handle_key(&mut self, doc: &mut Document, event: KeyEvent) -> KeyOutcome {
        let key = event.key;
        match self.state.interaction {
            Interaction::SelectOpen { select, option } => return self.select_key(doc, select, option, key),
            Interaction::InputEdit { input } => {
                if key == Key::Escape {
                    self.exit_input_edit(doc, input);
                    return KeyOutcome::Handled;
                }
                // Typing goes to the control
                return KeyOutcome::Ignored;
            }
            _ => {}
        }

        if key.is_arrow() && !self.state.section_reading {
            return KeyOutcome::Ignored;
        }

        if let Interaction::SliderOpen { slider } = self.state.interaction {
            return self.slider_key(doc, slider, key);
        }

        if self.state.section_reading {
            if let Some(step) = key.step() {
                self.move_cursor(doc, step);
                return KeyOutcome::Handled;
            }
            if key == Key::Enter {
                if let Some(node) = self.cursor.current().map(|e| e.node) {
                    if doc.tree.is_connected(node) {
                        self.activate(doc, node, Activation::Keyboard);
                    } else {
                        self.move_cursor(doc, 0);
                    }
                    return KeyOutcome::Handled;
                }
            }
        }

        if key == Key::Escape {
            return self.escape(doc);
        }

        let on_toggle = event
            .target
            .is_some_and(|t| doc.tree.attr(t, "id") == Some(self.config.toggle_id.as_str()));
        if matches!(key, Key::Enter | Key::Space) && !self.state.section_reading && on_toggle {
            self.toggle_panel();
            return KeyOutcome::Handled;
        }

        KeyOutcome::Ignored
    }

    fn escape(&mut self, doc: &mut Document) -> KeyOutcome {
        if self.state.section_reading {
            let view: &Document = doc;
            let open = self
                .cursor
                .overlay()
                .filter(|&o| overlay::is_overlay_open(view, &self.config, o))
                .or_else(|| overlay::find_opened_overlay(view, &self.config));
            if let Some(close) = open.and_then(|o| close_control(&view.tree, o)) {
                tracing::debug!("Closing overlay through {}", close);
                self.click(doc, close);
                self.schedule_detect(doc);
                return KeyOutcome::Handled;
            }
        }
        if self.state.panel_open {
            self.close_panel();
            return KeyOutcome::Handled;
        }
        KeyOutcome::Ignored
    }

    // ------------------------------------------------------------------
    // Virtual cursor
    // ------------------------------------------------------------------

    /// Move the virtual cursor and present the entry it lands on
    ///
    /// An entry whose element left the document is skipped: the active
    /// set is rebuilt and the cursor lands on whatever took its place.
    pub fn move_cursor(&mut self, doc: &mut Document, step: isize) -> Option<usize> {
        if self.cursor.set().is_empty() {
            let set = self.build(doc, self.active_scope());
            self.cursor.replace_set(set);
        }
        self.cursor.move_by(step)?;

        if !self.cursor.current().is_some_and(|e| doc.tree.is_connected(e.node)) {
            tracing::warn!("Entry under the cursor left the document, skipping");
            let set = self.build(doc, self.active_scope());
            self.cursor.replace_set(set);
            if self.cursor.position().is_none() {
                self.cursor.move_by(step)?;
            }
        }

        let position = self.cursor.position()?;
        tracing::debug!("Cursor at {} of {}", position + 1, self.cursor.set().len());
        self.present_current(doc);
        Some(position)
    }

    fn active_scope(&self) -> ScanScope {
        self.cursor.overlay().map_or(ScanScope::Global, ScanScope::Within)
    }

    fn build(&self, doc: &Document, scope: ScanScope) -> ReadableSet {
        ReadableSetBuilder::new(doc, &self.config).scope(scope).build()
    }

    fn present_current(&mut self, doc: &mut Document) {
        let Some(entry) = self.cursor.current().cloned() else {
            return;
        };
        self.check(doc.tree.scroll_into_view(entry.node, ScrollBehavior::Smooth, ScrollBlock::Center));
        self.show_highlight(doc, entry.node);
        let text = Classifier::new(doc, &self.config)
            .classify(entry.node)
            .map_or(entry.text, |c| c.text);
        self.say(&text, &entry.lang);
    }

    fn show_highlight(&mut self, doc: &Document, node: NodeId) {
        let rect = doc.tree.layout_rect(node);
        self.host.highlight(Some(node), rect);
        self.host.reading_line(rect.map(|r| r.center_y()));
    }

    fn hide_highlight(&mut self) {
        self.host.highlight(None, None);
        self.host.reading_line(None);
    }

    // ------------------------------------------------------------------
    // Activation
    // ------------------------------------------------------------------

    fn activate(&mut self, doc: &mut Document, node: NodeId, via: Activation) {
        let (kind, text, lang) = {
            let classifier = Classifier::new(doc, &self.config);
            let text = classifier.classify(node).map(|c| c.text).unwrap_or_default();
            (classifier.kind_of(node), text, classifier.resolve_lang(node))
        };
        tracing::debug!("Activating {} ({:?}, {:?})", node, kind, via);

        match kind {
            Some(ElementKind::Button | ElementKind::Link) => {
                if via == Activation::Voice {
                    self.say(&text, &lang);
                }
                self.click(doc, node);
                self.schedule_detect(doc);
            }
            Some(ElementKind::Input | ElementKind::Textarea) => self.enter_input_edit(doc, node, via),
            Some(ElementKind::Select) => self.open_select(doc, node),
            Some(ElementKind::Media) => self.toggle_media(doc, node),
            Some(ElementKind::Slider) => self.enter_slider(doc, node),
            _ if via == Activation::Voice => self.say(&text, &lang),
            _ => {}
        }
    }

    /// Voice dispatch of a numbered entry
    pub fn activate_number(&mut self, doc: &mut Document, number: usize) {
        if number == 0 {
            self.toggle_panel();
            return;
        }
        let node = self
            .numbered
            .as_ref()
            .and_then(|set| set.by_sequence(number))
            .map(|e| e.node)
            .filter(|&n| doc.tree.is_connected(n));
        match node {
            Some(node) => self.activate(doc, node, Activation::Voice),
            None => {
                tracing::debug!("Numbered entry {} is gone", number);
                let message = self.lang.not_found(number);
                self.say_ui(&message);
            }
        }
    }

    fn schedule_detect(&mut self, doc: &Document) {
        let before = overlay::opened_overlays(doc, &self.config);
        self.scheduler
            .schedule(self.config.timings.activation_detect(), Task::DetectOverlay { before });
    }

    fn click(&mut self, doc: &mut Document, node: NodeId) {
        self.check(doc.tree.click(node));
    }

    // ------------------------------------------------------------------
    // Input edit
    // ------------------------------------------------------------------

    fn enter_input_edit(&mut self, doc: &mut Document, input: NodeId, via: Activation) {
        self.transition(doc, ModeEvent::EnterInputEdit { input });
        self.check(doc.tree.add_class(input, EDIT_MARKER));
        self.check(doc.tree.focus(input));

        let (message, lang) = {
            let classifier = Classifier::new(doc, &self.config);
            let tree = &doc.tree;
            let placeholder = tree.attr(input, "placeholder").unwrap_or("").trim();
            let message = match via {
                Activation::Keyboard => {
                    let textarea = tree.has_tag(input, "textarea");
                    let control = InputType::parse(tree.attr(input, "type").unwrap_or("text")).as_str();
                    let value = tree.value(input);
                    let hint = ValueHint::new(&value, placeholder);
                    self.lang.input_edit_entered(&classifier.label_text(input), control, textarea, hint)
                }
                // Never read the value aloud on voice entry
                Activation::Voice if !placeholder.is_empty() => self.lang.input_hint(placeholder),
                Activation::Voice => String::new(),
            };
            (message, classifier.resolve_lang(input))
        };
        tracing::info!("Input edit mode on {}", input);
        self.say(&message, &lang);
    }

    fn exit_input_edit(&mut self, doc: &mut Document, input: NodeId) {
        self.transition(doc, ModeEvent::CloseInteraction);
        let value = doc.tree.value(input);
        let lang = Classifier::new(doc, &self.config).resolve_lang(input);
        let message = self.lang.input_edit_exited(value.trim());
        tracing::info!("Input edit mode off");
        self.say(&message, &lang);
    }

    // ------------------------------------------------------------------
    // Select navigation
    // ------------------------------------------------------------------

    fn open_select(&mut self, doc: &mut Document, select: NodeId) {
        let total = doc.tree.options(select).len();
        let (label, lang) = {
            let classifier = Classifier::new(doc, &self.config);
            (classifier.label_text(select), classifier.resolve_lang(select))
        };
        if total == 0 {
            self.say(self.lang.select_empty(), &lang);
            return;
        }

        let option = doc.tree.selected_index(select).unwrap_or(0);
        self.transition(doc, ModeEvent::OpenSelect { select, option });
        self.check(doc.tree.add_class(select, EDIT_MARKER));

        let text = Classifier::new(doc, &self.config)
            .option_text(select, option)
            .unwrap_or_default();
        let message = self.lang.select_opened(&label, option, total, &text);
        self.say(&message, &lang);
    }

    fn select_key(&mut self, doc: &mut Document, select: NodeId, option: usize, key: Key) -> KeyOutcome {
        if let Some(step) = key.step() {
            let total = doc.tree.options(select).len();
            if total == 0 {
                return KeyOutcome::Handled;
            }
            let next = (option as isize + step).rem_euclid(total as isize) as usize;
            self.transition(doc, ModeEvent::MoveSelectOption(next));
            let (text, lang) = {
                let classifier = Classifier::new(doc, &self.config);
                (classifier.option_text(select, next).unwrap_or_default(), classifier.resolve_lang(select))
            };
            let message = self.lang.select_option(next, total, &text);
            self.say(&message, &lang);
            return KeyOutcome::Handled;
        }
        match key {
            Key::Enter => {
                self.commit_select(doc, select, option);
                KeyOutcome::Handled
            }
            Key::Escape => {
                self.close_select(doc, select);
                KeyOutcome::Handled
            }
            _ => KeyOutcome::Ignored,
        }
    }

    fn commit_select(&mut self, doc: &mut Document, select: NodeId, option: usize) {
        self.check(doc.tree.set_selected_index(select, option));
        self.check(doc.tree.dispatch(select, DomEventType::Change));
        self.transition(doc, ModeEvent::CloseInteraction);
        let (text, lang) = {
            let classifier = Classifier::new(doc, &self.config);
            (classifier.option_text(select, option).unwrap_or_default(), classifier.resolve_lang(select))
        };
        let message = self.lang.select_committed(&text);
        self.say(&message, &lang);
    }

    fn close_select(&mut self, doc: &mut Document, select: NodeId) {
        self.transition(doc, ModeEvent::CloseInteraction);
        let (selected, lang) = {
            let classifier = Classifier::new(doc, &self.config);
            let selected = doc
                .tree
                .selected_index(select)
                .and_then(|i| classifier.option_text(select, i));
            (selected, classifier.resolve_lang(select))
        };
        let message = self.lang.select_closed(selected.as_deref());
        self.say(&message, &lang);
    }

    // ------------------------------------------------------------------
    // Media
    // ------------------------------------------------------------------

    fn toggle_media(&mut self, doc: &mut Document, media: NodeId) {
        let paused = doc.tree.is_paused(media);
        self.check(doc.tree.set_paused(media, !paused));
        let audio = doc.tree.has_tag(media, "audio");
        let (title, lang) = {
            let classifier = Classifier::new(doc, &self.config);
            (classifier.media_title(media), classifier.resolve_lang(media))
        };
        let message = self.lang.media_toggled(audio, paused, title.as_deref());
        self.say(&message, &lang);
    }

    // ------------------------------------------------------------------
    // Slider navigation
    // ------------------------------------------------------------------

    fn enter_slider(&mut self, doc: &mut Document, slider: NodeId) {
        self.transition(doc, ModeEvent::OpenSlider { slider });
        let lang = Classifier::new(doc, &self.config).resolve_lang(slider);
        tracing::info!("Slider mode on {}", slider);
        self.say(self.lang.slider_entered(), &lang);
        self.scheduler
            .schedule(self.config.timings.slide_read(), Task::ReadSlide { slider });
    }

    fn exit_slider(&mut self, doc: &mut Document) {
        self.transition(doc, ModeEvent::CloseInteraction);
        tracing::info!("Slider mode off");
        self.say_ui(self.lang.slider_exited());
    }

    fn slider_key(&mut self, doc: &mut Document, slider: NodeId, key: Key) -> KeyOutcome {
        match key {
            Key::ArrowRight | Key::ArrowDown => self.navigate_slider(doc, slider, true),
            Key::ArrowLeft | Key::ArrowUp => self.navigate_slider(doc, slider, false),
            Key::Escape => self.exit_slider(doc),
            Key::Enter => self.interact_with_slide(doc, slider),
            Key::Tab => {
                self.transition(doc, ModeEvent::CloseInteraction);
                self.move_cursor(doc, 1);
            }
            _ => return KeyOutcome::Ignored,
        }
        KeyOutcome::Handled
    }

    fn navigate_slider(&mut self, doc: &mut Document, slider: NodeId, forward: bool) {
        let Some(control) = slider_control(&doc.tree, slider, forward) else {
            tracing::debug!("No usable {} control on {}", if forward { "next" } else { "prev" }, slider);
            return;
        };
        self.click(doc, control);
        self.scheduler.cancel_where(|t| matches!(t, Task::ReadSlide { .. }));
        self.scheduler
            .schedule(self.config.timings.slide_nav_read(), Task::ReadSlide { slider });
    }

    fn read_slide(&mut self, doc: &Document, slider: NodeId) {
        let (message, lang) = {
            let classifier = Classifier::new(doc, &self.config);
            let slides = classifier.slides(slider);
            let Some(index) = slides.iter().position(|&s| is_active_slide(&doc.tree, s)) else {
                tracing::debug!("Carousel {} has no active slide", slider);
                return;
            };
            let mut message = self.lang.slide_position(index + 1, slides.len());
            let text = classifier.visible_text(slides[index]);
            if !text.is_empty() {
                message.push_str(". ");
                message.extend(text.chars().take(SLIDE_TEXT_LIMIT));
                if text.chars().count() > SLIDE_TEXT_LIMIT {
                    message.push_str("...");
                }
            }
            (message, classifier.resolve_lang(slider))
        };
        self.say(&message, &lang);
    }

    fn interact_with_slide(&mut self, doc: &mut Document, slider: NodeId) {
        let slides = Classifier::new(doc, &self.config).slides(slider);
        let Some(active) = slides.into_iter().find(|&s| is_active_slide(&doc.tree, s)) else {
            return;
        };
        let controls = doc.tree.find_all(active, is_slide_control);
        match controls.as_slice() {
            [] => self.say_ui(self.lang.slide_no_interactive()),
            &[control] => match slide_action(&doc.tree, control) {
                SlideAction::Edit => self.enter_input_edit(doc, control, Activation::Keyboard),
                SlideAction::Select => self.open_select(doc, control),
                SlideAction::Click => self.click(doc, control),
            },
            many => {
                let message = self.lang.slide_many_interactive(many.len());
                self.say_ui(&message);
            }
        }
    }

    // ------------------------------------------------------------------
    // Overlay scopes
    // ------------------------------------------------------------------

    /// Pop scopes whose overlay closed, push one for a newly opened overlay
    ///
    /// `before` lists overlays open before an activation; `None` compares
    /// against the last check.
    fn sync_overlays(&mut self, doc: &mut Document, before: Option<Vec<NodeId>>) {
        let before = before.unwrap_or_else(|| std::mem::take(&mut self.known_open));
        let mut changed = false;

        while let Some(current) = self.cursor.overlay() {
            if overlay::is_overlay_open(doc, &self.config, current) {
                break;
            }
            tracing::info!("Overlay {} closed", current);
            self.exit_scope(doc);
            changed = true;
        }

        let open = overlay::opened_overlays(doc, &self.config);
        let stacked = self.cursor.overlays();
        let fresh = open.iter().copied().find(|o| !stacked.contains(o) && !before.contains(o));
        if let Some(fresh) = fresh {
            self.enter_scope(doc, fresh);
            changed = true;
        } else if !changed {
            let set = self.build(doc, self.active_scope());
            self.cursor.replace_set(set);
        }

        self.known_open = open;
        if changed {
            self.rearm_watch(doc);
        }
    }

    fn enter_scope(&mut self, doc: &mut Document, overlay: NodeId) {
        let set = self.build(doc, ScanScope::Within(overlay));
        tracing::info!("Entering overlay {} ({} entries)", overlay, set.len());
        self.cursor.enter_nested(set, overlay);
        let (announcement, lang) = {
            let classifier = Classifier::new(doc, &self.config);
            (overlay_announcement(doc, &self.config, &classifier, overlay), classifier.resolve_lang(overlay))
        };
        self.say(&announcement, &lang);
    }

    fn exit_scope(&mut self, doc: &mut Document) {
        let outer = self.cursor.parent_overlay().map_or(ScanScope::Global, ScanScope::Within);
        let rebuilt = self.build(doc, outer);
        match self.cursor.exit_nested(rebuilt) {
            Some(position) => {
                tracing::info!("Navigation resumed at {}", position + 1);
                self.present_current(doc);
            }
            None => self.hide_highlight(),
        }
    }

    fn rearm_watch(&mut self, doc: &mut Document) {
        let mut targets: Vec<NodeId> = self
            .config
            .side_menu_id
            .as_deref()
            .and_then(|id| doc.get_element_by_id(id))
            .into_iter()
            .collect();
        for overlay in self.cursor.overlays() {
            if !targets.contains(&overlay) {
                targets.push(overlay);
            }
        }
        if targets.is_empty() {
            self.watch.disarm(&mut doc.tree);
        } else {
            self.watch.arm(&mut doc.tree, &targets);
        }
    }

    fn schedule_poll(&mut self) {
        if !self.scheduler.is_pending(|t| matches!(t, Task::PollOverlay)) {
            self.scheduler.schedule(self.config.timings.overlay_poll(), Task::PollOverlay);
        }
    }

    // ------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------

    pub fn toggle_section_reading(&mut self, doc: &mut Document) -> bool {
        let on = !self.state.section_reading;
        self.set_section_reading(doc, on);
        on
    }

    pub fn set_section_reading(&mut self, doc: &mut Document, on: bool) {
        if on == self.state.section_reading {
            return;
        }
        if on {
            self.transition(doc, ModeEvent::SetSectionReading(true));
            let global = self.build(doc, ScanScope::Global);
            tracing::info!("Section reading on ({} entries)", global.len());
            self.cursor.reset_to(global);
            self.known_open = overlay::opened_overlays(doc, &self.config);
            self.rearm_watch(doc);
            self.schedule_poll();
            self.close_panel();
        } else {
            self.stop(doc);
            self.transition(doc, ModeEvent::SetSectionReading(false));
            self.cursor.reset_to(ReadableSet::empty(ScanScope::Global));
            self.watch.disarm(&mut doc.tree);
            self.scheduler.cancel_where(|t| matches!(t, Task::PollOverlay));
            tracing::info!("Section reading off");
        }
        self.host.mode_changed(ModeIndicator::SectionReading, on);
    }

    /// Returns whether the mode is on afterwards
    pub fn toggle_numbered_voice(&mut self, doc: &mut Document) -> bool {
        let on = !self.state.numbered_voice;
        self.set_numbered_voice(doc, on)
    }

    /// Activation aborts with a one-time notice when recognition is missing
    pub fn set_numbered_voice(&mut self, doc: &mut Document, on: bool) -> bool {
        if on == self.state.numbered_voice {
            return on;
        }
        if on {
            if let Err(e) = self.recognition.start() {
                self.recover(e);
                return false;
            }
            self.transition(doc, ModeEvent::SetNumberedVoice(true));
            self.refresh_numbered(doc);
            self.close_panel();
            tracing::info!(
                "Numbered voice mode on ({} entries)",
                self.numbered.as_ref().map_or(0, ReadableSet::len)
            );
        } else {
            self.transition(doc, ModeEvent::SetNumberedVoice(false));
            self.numbered = None;
            self.check(readable::clear_number_badges(doc, &self.config));
            if !self.voice_commands {
                self.recognition.stop();
            }
            tracing::info!("Numbered voice mode off");
        }
        self.host.mode_changed(ModeIndicator::NumberedVoice, on);
        on
    }

    fn refresh_numbered(&mut self, doc: &mut Document) {
        // Old badges must not count as content
        self.check(readable::clear_number_badges(doc, &self.config));
        let set = self.build(doc, ScanScope::Global);
        self.check(readable::apply_number_badges(doc, &self.config, &set));
        self.numbered = Some(set);
    }

    /// General voice phrases; returns whether listening afterwards
    pub fn toggle_voice_commands(&mut self) -> bool {
        if self.voice_commands {
            self.voice_commands = false;
            if !self.state.numbered_voice {
                self.recognition.stop();
            }
        } else {
            if let Err(e) = self.recognition.start() {
                self.recover(e);
                return false;
            }
            self.voice_commands = true;
        }
        tracing::info!("Voice commands {}", if self.voice_commands { "on" } else { "off" });
        self.host.mode_changed(ModeIndicator::VoiceCommands, self.voice_commands);
        self.voice_commands
    }

    fn handle_transcript(&mut self, doc: &mut Document, transcript: &str) {
        let total = self
            .state
            .numbered_voice
            .then(|| self.numbered.as_ref().map_or(1, |set| set.len() + 1));
        let Some(command) = voice::interpret(transcript, total, self.lang) else {
            tracing::debug!("No command in {:?}", transcript);
            return;
        };
        tracing::info!("Voice command {:?}", command);

        match command {
            VoiceCommand::Deactivate => {
                self.set_numbered_voice(doc, false);
            }
            VoiceCommand::ClosePanel => {
                if self.state.panel_open {
                    self.close_panel();
                }
            }
            VoiceCommand::OpenPanel => self.open_panel(),
            VoiceCommand::Number(n) => self.activate_number(doc, n),
            VoiceCommand::NumberOutOfRange(n) => {
                let message = self.lang.not_found(n);
                self.say_ui(&message);
            }
            VoiceCommand::ReadPage => self.read_page(doc),
            VoiceCommand::Stop => self.stop(doc),
            VoiceCommand::Next => {
                self.move_cursor(doc, 1);
            }
            VoiceCommand::Previous => {
                self.move_cursor(doc, -1);
            }
            VoiceCommand::IncreaseText => self.set_font_size("large"),
            VoiceCommand::DecreaseText => self.set_font_size("small"),
        }
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Read the whole page from the top, one entry after another
    pub fn read_page(&mut self, doc: &mut Document) {
        let set = self.build(doc, ScanScope::Global);
        if set.is_empty() {
            self.host.notify(self.lang.nothing_to_read());
            return;
        }
        self.close_panel();

        let items: Vec<SequenceItem> = {
            let classifier = Classifier::new(doc, &self.config);
            set.entries()
                .iter()
                .map(|e| SequenceItem {
                    text: classifier.classify(e.node).map_or_else(|| e.text.clone(), |c| c.text),
                    lang: e.lang.clone(),
                    node: Some(e.node),
                })
                .collect()
        };
        if self.cursor.overlay().is_none() {
            self.cursor.replace_set(set);
        }

        match self.speech.speak_sequential(items, &mut self.scheduler, self.config.timings.settle()) {
            Ok(true) => {
                tracing::info!("Reading page");
                self.transition(doc, ModeEvent::SetFlowReading(true));
            }
            Ok(false) => self.host.notify(self.lang.nothing_to_read()),
            Err(e) => self.recover(e),
        }
    }

    fn follow_reading(&mut self, doc: &mut Document, node: NodeId) {
        if !doc.tree.is_connected(node) {
            return;
        }
        self.check(doc.tree.scroll_into_view(node, ScrollBehavior::Smooth, ScrollBlock::Center));
        self.show_highlight(doc, node);
        if let Some(position) = self.cursor.set().position_of(node) {
            self.cursor.move_to(position);
        }
    }

    /// Silence speech and hide the reading aids
    pub fn stop(&mut self, doc: &mut Document) {
        self.speech.stop();
        if self.state.flow_reading {
            self.transition(doc, ModeEvent::SetFlowReading(false));
        }
        self.host.set_speaking_indicator(false);
        self.hide_highlight();
    }

    /// Speak host-selected text in the language of its anchor
    pub fn read_selection(&mut self, doc: &Document, text: &str, anchor: Option<NodeId>) {
        let text = text.trim();
        if text.is_empty() {
            self.host.notify(self.lang.select_text_prompt());
            return;
        }
        if anchor.is_some_and(|a| should_ignore(doc, &self.config, a)) {
            self.host.notify(self.lang.selection_opted_out());
            return;
        }
        let lang = match anchor {
            Some(a) => Classifier::new(doc, &self.config).resolve_lang(a),
            None => self.config.default_lang.clone(),
        };
        self.close_panel();
        self.say(text, &lang);
    }

    /// Short role-prefixed label for a natively focused control
    pub fn announce_focus(&mut self, doc: &Document, node: NodeId) {
        if !is_focus_target(&doc.tree, node) || should_ignore(doc, &self.config, node) {
            return;
        }
        let (message, lang) = {
            let classifier = Classifier::new(doc, &self.config);
            let tree = &doc.tree;
            let text = classifier.visible_text(node);
            let value = tree.value(node);
            let label = [
                tree.attr(node, "aria-label"),
                Some(text.as_str()),
                Some(value.as_str()),
                tree.attr(node, "title"),
                tree.attr(node, "alt"),
            ]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(self.lang.interactive_fallback())
            .to_string();
            let tag = tree.tag_name(node).unwrap_or("");
            (self.lang.focus_label(tag, &label), classifier.resolve_lang(node))
        };
        self.say(&message, &lang);
    }

    // ------------------------------------------------------------------
    // Panel and preferences
    // ------------------------------------------------------------------

    pub fn open_panel(&mut self) {
        self.state = self.state.apply(ModeEvent::SetPanelOpen(true)).state;
        self.host.open_panel();
    }

    pub fn close_panel(&mut self) {
        if self.state.panel_open {
            self.state = self.state.apply(ModeEvent::SetPanelOpen(false)).state;
            self.host.close_panel();
        }
    }

    pub fn toggle_panel(&mut self) {
        if self.state.panel_open {
            self.close_panel();
        } else {
            self.open_panel();
        }
    }

    pub fn set_reading_rate(&mut self, rate: f32) {
        self.speech.set_rate(rate);
        self.prefs.reading_rate = self.speech.rate();
        self.persist();
    }

    pub fn set_font_size(&mut self, size: &str) {
        self.prefs.font_size = size.to_string();
        self.host.apply_font_size(size);
        self.persist();
    }

    pub fn set_theme(&mut self, theme: &str) {
        self.prefs.theme = theme.to_string();
        self.host.apply_theme(theme);
        self.persist();
    }

    pub fn set_cursor_size(&mut self, size: &str) {
        self.prefs.cursor_size = size.to_string();
        self.host.apply_cursor_size(size);
        self.persist();
    }

    pub fn set_dyslexia(&mut self, on: bool) {
        self.prefs.dyslexia_mode = on;
        self.host.set_dyslexia(on);
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(e) = self.prefs.save(self.store.as_mut()) {
            self.recover(e);
        }
    }

    /// Every mode off, badges and markers removed, preferences forgotten
    pub fn reset_all(&mut self, doc: &mut Document) {
        self.stop(doc);
        self.numbered = None;
        self.check(readable::clear_number_badges(doc, &self.config));
        self.voice_commands = false;
        self.recognition.stop();

        let root = doc.tree.root();
        for marked in doc.tree.find_all(root, |t, n| t.has_class(n, EDIT_MARKER)) {
            self.check(doc.tree.remove_class(marked, EDIT_MARKER));
        }
        self.transition(doc, ModeEvent::Reset);
        self.cursor.reset_to(ReadableSet::empty(ScanScope::Global));
        self.watch.disarm(&mut doc.tree);
        self.scheduler.cancel_where(|_| true);
        self.known_open.clear();

        self.prefs = Preferences::default();
        self.speech.set_rate(self.prefs.reading_rate);
        self.store.remove(STORAGE_KEY);
        self.host.apply_font_size(&self.prefs.font_size);
        self.host.apply_theme(&self.prefs.theme);
        self.host.apply_cursor_size(&self.prefs.cursor_size);
        self.host.set_dyslexia(false);
        for mode in [
            ModeIndicator::SectionReading,
            ModeIndicator::NumberedVoice,
            ModeIndicator::VoiceCommands,
            ModeIndicator::FlowReading,
        ] {
            self.host.mode_changed(mode, false);
        }
        tracing::info!("Settings reset");
        self.host.notify(self.lang.settings_reset());
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    /// Apply a mode event and undo whatever interaction it ended
    fn transition(&mut self, doc: &mut Document, event: ModeEvent) {
        let transition = self.state.apply(event);
        let flow_changed = transition.state.flow_reading != self.state.flow_reading;
        self.state = transition.state;
        if flow_changed {
            self.host.mode_changed(ModeIndicator::FlowReading, self.state.flow_reading);
        }
        if let Some(left) = transition.left {
            self.leave(doc, left);
        }
    }

    fn leave(&mut self, doc: &mut Document, interaction: Interaction) {
        tracing::debug!("Leaving {:?}", interaction);
        match interaction {
            Interaction::InputEdit { input: control } | Interaction::SelectOpen { select: control, .. } => {
                self.check(doc.tree.remove_class(control, EDIT_MARKER));
                self.check(doc.tree.blur(control));
            }
            Interaction::SliderOpen { .. } => {
                self.scheduler.cancel_where(|t| matches!(t, Task::ReadSlide { .. }));
            }
            Interaction::Browse => {}
        }
    }

    fn say(&mut self, text: &str, lang: &str) {
        if text.trim().is_empty() {
            return;
        }
        let settle = self.config.timings.settle();
        if let Err(e) = self.speech.speak(text, lang, &mut self.scheduler, settle) {
            self.recover(e);
        }
        if self.state.flow_reading && !self.speech.is_reading_sequence() {
            tracing::debug!("Page reading interrupted");
            self.end_flow_reading();
        }
    }

    /// Flow reading never leaves an interaction, so no DOM cleanup is due
    fn end_flow_reading(&mut self) {
        self.state = self.state.apply(ModeEvent::SetFlowReading(false)).state;
        self.host.mode_changed(ModeIndicator::FlowReading, false);
    }

    /// Speak a UI message in the overlay's language
    fn say_ui(&mut self, text: &str) {
        let lang = self.config.default_lang.clone();
        self.say(text, &lang);
    }

    fn check(&mut self, result: DomResult<()>) {
        if let Err(e) = result {
            self.recover(e.into());
        }
    }

    fn recover(&mut self, error: A11yError) {
        match error {
            A11yError::SpeechUnavailable => self.notice_once(Notice::Speech),
            A11yError::RecognitionUnavailable => self.notice_once(Notice::Recognition),
            other => tracing::warn!("Recovered: {}", other),
        }
    }

    fn notice_once(&mut self, notice: Notice) {
        if !self.shown.insert(notice) {
            return;
        }
        let message = match notice {
            Notice::Speech => self.lang.speech_unavailable(),
            Notice::Recognition => self.lang.recognition_unavailable(),
        };
        tracing::warn!("{}", message);
        self.host.notify(message);
    }
}

// ============================================================================
// Markup helpers
// ============================================================================

/// Dismiss control inside an overlay
fn close_control(tree: &DomTree, overlay: NodeId) -> Option<NodeId> {
    tree.find_first(overlay, |t, n| {
        t.attr(n, "data-dismiss") == Some("modal")
            || t.attr(n, "data-bs-dismiss") == Some("modal")
            || t.has_class(n, "close")
            || t.has_class(n, "btn-close")
            || t.attr(n, "aria-label").is_some_and(|l| l.contains("Close") || l.contains("Cerrar"))
    })
}

/// Title followed by the overlay's text, without saying the title twice
fn overlay_announcement(doc: &Document, config: &OverlayConfig, classifier: &Classifier<'_>, overlay: NodeId) -> String {
    let tree = &doc.tree;
    let title = tree
        .find_first(overlay, |t, n| {
            matches!(t.tag_name(n), Some("h1" | "h2" | "h3"))
                || t.attr(n, "role") == Some("heading")
                || t.has_class(n, "modal-title")
                || t.has_class(n, "title")
        })
        .filter(|&t| !should_ignore(doc, config, t))
        .map(|t| classifier.visible_text(t))
        .filter(|t| !t.is_empty());
    let content = classifier.visible_text(overlay);
    match title {
        Some(title) => {
            let rest = content.strip_prefix(title.as_str()).unwrap_or(&content).trim();
            if rest.is_empty() { title } else { format!("{}. {}", title, rest) }
        }
        None => content,
    }
}

/// Next or previous control of a Swiper or Bootstrap carousel
fn slider_control(tree: &DomTree, slider: NodeId, forward: bool) -> Option<NodeId> {
    let classes: &[&str] = if forward {
        &["swiper-button-next", "carousel-control-next"]
    } else {
        &["swiper-button-prev", "carousel-control-prev"]
    };
    let is_control = |t: &DomTree, n: NodeId| classes.iter().any(|c| t.has_class(n, c));
    let control = tree
        .find_first(slider, is_control)
        .or_else(|| tree.parent(slider).and_then(|p| tree.find_first(p, is_control)))?;
    let disabled = tree.has_class(control, "swiper-button-disabled")
        || tree.has_attr(control, "disabled")
        || aria::is_true(tree, control, "aria-disabled");
    (!disabled).then_some(control)
}

fn is_active_slide(tree: &DomTree, slide: NodeId) -> bool {
    tree.has_class(slide, "swiper-slide-active") || (tree.has_class(slide, "carousel-item") && tree.has_class(slide, "active"))
}

fn is_slide_control(tree: &DomTree, node: NodeId) -> bool {
    match tree.tag_name(node) {
        Some("button" | "a" | "textarea" | "select") => true,
        Some("input") => {
            let kind = InputType::parse(tree.attr(node, "type").unwrap_or("text"));
            kind.is_text_like() || matches!(kind, InputType::Radio | InputType::Checkbox)
        }
        _ => false,
    }
}

fn slide_action(tree: &DomTree, control: NodeId) -> SlideAction {
    match tree.tag_name(control) {
        Some("textarea") => SlideAction::Edit,
        Some("select") => SlideAction::Select,
        Some("input") if InputType::parse(tree.attr(control, "type").unwrap_or("text")).is_text_like() => {
            SlideAction::Edit
        }
        _ => SlideAction::Click,
    }
}

fn is_focus_target(tree: &DomTree, node: NodeId) -> bool {
    match tree.tag_name(node) {
        Some("button" | "input" | "select" | "textarea") => true,
        Some("a") => tree.has_attr(node, "href"),
        Some(_) => {
            tree.attr(node, "role") == Some("button")
                || tree.attr(node, "tabindex").is_some_and(|t| t.trim() != "-1")
        }
        None => false,
    }
}
