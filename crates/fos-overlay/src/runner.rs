//! Session loop
//!
//! Drives one overlay instance in wall-clock time. Each pass advances the
//! controller's timers, plays delivered utterances for their simulated
//! length, feeds engine callbacks back, and lets the page react to clicks.

use std::time::{Duration, Instant};

use anyhow::Context;
use fos_a11y::{
    Collaborators, Key, KeyEvent, ModeController, OverlayConfig, RecognitionEvent, RecognitionState,
    SpeechEvent, UtteranceId,
};
use fos_dom::{Document, NodeId};

use crate::console::{ConsoleHost, ConsoleRecognition, ConsoleSpeech, RecognitionSignal, speaking_time_ms};
use crate::page;
use crate::script::{Mode, Script, Step};

/// Upper bound on the wait for trailing speech after the last step
const DRAIN_LIMIT: Duration = Duration::from_secs(30);

pub struct Session {
    doc: Document,
    ctl: ModeController,
    speech: ConsoleSpeech,
    recognition: ConsoleRecognition,
    started: Instant,
    /// Utterances being played, with the time they end
    playing: Vec<(Duration, UtteranceId)>,
}

impl Session {
    pub fn new(doc: Document, config: OverlayConfig) -> Self {
        let speech = ConsoleSpeech::new();
        let recognition = ConsoleRecognition::new();
        let collaborators = Collaborators::new()
            .with_speech(speech.clone())
            .with_recognition(recognition.clone())
            .with_host(ConsoleHost);
        Self {
            doc,
            ctl: ModeController::new(config, collaborators),
            speech,
            recognition,
            started: Instant::now(),
            playing: Vec::new(),
        }
    }

    pub fn controller(&self) -> &ModeController {
        &self.ctl
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Run every step, then let trailing speech finish
    pub async fn run(&mut self, script: &Script) -> anyhow::Result<()> {
        tracing::info!("Running {} steps", script.steps.len());
        for (index, step) in script.steps.iter().enumerate() {
            tracing::debug!("Step {}: {:?}", index + 1, step);
            self.step(step).await.with_context(|| format!("step {} ({:?})", index + 1, step))?;
            self.pump()?;
        }
        self.drain().await?;
        tracing::info!("Session finished in state {:?}", self.ctl.state());
        Ok(())
    }

    async fn step(&mut self, step: &Step) -> anyhow::Result<()> {
        match step {
            Step::Key(key) => self.press(key, None),
            Step::KeyOn { key, id } => {
                let target = self.node(id)?;
                self.press(key, Some(target));
            }
            Step::Say(phrase) => self.hear(phrase),
            Step::Wait(ms) => self.wait(Duration::from_millis(*ms)).await?,
            Step::Show(id) => {
                page::set_shown(&mut self.doc, id, true)?;
                self.ctl.on_dom_mutations(&mut self.doc);
            }
            Step::Hide(id) => {
                page::set_shown(&mut self.doc, id, false)?;
                self.ctl.on_dom_mutations(&mut self.doc);
            }
            Step::Click(id) => {
                let node = self.node(id)?;
                self.doc.tree.click(node)?;
            }
            Step::Type { id, value } => {
                let node = self.node(id)?;
                self.doc.tree.set_value(node, value)?;
            }
            Step::Toggle(mode) => self.toggle(*mode),
            Step::ReadPage => self.ctl.read_page(&mut self.doc),
            Step::Stop => self.ctl.stop(&mut self.doc),
            Step::ReadSelection { text, anchor } => {
                let anchor = anchor.as_deref().map(|id| self.node(id)).transpose()?;
                self.ctl.read_selection(&self.doc, text, anchor);
            }
            Step::Focus(id) => {
                let node = self.node(id)?;
                self.doc.tree.focus(node)?;
                self.ctl.announce_focus(&self.doc, node);
            }
            Step::Reset => self.ctl.reset_all(&mut self.doc),
            Step::Rate(rate) => self.ctl.set_reading_rate(*rate),
        }
        Ok(())
    }

    fn press(&mut self, key: &str, target: Option<NodeId>) {
        let key = Key::parse(key);
        let event = match target {
            Some(target) => KeyEvent::on(key, target),
            None => KeyEvent::new(key),
        };
        if !self.ctl.handle_key(&mut self.doc, event).is_handled() {
            tracing::debug!("{:?} passed through to the page", key);
        }
    }

    fn hear(&mut self, phrase: &str) {
        match self.ctl.recognition_state() {
            RecognitionState::Starting | RecognitionState::Listening => {
                let event = RecognitionEvent::Result { transcript: phrase.to_string(), is_final: true };
                self.ctl.on_recognition_event(&mut self.doc, event);
            }
            state => tracing::warn!("Nobody is listening ({:?}), dropped {:?}", state, phrase),
        }
    }

    fn toggle(&mut self, mode: Mode) {
        match mode {
            Mode::SectionReading => {
                self.ctl.toggle_section_reading(&mut self.doc);
            }
            Mode::NumberedVoice => {
                self.ctl.toggle_numbered_voice(&mut self.doc);
            }
            Mode::VoiceCommands => {
                self.ctl.toggle_voice_commands();
            }
            Mode::Panel => self.ctl.toggle_panel(),
        }
    }

    fn node(&self, id: &str) -> anyhow::Result<NodeId> {
        self.doc
            .get_element_by_id(id)
            .with_context(|| format!("no element with id `{id}`"))
    }

    /// Bring the controller and the fake engines up to the current time
    fn pump(&mut self) -> anyhow::Result<()> {
        let now = self.started.elapsed();
        self.ctl.advance(&mut self.doc, now);
        loop {
            let mut progressed = false;

            if self.speech.take_cancelled() {
                self.playing.clear();
            }
            for utterance in self.speech.take_delivered() {
                let ends = now + Duration::from_millis(speaking_time_ms(&utterance));
                self.playing.push((ends, utterance.id));
                self.ctl.on_speech_event(&mut self.doc, SpeechEvent::Started(utterance.id));
                progressed = true;
            }

            self.playing.sort_by_key(|&(ends, _)| ends);
            while let Some(&(ends, id)) = self.playing.first() {
                if ends > now {
                    break;
                }
                self.playing.remove(0);
                self.ctl.on_speech_event(&mut self.doc, SpeechEvent::Ended(id));
                progressed = true;
            }

            for signal in self.recognition.take_signals() {
                let event = match signal {
                    RecognitionSignal::Started => RecognitionEvent::Started,
                    RecognitionSignal::Ended => RecognitionEvent::Ended,
                };
                self.ctl.on_recognition_event(&mut self.doc, event);
                progressed = true;
            }

            let events = self.doc.tree.take_events();
            if !events.is_empty() && page::react(&mut self.doc, &events)? {
                self.ctl.on_dom_mutations(&mut self.doc);
                progressed = true;
            }

            if !progressed {
                return Ok(());
            }
        }
    }

    /// Let `span` of wall-clock time pass, waking for every timer
    pub async fn wait(&mut self, span: Duration) -> anyhow::Result<()> {
        let target = self.started.elapsed() + span;
        loop {
            self.pump()?;
            let now = self.started.elapsed();
            if now >= target {
                return Ok(());
            }
            let mut wake = target;
            if let Some(due) = self.ctl.next_due() {
                wake = wake.min(due);
            }
            if let Some(&(ends, _)) = self.playing.first() {
                wake = wake.min(ends);
            }
            let sleep = wake.saturating_sub(now).max(Duration::from_millis(1));
            smol::Timer::after(sleep).await;
        }
    }

    async fn drain(&mut self) -> anyhow::Result<()> {
        let settle = self.ctl.config().timings.settle();
        self.wait(settle + Duration::from_millis(10)).await?;
        let deadline = self.started.elapsed() + DRAIN_LIMIT;
        while (!self.playing.is_empty() || self.ctl.is_speaking()) && self.started.elapsed() < deadline {
            self.wait(Duration::from_millis(100)).await?;
        }
        if !self.playing.is_empty() {
            tracing::warn!("Speech still playing after {:?}, stopping", DRAIN_LIMIT);
            self.ctl.stop(&mut self.doc);
        }
        Ok(())
    }
}
