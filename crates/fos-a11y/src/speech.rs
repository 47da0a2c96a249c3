//! Speech output pipeline
//!
//! One channel, one audible utterance. Every request cancels what is
//! playing, then holds the new utterance for a settle delay before handing
//! it to the engine; some engines drop an utterance spoken right after a
//! cancel. Sequential reading chains the next item from the end event of
//! the previous one instead.

use std::fmt;
use std::time::Duration;

use fos_dom::NodeId;

use crate::scheduler::{Scheduler, Task};
use crate::{A11yError, A11yResult};

/// Identity of one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Installed synthesis voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

/// One request to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    pub lang: String,
    pub rate: f32,
    pub voice: Option<Voice>,
}

/// Lifecycle callbacks from the engine
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    Started(UtteranceId),
    Ended(UtteranceId),
    Error(UtteranceId, String),
}

/// Speech synthesis backend
pub trait SpeechEngine {
    fn is_available(&self) -> bool {
        true
    }
    fn voices(&self) -> Vec<Voice>;
    fn speak(&mut self, utterance: &Utterance);
    fn cancel(&mut self);
}

/// Voice selection strategy
pub trait VoiceResolver {
    fn resolve(&self, lang: &str, voices: &[Voice]) -> Option<Voice>;
}

/// Match by primary language subtag, else the first voice
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixVoiceResolver;

impl VoiceResolver for PrefixVoiceResolver {
    fn resolve(&self, lang: &str, voices: &[Voice]) -> Option<Voice> {
        let primary = lang.split(['-', '_']).next().unwrap_or("").to_ascii_lowercase();
        voices
            .iter()
            .find(|v| !primary.is_empty() && v.lang.to_ascii_lowercase().starts_with(&primary))
            .or_else(|| voices.first())
            .cloned()
    }
}

/// One item of a sequential reading
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceItem {
    pub text: String,
    pub lang: String,
    /// Element to highlight while the item plays
    pub node: Option<NodeId>,
}

/// What the pipeline reports back to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Started(UtteranceId),
    Finished(UtteranceId),
    ItemStarted { index: usize, node: Option<NodeId> },
    SequenceDone,
}

#[derive(Debug)]
struct Sequence {
    items: Vec<SequenceItem>,
    index: usize,
    utterance: UtteranceId,
}

/// Interruptible speech channel
pub struct SpeechPipeline {
    engine: Option<Box<dyn SpeechEngine>>,
    resolver: Box<dyn VoiceResolver>,
    rate: f32,
    next_id: u64,
    /// Held until the settle delay elapses
    pending: Option<Utterance>,
    /// Delivered and not yet ended
    current: Option<UtteranceId>,
    speaking: bool,
    sequence: Option<Sequence>,
}

impl SpeechPipeline {
    pub fn new(engine: Option<Box<dyn SpeechEngine>>, resolver: Box<dyn VoiceResolver>) -> Self {
        Self {
            engine,
            resolver,
            rate: 1.0,
            next_id: 1,
            pending: None,
            current: None,
            speaking: false,
            sequence: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.engine.as_ref().is_some_and(|e| e.is_available())
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn is_reading_sequence(&self) -> bool {
        self.sequence.is_some()
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Non-positive or non-finite rates are ignored
    pub fn set_rate(&mut self, rate: f32) {
        if rate.is_finite() && rate > 0.0 {
            self.rate = rate;
        }
    }

    fn engine(&mut self) -> A11yResult<&mut Box<dyn SpeechEngine>> {
        match self.engine.as_mut() {
            Some(engine) if engine.is_available() => Ok(engine),
            _ => Err(A11yError::SpeechUnavailable),
        }
    }

    fn utterance(&mut self, text: &str, lang: &str) -> Utterance {
        let id = UtteranceId(self.next_id);
        self.next_id += 1;
        let voices = self.engine.as_ref().map(|e| e.voices()).unwrap_or_default();
        Utterance {
            id,
            text: text.to_string(),
            lang: lang.to_string(),
            rate: self.rate,
            voice: self.resolver.resolve(lang, &voices),
        }
    }

    fn hold(&mut self, utterance: Utterance, scheduler: &mut Scheduler, settle: Duration) -> UtteranceId {
        let id = utterance.id;
        self.pending = Some(utterance);
        scheduler.schedule(settle, Task::DeliverUtterance(id));
        id
    }

    /// Cancel whatever plays and speak `text` after the settle delay
    pub fn speak(&mut self, text: &str, lang: &str, scheduler: &mut Scheduler, settle: Duration) -> A11yResult<UtteranceId> {
        self.engine()?.cancel();
        self.clear();
        let utterance = self.utterance(text, lang);
        tracing::debug!("Speaking {} [{}]: {}", utterance.id, lang, text);
        Ok(self.hold(utterance, scheduler, settle))
    }

    /// Read `items` one after another; empty items are skipped
    ///
    /// Returns `false` when no item has text.
    pub fn speak_sequential(
        &mut self,
        items: Vec<SequenceItem>,
        scheduler: &mut Scheduler,
        settle: Duration,
    ) -> A11yResult<bool> {
        self.engine()?.cancel();
        self.clear();
        let Some(first) = items.iter().position(|i| !i.text.trim().is_empty()) else {
            return Ok(false);
        };
        let utterance = self.utterance(&items[first].text, &items[first].lang);
        let id = self.hold(utterance, scheduler, settle);
        tracing::debug!("Sequential reading of {} items", items.len());
        self.sequence = Some(Sequence { items, index: first, utterance: id });
        Ok(true)
    }

    /// Timer callback: hand the held utterance over if it is still wanted
    pub fn deliver(&mut self, id: UtteranceId) {
        if self.pending.as_ref().is_none_or(|u| u.id != id) {
            tracing::trace!("Dropping stale utterance {}", id);
            return;
        }
        let Some(utterance) = self.pending.take() else {
            return;
        };
        if let Some(engine) = self.engine.as_mut() {
            engine.speak(&utterance);
            self.current = Some(id);
        }
    }

    /// Engine callback; events of superseded utterances are ignored
    pub fn on_event(&mut self, event: SpeechEvent) -> Vec<PipelineEvent> {
        let mut out = Vec::new();
        match event {
            SpeechEvent::Started(id) if self.current == Some(id) => {
                self.speaking = true;
                out.push(PipelineEvent::Started(id));
                if let Some(seq) = self.sequence.as_ref().filter(|s| s.utterance == id) {
                    out.push(PipelineEvent::ItemStarted {
                        index: seq.index,
                        node: seq.items[seq.index].node,
                    });
                }
            }
            SpeechEvent::Ended(id) | SpeechEvent::Error(id, _) if self.current == Some(id) => {
                if let SpeechEvent::Error(_, reason) = &event {
                    tracing::warn!("Utterance {} failed: {}", id, reason);
                }
                self.speaking = false;
                self.current = None;
                out.push(PipelineEvent::Finished(id));
                if self.sequence.as_ref().is_some_and(|s| s.utterance == id) {
                    self.advance_sequence(&mut out);
                }
            }
            other => tracing::trace!("Ignoring stale speech event {:?}", other),
        }
        out
    }

    fn advance_sequence(&mut self, out: &mut Vec<PipelineEvent>) {
        let Some(mut seq) = self.sequence.take() else {
            return;
        };
        let next = (seq.index + 1..seq.items.len()).find(|&i| !seq.items[i].text.trim().is_empty());
        let Some(next) = next else {
            out.push(PipelineEvent::SequenceDone);
            return;
        };
        let utterance = self.utterance(&seq.items[next].text, &seq.items[next].lang);
        seq.index = next;
        seq.utterance = utterance.id;
        if let Some(engine) = self.engine.as_mut() {
            engine.speak(&utterance);
            self.current = Some(utterance.id);
            self.sequence = Some(seq);
        }
    }

    /// Cancel the engine and forget every pending or running utterance
    pub fn stop(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.cancel();
        }
        self.clear();
    }

    fn clear(&mut self) {
        self.pending = None;
        self.current = None;
        self.speaking = false;
        self.sequence = None;
    }
}
