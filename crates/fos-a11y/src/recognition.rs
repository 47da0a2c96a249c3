//! Continuous speech recognition session
//!
//! Engines end sessions on their own (silence, network, errors). While
//! voice control is wanted the session is restarted after every end; the
//! state machine makes a second concurrent start impossible.

use crate::{A11yError, A11yResult};

/// Speech recognition backend
pub trait RecognitionEngine {
    fn is_available(&self) -> bool {
        true
    }
    /// Begin a continuous session; results arrive as [`RecognitionEvent`]s
    fn start(&mut self, lang: &str) -> A11yResult<()>;
    fn stop(&mut self);
}

/// Callbacks from the engine
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Started,
    Result { transcript: String, is_final: bool },
    Error(String),
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecognitionState {
    #[default]
    Idle,
    Starting,
    Listening,
    Stopping,
}

/// What the session hands to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutput {
    /// A finalized transcript
    Transcript(String),
    /// Session ended while still wanted
    RestartNeeded,
}

/// Restartable recognition session
pub struct RecognitionSession {
    engine: Option<Box<dyn RecognitionEngine>>,
    state: RecognitionState,
    wanted: bool,
    lang: String,
}

impl RecognitionSession {
    pub fn new(engine: Option<Box<dyn RecognitionEngine>>, lang: &str) -> Self {
        Self {
            engine,
            state: RecognitionState::Idle,
            wanted: false,
            lang: lang.to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.engine.as_ref().is_some_and(|e| e.is_available())
    }

    pub fn state(&self) -> RecognitionState {
        self.state
    }

    pub fn is_wanted(&self) -> bool {
        self.wanted
    }

    /// Start listening; a no-op while a session is already live
    pub fn start(&mut self) -> A11yResult<()> {
        if !self.is_available() {
            return Err(A11yError::RecognitionUnavailable);
        }
        self.wanted = true;
        self.launch()
    }

    fn launch(&mut self) -> A11yResult<()> {
        if self.state != RecognitionState::Idle {
            tracing::trace!("Recognition already {:?}, not starting", self.state);
            return Ok(());
        }
        let Some(engine) = self.engine.as_mut() else {
            return Err(A11yError::RecognitionUnavailable);
        };
        self.state = RecognitionState::Starting;
        if let Err(e) = engine.start(&self.lang) {
            self.state = RecognitionState::Idle;
            return Err(e);
        }
        tracing::debug!("Recognition starting ({})", self.lang);
        Ok(())
    }

    /// Restart timer callback
    pub fn restart(&mut self) -> A11yResult<()> {
        if !self.wanted {
            return Ok(());
        }
        self.launch()
    }

    /// Stop listening; later engine events only finish the teardown
    pub fn stop(&mut self) {
        self.wanted = false;
        if matches!(self.state, RecognitionState::Starting | RecognitionState::Listening) {
            self.state = RecognitionState::Stopping;
            if let Some(engine) = self.engine.as_mut() {
                engine.stop();
            }
        }
    }

    /// Feed an engine event; interim results are dropped
    pub fn on_event(&mut self, event: RecognitionEvent) -> Option<SessionOutput> {
        match event {
            RecognitionEvent::Started => {
                if self.state == RecognitionState::Starting {
                    self.state = RecognitionState::Listening;
                }
                None
            }
            RecognitionEvent::Result { transcript, is_final } => {
                let live = matches!(self.state, RecognitionState::Starting | RecognitionState::Listening);
                if !is_final || !live || !self.wanted {
                    return None;
                }
                let transcript = transcript.trim();
                if transcript.is_empty() {
                    return None;
                }
                tracing::debug!("Heard: {}", transcript);
                Some(SessionOutput::Transcript(transcript.to_string()))
            }
            RecognitionEvent::Error(reason) => {
                tracing::warn!("Recognition error: {}", reason);
                None
            }
            RecognitionEvent::Ended => {
                self.state = RecognitionState::Idle;
                self.wanted.then_some(SessionOutput::RestartNeeded)
            }
        }
    }
}
