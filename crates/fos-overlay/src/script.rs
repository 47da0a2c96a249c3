//! Session scripts
//!
//! A script is the user's side of a session: key presses, spoken phrases,
//! pauses and page changes, run in order.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Panel toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    SectionReading,
    NumberedVoice,
    VoiceCommands,
    Panel,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Key press with no focused element (`"ArrowDown"`, `"Enter"`, `" "`)
    Key(String),
    /// Key press while `id` has native focus
    KeyOn { key: String, id: String },
    /// Final transcript from the recognizer
    Say(String),
    /// Let time pass, in milliseconds
    Wait(u64),
    Show(String),
    Hide(String),
    /// The user clicks the element with the mouse
    Click(String),
    /// The user types into a text field
    Type { id: String, value: String },
    Toggle(Mode),
    ReadPage,
    Stop,
    ReadSelection {
        text: String,
        #[serde(default)]
        anchor: Option<String>,
    },
    /// Native focus lands on the element
    Focus(String),
    Reset,
    Rate(f32),
}

impl Script {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("parsing script {}", path.display()))
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
