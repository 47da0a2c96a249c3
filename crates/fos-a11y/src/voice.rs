//! Voice command interpreter
//!
//! Literal keyword and number matching over a finalized transcript. Matching
//! is done on whole tokens after lowercasing and accent folding, so "21"
//! never matches inside "121".

use crate::i18n::{Language, number_word};

/// Command recognized in a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceCommand {
    /// Leave numbered voice mode
    Deactivate,
    ClosePanel,
    OpenPanel,
    /// Activate the numbered entry
    Number(usize),
    /// A number with nothing behind it
    NumberOutOfRange(usize),
    ReadPage,
    Stop,
    Next,
    Previous,
    IncreaseText,
    DecreaseText,
}

const DEACTIVATE_WORDS: &[&str] = &["desactivar", "salir", "cancelar", "deactivate"];
const CLOSE_WORDS: &[&str] = &["cerrar", "close"];

/// Phrases checked in order; longer phrases come first
const PHRASES: &[(&str, VoiceCommand)] = &[
    ("abrir accesibilidad", VoiceCommand::OpenPanel),
    ("open accessibility", VoiceCommand::OpenPanel),
    ("cerrar accesibilidad", VoiceCommand::ClosePanel),
    ("close accessibility", VoiceCommand::ClosePanel),
    ("aumentar texto", VoiceCommand::IncreaseText),
    ("increase text", VoiceCommand::IncreaseText),
    ("disminuir texto", VoiceCommand::DecreaseText),
    ("decrease text", VoiceCommand::DecreaseText),
    ("leer pagina", VoiceCommand::ReadPage),
    ("read page", VoiceCommand::ReadPage),
    ("detener", VoiceCommand::Stop),
    ("stop", VoiceCommand::Stop),
    ("siguiente", VoiceCommand::Next),
    ("next", VoiceCommand::Next),
    ("anterior", VoiceCommand::Previous),
    ("previous", VoiceCommand::Previous),
];

fn fold(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        c if c.is_alphanumeric() => c,
        _ => ' ',
    }
}

/// Lowercased, accent-folded tokens
pub fn tokenize(transcript: &str) -> Vec<String> {
    transcript
        .to_lowercase()
        .chars()
        .map(fold)
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn spoken_number(tokens: &[String], lang: Language) -> Option<usize> {
    tokens.iter().find_map(|t| {
        if t.chars().all(|c| c.is_ascii_digit()) {
            t.parse().ok()
        } else {
            number_word(t, lang)
        }
    })
}

fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split(' ').collect();
    tokens.windows(words.len()).any(|w| w.iter().zip(&words).all(|(a, b)| a == b))
}

/// Interpret a transcript
///
/// With `numbered_total` set (numbered voice mode), deactivation, close
/// and numbers take precedence; valid numbers are `0..numbered_total`.
pub fn interpret(transcript: &str, numbered_total: Option<usize>, lang: Language) -> Option<VoiceCommand> {
    let tokens = tokenize(transcript);
    if tokens.is_empty() {
        return None;
    }
    let has_any = |words: &[&str]| tokens.iter().any(|t| words.contains(&t.as_str()));

    if let Some(total) = numbered_total {
        if has_any(DEACTIVATE_WORDS) {
            return Some(VoiceCommand::Deactivate);
        }
        if has_any(CLOSE_WORDS) {
            return Some(VoiceCommand::ClosePanel);
        }
        if let Some(n) = spoken_number(&tokens, lang) {
            return Some(if n < total { VoiceCommand::Number(n) } else { VoiceCommand::NumberOutOfRange(n) });
        }
    }

    PHRASES
        .iter()
        .find(|(phrase, _)| contains_phrase(&tokens, phrase))
        .map(|(_, command)| *command)
}
