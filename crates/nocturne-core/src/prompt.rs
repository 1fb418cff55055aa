//! Wake-up prompt construction.
//!
//! The first and last wakeups of a night carry user-edited template text,
//! read fresh from disk on every fire so edits apply without a restart.
//! Middle wakeups use a fixed line and never touch the filesystem.

use chrono::{DateTime, Local};
use std::path::Path;
use tracing::warn;

/// Opening line used when the opening template file cannot be read.
pub const OPENING_FALLBACK: &str = "The night begins. You have time alone.";

/// Farewell line used when the closing template file cannot be read.
pub const CLOSING_FALLBACK: &str = "The night ends. Rest well.";

/// A template file's contents, or the built-in line standing in for it.
///
/// Absence of a template is recovered here, never surfaced as an error; a
/// wakeup always has something to say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateText {
    Loaded(String),
    Fallback(&'static str),
}

/// Read a template file, substituting `fallback` when it cannot be read.
pub fn load_template(path: &Path, fallback: &'static str) -> TemplateText {
    match std::fs::read_to_string(path) {
        Ok(text) => TemplateText::Loaded(text),
        Err(e) => {
            warn!(
                "prompt: template {} unavailable ({e}), using fallback",
                path.display()
            );
            TemplateText::Fallback(fallback)
        }
    }
}

/// Current wall-clock time in 12-hour form without a leading zero,
/// e.g. `2:30 AM` or `11:05 PM`.
pub fn time_label(now: DateTime<Local>) -> String {
    now.format("%-I:%M %p").to_string()
}

/// Prompt for the night's first wakeup.
///
/// The loaded template is prefixed with the current time and the clock
/// time of the closing wakeup, so the agent knows how long the night runs.
pub fn opening_prompt(now: DateTime<Local>, template: &TemplateText, last_label: &str) -> String {
    let time = time_label(now);
    match template {
        TemplateText::Loaded(text) => format!(
            "It's {time}. Your last wakeup tonight will be at {last_label}.\n\n{text}"
        ),
        TemplateText::Fallback(line) => format!("It's {time}. {line}"),
    }
}

/// Fixed prompt for middle wakeups. No file is read.
pub fn middle_prompt(now: DateTime<Local>) -> String {
    format!("It's {}. You have time alone.", time_label(now))
}

/// Prompt for the closing wakeup.
pub fn closing_prompt(now: DateTime<Local>, template: &TemplateText) -> String {
    let time = time_label(now);
    match template {
        TemplateText::Loaded(text) => format!("It's {time}.\n\n{text}"),
        TemplateText::Fallback(line) => format!("It's {time}. {line}"),
    }
}
