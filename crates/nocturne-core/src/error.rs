//! Error types shared across the Nocturne crates.

use thiserror::Error;

/// Errors surfaced by the Nocturne crates.
///
/// Only `Config` is fatal to the process, and only at startup. Everything
/// else is handled where it occurs: a wakeup logs its failure and waits for
/// the next fire.
#[derive(Debug, Error)]
pub enum NocturneError {
    /// Configuration missing, unreadable, or invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The firing schedule could not be built.
    #[error("schedule error: {0}")]
    Schedule(String),

    /// Agent subprocess failure: spawn error, non-zero exit, or timeout.
    #[error("agent error: {0}")]
    Agent(String),

    /// The nightly journal could not be written.
    #[error("journal error: {0}")]
    Journal(String),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, NocturneError>;
