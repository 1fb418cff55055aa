//! # nocturne-core
//!
//! Core types for Nocturne: configuration, the pure schedule calculator,
//! the night-cycle state machine, prompt construction, and the trait seam
//! to the external agent.

pub mod config;
pub mod error;
pub mod night;
pub mod prompt;
pub mod schedule;
pub mod traits;

pub use config::Config;
pub use error::{NocturneError, Result};
