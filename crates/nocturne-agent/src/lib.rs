//! # nocturne-agent
//!
//! The `claude` CLI driven as Nocturne's conversational agent.

mod claude;

pub use claude::ClaudeCli;
