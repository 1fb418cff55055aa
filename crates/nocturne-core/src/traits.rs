//! Trait seam between the daemon and the external agent.

use crate::error::Result;
use async_trait::async_trait;

/// How the agent should treat the conversation for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode<'a> {
    /// Open a brand-new conversation under the given identity.
    Start(&'a str),
    /// Continue the existing conversation with that identity.
    Resume(&'a str),
}

impl SessionMode<'_> {
    /// The session identity, regardless of mode.
    pub fn id(&self) -> &str {
        match self {
            SessionMode::Start(id) | SessionMode::Resume(id) => id,
        }
    }
}

/// An external conversational agent, invoked once per wakeup.
///
/// Implementations bound execution time and surface spawn failures,
/// non-zero exits, and timeouts as
/// [`NocturneError::Agent`](crate::error::NocturneError::Agent). The Ok
/// value is the agent's captured stdout, which may be empty.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn invoke(&self, mode: SessionMode<'_>, prompt: &str) -> Result<String>;
}
