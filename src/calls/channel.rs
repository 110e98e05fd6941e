//! Channel collaborator boundary.

use async_trait::async_trait;
use serde_json::Value;

use super::error::CallError;

/// Local outcome of a channel publish.
///
/// Fire-and-observe: `Ok` means the channel took the message, not that
/// the peer received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Ok,
    Error(String),
    Timeout,
}

impl PushOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Fold the non-ok outcomes into the error taxonomy.
    pub fn into_result(self) -> Result<(), CallError> {
        match self {
            Self::Ok => Ok(()),
            Self::Error(e) => Err(CallError::Transport(e)),
            Self::Timeout => Err(CallError::Transport("push timed out".to_string())),
        }
    }
}

/// The publish half of the shared presence/messaging channel.
///
/// The channel must deliver one sender's messages to a peer in send
/// order; the negotiation relies on a pick-up never overtaking the
/// offer that follows it.
///
/// Subscription runs the other way around: the integration listens on
/// the channel for the named events and presence syncs and feeds them
/// into the [`CallServiceHandle`](super::CallServiceHandle), so every
/// inbound callback becomes a message on the service queue.
#[async_trait]
pub trait SignalChannel: Send + Sync {
    /// Push a named event with a JSON payload.
    async fn push(&self, event: &str, payload: Value) -> PushOutcome;
}
