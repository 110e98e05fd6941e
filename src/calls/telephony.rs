//! Telephony collaborator boundary.

use async_trait::async_trait;

use super::error::CallError;
use crate::types::peer::PeerId;

/// The system telephony surface (call screen, ringtone, audio route).
///
/// The service reports lifecycle intents here; how they render is the
/// integration's business. Outcomes are logged by the service and never
/// block the negotiation. User intents travel the other way, through
/// the service handle's `user_*` methods.
#[async_trait]
pub trait TelephonyBridge: Send + Sync {
    /// An outgoing call left the local side.
    async fn report_outgoing_call_started(&self, peer: PeerId);

    /// An incoming call should be presented.
    async fn report_incoming_call(&self, peer: PeerId) -> Result<(), CallError>;

    /// The call with the peer is over; dismiss any call UI.
    async fn request_end_call(&self, peer: PeerId) -> Result<(), CallError>;

    /// Open the system's outgoing-call flow. Invoked by the service
    /// when the user starts a call, alongside the negotiation itself;
    /// implementations must not loop the system's start action back
    /// into [`CallServiceHandle::user_started_call`](super::CallServiceHandle::user_started_call).
    async fn request_start_call(&self, peer: PeerId) -> Result<(), CallError>;
}
