//! Media collaborator boundary.

use async_trait::async_trait;

use super::error::CallError;
use super::signaling::{IceCandidate, SessionDescription};

/// Connection state reported by the media engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaConnectionState {
    New,
    Checking,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Events flowing back from the media engine into the call service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// The engine discovered a local network candidate to share with
    /// the peer.
    LocalCandidateDiscovered(IceCandidate),
    /// The media connection state changed.
    ConnectionStateChanged(MediaConnectionState),
}

/// The media engine the service negotiates descriptions with.
///
/// Descriptions and candidates are opaque to the negotiation; the
/// service only moves them between the channel and this session.
#[async_trait]
pub trait MediaSession: Send + Sync {
    /// Produce a session-description offer.
    async fn produce_offer(&self) -> Result<SessionDescription, CallError>;

    /// Produce a session-description answer to a previously applied
    /// remote offer.
    async fn produce_answer(&self) -> Result<SessionDescription, CallError>;

    /// Apply a description received from the peer.
    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), CallError>;

    /// Feed a candidate received from the peer.
    fn add_remote_candidate(&self, candidate: IceCandidate);

    /// Tear the media session down.
    fn close(&self);
}
