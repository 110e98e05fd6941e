//! Wire messages exchanged between peers over the channel.
//!
//! Call control travels as three bare named events (`call`, `pick-up`,
//! `hang-up`) carrying only the peer id. Media negotiation payloads are
//! multiplexed under the `peer-message` event: the envelope names the
//! peer and carries one encoded [`PeerMessage`] in its body.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::CallError;
use crate::types::peer::PeerId;

/// Named channel events used for call control and peer signaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// A peer is calling.
    Call,
    /// A peer accepted the call.
    PickUp,
    /// A peer terminated the call.
    HangUp,
    /// Envelope for session-description and candidate payloads.
    PeerMessage,
}

impl SignalKind {
    pub const ALL: [SignalKind; 4] = [Self::Call, Self::PickUp, Self::HangUp, Self::PeerMessage];

    /// Event name on the wire.
    pub const fn tag_name(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::PickUp => "pick-up",
            Self::HangUp => "hang-up",
            Self::PeerMessage => "peer-message",
        }
    }

    /// Parse from an event name.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "call" => Some(Self::Call),
            "pick-up" => Some(Self::PickUp),
            "hang-up" => Some(Self::HangUp),
            "peer-message" => Some(Self::PeerMessage),
            _ => None,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag_name())
    }
}

/// Payload of the `call`, `pick-up` and `hang-up` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatePayload {
    pub mate: PeerId,
}

/// Payload of the `peer-message` event: an encoded [`PeerMessage`]
/// addressed to (or received from) the given peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEnvelope {
    pub mate: PeerId,
    pub body: String,
}

/// Session description kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

/// A media session description (offer or answer), opaque to the
/// negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    pub sdp: String,
    #[serde(rename = "type")]
    pub kind: SdpType,
}

/// A network reachability candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    pub sdp: String,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: i32,
    #[serde(rename = "sdpMid")]
    pub sdp_mid: Option<String>,
}

/// The two signaling payload kinds, multiplexed under a discriminator
/// tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum PeerMessage {
    #[serde(rename = "sdp")]
    Sdp(SessionDescription),
    #[serde(rename = "ice-candidate")]
    Candidate(IceCandidate),
}

impl PeerMessage {
    /// Encode for the `body` field of a [`SignalEnvelope`]. Total:
    /// every representable value encodes.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("peer message serialization is infallible")
    }

    /// Decode a received body. Unknown discriminators and malformed
    /// payloads fail with a decode error; callers drop and log.
    pub fn decode(body: &str) -> Result<Self, CallError> {
        serde_json::from_str(body).map_err(|e| CallError::Decode(e.to_string()))
    }
}
