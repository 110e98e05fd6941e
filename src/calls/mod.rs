//! Two-party voice call negotiation over a shared presence/messaging
//! channel.
//!
//! Two peers connected to the same channel agree, without a central
//! arbiter, on who calls, who answers, and who produces the media
//! offer. The only tie-break is the total order over peer identifiers:
//! when both sides call each other simultaneously, the smaller id
//! becomes the offerer and the larger id the answerer, so both
//! instances converge on compatible roles from locally available
//! information alone.
//!
//! # Architecture
//!
//! - [`CallState`], [`CallEvent`], [`Command`] & [`CallMachine`]: pure
//!   negotiation state machine
//! - [`CallService`]: event-loop orchestrator bridging the machine to
//!   its collaborators
//! - [`PeerMessage`] & [`SignalKind`]: wire codec for the signaling
//!   payloads and the named channel events
//! - [`SignalChannel`], [`MediaSession`], [`TelephonyBridge`]: the
//!   collaborator seams (channel transport, media engine, system call
//!   surface)

mod channel;
mod error;
mod media;
mod service;
mod signaling;
mod state;
mod telephony;


pub use channel::{PushOutcome, SignalChannel};
pub use error::CallError;
pub use media::{MediaConnectionState, MediaEvent, MediaSession};
pub use service::{
    CallDirection, CallService, CallServiceConfig, CallServiceHandle, CallSnapshot,
};
pub use signaling::{
    IceCandidate, MatePayload, PeerMessage, SdpType, SessionDescription, SignalEnvelope,
    SignalKind,
};
pub use state::{CallEvent, CallMachine, CallState, Command, transition};
pub use telephony::TelephonyBridge;
