//! Call-related error types.

use thiserror::Error;

/// Errors surfaced while orchestrating a call.
///
/// None of these are fatal: transport and telephony failures are logged
/// and never rolled back against the negotiation state, decode failures
/// drop the offending message, and media failures leave the call to be
/// torn down by an explicit hang-up.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("media error: {0}")]
    Media(String),

    #[error("telephony error: {0}")]
    Telephony(String),
}
