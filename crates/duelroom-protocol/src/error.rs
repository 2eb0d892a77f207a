//! Error types for the protocol layer.
//!
//! Each crate in Duelroom defines its own error enum. A `ProtocolError`
//! always means the problem is in the shape of the shared document or
//! an identifier, never in the store or the session logic.

/// Errors that can occur while encoding, decoding, or validating
/// protocol values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Turning a Rust value into a document failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// A stored document doesn't match the expected shape: a missing
    /// required field, a wrong type, an unknown enum value.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The value serialized to something other than a JSON object, so
    /// it can't be stored as a document.
    #[error("value did not encode to a document object")]
    NotAnObject,

    /// A user-supplied room code is empty or contains characters that
    /// the generator never produces.
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),
}
