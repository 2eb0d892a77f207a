//! Error types for the session layer.

use duelroom_protocol::{ProtocolError, RoomCode, RoomStatus};
use duelroom_store::StoreError;

/// Errors returned by [`Matchmaker`](crate::Matchmaker) operations.
///
/// Join failures are split by cause so a UI can tell "no such room" from
/// "that match is over" from "can't reach the store".
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// No room exists under this code.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The room exists but is no longer accepting players.
    #[error("room {code} is closed (status: {status})")]
    RoomClosed { code: RoomCode, status: RoomStatus },

    /// The store rejected a create or update.
    #[error("store write failed: {0}")]
    StoreWrite(#[source] StoreError),

    /// A read or subscription against the store failed.
    #[error("store read failed: {0}")]
    StoreRead(#[source] StoreError),

    /// The room document couldn't be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Coarse classification of a [`MatchError`] for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchErrorKind {
    RoomNotFound,
    RoomClosed,
    /// Read or write against the store failed; usually worth a retry.
    Connectivity,
    /// The document is malformed; retrying won't help.
    Protocol,
}

impl MatchError {
    pub fn kind(&self) -> MatchErrorKind {
        match self {
            Self::RoomNotFound(_) => MatchErrorKind::RoomNotFound,
            Self::RoomClosed { .. } => MatchErrorKind::RoomClosed,
            Self::StoreWrite(_) | Self::StoreRead(_) => MatchErrorKind::Connectivity,
            Self::Protocol(_) => MatchErrorKind::Protocol,
        }
    }
}
