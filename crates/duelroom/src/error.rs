//! Unified error type for the Duelroom crates.

use duelroom_protocol::ProtocolError;
use duelroom_session::{MatchError, MatchErrorKind};
use duelroom_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// Lets applications built on the `duelroom` facade use `?` across store,
/// protocol and session calls with one error type.
#[derive(Debug, thiserror::Error)]
pub enum DuelroomError {
    /// The document store failed outside a matchmaking operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A room document or payload could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A matchmaking operation failed.
    #[error(transparent)]
    Match(#[from] MatchError),
}

impl DuelroomError {
    /// Classifies the error the way a UI would report it.
    pub fn kind(&self) -> MatchErrorKind {
        match self {
            Self::Store(_) => MatchErrorKind::Connectivity,
            Self::Protocol(_) => MatchErrorKind::Protocol,
            Self::Match(e) => e.kind(),
        }
    }
}
