use crate::DocPath;

/// Errors that can occur in the document store layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed document does not exist.
    /// Returned by `update` when there is nothing to merge into.
    #[error("document {0} not found")]
    NotFound(DocPath),

    /// The store refused a write (create or update).
    #[error("write rejected: {0}")]
    WriteRejected(String),

    /// A point read failed.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// The store cannot be reached or has shut down.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
