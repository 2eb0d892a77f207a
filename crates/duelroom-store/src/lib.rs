//! Shared document store abstraction for Duelroom.
//!
//! Two clients that never talk to each other directly coordinate through
//! a single remote document. This crate defines the contract that such a
//! store has to honor ([`DocumentStore`]) and the [`Subscription`] handle
//! through which change notifications arrive.
//!
//! The contract is deliberately small:
//!
//! - `create`: unconditional overwrite-or-create
//! - `get`: point read, `None` when absent
//! - `update`: merge named top-level fields, fails when absent
//! - `subscribe`: full snapshot on every write, including the
//!   subscriber's own writes
//!
//! There are no transactions and no conditional writes: last write wins.
//!
//! # Feature Flags
//!
//! - `memory` (default): [`MemoryStore`], an in-process implementation
//!   used by tests and the demo

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "memory")]
mod memory;

pub use error::StoreError;
#[cfg(feature = "memory")]
pub use memory::MemoryStore;

use std::fmt;

use tokio::sync::mpsc;

/// A stored document: a flat JSON object whose top-level keys are the
/// fields that [`DocumentStore::update`] merges.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Sending half of a subscription. Store implementations push one full
/// snapshot per write into it.
pub type SnapshotSender = mpsc::UnboundedSender<Document>;

/// Address of a single document: `collection/id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    pub collection: String,
    pub id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A key-value document service with last-write-wins semantics and
/// push-based change notification.
pub trait DocumentStore: Send + Sync + 'static {
    /// Writes `document` at `collection/id`, replacing whatever was there.
    async fn create(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> Result<(), StoreError>;

    /// Reads the document at `collection/id`.
    ///
    /// Returns `Ok(None)` when the document does not exist.
    async fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Merges every top-level key of `fields` into the existing document.
    /// Values are replaced wholesale, never deep-merged or appended.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError>;

    /// Subscribes to changes of `collection/id`.
    ///
    /// If the document exists, its current snapshot is delivered first.
    /// After that every write produces one full snapshot. Dropping the
    /// returned [`Subscription`] unsubscribes.
    async fn subscribe(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Subscription, StoreError>;
}

/// Receiving end of a document subscription.
///
/// Holding it keeps the subscription alive; dropping it (or calling
/// [`unsubscribe`](Self::unsubscribe)) releases it. Snapshots written
/// after that are never delivered.
#[derive(Debug)]
pub struct Subscription {
    path: DocPath,
    receiver: mpsc::UnboundedReceiver<Document>,
}

impl Subscription {
    /// Creates a connected sender/subscription pair for `path`.
    ///
    /// Store implementations keep the sender and hand the subscription
    /// to the caller.
    pub fn channel(path: DocPath) -> (SnapshotSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { path, receiver: rx })
    }

    /// The document this subscription watches.
    pub fn path(&self) -> &DocPath {
        &self.path
    }

    /// Waits for the next snapshot.
    ///
    /// Returns `None` once the store has dropped its sending half.
    pub async fn next(&mut self) -> Option<Document> {
        self.receiver.recv().await
    }

    /// Returns an already-delivered snapshot without waiting.
    pub fn try_next(&mut self) -> Option<Document> {
        self.receiver.try_recv().ok()
    }

    /// Releases the subscription.
    pub fn unsubscribe(self) {
        tracing::debug!(path = %self.path, "unsubscribed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_path_display() {
        let path = DocPath::new("matches", "ABC123");
        assert_eq!(path.to_string(), "matches/ABC123");
    }

    #[test]
    fn test_doc_path_equality() {
        assert_eq!(DocPath::new("a", "1"), DocPath::new("a", "1"));
        assert_ne!(DocPath::new("a", "1"), DocPath::new("a", "2"));
        assert_ne!(DocPath::new("a", "1"), DocPath::new("b", "1"));
    }

    #[tokio::test]
    async fn test_subscription_channel_delivers_in_order() {
        let (tx, mut sub) = Subscription::channel(DocPath::new("m", "X"));
        let mut first = Document::new();
        first.insert("n".into(), 1.into());
        let mut second = Document::new();
        second.insert("n".into(), 2.into());

        tx.send(first).unwrap();
        tx.send(second).unwrap();

        assert_eq!(sub.next().await.unwrap()["n"], 1);
        assert_eq!(sub.try_next().unwrap()["n"], 2);
        assert!(sub.try_next().is_none());
    }

    #[tokio::test]
    async fn test_subscription_ends_when_sender_dropped() {
        let (tx, mut sub) = Subscription::channel(DocPath::new("m", "X"));
        drop(tx);
        assert!(sub.next().await.is_none());
    }

    #[test]
    fn test_unsubscribe_closes_sender() {
        let (tx, sub) = Subscription::channel(DocPath::new("m", "X"));
        sub.unsubscribe();
        assert!(tx.is_closed());
        assert!(tx.send(Document::new()).is_err());
    }
}
