//! In-process document store.
//!
//! Behaves like the remote service as far as the contract goes: writes
//! are last-write-wins, `update` merges top-level fields, and every write
//! fans a full snapshot out to the current subscribers. It exists so the
//! session controller can be exercised without a network.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::{
    DocPath, Document, DocumentStore, SnapshotSender, StoreError, Subscription,
};

/// An in-memory [`DocumentStore`].
///
/// Cloning is cheap and every clone shares the same documents, so two
/// sessions given clones of one `MemoryStore` see each other's writes
/// just like two clients of one remote store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    fail_subscriptions: AtomicBool,
    writes: AtomicU64,
}

#[derive(Default)]
struct State {
    documents: HashMap<DocPath, Document>,
    /// Subscribers may register before the document exists.
    subscribers: HashMap<DocPath, Vec<SnapshotSender>>,
}

impl State {
    /// Sends `document` to every live subscriber of `path`, pruning the
    /// ones whose `Subscription` was dropped.
    fn dispatch(&mut self, path: &DocPath) {
        let Some(document) = self.documents.get(path) else {
            return;
        };
        if let Some(senders) = self.subscribers.get_mut(path) {
            senders.retain(|tx| tx.send(document.clone()).is_ok());
            if senders.is_empty() {
                self.subscribers.remove(path);
            }
        }
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `create`/`update` fail with
    /// [`StoreError::WriteRejected`] until switched off again.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `get` fail with [`StoreError::ReadFailed`].
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `subscribe` fail with
    /// [`StoreError::Unavailable`], as if the listener channel were down.
    pub fn fail_subscriptions(&self, fail: bool) {
        self.inner.fail_subscriptions.store(fail, Ordering::SeqCst);
    }

    /// Returns a copy of the stored document, bypassing fault injection.
    pub async fn document(&self, collection: &str, id: &str) -> Option<Document> {
        let state = self.inner.state.lock().await;
        state.documents.get(&DocPath::new(collection, id)).cloned()
    }

    /// Number of live subscriptions on `collection/id`.
    ///
    /// Dropped subscriptions are only noticed on the next write, so this
    /// counts closed senders out explicitly.
    pub async fn subscriber_count(&self, collection: &str, id: &str) -> usize {
        let state = self.inner.state.lock().await;
        state
            .subscribers
            .get(&DocPath::new(collection, id))
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Total number of successful writes since the store was created.
    pub fn write_count(&self) -> u64 {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn check_writable(&self, path: &DocPath) -> Result<(), StoreError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            tracing::debug!(%path, "write rejected by fault injection");
            return Err(StoreError::WriteRejected(format!(
                "writes to {path} are disabled"
            )));
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    async fn create(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> Result<(), StoreError> {
        let path = DocPath::new(collection, id);
        self.check_writable(&path)?;

        let mut state = self.inner.state.lock().await;
        state.documents.insert(path.clone(), document);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        state.dispatch(&path);

        tracing::trace!(%path, "document created");
        Ok(())
    }

    async fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let path = DocPath::new(collection, id);
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::ReadFailed(format!(
                "reads of {path} are disabled"
            )));
        }

        let state = self.inner.state.lock().await;
        Ok(state.documents.get(&path).cloned())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let path = DocPath::new(collection, id);
        self.check_writable(&path)?;

        let mut state = self.inner.state.lock().await;
        let document = state
            .documents
            .get_mut(&path)
            .ok_or_else(|| StoreError::NotFound(path.clone()))?;
        for (key, value) in fields {
            document.insert(key, value);
        }
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        state.dispatch(&path);

        tracing::trace!(%path, "document updated");
        Ok(())
    }

    async fn subscribe(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Subscription, StoreError> {
        let path = DocPath::new(collection, id);
        if self.inner.fail_subscriptions.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "cannot listen to {path}"
            )));
        }
        let (tx, subscription) = Subscription::channel(path.clone());

        let mut state = self.inner.state.lock().await;
        if let Some(current) = state.documents.get(&path) {
            // The receiver is alive in `subscription`, so this cannot fail.
            let _ = tx.send(current.clone());
        }
        state.subscribers.entry(path.clone()).or_default().push(tx);

        tracing::debug!(%path, "subscribed");
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pairs: &[(&str, serde_json::Value)]) -> Document {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_dispatch_prunes_dropped_subscribers() {
        let store = MemoryStore::new();
        store.create("m", "A", doc(&[])).await.unwrap();
        let sub = store.subscribe("m", "A").await.unwrap();
        assert_eq!(store.subscriber_count("m", "A").await, 1);

        drop(sub);
        assert_eq!(store.subscriber_count("m", "A").await, 0);

        store.update("m", "A", doc(&[("x", 1.into())])).await.unwrap();
        let state = store.inner.state.lock().await;
        assert!(!state.subscribers.contains_key(&DocPath::new("m", "A")));
    }

    #[tokio::test]
    async fn test_subscribe_unavailable_when_failing() {
        let store = MemoryStore::new();
        store.create("m", "A", doc(&[])).await.unwrap();
        store.fail_subscriptions(true);

        let err = store.subscribe("m", "A").await.unwrap_err();

        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.subscriber_count("m", "A").await, 0);
    }

    #[tokio::test]
    async fn test_write_count_ignores_rejected_writes() {
        let store = MemoryStore::new();
        store.create("m", "A", doc(&[])).await.unwrap();
        store.fail_writes(true);
        assert!(store.update("m", "A", doc(&[])).await.is_err());
        assert_eq!(store.write_count(), 1);
    }
}
