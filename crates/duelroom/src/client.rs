//! `Duelroom` builder and update loop.
//!
//! This is the entry point for wiring a client: pick a store, hand over
//! the game, get back a [`Matchmaker`] ready to create or join a room.

use std::sync::Arc;

use duelroom_session::{GameEvents, Matchmaker, SessionConfig};
use duelroom_store::DocumentStore;

/// Namespace for [`Duelroom::builder`].
pub struct Duelroom;

impl Duelroom {
    /// Creates a new builder.
    pub fn builder() -> DuelroomBuilder {
        DuelroomBuilder::new()
    }
}

/// Builder for configuring a [`Matchmaker`].
///
/// # Example
///
/// ```rust,ignore
/// use duelroom::prelude::*;
///
/// let matchmaker = Duelroom::builder()
///     .collection("duels")
///     .build(Arc::new(MemoryStore::new()), my_game);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DuelroomBuilder {
    config: SessionConfig,
}

impl DuelroomBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store collection that holds room documents.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.config.collection = collection.into();
        self
    }

    /// Sets the length of generated room codes.
    pub fn room_code_len(mut self, len: usize) -> Self {
        self.config.room_code_len = len;
        self
    }

    /// Replaces the whole session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds an idle matchmaker over `store`.
    pub fn build<S, G>(self, store: Arc<S>, game: G) -> Matchmaker<S, G>
    where
        S: DocumentStore,
        G: GameEvents,
    {
        tracing::debug!(collection = %self.config.collection, "matchmaker built");
        Matchmaker::new(store, game, self.config)
    }
}

/// Handles room snapshots until the room is finished or the subscription
/// ends. Returns the number of snapshots handled.
///
/// Malformed snapshots are logged and skipped. Without a room it returns
/// immediately.
pub async fn run_until_finished<S, G>(matchmaker: &mut Matchmaker<S, G>) -> usize
where
    S: DocumentStore,
    G: GameEvents,
{
    let mut handled = 0;
    while matchmaker.phase().is_active() {
        match matchmaker.next_update().await {
            Some(Ok(_)) => handled += 1,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "skipping malformed room snapshot");
            }
            None => break,
        }
    }
    tracing::debug!(handled, phase = %matchmaker.phase(), "update loop stopped");
    handled
}
