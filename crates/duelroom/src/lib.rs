//! # Duelroom
//!
//! Serverless two-player matchmaking for turn-based card games.
//!
//! Host and guest never talk to each other directly. They share one room
//! document in a remote store and coordinate by writing to it and reacting
//! to the snapshots it pushes back. Game code implements [`GameEvents`]
//! and drives a [`Matchmaker`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use duelroom::prelude::*;
//!
//! # struct MyGame;
//! # impl GameEvents for MyGame {
//! #     fn remote_place_card(&mut self, _: &LastMove) {}
//! #     fn on_rematch_start(&mut self, _: &Room) {}
//! #     fn trigger_rematch_setup(&mut self) {}
//! # }
//! # async fn run() -> Result<(), DuelroomError> {
//! duelroom::init_tracing();
//!
//! let store = Arc::new(MemoryStore::new());
//! let mut host = Duelroom::builder().build(store, MyGame);
//!
//! let setup = RoundSetup::new(Role::Host, &[0u8; 9], &vec![1, 2], &vec![3, 4])?;
//! let code = host.create_room(setup).await?;
//! println!("share this code: {code}");
//!
//! duelroom::run_until_finished(&mut host).await;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::{Duelroom, DuelroomBuilder, run_until_finished};
pub use error::DuelroomError;

pub use duelroom_protocol as protocol;
pub use duelroom_session as session;
pub use duelroom_store as store;

pub mod prelude {
    pub use crate::{Duelroom, DuelroomBuilder, DuelroomError, run_until_finished};

    pub use duelroom_protocol::{
        LastMove, ProtocolError, Role, Room, RoomCode, RoomStatus, RoundId, RoundSetup,
    };
    pub use duelroom_session::{
        GameEvents, MatchError, MatchErrorKind, Matchmaker, SessionConfig, SessionPhase,
        UpdateOutcome,
    };
    pub use duelroom_store::{DocumentStore, MemoryStore, StoreError};
}

/// Installs a `tracing` subscriber that logs to stderr.
///
/// Filtering follows `RUST_LOG` and falls back to `info`. Calling it
/// again, or after another subscriber was installed, does nothing.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
