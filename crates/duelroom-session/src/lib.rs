//! Two-player matchmaking and state synchronization for Duelroom.
//!
//! Two clients share nothing but a room document in a remote store. This
//! crate turns that document into a coordination protocol:
//!
//! 1. **Matchmaking**: the host creates a room under a short code, the
//!    guest joins it ([`Matchmaker::create_room`], [`Matchmaker::join_room`])
//! 2. **Turn handoff**: each move is written as `lastMove` plus a flipped
//!    `turn`; the peer replays it onto its own board
//! 3. **Rounds**: both players flag a rematch, the host writes a fresh
//!    round under a new round id, and the guest detects the id change
//!
//! # How it fits in the stack
//!
//! ```text
//! Game logic (above)  ← implements GameEvents, calls Matchmaker
//!     ↕
//! Session layer (this crate)  ← interprets snapshots, issues writes
//!     ↕
//! Protocol layer (below)  ← Room, RoomPatch, RoomCode, RoundId
//!     ↕
//! Store layer  ← DocumentStore: create/get/update/subscribe
//! ```

mod error;
mod events;
mod matchmaker;
mod session;

pub use error::{MatchError, MatchErrorKind};
pub use events::GameEvents;
pub use matchmaker::Matchmaker;
pub use session::{Session, SessionConfig, SessionPhase, UpdateOutcome};
