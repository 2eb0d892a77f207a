//! Per-client session state.
//!
//! A [`Session`] is this client's private record of the room it is in:
//! the room code, which side it plays, the last round it has processed,
//! and the subscription delivering snapshots. It is never written to the
//! store. It lives from `create_room`/`join_room` until the client leaves.

use std::collections::HashSet;

use duelroom_protocol::{LastMove, Role, RoomCode, RoundId};
use duelroom_store::Subscription;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`Matchmaker`](crate::Matchmaker).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Store collection holding room documents.
    ///
    /// Default: `"matches"`.
    pub collection: String,

    /// Number of characters in generated room codes.
    ///
    /// Default: [`RoomCode::DEFAULT_LEN`] (6).
    pub room_code_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            collection: "matches".to_string(),
            room_code_len: RoomCode::DEFAULT_LEN,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Where this client is in the room lifecycle.
///
/// ```text
///        create_room            guest joins
///   Idle ───────────→ Hosting ──────────────→ Playing ──→ Finished
///    │                                          │  ↑
///    │   join_room                              │  │ round starts
///    └────────────→ Guesting ──────────────→    ↓  │
///                              status=playing  AwaitingRematch
/// ```
///
/// `leave` returns to `Idle` from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No room.
    Idle,
    /// Room created, waiting for a guest.
    Hosting,
    /// Joined a room, waiting for the first snapshot.
    Guesting,
    /// Both players present, round in progress.
    Playing,
    /// This client asked for a rematch and waits for the new round.
    AwaitingRematch,
    /// The room was closed.
    Finished,
}

impl SessionPhase {
    /// Returns `true` while the client has a room it can write to.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle | Self::Finished)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Hosting => write!(f, "Hosting"),
            Self::Guesting => write!(f, "Guesting"),
            Self::Playing => write!(f, "Playing"),
            Self::AwaitingRematch => write!(f, "AwaitingRematch"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// UpdateOutcome
// ---------------------------------------------------------------------------

/// Which game callbacks one notification triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub opponent_connected: bool,
    pub round_started: bool,
    pub rematch_ready: bool,
    pub move_applied: bool,
}

impl UpdateOutcome {
    /// Returns `true` if no callback fired.
    pub fn is_quiet(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// This client's view of the room it is in.
///
/// Besides identity it keeps just enough of what it has already seen to
/// tell a fresh notification from a redelivered one. Snapshots are full
/// documents, not diffs, so "what changed" has to be derived here.
#[derive(Debug)]
pub struct Session {
    pub(crate) code: RoomCode,
    pub(crate) role: Role,

    /// Last round this client processed. `None` only for rooms written
    /// by clients that predate round tokens.
    pub(crate) round_id: Option<RoundId>,

    /// At most one live subscription per session.
    pub(crate) subscription: Option<Subscription>,

    /// Opponent arrival has been reported to the game.
    pub(crate) opponent_announced: bool,

    /// Every round this session has entered. A snapshot from one of
    /// these that isn't the current round is stale.
    pub(crate) seen_rounds: HashSet<RoundId>,

    /// Rematch setup has been requested for the current round.
    pub(crate) rematch_signalled: bool,

    /// Opponent moves handed to the game this round. Squares are never
    /// reused within a round, so a repeat is always a redelivery.
    pub(crate) applied_moves: Vec<LastMove>,
}

impl Session {
    pub(crate) fn new(code: RoomCode, role: Role, round_id: Option<RoundId>) -> Self {
        Self {
            code,
            role,
            seen_rounds: round_id.iter().cloned().collect(),
            round_id,
            subscription: None,
            opponent_announced: false,
            rematch_signalled: false,
            applied_moves: Vec::new(),
        }
    }

    /// Code of the room this session belongs to.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// The side this client plays.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The round this client last processed.
    pub fn round_id(&self) -> Option<&RoundId> {
        self.round_id.as_ref()
    }

    /// Returns `true` while a subscription is held.
    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }

    /// Switches to `round_id` and forgets per-round bookkeeping.
    pub(crate) fn enter_round(&mut self, round_id: Option<RoundId>) {
        if let Some(id) = &round_id {
            self.seen_rounds.insert(id.clone());
        }
        self.round_id = round_id;
        self.rematch_signalled = false;
        self.applied_moves.clear();
    }

    /// Returns `true` if `round_id` is a round this session already left.
    pub(crate) fn is_stale_round(&self, round_id: &RoundId) -> bool {
        self.round_id.as_ref() != Some(round_id) && self.seen_rounds.contains(round_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.collection, "matches");
        assert_eq!(config.room_code_len, 6);
    }

    #[test]
    fn test_session_phase_is_active() {
        assert!(!SessionPhase::Idle.is_active());
        assert!(SessionPhase::Hosting.is_active());
        assert!(SessionPhase::Guesting.is_active());
        assert!(SessionPhase::Playing.is_active());
        assert!(SessionPhase::AwaitingRematch.is_active());
        assert!(!SessionPhase::Finished.is_active());
    }

    #[test]
    fn test_session_phase_display() {
        assert_eq!(SessionPhase::AwaitingRematch.to_string(), "AwaitingRematch");
    }

    #[test]
    fn test_update_outcome_default_is_quiet() {
        assert!(UpdateOutcome::default().is_quiet());
        let outcome = UpdateOutcome {
            move_applied: true,
            ..UpdateOutcome::default()
        };
        assert!(!outcome.is_quiet());
    }

    #[test]
    fn test_enter_round_resets_bookkeeping() {
        let mut session = Session::new(
            RoomCode::parse("AAAAAA").unwrap(),
            Role::Host,
            Some(RoundId::new("r1")),
        );
        session.rematch_signalled = true;
        session.opponent_announced = true;

        session.enter_round(Some(RoundId::new("r2")));

        assert_eq!(session.round_id(), Some(&RoundId::new("r2")));
        assert!(!session.rematch_signalled);
        assert!(session.applied_moves.is_empty());
        assert!(session.opponent_announced, "arrival is per session, not per round");
    }

    #[test]
    fn test_is_stale_round_only_for_left_rounds() {
        let mut session = Session::new(
            RoomCode::parse("AAAAAA").unwrap(),
            Role::Guest,
            Some(RoundId::new("r1")),
        );
        assert!(!session.is_stale_round(&RoundId::new("r1")));
        assert!(!session.is_stale_round(&RoundId::new("r2")));

        session.enter_round(Some(RoundId::new("r2")));

        assert!(session.is_stale_round(&RoundId::new("r1")));
        assert!(!session.is_stale_round(&RoundId::new("r2")));
        assert!(!session.is_stale_round(&RoundId::new("r3")));
    }
}
