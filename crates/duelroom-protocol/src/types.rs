//! The shared room document and the typed writes made against it.
//!
//! Everything in this module travels through the document store. The
//! JSON field names (`roundId`, `hostConnected`, `lastMove`, ...) are the
//! document's schema; both peers must agree on them, so every type here
//! pins its serde representation explicitly.

use std::fmt;

use duelroom_store::Document;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{ProtocolError, RoundId, codec};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Which side of the room a client is on.
///
/// The host creates the room and is the only side that ever starts a new
/// round. The guest joins with a code and otherwise only requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::Host => Self::Guest,
            Self::Guest => Self::Host,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Guest => write!(f, "guest"),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a room as recorded in the document.
///
/// ```text
/// Waiting ──(guest joins)──→ Playing ──(end match)──→ Finished
///                               ↑                        │
///                               └──(rematch reset)───────┘
/// ```
///
/// Within one round the status only moves forward. A rematch resets it
/// to `Playing` in place; the room is never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

impl RoomStatus {
    /// Returns `true` if a guest may still join.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Waiting | Self::Playing)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// LastMove
// ---------------------------------------------------------------------------

/// The most recent move. Overwritten on every turn, never appended.
///
/// Peers don't ship the board back and forth: each one applies the
/// other's `LastMove` to its own copy of the board, so the board stays in
/// sync as long as every move is applied exactly once and in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMove {
    /// Who made the move.
    pub player: Role,
    /// Position of the played card in the mover's hand.
    pub card_index: usize,
    /// Board cell the card was placed on.
    pub board_index: usize,
    /// The card itself, opaque to the protocol.
    pub card: Value,
}

impl LastMove {
    /// Decodes the opaque card payload into the game's card type.
    pub fn card<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.card.clone()).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// RoundSetup
// ---------------------------------------------------------------------------

/// The game state a round starts from, supplied by game logic.
///
/// Board and hands are opaque JSON to the protocol. Use [`RoundSetup::new`]
/// to build one from typed game values.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSetup {
    pub turn: Role,
    pub board_elements: Value,
    pub host_hand: Value,
    pub guest_hand: Value,
}

impl RoundSetup {
    /// Serializes typed board and hands into a setup.
    ///
    /// # Errors
    /// [`ProtocolError::Encode`] if any of the values fails to serialize.
    pub fn new<B, H>(
        turn: Role,
        board: &B,
        host_hand: &H,
        guest_hand: &H,
    ) -> Result<Self, ProtocolError>
    where
        B: Serialize,
        H: Serialize,
    {
        Ok(Self {
            turn,
            board_elements: serde_json::to_value(board)
                .map_err(ProtocolError::Encode)?,
            host_hand: serde_json::to_value(host_hand)
                .map_err(ProtocolError::Encode)?,
            guest_hand: serde_json::to_value(guest_hand)
                .map_err(ProtocolError::Encode)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// The shared room document: all synchronized state of one session.
///
/// Fields other than `status` and `turn` carry `#[serde(default)]` so a
/// document written by an older client (no `roundId`, no rematch flags)
/// still decodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub status: RoomStatus,

    /// Token of the current round. Changes exactly once per accepted
    /// rematch.
    #[serde(default)]
    pub round_id: Option<RoundId>,

    /// Always `true` once the room exists.
    #[serde(default)]
    pub host_connected: bool,

    /// Becomes `true` when a guest joins.
    #[serde(default)]
    pub guest_connected: bool,

    /// Whose move is authoritative next.
    pub turn: Role,

    /// Board state used to seed a round. Not updated per move.
    #[serde(default)]
    pub board_elements: Value,

    #[serde(default)]
    pub host_hand: Value,

    #[serde(default)]
    pub guest_hand: Value,

    /// Most recent move of the current round, `null` at round start.
    #[serde(default)]
    pub last_move: Option<LastMove>,

    #[serde(default)]
    pub host_rematch: bool,

    #[serde(default)]
    pub guest_rematch: bool,

    /// Creation time in milliseconds since the UNIX epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
}

impl Room {
    /// Builds the document a host writes when it creates a room.
    pub fn new(round_id: RoundId, setup: RoundSetup, created_at: u64) -> Self {
        Self {
            status: RoomStatus::Waiting,
            round_id: Some(round_id),
            host_connected: true,
            guest_connected: false,
            turn: setup.turn,
            board_elements: setup.board_elements,
            host_hand: setup.host_hand,
            guest_hand: setup.guest_hand,
            last_move: None,
            host_rematch: false,
            guest_rematch: false,
            created_at: Some(created_at),
        }
    }

    /// Decodes a store document.
    pub fn from_document(document: Document) -> Result<Self, ProtocolError> {
        codec::from_document(document)
    }

    /// Encodes this room as a store document.
    pub fn to_document(&self) -> Result<Document, ProtocolError> {
        codec::to_document(self)
    }

    /// Whether `role` has asked for a rematch.
    pub fn rematch_requested(&self, role: Role) -> bool {
        match role {
            Role::Host => self.host_rematch,
            Role::Guest => self.guest_rematch,
        }
    }

    /// Both sides want another round.
    pub fn rematch_agreed(&self) -> bool {
        self.rematch_requested(Role::Host) && self.rematch_requested(Role::Guest)
    }

    /// Decodes the board payload into the game's board type.
    pub fn board<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.board_elements.clone())
            .map_err(ProtocolError::Decode)
    }

    /// Decodes `role`'s hand into the game's hand type.
    pub fn hand<T: DeserializeOwned>(&self, role: Role) -> Result<T, ProtocolError> {
        let raw = match role {
            Role::Host => &self.host_hand,
            Role::Guest => &self.guest_hand,
        };
        serde_json::from_value(raw.clone()).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// RoomPatch
// ---------------------------------------------------------------------------

/// A partial write to the room document.
///
/// Only the fields that are `Some` end up in the encoded document, so the
/// store's merge leaves everything else alone. `last_move` is a double
/// option: `None` leaves it untouched, `Some(None)` clears it to `null`,
/// `Some(Some(m))` replaces it with `m`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RoomStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_id: Option<RoundId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_connected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_elements: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_hand: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_hand: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<Option<LastMove>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_rematch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_rematch: Option<bool>,
}

impl RoomPatch {
    /// Guest arrival: marks the guest connected and starts play.
    pub fn join() -> Self {
        Self {
            guest_connected: Some(true),
            status: Some(RoomStatus::Playing),
            ..Self::default()
        }
    }

    /// Records `mv` as the latest move and hands the turn to the other
    /// side. The board itself is not written.
    pub fn advance(mv: LastMove) -> Self {
        Self {
            turn: Some(mv.player.opponent()),
            last_move: Some(Some(mv)),
            ..Self::default()
        }
    }

    /// Sets `role`'s own rematch flag and nothing else.
    pub fn rematch_request(role: Role) -> Self {
        match role {
            Role::Host => Self {
                host_rematch: Some(true),
                ..Self::default()
            },
            Role::Guest => Self {
                guest_rematch: Some(true),
                ..Self::default()
            },
        }
    }

    /// Closes the room.
    pub fn finish() -> Self {
        Self {
            status: Some(RoomStatus::Finished),
            ..Self::default()
        }
    }

    /// Replaces every per-round field for a fresh round.
    pub fn new_round(round_id: RoundId, setup: RoundSetup) -> Self {
        Self {
            status: Some(RoomStatus::Playing),
            round_id: Some(round_id),
            turn: Some(setup.turn),
            board_elements: Some(setup.board_elements),
            host_hand: Some(setup.host_hand),
            guest_hand: Some(setup.guest_hand),
            last_move: Some(None),
            host_rematch: Some(false),
            guest_rematch: Some(false),
            ..Self::default()
        }
    }

    /// Encodes the set fields as a store document.
    pub fn to_document(&self) -> Result<Document, ProtocolError> {
        codec::to_document(self)
    }
}
