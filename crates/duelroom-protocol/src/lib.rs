//! Shared-document protocol for Duelroom.
//!
//! This crate defines what the two peers write into the shared room
//! document and how they name things:
//!
//! - **Types** ([`Room`], [`RoomPatch`], [`LastMove`], [`Role`],
//!   [`RoomStatus`], [`RoundSetup`]): the document schema and the typed
//!   partial writes made against it.
//! - **Identifiers** ([`RoomCode`], [`RoundId`]): locally generated,
//!   coordination-free.
//! - **Codec** ([`to_document`], [`from_document`]): typed values to and
//!   from store documents.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Store (Document) → Protocol (Room, RoomPatch) → Session (roles, rounds)
//! ```
//!
//! The protocol layer knows nothing about subscriptions or whose turn it
//! is locally. It only knows the shape of the document.

mod codec;
mod error;
mod ids;
mod types;

pub use codec::{from_document, to_document};
pub use error::ProtocolError;
pub use ids::{RoomCode, RoundId};
pub use types::{LastMove, Role, Room, RoomPatch, RoomStatus, RoundSetup};
