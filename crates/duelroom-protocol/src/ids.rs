//! Identifiers: room codes and round tokens.
//!
//! Both are generated locally from randomness alone. There is no counter
//! and no coordination with the store or the peer, so two clients can
//! mint identifiers at the same time without talking to each other.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Characters a generated room code is drawn from.
const ROOM_CODE_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// A short, human-shareable join code. Also the document id of the room.
///
/// Codes are random and NOT checked for uniqueness: creating a room
/// overwrites whatever document already lives under that code. With 36^6
/// possible codes a collision between live rooms is unlikely enough to
/// accept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Length of codes produced by the default configuration.
    pub const DEFAULT_LEN: usize = 6;

    /// Generates a random code of `len` upper-case base-36 characters.
    /// A `len` of zero is bumped to one.
    pub fn generate(len: usize) -> Self {
        let mut rng = rand::rng();
        let code = (0..len.max(1))
            .map(|_| {
                let idx = rng.random_range(0..ROOM_CODE_ALPHABET.len());
                ROOM_CODE_ALPHABET[idx] as char
            })
            .collect();
        Self(code)
    }

    /// Parses a code typed by a user: surrounding whitespace is trimmed
    /// and letters are upper-cased.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidRoomCode`] if the result is empty or has
    /// anything but ASCII letters and digits.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let code = input.trim().to_ascii_uppercase();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ProtocolError::InvalidRoomCode(input.to_string()));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RoundId
// ---------------------------------------------------------------------------

/// Opaque token naming one round inside a room.
///
/// A fresh one is minted for the first round and for every accepted
/// rematch. Peers only ever compare tokens for equality: "is this the
/// round I already know about?" There is no ordering between them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(String);

impl RoundId {
    /// Mints a new token: 128 random bits as 32 lower-case hex characters.
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::rng().random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Wraps an existing token, e.g. one read back from a document.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_code_generate_has_requested_length() {
        assert_eq!(RoomCode::generate(6).as_str().len(), 6);
        assert_eq!(RoomCode::generate(10).as_str().len(), 10);
    }

    #[test]
    fn test_room_code_generate_zero_len_yields_one_char() {
        assert_eq!(RoomCode::generate(0).as_str().len(), 1);
    }

    #[test]
    fn test_room_code_generate_uses_upper_base36() {
        for _ in 0..50 {
            let code = RoomCode::generate(RoomCode::DEFAULT_LEN);
            assert!(
                code.as_str()
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()),
                "unexpected character in {code}"
            );
        }
    }

    #[test]
    fn test_room_code_generate_is_random() {
        // 36^8 possibilities; twenty draws colliding into one value
        // would mean the generator is constant.
        let codes: std::collections::HashSet<_> =
            (0..20).map(|_| RoomCode::generate(8)).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_room_code_parse_normalizes_input() {
        let code = RoomCode::parse("  ab12cd \n").unwrap();
        assert_eq!(code.as_str(), "AB12CD");
    }

    #[test]
    fn test_room_code_parse_rejects_empty_and_symbols() {
        assert!(matches!(
            RoomCode::parse("   "),
            Err(ProtocolError::InvalidRoomCode(_))
        ));
        assert!(matches!(
            RoomCode::parse("AB-12"),
            Err(ProtocolError::InvalidRoomCode(_))
        ));
    }

    #[test]
    fn test_room_code_serializes_as_plain_string() {
        let code = RoomCode::parse("XYZ789").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"XYZ789\"");
    }

    #[test]
    fn test_round_id_generate_is_32_hex_chars() {
        let id = RoundId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_round_id_generate_differs_each_time() {
        assert_ne!(RoundId::generate(), RoundId::generate());
    }
}
