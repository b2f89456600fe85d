//! Identity types.
//!
//! Both ids are "newtype wrappers" around `String`. They are generated
//! locally (no authority hands them out) and travel as plain strings in
//! the store, so a `PlayerId` and a `RoomId` are indistinguishable on the
//! wire; the wrappers keep them apart in code.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of a room code, e.g. `"K7QX2M"`.
pub const ROOM_CODE_LEN: usize = 6;

/// Length of a generated player token.
const PLAYER_TOKEN_LEN: usize = 11;

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const PLAYER_TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Opaque player identifier, unique within a room.
///
/// `#[serde(transparent)]` makes `PlayerId("abc")` serialize as `"abc"`
/// rather than `{"0":"abc"}`; player ids are also used as map keys in
/// the store, so they have to be plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Generates a fresh random token (lowercase base-36).
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(random_token(rng, PLAYER_TOKEN_ALPHABET, PLAYER_TOKEN_LEN))
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short room code shared between players to join the same game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Generates a fresh random code of [`ROOM_CODE_LEN`] uppercase
    /// alphanumerics.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(random_token(rng, ROOM_CODE_ALPHABET, ROOM_CODE_LEN))
    }

    /// Normalizes user input: surrounding whitespace is dropped and the
    /// code is upper-cased, so `" k7qx2m "` finds room `K7QX2M`.
    pub fn normalize(input: &str) -> Self {
        Self(input.trim().to_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn random_token<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
        .collect()
}
