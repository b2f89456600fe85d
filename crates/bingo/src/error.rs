//! Unified error type for the bingo client.

use bingo_protocol::ProtocolError;
use bingo_room::RoomError;
use bingo_session::SessionError;
use bingo_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` conversions let `?` lift any sub-crate error into this
/// one, so callers of [`BingoClient`](crate::BingoClient) match on a
/// single type.
#[derive(Debug, thiserror::Error)]
pub enum BingoError {
    /// A malformed snapshot or identity file.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The shared store is unreachable or too contended.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A game rule refused the operation (full, not host, ...).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The local identity couldn't be loaded or saved.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The operation acts "as me", but this client hasn't created or
    /// joined a room yet.
    #[error("no local identity: create or join a room first")]
    NoIdentity,
}

impl BingoError {
    /// The underlying room rule violation, if that's what this is.
    pub fn as_room_error(&self) -> Option<&RoomError> {
        match self {
            Self::Room(err) => Some(err),
            _ => None,
        }
    }
}
