//! Error types for the room layer.

use bingo_protocol::{PlayerId, ProtocolError, RoomId};
use bingo_store::StoreError;

/// Errors that can occur during room operations.
///
/// Every variant except `Store` and `Protocol` is raised before anything
/// is written, so a failed operation leaves the room untouched.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room is stored under this code.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// Every seat in the room is taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The room has started; joins and ready changes are closed.
    #[error("game in room {0} has already started")]
    GameAlreadyStarted(RoomId),

    /// The player is not seated in this room.
    #[error("player {0} not in room {1}")]
    PlayerNotFound(PlayerId, RoomId),

    /// Only the host may do this.
    #[error("player {0} is not the host of room {1}")]
    NotHost(PlayerId, RoomId),

    /// Starting needs enough players, all of them ready.
    #[error("room {room_id} can't start: {ready} of {players} ready, {required} players required")]
    PlayersNotReady {
        room_id: RoomId,
        players: usize,
        ready: usize,
        required: usize,
    },

    /// Requested room size is outside the supported range.
    #[error("room capacity {requested} outside {min}..={max}")]
    InvalidCapacity {
        requested: usize,
        min: usize,
        max: usize,
    },

    /// A called number that no card can hold.
    #[error("number {0} is outside the number pool")]
    NumberOutOfRange(u8),

    /// The number pool can't fill a card.
    #[error("number pool has {available} numbers, a board needs {needed}")]
    RangeExhausted { needed: usize, available: usize },

    /// A [`GameConfig`](crate::GameConfig) value makes no sense.
    #[error("invalid game config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored room snapshot failed to decode or validate.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
