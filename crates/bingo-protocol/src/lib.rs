//! Data model for bingo sessions.
//!
//! This crate defines the shapes that live in the shared store and travel
//! to every subscribed client:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`]): opaque, randomly generated
//!   tokens.
//! - **Game pieces** ([`Board`], [`Letter`]): the 5×5 card and the five
//!   achievement symbols.
//! - **Aggregates** ([`Room`], [`Player`]): the room record, decoded from
//!   untyped store snapshots and validated at the boundary.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): byte encoding for
//!   anything that needs to leave memory (e.g. the local identity file).
//!
//! # Architecture
//!
//! ```text
//! Store (serde_json::Value) → Protocol (Room, validated) → Room engine
//! ```
//!
//! Nothing here knows about the store or about turn rules. It only knows
//! what a well-formed room looks like.

mod board;
mod codec;
mod error;
mod room;
mod types;

pub use board::{Board, Letter, BOARD_SIZE, CELL_COUNT, MAX_LETTERS, NUMBER_POOL};
pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use room::{Player, Room, MAX_ROOM_PLAYERS, MIN_ROOM_PLAYERS};
pub use types::{PlayerId, RoomId, ROOM_CODE_LEN};
