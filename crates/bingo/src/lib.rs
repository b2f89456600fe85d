//! # Bingo
//!
//! Multiplayer bingo session core: rooms, matchmaking, turn rotation,
//! number calling, line detection and win determination, over a shared
//! real-time store.
//!
//! Players share one store. Each client drives it through a
//! [`BingoClient`]; there is no server of its own. Every rule that reads
//! and then writes runs as one conditional update on the room record, so
//! concurrent clients can't overfill a room or double-apply a call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bingo::prelude::*;
//!
//! # async fn demo() -> Result<(), BingoError> {
//! let store = MemoryStore::new();
//! let alice = BingoClientBuilder::new().build(store.clone(), MemoryIdentityStore::new())?;
//! let bob = BingoClientBuilder::new().build(store, MemoryIdentityStore::new())?;
//!
//! let room = alice.create_room("Alice", 2).await?.room_id;
//! bob.join_room(&room, "Bob").await?;
//! alice.set_ready(true).await?;
//! bob.set_ready(true).await?;
//! alice.start_game().await?;
//! alice.call_number(7).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | crate | role |
//! |---|---|
//! | `bingo-protocol` | room/player model, snapshot validation, codec |
//! | `bingo-store` | store interface, `transact`, in-memory store |
//! | `bingo-room` | rules, room lifecycle, matchmaking |
//! | `bingo-session` | local identity, per-client feeds |

mod client;
mod config;
mod error;
mod telemetry;

pub use client::{BingoClient, BingoClientBuilder};
pub use config::ClientConfig;
pub use error::BingoError;
pub use telemetry::{init_tracing, DEFAULT_LOG_FILTER};

pub use bingo_protocol as protocol;
pub use bingo_room as room;
pub use bingo_session as session;
pub use bingo_store as store;

/// Everything a typical client needs, in one import.
pub mod prelude {
    pub use crate::{init_tracing, BingoClient, BingoClientBuilder, BingoError, ClientConfig};
    pub use bingo_protocol::{Board, Letter, Player, PlayerId, Room, RoomId};
    pub use bingo_room::{CallOutcome, GameConfig, RoomError, RoomUpdate};
    pub use bingo_session::{FileIdentityStore, IdentityStore, LocalIdentity, MemoryIdentityStore, SessionFeed};
    pub use bingo_store::{MemoryStore, StoreError, SyncStore};
}
