//! Game rules and room lifecycle for bingo sessions.
//!
//! All room state lives in a shared [`SyncStore`](bingo_store::SyncStore);
//! this crate decides what may be written there.
//!
//! # Key types
//!
//! - [`RoomManager`]: create, join, ready, start, call, delete, plus
//!   quick-play matchmaking and typed subscriptions
//! - [`CallOutcome`]: what a number call did (or why it was ignored)
//! - [`GameConfig`]: player limits, number pool, store timeouts
//! - [`generate_board`]: deals a card from a number pool
//! - [`completed_lines`] / [`award`]: line detection and letter awards
//!
//! # How a call flows
//!
//! ```text
//! call_number ──→ transact(rooms/<code>)
//!                   ├─ not started / ended ──→ NotInPlay (no write)
//!                   ├─ not your turn ────────→ NotYourTurn (no write)
//!                   └─ append number, pass turn, award caller's letters
//!                        └─ fifth letter ──→ winner, room ended
//! ```

mod board;
mod config;
mod detector;
mod engine;
mod error;
mod manager;
mod subscription;

pub use board::generate_board;
pub use config::GameConfig;
pub use detector::{award, completed_lines, has_all_letters, Line};
pub use engine::CallOutcome;
pub use error::RoomError;
pub use manager::{RoomManager, Seat};
pub use subscription::{RoomSubscription, RoomUpdate};
