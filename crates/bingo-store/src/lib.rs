//! Shared real-time store for bingo sessions.
//!
//! Room state lives in a hierarchical key-value store that every client
//! can read, write and subscribe to. This crate defines what the rest of
//! the workspace needs from such a store, the [`SyncStore`] trait, and
//! ships [`MemoryStore`], an in-process implementation used by tests, the
//! demo, and single-process deployments.
//!
//! # Atomic updates
//!
//! Plain `write`/`patch` calls race: two clients that both read a room,
//! check "one seat left", and write a new player will overshoot capacity.
//! [`transact`] closes that gap with optimistic concurrency: read a
//! value and its [`Version`], compute the new value, and commit only if
//! the version is unchanged, retrying otherwise.
//!
//! ```text
//! read_versioned ──→ update(current) ──→ compare_and_set ──(conflict)──┐
//!       ↑                                                               │
//!       └───────────────────────────────────────────────────────────────┘
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod memory;
mod path;
mod store;
mod subscription;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use path::StorePath;
pub use store::{transact, SyncStore, Transaction, Version, Versioned};
pub use subscription::{Snapshot, Subscription};
