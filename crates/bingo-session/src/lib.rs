//! Client-side session state for bingo.
//!
//! Everything here belongs to one client rather than to the shared game:
//!
//! 1. **Identity**: who this client is ([`LocalIdentity`]) and where it is
//!    kept between runs ([`IdentityStore`])
//! 2. **Feeds**: the room subscriptions this client holds, at most one
//!    per room ([`ClientSession`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Client facade (above)  ← remembers who "me" is, owns the feeds
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Room Layer (below)  ← RoomSubscription, room ids
//! ```

#![allow(async_fn_in_trait)]

mod client;
mod error;
mod identity;

pub use client::{ClientSession, SessionFeed};
pub use error::SessionError;
pub use identity::{FileIdentityStore, IdentityStore, LocalIdentity, MemoryIdentityStore};
