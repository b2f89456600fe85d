//! Push-based change feeds.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::StorePath;

/// The full value at a subscribed path after a change.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: StorePath,
    /// `None` when the path is now empty (e.g. the room was removed).
    pub value: Option<Value>,
}

/// A live feed of [`Snapshot`]s for one path.
///
/// Dropping the subscription (or calling [`unsubscribe`](Self::unsubscribe))
/// stops delivery; the store forgets closed feeds the next time it
/// publishes.
#[derive(Debug)]
pub struct Subscription {
    path: StorePath,
    receiver: mpsc::UnboundedReceiver<Snapshot>,
}

impl Subscription {
    /// Wraps the receiving half of a feed. Stores create these; callers
    /// get them from [`SyncStore::subscribe`](crate::SyncStore::subscribe).
    pub fn new(path: StorePath, receiver: mpsc::UnboundedReceiver<Snapshot>) -> Self {
        Self { path, receiver }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// Waits for the next snapshot. Returns `None` once the feed is
    /// closed.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Returns an already-delivered snapshot without waiting.
    pub fn try_recv(&mut self) -> Option<Snapshot> {
        self.receiver.try_recv().ok()
    }

    /// Stops delivery.
    pub fn unsubscribe(mut self) {
        self.receiver.close();
    }
}
