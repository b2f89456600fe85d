//! Per-client bookkeeping of live room feeds.
//!
//! A client that subscribes to the same room twice would see every
//! update twice. [`ClientSession`] keeps at most one live feed per room:
//! registering a new one closes the old one first.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bingo_protocol::RoomId;
use bingo_room::{RoomSubscription, RoomUpdate};
use tokio::sync::oneshot;

/// One client's set of room subscriptions.
///
/// Dropping the session closes every feed it registered.
#[derive(Debug, Default)]
pub struct ClientSession {
    /// Cancel switch for the live feed of each room.
    feeds: Mutex<HashMap<RoomId, oneshot::Sender<()>>>,
}

impl ClientSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `subscription`, closing any feed this session
    /// already had for the same room.
    pub fn register(&self, subscription: RoomSubscription) -> SessionFeed {
        let room_id = subscription.room_id().clone();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        if let Some(previous) = self.feeds().insert(room_id.clone(), cancel_tx) {
            // Err means that feed was already gone.
            let _ = previous.send(());
            tracing::debug!(%room_id, "replaced existing room feed");
        }

        SessionFeed {
            room_id,
            inner: Some(subscription),
            cancel: cancel_rx,
        }
    }

    /// Closes the feed for `room_id`. Returns `false` if there was none.
    pub fn unsubscribe(&self, room_id: &RoomId) -> bool {
        match self.feeds().remove(room_id) {
            Some(cancel) => {
                let _ = cancel.send(());
                tracing::debug!(%room_id, "room feed closed");
                true
            }
            None => false,
        }
    }

    /// Closes every feed.
    pub fn unsubscribe_all(&self) {
        for (_, cancel) in self.feeds().drain() {
            let _ = cancel.send(());
        }
    }

    /// Returns `true` if a feed for `room_id` is registered and its
    /// receiving side is still alive.
    pub fn is_subscribed(&self, room_id: &RoomId) -> bool {
        self.feeds().get(room_id).is_some_and(|cancel| !cancel.is_closed())
    }

    /// Rooms with a live feed.
    pub fn subscribed_rooms(&self) -> Vec<RoomId> {
        let mut feeds = self.feeds();
        feeds.retain(|_, cancel| !cancel.is_closed());
        feeds.keys().cloned().collect()
    }

    fn feeds(&self) -> MutexGuard<'_, HashMap<RoomId, oneshot::Sender<()>>> {
        self.feeds.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A room feed owned by a [`ClientSession`].
///
/// Behaves like the [`RoomSubscription`] it wraps until the session
/// replaces or closes it; from then on [`recv`](Self::recv) returns
/// `None`.
#[derive(Debug)]
pub struct SessionFeed {
    room_id: RoomId,
    inner: Option<RoomSubscription>,
    cancel: oneshot::Receiver<()>,
}

impl SessionFeed {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Waits for the next update. `None` once the feed is closed, by the
    /// store or by the session.
    pub async fn recv(&mut self) -> Option<RoomUpdate> {
        let inner = self.inner.as_mut()?;
        tokio::select! {
            biased;
            _ = &mut self.cancel => {}
            update = inner.recv() => return update,
        }
        self.close();
        None
    }

    /// Returns an already-delivered update without waiting.
    pub fn try_recv(&mut self) -> Option<RoomUpdate> {
        match self.cancel.try_recv() {
            Err(oneshot::error::TryRecvError::Empty) => self.inner.as_mut()?.try_recv(),
            _ => {
                self.close();
                None
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    fn close(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.unsubscribe();
        }
    }
}
