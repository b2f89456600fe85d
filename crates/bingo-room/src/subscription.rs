//! Typed room feeds.

use bingo_protocol::{ProtocolError, Room, RoomId};
use bingo_store::Subscription;

/// One change to a watched room.
#[derive(Debug)]
pub enum RoomUpdate {
    /// The room's full, validated state after the change.
    Changed(Room),
    /// The room no longer exists.
    Removed,
    /// The store pushed something that isn't a valid room.
    Rejected(ProtocolError),
}

/// A live feed of [`RoomUpdate`]s for one room.
///
/// Dropping it, or calling [`unsubscribe`](Self::unsubscribe), stops
/// delivery.
#[derive(Debug)]
pub struct RoomSubscription {
    room_id: RoomId,
    inner: Subscription,
}

impl RoomSubscription {
    pub(crate) fn new(room_id: RoomId, inner: Subscription) -> Self {
        Self { room_id, inner }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Waits for the next update. `None` once the feed is closed.
    pub async fn recv(&mut self) -> Option<RoomUpdate> {
        let snapshot = self.inner.recv().await?;
        Some(self.decode(snapshot.value))
    }

    /// Returns an already-delivered update without waiting.
    pub fn try_recv(&mut self) -> Option<RoomUpdate> {
        let snapshot = self.inner.try_recv()?;
        Some(self.decode(snapshot.value))
    }

    pub fn unsubscribe(self) {
        tracing::debug!(room_id = %self.room_id, "room subscription closed");
        self.inner.unsubscribe();
    }

    fn decode(&self, value: Option<serde_json::Value>) -> RoomUpdate {
        let Some(value) = value else {
            return RoomUpdate::Removed;
        };
        match Room::from_value(value) {
            Ok(room) => RoomUpdate::Changed(room),
            Err(err) => {
                tracing::warn!(room_id = %self.room_id, error = %err, "rejected malformed room update");
                RoomUpdate::Rejected(err)
            }
        }
    }
}
