//! In-process [`SyncStore`] implementation.
//!
//! The whole tree is one `serde_json::Value` behind a Tokio mutex. Every
//! operation takes the lock once, so each operation is atomic with
//! respect to every other one, and subscribers are notified while the
//! lock is still held, which keeps delivery in commit order.
//!
//! # Versions
//!
//! Each write stamps the exact path it touched with the next tick of a
//! logical clock. The version of a path is the newest stamp on that path,
//! any ancestor, or any descendant. That is exactly the set of writes that could
//! have changed what a reader at that path sees. Writes to sibling rooms
//! never conflict with each other.
//!
//! Stamps below a rewritten path are dropped, and a path that ends up
//! empty hands its stamp to the nearest ancestor still holding a value.
//! The stamp map therefore tracks what is stored, not everything ever
//! written. Removing a room bumps its siblings' versions once; their
//! pending transactions retry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::{mpsc, Mutex};

use crate::{Snapshot, StoreError, StorePath, Subscription, SyncStore, Version, Versioned};

/// Shared in-memory store. Cheap to clone; clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    offline: AtomicBool,
    stalled: AtomicBool,
}

#[derive(Default)]
struct State {
    root: Value,
    stamps: HashMap<StorePath, u64>,
    clock: u64,
    subscribers: Vec<Subscriber>,
}

struct Subscriber {
    path: StorePath,
    sender: mpsc::UnboundedSender<Snapshot>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an outage: while offline, every call fails with
    /// [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.inner.offline.store(!available, Ordering::SeqCst);
    }

    /// Simulates a store that accepts requests but never answers. Calls
    /// made while stalled hang until the caller gives up.
    pub fn set_stalled(&self, stalled: bool) {
        self.inner.stalled.store(stalled, Ordering::SeqCst);
    }

    /// Number of feeds that are still open, across all paths.
    pub async fn subscriber_count(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        state.subscribers.retain(|s| !s.sender.is_closed());
        state.subscribers.len()
    }

    async fn reachable(&self) -> Result<(), StoreError> {
        if self.inner.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_owned()));
        }
        Ok(())
    }
}

impl State {
    fn get(&self, path: &StorePath) -> Option<&Value> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = node.as_object()?.get(segment)?;
        }
        (!is_empty(node)).then_some(node)
    }

    fn version(&self, path: &StorePath) -> Version {
        let newest = self
            .stamps
            .iter()
            .filter(|(stamped, _)| stamped.overlaps(path))
            .map(|(_, stamp)| *stamp)
            .max()
            .unwrap_or(0);
        Version(newest)
    }

    /// Applies one change and publishes it. `value` of `None` removes.
    fn apply(&mut self, path: &StorePath, value: Option<Value>) {
        let value = value.map(prune).unwrap_or(Value::Null);
        set_at(&mut self.root, path.segments(), value);
        self.clock += 1;
        self.restamp(path, self.clock);
        self.publish(path);
    }

    /// Records a change at `changed` under `stamp`.
    ///
    /// The new stamp lands on an ancestor of (or on) every stamp it
    /// replaces and is newer than all of them, so no version goes back.
    fn restamp(&mut self, changed: &StorePath, stamp: u64) {
        let mut anchor = changed.clone();
        while self.get(&anchor).is_none() {
            match anchor.parent() {
                Some(parent) => anchor = parent,
                None => break,
            }
        }
        // The whole branch below the anchor that this change rewrote.
        let cleared = changed.prefix(anchor.segments().len() + 1);
        self.stamps
            .retain(|stamped, _| !(stamped == &cleared || cleared.is_ancestor_of(stamped)));
        self.stamps.insert(anchor, stamp);
    }

    fn publish(&mut self, changed: &StorePath) {
        let mut deliveries = Vec::new();
        for (index, subscriber) in self.subscribers.iter().enumerate() {
            if subscriber.path.overlaps(changed) {
                deliveries.push((index, self.get(&subscriber.path).cloned()));
            }
        }
        let mut closed = Vec::new();
        for (index, value) in deliveries {
            let subscriber = &self.subscribers[index];
            let snapshot = Snapshot {
                path: subscriber.path.clone(),
                value,
            };
            if subscriber.sender.send(snapshot).is_err() {
                closed.push(index);
            }
        }
        for index in closed.into_iter().rev() {
            self.subscribers.remove(index);
        }
    }
}

impl SyncStore for MemoryStore {
    async fn read(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        self.reachable().await?;
        let state = self.inner.state.lock().await;
        Ok(state.get(path).cloned())
    }

    async fn read_versioned(&self, path: &StorePath) -> Result<Versioned, StoreError> {
        self.reachable().await?;
        let state = self.inner.state.lock().await;
        Ok(Versioned {
            value: state.get(path).cloned(),
            version: state.version(path),
        })
    }

    async fn write(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        self.reachable().await?;
        let mut state = self.inner.state.lock().await;
        state.apply(path, Some(value));
        Ok(())
    }

    async fn patch(&self, path: &StorePath, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.reachable().await?;
        // Validate every key before touching anything, so a bad key can't
        // leave a half-applied patch behind.
        let children = fields
            .into_iter()
            .map(|(key, value)| Ok((path.child(&key)?, value)))
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut state = self.inner.state.lock().await;
        for (child, value) in &children {
            let value = prune(value.clone());
            set_at(&mut state.root, child.segments(), value);
        }
        state.clock += 1;
        let stamp = state.clock;
        for (child, _) in &children {
            state.restamp(child, stamp);
        }
        state.publish(path);
        Ok(())
    }

    async fn remove(&self, path: &StorePath) -> Result<(), StoreError> {
        self.reachable().await?;
        let mut state = self.inner.state.lock().await;
        state.apply(path, None);
        Ok(())
    }

    async fn compare_and_set(
        &self,
        path: &StorePath,
        expected: Version,
        value: Option<Value>,
    ) -> Result<bool, StoreError> {
        self.reachable().await?;
        let mut state = self.inner.state.lock().await;
        if state.version(path) != expected {
            return Ok(false);
        }
        state.apply(path, value);
        Ok(true)
    }

    async fn subscribe(&self, path: &StorePath) -> Result<Subscription, StoreError> {
        self.reachable().await?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.inner.state.lock().await;
        if let Some(value) = state.get(path).cloned() {
            // The receiver is in hand, so this send can't fail.
            let _ = sender.send(Snapshot {
                path: path.clone(),
                value: Some(value),
            });
        }
        state.subscribers.push(Subscriber {
            path: path.clone(),
            sender,
        });
        tracing::debug!(%path, subscribers = state.subscribers.len(), "subscription opened");
        Ok(Subscription::new(path.clone(), receiver))
    }
}

// ---------------------------------------------------------------------------
// Tree helpers
// ---------------------------------------------------------------------------

/// Null and empty containers count as "nothing stored here".
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Drops null and empty children recursively, the way the store never
/// keeps an empty node around.
fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let kept: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, prune(v)))
                .filter(|(_, v)| !is_empty(v))
                .collect();
            if kept.is_empty() {
                Value::Null
            } else {
                Value::Object(kept)
            }
        }
        Value::Array(items) if items.is_empty() => Value::Null,
        other => other,
    }
}

/// Writes `value` at `segments` below `node`, creating intermediate
/// objects as needed and removing nodes left empty.
fn set_at(node: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        if is_empty(&value) {
            return;
        }
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(head.clone()).or_insert(Value::Null);
        set_at(child, rest, value);
        if is_empty(child) {
            map.shift_remove(head);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_read_missing_path_returns_none() {
        let store = MemoryStore::new();
        assert_eq!(store.read(&path("rooms/A")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_read_nested_path() {
        let store = MemoryStore::new();
        store.write(&path("rooms/A"), json!({"id": "A"})).await.unwrap();

        assert_eq!(store.read(&path("rooms/A/id")).await.unwrap(), Some(json!("A")));
        assert_eq!(
            store.read(&path("rooms")).await.unwrap(),
            Some(json!({"A": {"id": "A"}}))
        );
    }

    #[tokio::test]
    async fn test_write_prunes_null_and_empty_children() {
        let store = MemoryStore::new();
        store
            .write(&path("rooms/A"), json!({"id": "A", "winner": null, "calledNumbers": [], "players": {}}))
            .await
            .unwrap();
        assert_eq!(store.read(&path("rooms/A")).await.unwrap(), Some(json!({"id": "A"})));
    }

    #[tokio::test]
    async fn test_patch_merges_fields_and_null_removes() {
        let store = MemoryStore::new();
        store.write(&path("rooms/A"), json!({"a": 1, "b": 2})).await.unwrap();

        let mut fields = Map::new();
        fields.insert("b".into(), Value::Null);
        fields.insert("c".into(), json!(3));
        store.patch(&path("rooms/A"), fields).await.unwrap();

        assert_eq!(store.read(&path("rooms/A")).await.unwrap(), Some(json!({"a": 1, "c": 3})));
    }

    #[tokio::test]
    async fn test_patch_rejects_bad_key_without_writing() {
        let store = MemoryStore::new();
        let mut fields = Map::new();
        fields.insert("ok".into(), json!(1));
        fields.insert("not.ok".into(), json!(2));

        let result = store.patch(&path("rooms/A"), fields).await;
        assert!(matches!(result, Err(StoreError::InvalidPath(_))));
        assert_eq!(store.read(&path("rooms/A")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_prunes_empty_parents() {
        let store = MemoryStore::new();
        store.write(&path("rooms/A"), json!({"id": "A"})).await.unwrap();
        store.remove(&path("rooms/A")).await.unwrap();

        assert_eq!(store.read(&path("rooms")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_children_keep_insertion_order() {
        let store = MemoryStore::new();
        for id in ["Z", "A", "M"] {
            store.write(&path(&format!("rooms/{id}")), json!({"id": id})).await.unwrap();
        }
        let rooms = store.read(&path("rooms")).await.unwrap().unwrap();
        let keys: Vec<&String> = rooms.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["Z", "A", "M"]);
    }

    #[tokio::test]
    async fn test_compare_and_set_rejects_stale_version() {
        let store = MemoryStore::new();
        let room = path("rooms/A");
        let seen = store.read_versioned(&room).await.unwrap();

        store.write(&room, json!(1)).await.unwrap();
        let applied = store.compare_and_set(&room, seen.version, Some(json!(2))).await.unwrap();

        assert!(!applied);
        assert_eq!(store.read(&room).await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_version_tracks_descendant_and_ancestor_writes() {
        let store = MemoryStore::new();
        let room = path("rooms/A");
        let v0 = store.read_versioned(&room).await.unwrap().version;

        store.write(&path("rooms/A/players/p1"), json!({"name": "x"})).await.unwrap();
        let v1 = store.read_versioned(&room).await.unwrap().version;
        assert!(v1 > v0, "descendant write must bump the room version");

        store.write(&path("rooms"), json!({})).await.unwrap();
        let v2 = store.read_versioned(&room).await.unwrap().version;
        assert!(v2 > v1, "ancestor write must bump the room version");
    }

    #[tokio::test]
    async fn test_version_ignores_sibling_writes() {
        let store = MemoryStore::new();
        let room = path("rooms/A");
        store.write(&room, json!(1)).await.unwrap();
        let before = store.read_versioned(&room).await.unwrap().version;

        store.write(&path("rooms/B"), json!(2)).await.unwrap();
        assert_eq!(store.read_versioned(&room).await.unwrap().version, before);
    }

    #[tokio::test]
    async fn test_stamps_stay_bounded_as_rooms_come_and_go() {
        let store = MemoryStore::new();
        store.write(&path("stats/games"), json!(1)).await.unwrap();

        for i in 0..500 {
            let room = path(&format!("rooms/R{i}"));
            store.write(&room, json!({"id": i})).await.unwrap();
            store
                .write(&room.child("calledNumbers").unwrap(), json!([i % 25 + 1]))
                .await
                .unwrap();
            store.remove(&room).await.unwrap();
        }

        assert_eq!(store.read(&path("rooms")).await.unwrap(), None);
        let stamps = store.inner.state.lock().await.stamps.len();
        assert!(stamps <= 2, "{stamps} stamps left behind");
    }

    #[tokio::test]
    async fn test_overwrite_drops_descendant_stamps() {
        let store = MemoryStore::new();
        for p in ["p1", "p2", "p3"] {
            store
                .write(&path(&format!("rooms/A/players/{p}")), json!({"ready": false}))
                .await
                .unwrap();
        }
        store.write(&path("rooms/A"), json!({"id": "A"})).await.unwrap();

        let state = store.inner.state.lock().await;
        assert_eq!(state.stamps.len(), 1);
        assert!(state.stamps.contains_key(&path("rooms/A")));
    }

    #[tokio::test]
    async fn test_remove_then_recreate_still_bumps_version() {
        let store = MemoryStore::new();
        let room = path("rooms/A");
        store.write(&path("rooms/B"), json!(0)).await.unwrap();
        let absent = store.read_versioned(&room).await.unwrap();

        store.write(&room, json!(1)).await.unwrap();
        let present = store.read_versioned(&room).await.unwrap();
        store.remove(&room).await.unwrap();
        let removed = store.read_versioned(&room).await.unwrap();
        store.write(&room, json!(1)).await.unwrap();

        assert!(removed.version > present.version);
        assert!(!store.compare_and_set(&room, absent.version, Some(json!(2))).await.unwrap());
        assert!(!store.compare_and_set(&room, present.version, Some(json!(2))).await.unwrap());
        assert_eq!(store.read(&room).await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_patch_removing_child_bumps_parent_version() {
        let store = MemoryStore::new();
        let room = path("rooms/A");
        store.write(&room, json!({"a": 1, "b": 2})).await.unwrap();
        let before = store.read_versioned(&room).await.unwrap().version;

        let mut fields = Map::new();
        fields.insert("b".into(), Value::Null);
        store.patch(&room, fields).await.unwrap();

        assert!(store.read_versioned(&room).await.unwrap().version > before);
        assert!(store.read_versioned(&path("rooms/A/b")).await.unwrap().version > before);
    }

    #[tokio::test]
    async fn test_offline_store_returns_unavailable() {
        let store = MemoryStore::new();
        store.set_available(false);
        let result = store.read(&path("rooms")).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        store.set_available(true);
        assert!(store.read(&path("rooms")).await.is_ok());
    }

    #[tokio::test]
    async fn test_prune_keeps_scalars_and_non_empty_arrays() {
        assert_eq!(prune(json!({"n": [1, 2], "z": 0, "f": false})), json!({"n": [1, 2], "z": 0, "f": false}));
        assert_eq!(prune(json!({"a": {"b": null}})), Value::Null);
    }
}
