//! Integration tests for `transact` and subscriptions on the in-memory
//! store.

use std::time::Duration;

use bingo_store::{transact, MemoryStore, StoreError, StorePath, SyncStore, Transaction, Version};
use futures_util::FutureExt;
use serde_json::{json, Map, Value};

fn path(raw: &str) -> StorePath {
    StorePath::parse(raw).unwrap()
}

/// Adds one to the number at `at`, treating a missing value as zero.
async fn increment(store: &MemoryStore, at: &StorePath) -> Result<u64, StoreError> {
    transact(store, at, 32, |current| {
        let next = current.and_then(|v| v.as_u64()).unwrap_or(0) + 1;
        Ok(Transaction::Commit(Some(json!(next)), next))
    })
    .await
}

// =========================================================================
// transact
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_transact_concurrent_increments_are_not_lost() {
    let store = MemoryStore::new();
    let counter = path("stats/counter");

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let store = store.clone();
            let counter = counter.clone();
            tokio::spawn(async move { increment(&store, &counter).await })
        })
        .collect();

    let mut seen = Vec::new();
    for handle in handles {
        seen.push(handle.await.unwrap().unwrap());
    }
    seen.sort_unstable();

    // Every increment observed a distinct predecessor.
    assert_eq!(seen, (1..=20).collect::<Vec<u64>>());
    assert_eq!(store.read(&counter).await.unwrap(), Some(json!(20)));
}

#[tokio::test]
async fn test_transact_skip_leaves_version_untouched() {
    let store = MemoryStore::new();
    let at = path("rooms/A");
    store.write(&at, json!({"open": true})).await.unwrap();
    let before = store.read_versioned(&at).await.unwrap().version;

    let open = transact(&store, &at, 4, |current| {
        Ok::<_, StoreError>(Transaction::Skip(current == Some(json!({"open": true}))))
    })
    .await
    .unwrap();

    assert!(open);
    assert_eq!(store.read_versioned(&at).await.unwrap().version, before);
}

#[tokio::test]
async fn test_transact_update_error_aborts_without_writing() {
    let store = MemoryStore::new();
    let at = path("rooms/A");

    let result = transact(&store, &at, 4, |_| -> Result<Transaction<()>, StoreError> {
        Err(StoreError::InvalidPath("refused".to_owned()))
    })
    .await;

    assert!(matches!(result, Err(StoreError::InvalidPath(_))));
    assert_eq!(store.read(&at).await.unwrap(), None);
    assert_eq!(store.read_versioned(&at).await.unwrap().version, Version(0));
}

#[tokio::test]
async fn test_transact_gives_up_after_max_attempts() {
    let store = MemoryStore::new();
    let at = path("rooms/A");
    let mut runs = 0u32;

    // Every time the update runs, another writer sneaks in before the
    // commit, so the compare-and-set never matches.
    let result = transact(&store, &at, 3, |_| -> Result<Transaction<()>, StoreError> {
        runs += 1;
        store
            .write(&at, json!(runs))
            .now_or_never()
            .expect("uncontended write completes immediately")?;
        Ok(Transaction::Commit(Some(json!("mine")), ()))
    })
    .await;

    assert_eq!(runs, 3);
    assert!(matches!(
        result,
        Err(StoreError::Contention { attempts: 3, .. })
    ));
    assert_eq!(store.read(&at).await.unwrap(), Some(json!(3)));
}

#[tokio::test]
async fn test_transact_commit_none_removes_value() {
    let store = MemoryStore::new();
    let at = path("rooms/A");
    store.write(&at, json!({"host": "p1"})).await.unwrap();

    transact(&store, &at, 4, |_| Ok::<_, StoreError>(Transaction::Commit(None, ())))
        .await
        .unwrap();

    assert_eq!(store.read(&at).await.unwrap(), None);
    assert_eq!(store.read(&path("rooms")).await.unwrap(), None);
}

#[tokio::test]
async fn test_transact_on_unreachable_store_is_unavailable() {
    let store = MemoryStore::new();
    store.set_available(false);

    let result = increment(&store, &path("stats/counter")).await;
    assert!(matches!(result, Err(StoreError::Unavailable(_))));
}

// =========================================================================
// Subscriptions
// =========================================================================

#[tokio::test]
async fn test_subscribe_empty_path_sends_nothing_up_front() {
    let store = MemoryStore::new();
    let mut feed = store.subscribe(&path("rooms/A")).await.unwrap();

    assert!(feed.try_recv().is_none());
    assert_eq!(feed.path(), &path("rooms/A"));
}

#[tokio::test]
async fn test_subscribe_existing_value_arrives_first() {
    let store = MemoryStore::new();
    let at = path("rooms/A");
    store.write(&at, json!({"started": false})).await.unwrap();

    let mut feed = store.subscribe(&at).await.unwrap();
    let first = feed.recv().await.unwrap();
    assert_eq!(first.path, at);
    assert_eq!(first.value, Some(json!({"started": false})));
}

#[tokio::test]
async fn test_subscription_sees_writes_in_commit_order() {
    let store = MemoryStore::new();
    let at = path("rooms/A/calledNumbers");
    let mut feed = store.subscribe(&at).await.unwrap();

    let mut called = Vec::new();
    for n in [7, 3, 19, 25] {
        called.push(n);
        store.write(&at, json!(called)).await.unwrap();
    }

    let mut lengths = Vec::new();
    while let Some(snapshot) = feed.try_recv() {
        let value = snapshot.value.unwrap();
        lengths.push(value.as_array().unwrap().len());
    }
    assert_eq!(lengths, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_subscription_on_room_sees_nested_patch() {
    let store = MemoryStore::new();
    let room = path("rooms/A");
    store
        .write(&room, json!({"players": {"p1": {"ready": false}}}))
        .await
        .unwrap();

    let mut feed = store.subscribe(&room).await.unwrap();
    feed.recv().await.unwrap();

    let mut fields = Map::new();
    fields.insert("ready".to_owned(), Value::Bool(true));
    store.patch(&path("rooms/A/players/p1"), fields).await.unwrap();

    let update = feed.recv().await.unwrap();
    assert_eq!(update.path, room);
    assert_eq!(update.value, Some(json!({"players": {"p1": {"ready": true}}})));
}

#[tokio::test]
async fn test_subscription_ignores_sibling_rooms() {
    let store = MemoryStore::new();
    let mut feed = store.subscribe(&path("rooms/B")).await.unwrap();

    store.write(&path("rooms/A"), json!({"x": 1})).await.unwrap();
    assert!(feed.try_recv().is_none());

    store.write(&path("rooms/B"), json!({"x": 2})).await.unwrap();
    assert_eq!(feed.try_recv().unwrap().value, Some(json!({"x": 2})));
}

#[tokio::test]
async fn test_subscription_reports_removal_as_none() {
    let store = MemoryStore::new();
    let room = path("rooms/A");
    store.write(&room, json!({"x": 1})).await.unwrap();
    let mut feed = store.subscribe(&room).await.unwrap();
    feed.recv().await.unwrap();

    // Removing the parent removes the room too.
    store.remove(&path("rooms")).await.unwrap();
    let gone = feed.recv().await.unwrap();
    assert_eq!(gone.value, None);
}

#[tokio::test]
async fn test_unsubscribe_releases_the_feed() {
    let store = MemoryStore::new();
    let first = store.subscribe(&path("rooms/A")).await.unwrap();
    let second = store.subscribe(&path("rooms/A")).await.unwrap();
    assert_eq!(store.subscriber_count().await, 2);

    first.unsubscribe();
    assert_eq!(store.subscriber_count().await, 1);

    drop(second);
    store.write(&path("rooms/A"), json!(1)).await.unwrap();
    assert_eq!(store.subscriber_count().await, 0);
}

// =========================================================================
// Outages
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_stalled_store_never_answers() {
    let store = MemoryStore::new();
    store.set_stalled(true);

    let read = tokio::time::timeout(Duration::from_secs(5), store.read(&path("rooms"))).await;
    assert!(read.is_err(), "a stalled store must not answer");

    store.set_stalled(false);
    assert_eq!(store.read(&path("rooms")).await.unwrap(), None);
}

#[tokio::test]
async fn test_store_comes_back_after_outage() {
    let store = MemoryStore::new();
    let at = path("stats/counter");
    assert_eq!(increment(&store, &at).await.unwrap(), 1);

    store.set_available(false);
    assert!(matches!(store.read(&at).await, Err(StoreError::Unavailable(_))));

    store.set_available(true);
    assert_eq!(increment(&store, &at).await.unwrap(), 2);
}
