//! The store contract and the optimistic transaction helper.

use std::fmt;
use std::future::Future;

use serde_json::{Map, Value};

use crate::{StoreError, StorePath, Subscription};

/// Monotonic version of the data visible at a path.
///
/// Two reads that return the same version saw the same value. The number
/// itself means nothing outside the store that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version(pub u64);

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A value read together with its version.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    pub value: Option<Value>,
    pub version: Version,
}

/// What a shared real-time store must provide.
///
/// Absent values and `null` are the same thing: reading a path that was
/// never written, or was removed, yields `Ok(None)`.
///
/// # Ordering
///
/// Writes to one path are applied in the order they are submitted and
/// reach every subscriber of that path in the same order. Nothing is
/// promised across unrelated paths.
pub trait SyncStore: Send + Sync + 'static {
    /// Reads the value at `path`.
    fn read(
        &self,
        path: &StorePath,
    ) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Reads the value at `path` together with its [`Version`].
    fn read_versioned(
        &self,
        path: &StorePath,
    ) -> impl Future<Output = Result<Versioned, StoreError>> + Send;

    /// Overwrites the value at `path`.
    fn write(
        &self,
        path: &StorePath,
        value: Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Merges `fields` into the object at `path`. A `null` field removes
    /// that child. Creates the object if `path` is empty.
    fn patch(
        &self,
        path: &StorePath,
        fields: Map<String, Value>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes the value at `path` (and everything below it).
    fn remove(
        &self,
        path: &StorePath,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Replaces the value at `path` with `value` (`None` removes it), but
    /// only if its version still equals `expected`.
    ///
    /// Returns `Ok(false)` when the version moved on; nothing is written.
    fn compare_and_set(
        &self,
        path: &StorePath,
        expected: Version,
        value: Option<Value>,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Starts receiving the full value at `path` on every change that can
    /// affect it, plus once immediately if a value exists.
    fn subscribe(
        &self,
        path: &StorePath,
    ) -> impl Future<Output = Result<Subscription, StoreError>> + Send;
}

/// Result of one step of a [`transact`] update function.
#[derive(Debug)]
pub enum Transaction<T> {
    /// Replace the value (`None` removes it) and return `T`.
    Commit(Option<Value>, T),
    /// Leave the store untouched and return `T`.
    Skip(T),
}

/// Runs `update` as an atomic read-modify-write on `path`.
///
/// `update` receives the current value and decides what to do. It may
/// run several times if other writers get in between, so it must be a
/// pure function of its input (plus anything it captured up front).
/// Returning `Err` aborts without writing.
///
/// # Errors
/// - whatever `update` returns
/// - [`StoreError::Contention`] after `max_attempts` lost races
/// - any [`StoreError`] from the underlying reads and writes
pub async fn transact<S, T, E, F>(
    store: &S,
    path: &StorePath,
    max_attempts: u32,
    mut update: F,
) -> Result<T, E>
where
    S: SyncStore,
    E: From<StoreError>,
    F: FnMut(Option<Value>) -> Result<Transaction<T>, E>,
{
    for attempt in 1..=max_attempts {
        let current = store.read_versioned(path).await?;
        match update(current.value)? {
            Transaction::Skip(output) => return Ok(output),
            Transaction::Commit(next, output) => {
                if store.compare_and_set(path, current.version, next).await? {
                    return Ok(output);
                }
                tracing::debug!(
                    %path,
                    attempt,
                    version = %current.version,
                    "transaction lost a race, retrying"
                );
            }
        }
    }

    Err(StoreError::Contention {
        path: path.to_string(),
        attempts: max_attempts,
    }
    .into())
}
