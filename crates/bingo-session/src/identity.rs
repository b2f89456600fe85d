//! The player's own identity, kept on the client between runs.
//!
//! There is no authentication: a player is whoever holds the id that was
//! generated when they created or joined a room. Persisting it lets a
//! client that restarts pick up the same seat.
//!
//! [`IdentityStore`] is the seam; [`MemoryIdentityStore`] suits tests and
//! short-lived clients, [`FileIdentityStore`] survives restarts.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use bingo_protocol::{Codec, JsonCodec, PlayerId, RoomId};
use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Who this client is and where it last sat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalIdentity {
    pub player_id: PlayerId,
    pub player_name: String,
    pub room_id: RoomId,
}

/// Somewhere to keep one [`LocalIdentity`].
///
/// # Example
///
/// ```rust
/// use bingo_session::{IdentityStore, LocalIdentity, SessionError};
///
/// /// Forgets everything. Every client starts fresh.
/// struct Amnesiac;
///
/// impl IdentityStore for Amnesiac {
///     async fn load(&self) -> Result<Option<LocalIdentity>, SessionError> {
///         Ok(None)
///     }
///     async fn save(&self, _identity: &LocalIdentity) -> Result<(), SessionError> {
///         Ok(())
///     }
///     async fn clear(&self) -> Result<(), SessionError> {
///         Ok(())
///     }
/// }
/// ```
pub trait IdentityStore: Send + Sync + 'static {
    /// The stored identity, if any.
    fn load(&self) -> impl Future<Output = Result<Option<LocalIdentity>, SessionError>> + Send;

    /// Replaces the stored identity.
    fn save(&self, identity: &LocalIdentity) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Forgets the stored identity. Clearing an empty store is fine.
    fn clear(&self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

// ---------------------------------------------------------------------------
// MemoryIdentityStore
// ---------------------------------------------------------------------------

/// Keeps the identity in memory for the life of the value.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    slot: Mutex<Option<LocalIdentity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<LocalIdentity>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IdentityStore for MemoryIdentityStore {
    async fn load(&self) -> Result<Option<LocalIdentity>, SessionError> {
        Ok(self.slot().clone())
    }

    async fn save(&self, identity: &LocalIdentity) -> Result<(), SessionError> {
        *self.slot() = Some(identity.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        *self.slot() = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileIdentityStore
// ---------------------------------------------------------------------------

/// Keeps the identity in a small JSON file.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
    codec: JsonCodec,
}

impl FileIdentityStore {
    /// Uses the file at `path`. Nothing is touched until the first call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            codec: JsonCodec,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for FileIdentityStore {
    async fn load(&self) -> Result<Option<LocalIdentity>, SessionError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let identity = self.codec.decode(&bytes)?;
        Ok(Some(identity))
    }

    async fn save(&self, identity: &LocalIdentity) -> Result<(), SessionError> {
        let bytes = self.codec.encode(identity)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&self.path, bytes).await?;
        tracing::debug!(path = %self.path.display(), player_id = %identity.player_id, "identity saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
