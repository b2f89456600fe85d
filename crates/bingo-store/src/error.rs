//! Error types for the store layer.

/// Errors that can occur while talking to the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store did not answer, or answered with a failure.
    ///
    /// Always transient from the store's point of view. The core never
    /// retries these on its own; the calling layer decides.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A conditional update kept losing to concurrent writers.
    #[error("gave up on {path} after {attempts} conflicting attempts")]
    Contention { path: String, attempts: u32 },

    /// A path or path segment is empty or contains reserved characters.
    #[error("invalid store path: {0}")]
    InvalidPath(String),
}
