//! Error types for the session layer.

use bingo_protocol::ProtocolError;

/// Errors from persisting or loading the local identity.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The identity file couldn't be read or written.
    #[error("identity storage failed: {0}")]
    Io(#[from] std::io::Error),

    /// The identity file exists but isn't a valid identity.
    #[error(transparent)]
    Codec(#[from] ProtocolError),
}
