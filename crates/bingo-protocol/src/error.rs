//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. A
//! `ProtocolError` always means "this data has the wrong shape", never
//! "the store is down" or "the room is full".

/// Errors that can occur while encoding, decoding or validating data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes or JSON).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (missing fields, wrong types, bad JSON).
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The data deserialized, but breaks a room invariant.
    ///
    /// Snapshots come from a shared store that any client can write to,
    /// so a structurally valid record may still describe an impossible
    /// game (a winner who is not flagged, a board with repeated numbers,
    /// more players than seats). Those are rejected here.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}
