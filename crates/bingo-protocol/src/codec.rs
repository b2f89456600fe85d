//! Codec trait and the JSON implementation.
//!
//! The store speaks `serde_json::Value`, but some data leaves the process
//! as raw bytes (the persisted local identity, debug dumps of a room).
//! Those paths go through a [`Codec`] so the byte format can change
//! without touching the callers.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` lets a codec live inside long-lived async
/// tasks and be shared between them.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// truncated, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable on purpose: the identity file is small and it is
/// convenient to be able to open it in an editor.
///
/// ```rust
/// use bingo_protocol::{Codec, JsonCodec, PlayerId};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&PlayerId::from("k3j9x0")).unwrap();
/// let back: PlayerId = codec.decode(&bytes).unwrap();
/// assert_eq!(back.as_str(), "k3j9x0");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec_pretty(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
