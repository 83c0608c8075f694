//! Codec trait and implementations for message text.
//!
//! The transport delivers one complete textual payload per message —
//! no framing, no fragmentation — so the codec works in `String`s, not
//! byte buffers. The session layer doesn't care *how* messages become
//! text; it needs something implementing [`Codec`], and swapping in a
//! different representation later touches nothing else.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to payload text and decodes payload text back.
///
/// `Send + Sync + 'static` so one codec instance can be shared across
/// async tasks for the life of the app.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one payload string.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a payload string back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the text is malformed or
    /// doesn't match the expected type. Callers treat this as "ignore
    /// the payload" — it must never escalate past the boundary.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] using JSON via `serde_json`.
///
/// Human-readable payloads keep nearby-device debugging sane: any
/// captured payload can be read as-is. Size is comfortably inside the
/// transport's per-payload limits for this protocol's message shapes.
///
/// ## Example
///
/// ```rust
/// use muster_protocol::{Codec, JsonCodec, SessionMessage};
///
/// let codec = JsonCodec;
/// let msg = SessionMessage::JoinRequest { player_name: "Bob".into() };
///
/// let text = codec.encode(&msg).unwrap();
/// let decoded: SessionMessage = codec.decode(&text).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
