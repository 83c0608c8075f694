//! Error types for the protocol layer.

/// Errors that can occur encoding or decoding session messages.
///
/// A `Decode` here never crosses the transport boundary as a failure:
/// the session layer's contract for peer-sourced payloads is log and
/// drop.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (a value could not be represented).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed text, an unknown message tag,
    /// or missing required fields.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
