//! Error types for the roster layer.

use crate::CharacterId;

/// Errors raised while working with rosters and share codes.
///
/// Share-code decoding maps *every* malformed input to one of these —
/// a bad scan must surface as a dismissible error, never a panic.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// The share code is not valid base64.
    #[error("share code is not valid base64")]
    NotBase64,

    /// The decoded share code is not valid UTF-8 text.
    #[error("share code does not decode to text")]
    NotText,

    /// The decoded text doesn't have the `name|payload` shape, or the
    /// character block is truncated.
    #[error("malformed share code: {0}")]
    Malformed(&'static str),

    /// The faction letter is outside the fixed 4-entry table.
    #[error("unknown faction code '{0}'")]
    UnknownFaction(char),

    /// A troupe references a character the catalog doesn't know.
    /// Raised on encode only; on decode unknown codes are skipped.
    #[error("character {0} is not in the catalog")]
    UnknownCharacter(CharacterId),
}
