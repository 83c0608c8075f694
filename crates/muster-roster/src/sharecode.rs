//! Share codes: a compact text encoding of a troupe's composition.
//!
//! The plaintext layout is
//!
//! ```text
//! <troupe name> '|' <faction letter> <code><code><code>...
//! ```
//!
//! with each character contributing its fixed-width 3-character share
//! code, and the whole string base64-encoded so it survives QR scanning
//! and copy/paste untouched. Decoding re-joins characters by fresh
//! catalog lookups, so a code scanned on a newer app version simply
//! drops characters that version no longer knows.

use tracing::debug;

use crate::base64;
use crate::{CharacterCatalog, Faction, RosterError, Troupe};

/// The separator between the troupe name and the faction+character block.
const DELIMITER: char = '|';

/// Width of one character's code inside the block.
const CODE_WIDTH: usize = 3;

/// Encodes a troupe as a share code.
///
/// # Errors
/// Returns [`RosterError::UnknownCharacter`] if the troupe references a
/// character id the catalog can't resolve to a share code — an encoded
/// code must be reconstructible, so encoding is strict where decoding
/// is lenient.
pub fn encode_share_code(
    troupe: &Troupe,
    catalog: &CharacterCatalog,
) -> Result<String, RosterError> {
    let mut plain = String::with_capacity(
        troupe.name.len() + 2 + troupe.characters.len() * CODE_WIDTH,
    );
    plain.push_str(&troupe.name);
    plain.push(DELIMITER);
    plain.push(troupe.faction.letter());
    for &id in &troupe.characters {
        let character = catalog.get(id).ok_or(RosterError::UnknownCharacter(id))?;
        plain.push_str(&character.share_code);
    }
    Ok(base64::encode(plain.as_bytes()))
}

/// Decodes a share code back into a troupe.
///
/// The result is transient (`id: None`) with `share_code` set to the
/// original input so callers can de-duplicate against already-saved
/// troupes. Character codes missing from the catalog are skipped with a
/// debug log; everything structurally wrong is an error.
///
/// # Errors
/// - [`RosterError::NotBase64`] / [`RosterError::NotText`] — the input
///   doesn't decode to a plaintext layout at all.
/// - [`RosterError::Malformed`] — missing delimiter, more than one
///   delimiter, empty faction block, or a truncated character code.
/// - [`RosterError::UnknownFaction`] — faction letter outside the table.
pub fn decode_share_code(
    code: &str,
    catalog: &CharacterCatalog,
) -> Result<Troupe, RosterError> {
    let bytes = base64::decode(code.trim()).map_err(|_| RosterError::NotBase64)?;
    let plain = String::from_utf8(bytes).map_err(|_| RosterError::NotText)?;

    let parts: Vec<&str> = plain.split(DELIMITER).collect();
    let [name, block] = parts.as_slice() else {
        return Err(RosterError::Malformed("expected exactly one '|' delimiter"));
    };

    let mut letters = block.chars();
    let letter = letters
        .next()
        .ok_or(RosterError::Malformed("empty faction block"))?;
    let faction =
        Faction::from_letter(letter).ok_or(RosterError::UnknownFaction(letter))?;

    let rest = letters.as_str();
    if rest.len() % CODE_WIDTH != 0 {
        return Err(RosterError::Malformed("truncated character code"));
    }

    let mut characters = Vec::with_capacity(rest.len() / CODE_WIDTH);
    for chunk in rest.as_bytes().chunks_exact(CODE_WIDTH) {
        // The block is ASCII share codes; a multi-byte chunk can only
        // come from a hand-mangled code and will miss every lookup.
        let chunk_code = std::str::from_utf8(chunk)
            .map_err(|_| RosterError::Malformed("truncated character code"))?;
        match catalog.by_share_code(chunk_code) {
            Some(character) => characters.push(character.id),
            None => debug!(chunk_code, "unknown character code, skipping"),
        }
    }

    let mut troupe = Troupe::new(name.to_string(), faction, characters);
    troupe.share_code = Some(code.trim().to_string());
    Ok(troupe)
}

// =========================================================================
// Tests
// =========================================================================
