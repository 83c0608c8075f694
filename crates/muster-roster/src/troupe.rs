//! Troupes: named rosters of characters.

use serde::{Deserialize, Serialize};

use crate::{CharacterId, Faction};

/// A named roster: one faction, an ordered list of characters.
///
/// A troupe is owned by the persistent store when saved and owned by a
/// session transiently when assigned to a seat — always as a copy, never
/// a shared reference, so in-session edits don't leak into saved data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Troupe {
    /// Store-assigned identity. `None` for transient troupes (e.g. a
    /// freshly decoded share code) until they are explicitly saved.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name, chosen by the player.
    pub name: String,
    /// The faction every listed character belongs to.
    pub faction: Faction,
    /// Character ids in roster order. Order is significant: it maps to
    /// character slots during a game.
    pub characters: Vec<CharacterId>,
    /// The share code this troupe was imported from, if any. Used to
    /// de-duplicate repeated imports of the same code.
    #[serde(default)]
    pub share_code: Option<String>,
    /// When set, the app pre-selects this troupe when joining a session.
    #[serde(default)]
    pub auto_select: bool,
}

impl Troupe {
    /// Creates a new unsaved troupe.
    pub fn new(name: impl Into<String>, faction: Faction, characters: Vec<CharacterId>) -> Self {
        Self {
            id: None,
            name: name.into(),
            faction,
            characters,
            share_code: None,
            auto_select: false,
        }
    }

    /// Returns `true` if this troupe has been persisted.
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }
}
