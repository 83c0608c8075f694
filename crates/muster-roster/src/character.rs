//! Character reference data and the in-memory catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::Faction;

/// A unique identifier for a character definition.
///
/// Newtype over `u32` so a character id can't be confused with a seat
/// index or a slot index. `#[serde(transparent)]` keeps the wire shape a
/// plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub u32);

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// Static reference data for one character.
///
/// Loaded from the bundled definitions into the persistent store on app
/// open and immutable during a session — in-game changes live in
/// per-seat play-state overlays, never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Stable identity. Bundled definitions overwrite store rows by
    /// this id on every app open.
    pub id: CharacterId,
    /// Display name.
    pub name: String,
    /// The faction this character fights for.
    pub faction: Faction,
    /// Starting and maximum health.
    pub max_health: u32,
    /// Maximum energy. Energy starts at 0 each game.
    pub max_energy: u32,
    /// Ability names, in card order.
    pub abilities: Vec<String>,
    /// Fixed-width 3-character code used inside share codes.
    pub share_code: String,
}

/// An id- and share-code-indexed view over a set of characters.
///
/// Built once from the bundled definitions (or from store contents) and
/// handed to whatever needs lookups: share-code decoding, play-state
/// initialization.
#[derive(Debug, Clone, Default)]
pub struct CharacterCatalog {
    by_id: HashMap<CharacterId, Character>,
    by_code: HashMap<String, CharacterId>,
}

impl CharacterCatalog {
    /// Builds a catalog from character definitions.
    ///
    /// Later entries overwrite earlier ones with the same id, matching
    /// the store's overwrite-by-identity load semantics.
    pub fn new(characters: impl IntoIterator<Item = Character>) -> Self {
        let mut catalog = Self::default();
        for character in characters {
            catalog.by_code.insert(character.share_code.clone(), character.id);
            catalog.by_id.insert(character.id, character);
        }
        catalog
    }

    /// Looks a character up by id.
    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.by_id.get(&id)
    }

    /// Looks a character up by its 3-character share code.
    pub fn by_share_code(&self, code: &str) -> Option<&Character> {
        self.by_code.get(code).and_then(|id| self.by_id.get(id))
    }

    /// Iterates over all characters, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.by_id.values()
    }

    /// Number of characters in the catalog.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if the catalog holds no characters.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(id: u32, code: &str) -> Character {
        Character {
            id: CharacterId(id),
            name: format!("Test {id}"),
            faction: Faction::Concord,
            max_health: 10,
            max_energy: 3,
            abilities: vec!["Strike".into()],
            share_code: code.into(),
        }
    }

    #[test]
    fn test_character_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&CharacterId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_character_id_display() {
        assert_eq!(CharacterId(7).to_string(), "C-7");
    }

    #[test]
    fn test_catalog_lookup_by_id_and_code() {
        let catalog = CharacterCatalog::new([character(1, "AAA"), character(2, "BBB")]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(CharacterId(1)).unwrap().share_code, "AAA");
        assert_eq!(catalog.by_share_code("BBB").unwrap().id, CharacterId(2));
        assert!(catalog.get(CharacterId(9)).is_none());
        assert!(catalog.by_share_code("ZZZ").is_none());
    }

    #[test]
    fn test_catalog_later_entry_overwrites_same_id() {
        let mut updated = character(1, "AAA");
        updated.name = "Renamed".into();
        let catalog = CharacterCatalog::new([character(1, "AAA"), updated]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(CharacterId(1)).unwrap().name, "Renamed");
    }

    #[test]
    fn test_catalog_empty() {
        let catalog = CharacterCatalog::default();
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
    }
}
