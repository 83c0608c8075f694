//! Bundled character definitions.
//!
//! This is the app's shipped catalog: the single source of truth the
//! persistent store is synchronized against on every app open
//! (overwrite-by-identity, so stat errata in an app update replace the
//! stored rows).
//!
//! Share codes are fixed-width 3-character tags. They are part of the
//! share-code wire contract and must never be reused across ids.

use crate::{Character, CharacterId, Faction};

fn def(
    id: u32,
    name: &str,
    faction: Faction,
    max_health: u32,
    max_energy: u32,
    abilities: &[&str],
    share_code: &str,
) -> Character {
    debug_assert_eq!(share_code.len(), 3);
    Character {
        id: CharacterId(id),
        name: name.to_string(),
        faction,
        max_health,
        max_energy,
        abilities: abilities.iter().map(|a| a.to_string()).collect(),
        share_code: share_code.to_string(),
    }
}

/// The characters bundled with this build, in catalog order.
pub fn bundled_characters() -> Vec<Character> {
    use Faction::*;
    vec![
        // -- Concord -------------------------------------------------------
        def(1, "Captain Ilsa Vane", Concord, 12, 3, &["Rally", "Sabre Arc"], "CIV"),
        def(2, "Warden Bram", Concord, 14, 2, &["Shield Wall", "Hold Fast"], "WBR"),
        def(3, "Skyla the Lark", Concord, 8, 4, &["Longshot", "Spotter"], "SKL"),
        def(4, "Brother Aldous", Concord, 10, 3, &["Mend", "Censure"], "BAL"),
        // -- Dominion ------------------------------------------------------
        def(5, "Legate Corvus", Dominion, 12, 3, &["Decimate", "Iron Will"], "LGC"),
        def(6, "Pyrarch Velm", Dominion, 9, 5, &["Firestorm", "Cinder Step"], "PYV"),
        def(7, "Breacher Okk", Dominion, 15, 2, &["Ram", "Bulwark"], "BOK"),
        def(8, "Auger Nyss", Dominion, 8, 4, &["Foresee", "Hex"], "ANY"),
        // -- Wyldfolk ------------------------------------------------------
        def(9, "Thornmother Eswen", Wyldfolk, 11, 3, &["Entangle", "Regrow"], "TME"),
        def(10, "Howl", Wyldfolk, 13, 2, &["Rend", "Pack Call"], "HWL"),
        def(11, "Moss-Shaman Itri", Wyldfolk, 9, 4, &["Spore Cloud", "Commune"], "MSI"),
        def(12, "Redquill", Wyldfolk, 10, 3, &["Quill Volley", "Burrow"], "RDQ"),
        // -- Ashen ---------------------------------------------------------
        def(13, "The Gravesworn", Ashen, 14, 2, &["Rise Again", "Grasp"], "TGS"),
        def(14, "Cinder-Witch Mara", Ashen, 9, 5, &["Ashfall", "Soul Tithe"], "CWM"),
        def(15, "Rustbaron Kel", Ashen, 12, 3, &["Scrap Cannon", "Salvage"], "RBK"),
        def(16, "Pale Courier", Ashen, 8, 4, &["Dead Drop", "Vanish"], "PLC"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_bundled_ids_are_unique() {
        let chars = bundled_characters();
        let ids: HashSet<_> = chars.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), chars.len());
    }

    #[test]
    fn test_bundled_share_codes_are_unique_and_fixed_width() {
        let chars = bundled_characters();
        let codes: HashSet<_> = chars.iter().map(|c| c.share_code.clone()).collect();
        assert_eq!(codes.len(), chars.len());
        for c in &chars {
            assert_eq!(c.share_code.len(), 3, "{} has a bad share code", c.name);
        }
    }

    #[test]
    fn test_bundled_covers_every_faction() {
        let chars = bundled_characters();
        for faction in Faction::ALL {
            assert!(
                chars.iter().any(|c| c.faction == faction),
                "no bundled characters for {faction}"
            );
        }
    }
}
