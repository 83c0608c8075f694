//! The four playable factions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A faction a troupe belongs to.
///
/// The variant set is closed: every character in the catalog and every
/// troupe belongs to exactly one of these four. Each faction carries a
/// fixed single-letter code used in share codes; the letters are
/// positional (`'A'`–`'D'`), not initials, and are part of the wire
/// contract — changing them breaks every share code in circulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// The old alliance of free cities.
    Concord,
    /// The imperial war machine.
    Dominion,
    /// Beast-kin raiders of the deep forests.
    Wyldfolk,
    /// Ash-wastes scavengers and their reanimates.
    Ashen,
}

impl Faction {
    /// All factions, in share-code letter order.
    pub const ALL: [Faction; 4] = [
        Faction::Concord,
        Faction::Dominion,
        Faction::Wyldfolk,
        Faction::Ashen,
    ];

    /// The faction's share-code letter.
    pub fn letter(self) -> char {
        match self {
            Faction::Concord => 'A',
            Faction::Dominion => 'B',
            Faction::Wyldfolk => 'C',
            Faction::Ashen => 'D',
        }
    }

    /// Looks a faction up by its share-code letter.
    ///
    /// Returns `None` for any letter outside the fixed 4-entry table;
    /// share-code decoding turns that into a decode failure.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'A' => Some(Faction::Concord),
            'B' => Some(Faction::Dominion),
            'C' => Some(Faction::Wyldfolk),
            'D' => Some(Faction::Ashen),
            _ => None,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Faction::Concord => "Concord",
            Faction::Dominion => "Dominion",
            Faction::Wyldfolk => "Wyldfolk",
            Faction::Ashen => "Ashen",
        };
        write!(f, "{name}")
    }
}
