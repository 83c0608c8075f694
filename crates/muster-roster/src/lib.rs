//! Reference data and rosters for Muster.
//!
//! This crate owns everything a player can put on the table:
//!
//! - **Characters** ([`Character`], [`CharacterId`], [`CharacterCatalog`]) —
//!   static reference data (stats, abilities), bundled with the app.
//! - **Factions** ([`Faction`]) — the four playable factions, each with a
//!   fixed single-letter wire code.
//! - **Troupes** ([`Troupe`]) — a named, ordered roster of characters
//!   belonging to one faction.
//! - **Share codes** ([`encode_share_code`], [`decode_share_code`]) — a
//!   compact, QR-embeddable text encoding of a troupe's composition.
//!
//! Nothing here knows about sessions or transports. A troupe used in a
//! session is a copy of a saved one; mutating it in play never touches
//! the store.

mod base64;
mod catalog;
mod character;
mod error;
mod faction;
mod sharecode;
mod troupe;

pub use catalog::bundled_characters;
pub use character::{Character, CharacterCatalog, CharacterId};
pub use error::RosterError;
pub use faction::Faction;
pub use sharecode::{decode_share_code, encode_share_code};
pub use troupe::Troupe;
