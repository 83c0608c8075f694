//! The persistence boundary for Muster.
//!
//! The mobile shell owns the real database; this crate only defines the
//! narrow seam the core talks through ([`Store`]) plus an in-memory
//! implementation for tests and demos ([`MemoryStore`]).
//!
//! A store is an explicitly constructed, owned dependency: build one at
//! startup and hand it to whatever needs it. There is no process-wide
//! getter — the only global here is the one-time materialization of the
//! bundled character definitions, guarded by an explicit
//! [`std::sync::OnceLock`] in [`bundled_catalog`].
//!
//! All operations are async so a real database never blocks the session
//! event path.

mod catalog;
mod error;
mod memory;

pub use catalog::{bundled_catalog, sync_catalog};
pub use error::StoreError;
pub use memory::MemoryStore;

use std::future::Future;

use serde::{Deserialize, Serialize};

use muster_roster::{Character, Faction, Troupe};

/// An explicit end-of-game snapshot.
///
/// Play-state overlays die with the game screen; nothing about a match
/// is persisted unless the user saves one of these at game end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// The session this game was played in.
    pub session_id: String,
    /// One entry per seat that played, in player order.
    pub seats: Vec<GameResultSeat>,
}

/// One seat's line in a saved game result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResultSeat {
    pub seat: usize,
    pub player_name: String,
    pub faction: Faction,
    pub troupe_name: String,
}

/// Upsert/delete/query over characters, troupes, and game results.
///
/// Implementations must be safe to call from any task; the returned
/// futures are `Send` so callers can await them inside spawned work.
pub trait Store: Send + Sync + 'static {
    /// Inserts or overwrites a character by id.
    fn upsert_character(
        &self,
        character: Character,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All stored characters, in id order.
    fn characters(&self) -> impl Future<Output = Result<Vec<Character>, StoreError>> + Send;

    /// Inserts or overwrites a troupe. A transient troupe (no id) is
    /// assigned one; the stored record is returned either way.
    fn upsert_troupe(
        &self,
        troupe: Troupe,
    ) -> impl Future<Output = Result<Troupe, StoreError>> + Send;

    /// Deletes a troupe by id.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if no troupe has that id.
    fn delete_troupe(&self, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All saved troupes, in id order.
    fn troupes(&self) -> impl Future<Output = Result<Vec<Troupe>, StoreError>> + Send;

    /// Looks a saved troupe up by the share code it was imported from.
    /// This is the import de-duplication key.
    fn troupe_by_share_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<Troupe>, StoreError>> + Send;

    /// Appends a game-result snapshot.
    fn save_game_result(
        &self,
        result: GameResult,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All saved game results, oldest first.
    fn game_results(&self) -> impl Future<Output = Result<Vec<GameResult>, StoreError>> + Send;
}
