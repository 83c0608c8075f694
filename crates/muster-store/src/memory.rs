//! In-memory [`Store`] implementation.

use std::collections::BTreeMap;
use std::sync::Mutex;

use muster_roster::{Character, CharacterId, Troupe};

use crate::{GameResult, Store, StoreError};

/// A store backed by process memory. Used by tests and demos; the
/// mobile shell supplies a database-backed implementation behind the
/// same trait.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    characters: BTreeMap<CharacterId, Character>,
    troupes: BTreeMap<String, Troupe>,
    results: Vec<GameResult>,
    next_troupe_id: u64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Lock poisoning only happens if a panic escaped while holding
        // the guard; nothing below can panic with it held.
        self.inner.lock().expect("store lock")
    }
}

impl Store for MemoryStore {
    async fn upsert_character(&self, character: Character) -> Result<(), StoreError> {
        self.lock().characters.insert(character.id, character);
        Ok(())
    }

    async fn characters(&self) -> Result<Vec<Character>, StoreError> {
        Ok(self.lock().characters.values().cloned().collect())
    }

    async fn upsert_troupe(&self, mut troupe: Troupe) -> Result<Troupe, StoreError> {
        let mut inner = self.lock();
        let id = match &troupe.id {
            Some(id) => id.clone(),
            None => {
                inner.next_troupe_id += 1;
                let id = format!("T-{}", inner.next_troupe_id);
                troupe.id = Some(id.clone());
                id
            }
        };
        inner.troupes.insert(id, troupe.clone());
        Ok(troupe)
    }

    async fn delete_troupe(&self, id: &str) -> Result<(), StoreError> {
        self.lock()
            .troupes
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn troupes(&self) -> Result<Vec<Troupe>, StoreError> {
        Ok(self.lock().troupes.values().cloned().collect())
    }

    async fn troupe_by_share_code(&self, code: &str) -> Result<Option<Troupe>, StoreError> {
        Ok(self
            .lock()
            .troupes
            .values()
            .find(|t| t.share_code.as_deref() == Some(code))
            .cloned())
    }

    async fn save_game_result(&self, result: GameResult) -> Result<(), StoreError> {
        self.lock().results.push(result);
        Ok(())
    }

    async fn game_results(&self) -> Result<Vec<GameResult>, StoreError> {
        Ok(self.lock().results.clone())
    }
}

// =========================================================================
// Tests
// =========================================================================
