//! Bundled-catalog loading.

use std::sync::OnceLock;

use tracing::info;

use muster_roster::Character;

use crate::{Store, StoreError};

/// The bundled character definitions, materialized once per process.
pub fn bundled_catalog() -> &'static [Character] {
    static BUNDLED: OnceLock<Vec<Character>> = OnceLock::new();
    BUNDLED.get_or_init(muster_roster::bundled_characters)
}

/// Pushes the bundled definitions into the store.
///
/// Runs on every app open. Overwrite-by-identity: an existing row with
/// the same character id is replaced, so stat errata shipped in an app
/// update take effect; rows the bundle no longer mentions are left
/// alone.
pub async fn sync_catalog<S: Store>(store: &S) -> Result<(), StoreError> {
    let bundled = bundled_catalog();
    for character in bundled {
        store.upsert_character(character.clone()).await?;
    }
    info!(characters = bundled.len(), "catalog synchronized");
    Ok(())
}
