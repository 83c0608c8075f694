//! Live-play state: per-seat, per-character overlays for an active game.
//!
//! Character reference data never changes during a session. Everything
//! that does change — health, energy, spent abilities, the card's UI
//! flags — lives here, keyed by seat and character slot, and exists
//! only while a game is active. Nothing in this module is persisted;
//! an explicit game-result snapshot at the end is the store's concern.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use muster_protocol::PlayUpdate;
use muster_roster::{CharacterCatalog, Troupe};

/// Addresses one character overlay: which seat, which slot in that
/// seat's troupe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub seat: usize,
    pub slot: usize,
}

/// The mutable overlay for one character in play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterPlayState {
    /// Current health. Starts at the character's maximum.
    pub health: u32,
    /// Current energy. Starts at zero.
    pub energy: u32,
    /// Ability name → spent flag. Only touched abilities appear.
    pub used_abilities: BTreeMap<String, bool>,
    /// Card face-down in the UI.
    pub flipped: bool,
    /// Card expanded in the UI.
    pub expanded: bool,
}

impl CharacterPlayState {
    fn fresh(max_health: u32) -> Self {
        Self {
            health: max_health,
            energy: 0,
            used_abilities: BTreeMap::new(),
            flipped: false,
            expanded: false,
        }
    }
}

/// One seat's loadout in the active game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatLoadout {
    /// Seat index in the session's player order.
    pub seat: usize,
    /// The troupe that seat brought, as selected at game start.
    pub troupe: Troupe,
    /// Per-slot starting health, resolved from the catalog at game
    /// start. Slots whose character id is unknown get 0.
    max_health: Vec<u32>,
}

/// The whole table's live state for one game.
///
/// Overlays are created lazily: the first edit (or read through
/// [`PlayState::entry`]) of a `(seat, slot)` materializes it with
/// default values. Out-of-range keys are rejected, not invented — a
/// malformed peer update must not grow the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayState {
    seats: Vec<SeatLoadout>,
    entries: HashMap<SlotKey, CharacterPlayState>,
    /// Current turn number, starting at 1.
    pub turn: u32,
    /// Seat whose activation it is.
    pub active_seat: usize,
}

impl PlayState {
    /// Builds the table from `(seat, troupe)` pairs in player order,
    /// resolving starting health from the catalog once up front.
    pub fn new(seats: Vec<(usize, Troupe)>, catalog: &CharacterCatalog) -> Self {
        let seats = seats
            .into_iter()
            .map(|(seat, troupe)| {
                let max_health = troupe
                    .characters
                    .iter()
                    .map(|&id| catalog.get(id).map_or(0, |c| c.max_health))
                    .collect();
                SeatLoadout {
                    seat,
                    troupe,
                    max_health,
                }
            })
            .collect();
        Self {
            seats,
            entries: HashMap::new(),
            turn: 1,
            active_seat: 0,
        }
    }

    /// The seats playing, in player order.
    pub fn seats(&self) -> &[SeatLoadout] {
        &self.seats
    }

    fn loadout(&self, seat: usize) -> Option<&SeatLoadout> {
        self.seats.iter().find(|l| l.seat == seat)
    }

    /// The overlay for a key, materializing it with defaults on first
    /// reference. `None` if the key addresses no character in play.
    pub fn entry(&mut self, key: SlotKey) -> Option<&mut CharacterPlayState> {
        let max_health = {
            let loadout = self.loadout(key.seat)?;
            *loadout.max_health.get(key.slot)?
        };
        Some(
            self.entries
                .entry(key)
                .or_insert_with(|| CharacterPlayState::fresh(max_health)),
        )
    }

    /// Read-only view of an overlay, without materializing it.
    pub fn get(&self, key: SlotKey) -> Option<&CharacterPlayState> {
        self.entries.get(&key)
    }

    /// Applies one live-play edit. Returns `false` when the key is out
    /// of range (the update is dropped).
    pub fn apply(&mut self, key: SlotKey, update: &PlayUpdate) -> bool {
        let Some(state) = self.entry(key) else {
            debug!(seat = key.seat, slot = key.slot, "play update for unknown slot, dropping");
            return false;
        };
        match update {
            PlayUpdate::Health { value } => state.health = *value,
            PlayUpdate::Energy { value } => state.energy = *value,
            PlayUpdate::Ability { name, used } => {
                state.used_abilities.insert(name.clone(), *used);
            }
            PlayUpdate::Flip { flipped } => state.flipped = *flipped,
            PlayUpdate::Expand { expanded } => state.expanded = *expanded,
        }
        true
    }

    /// Records a turn change.
    pub fn set_turn(&mut self, turn: u32, active_seat: usize) {
        self.turn = turn;
        self.active_seat = active_seat;
    }
}

// =========================================================================
// Tests
// =========================================================================
