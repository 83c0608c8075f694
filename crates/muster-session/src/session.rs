//! Session types: phases, the session record, and seat rules.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use muster_protocol::{DeviceId, Player};

/// Maximum seats in a session, host included.
pub const MAX_PLAYERS: usize = 4;

/// Per-player roster size cap, derived from how many are playing.
///
/// Three-player games shrink rosters to 4 characters and four-player
/// games to 3; any other count plays the full 6.
pub fn roster_cap(player_count: usize) -> usize {
    match player_count {
        3 => 4,
        4 => 3,
        _ => 6,
    }
}

/// Generates a short random session token (8 hex characters).
///
/// Collision resistance only needs to cover "a handful of nearby
/// tables", not the internet.
pub fn generate_session_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 4] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where this device stands in the session lifecycle.
///
/// ```text
///                ┌──(start hosting)──▶ HostActive ─────┐
/// NoSession ─────┤                                     ├──(leave)──▶ NoSession
///                └──(connect)─▶ AwaitingJoinAcceptance │
///                                      │               │
///                                (first sync)          │
///                                      ▼               │
///                                 ClientActive ────────┘
/// ```
///
/// There is no distinct terminal state: leaving lands back in
/// `NoSession` and everything can start over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No session exists on this device.
    NoSession,
    /// Connected and join-request sent, waiting for the host's first
    /// sync.
    AwaitingJoinAcceptance,
    /// This device hosts a live session and owns the canonical state.
    HostActive,
    /// This device participates in someone else's session.
    ClientActive,
}

impl Phase {
    /// Returns `true` while a session exists (host or client).
    pub fn in_session(&self) -> bool {
        matches!(self, Self::HostActive | Self::ClientActive)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoSession => "NoSession",
            Self::AwaitingJoinAcceptance => "AwaitingJoinAcceptance",
            Self::HostActive => "HostActive",
            Self::ClientActive => "ClientActive",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One multiplayer match-setup, as seen from this device.
///
/// Created when the user starts hosting or when a first sync arrives;
/// destroyed only by an explicit leave. The player list is ordered —
/// seat indices are positions in this list, and the host seat is
/// conventionally first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Short random token identifying the match, host-generated.
    pub id: String,
    /// Whether this device is the authority for the player list.
    pub is_host: bool,
    /// Seats, in insertion order.
    pub players: Vec<Player>,
}

impl Session {
    /// Creates a hosted session with the host in seat 0.
    pub fn new_hosting(id: String, host_name: impl Into<String>) -> Self {
        Self {
            id,
            is_host: true,
            players: vec![Player::new(host_name, DeviceId::host())],
        }
    }

    /// Creates a client-side session from a received sync snapshot.
    pub fn from_sync(id: String, players: Vec<Player>) -> Self {
        Self {
            id,
            is_host: false,
            players,
        }
    }

    /// The seat index for a device id, if that device holds one.
    pub fn seat_of(&self, device_id: &DeviceId) -> Option<usize> {
        self.players.iter().position(|p| &p.device_id == device_id)
    }

    /// Mutable access to the player seated for a device id.
    pub fn player_mut(&mut self, device_id: &DeviceId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.device_id == device_id)
    }

    /// Returns `true` when no more seats are available.
    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }
}

// =========================================================================
// Tests
// =========================================================================
