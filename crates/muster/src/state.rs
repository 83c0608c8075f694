//! The observable application state.
//!
//! The service folds every session message and local action into one
//! authoritative [`AppState`] value and hands out clones — the UI never
//! holds a reference into live state, so reads never race writes.

use muster_protocol::Player;
use muster_roster::Troupe;
use muster_session::{Phase, PlayState};
use muster_transport::EndpointId;

/// A read-only view of the current session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    /// The session token.
    pub id: String,
    /// Whether this device is the host.
    pub is_host: bool,
    /// Seats in player order.
    pub players: Vec<Player>,
}

/// One immutable snapshot of everything the UI renders.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// Session lifecycle phase.
    pub phase: Phase,
    /// The current session, if one exists.
    pub session: Option<SessionView>,
    /// Join candidates: discovered-but-unconnected endpoints and their
    /// advertised names.
    pub discovered: Vec<(EndpointId, String)>,
    /// Currently connected endpoints.
    pub connected: Vec<EndpointId>,
    /// Saved troupes, as last read from the store.
    pub troupes: Vec<Troupe>,
    /// Live game state while a game is running.
    pub play: Option<PlayState>,
    /// A dismissible share-code import failure. The only peer-adjacent
    /// error that ever reaches the UI.
    pub import_error: Option<String>,
}

impl AppState {
    /// The empty pre-session state.
    pub fn idle() -> Self {
        Self {
            phase: Phase::NoSession,
            session: None,
            discovered: Vec::new(),
            connected: Vec::new(),
            troupes: Vec::new(),
            play: None,
            import_error: None,
        }
    }
}

/// Events pushed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The snapshot changed. Carries the new state.
    StateChanged(AppState),
    /// One-shot: the game started with these `(seat, troupe)` pairs in
    /// player order.
    GameStarted { seats: Vec<(usize, Troupe)> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_state_is_empty() {
        let state = AppState::idle();
        assert_eq!(state.phase, Phase::NoSession);
        assert!(state.session.is_none());
        assert!(state.discovered.is_empty());
        assert!(state.troupes.is_empty());
        assert!(state.import_error.is_none());
    }
}
