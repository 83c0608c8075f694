//! The session state machine.
//!
//! One [`SessionMachine`] runs per device, host and client alike — the
//! behavior differs only by the session's host flag. Events go in one
//! at a time on one serialized path; effects come out as data. The
//! machine does no I/O and holds no locks, so every protocol rule in
//! this file is testable by feeding events and inspecting effects.

use tracing::{debug, info, warn};

use muster_protocol::{DeviceId, PlayUpdate, Player, SessionMessage};
use muster_roster::{CharacterCatalog, Troupe};
use muster_transport::EndpointId;

use crate::{
    generate_session_id, roster_cap, Phase, PlayState, Session, SessionError, SlotKey,
    MAX_PLAYERS,
};

// ---------------------------------------------------------------------------
// Events, effects, notifications
// ---------------------------------------------------------------------------

/// Everything that can happen to the machine.
///
/// Local user actions and inbound transport traffic arrive through the
/// same funnel so session state is never mutated concurrently with
/// itself.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// User: host a new session under the local display name.
    StartHosting,
    /// User: look for nearby hosts.
    StartDiscovery,
    /// User: play this troupe in the current session.
    SelectTroupe { troupe: Troupe },
    /// User (host only): end setup, move everyone to the game.
    StartGame,
    /// User: leave the session.
    Leave,
    /// User: one live-play edit on the local device.
    ApplyPlayUpdate {
        seat: usize,
        slot: usize,
        update: PlayUpdate,
    },
    /// User: advance/set the turn locally.
    AdvanceTurn { turn: u32, active_seat: usize },
    /// Transport: a connection to `endpoint` is established.
    Connected { endpoint: EndpointId },
    /// Transport: a connected endpoint dropped.
    Disconnected { endpoint: EndpointId },
    /// Transport: a decoded message arrived from `endpoint`.
    Message {
        endpoint: EndpointId,
        message: SessionMessage,
    },
}

/// What the machine wants done. The caller executes these in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Begin advertising under the local display name.
    StartAdvertising { local_name: String },
    /// Begin discovery.
    StartDiscovery,
    /// Send one message to one endpoint.
    SendTo {
        endpoint: EndpointId,
        message: SessionMessage,
    },
    /// Send one message to every connected endpoint.
    Broadcast { message: SessionMessage },
    /// Stop advertising, discovery, and all connections.
    StopTransport,
    /// Tell the UI layer something happened.
    Notify(Notification),
}

/// One-shot signals for the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The game started: `(seat, troupe)` pairs in player order, seats
    /// without a troupe skipped.
    GameStarted { seats: Vec<(usize, Troupe)> },
}

// ---------------------------------------------------------------------------
// SessionMachine
// ---------------------------------------------------------------------------

/// The protocol core for one device.
pub struct SessionMachine {
    /// This device's display name: advertised when hosting, carried in
    /// join requests when joining.
    local_name: String,
    catalog: CharacterCatalog,
    phase: Phase,
    session: Option<Session>,
    play: Option<PlayState>,
    /// This device's id as the host sees it. `HOST` when hosting;
    /// derived from the first sync after joining otherwise.
    own_device: Option<DeviceId>,
}

impl SessionMachine {
    /// Creates an idle machine for a device with the given display name.
    pub fn new(local_name: impl Into<String>, catalog: CharacterCatalog) -> Self {
        Self {
            local_name: local_name.into(),
            catalog,
            phase: Phase::NoSession,
            session: None,
            play: None,
            own_device: None,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The current session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The active game's play state, if a game is running.
    pub fn play(&self) -> Option<&PlayState> {
        self.play.as_ref()
    }

    /// The local display name.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// The character catalog this machine resolves play state against.
    pub fn catalog(&self) -> &CharacterCatalog {
        &self.catalog
    }

    /// Feeds one event through the machine.
    ///
    /// # Errors
    /// Only local user actions can fail, and only on preconditions the
    /// UI should have enforced ([`SessionError`]). Transport events and
    /// peer messages never error: anything invalid is logged and
    /// dropped, because a peer must not be able to fault this device.
    pub fn handle(&mut self, event: SessionEvent) -> Result<Vec<Effect>, SessionError> {
        match event {
            SessionEvent::StartHosting => self.start_hosting(),
            SessionEvent::StartDiscovery => self.start_discovery(),
            SessionEvent::SelectTroupe { troupe } => self.select_troupe(troupe),
            SessionEvent::StartGame => self.start_game(),
            SessionEvent::Leave => Ok(self.leave()),
            SessionEvent::ApplyPlayUpdate { seat, slot, update } => {
                self.apply_play_update(seat, slot, update)
            }
            SessionEvent::AdvanceTurn { turn, active_seat } => {
                self.advance_turn(turn, active_seat)
            }
            SessionEvent::Connected { endpoint } => Ok(self.on_connected(endpoint)),
            SessionEvent::Disconnected { endpoint } => {
                debug!(%endpoint, "endpoint disconnected");
                Ok(Vec::new())
            }
            SessionEvent::Message { endpoint, message } => {
                Ok(self.on_message(endpoint, message))
            }
        }
    }

    // -- Local actions ----------------------------------------------------

    fn start_hosting(&mut self) -> Result<Vec<Effect>, SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyInSession);
        }
        let id = generate_session_id();
        info!(session_id = %id, "hosting new session");
        self.session = Some(Session::new_hosting(id, self.local_name.clone()));
        self.own_device = Some(DeviceId::host());
        self.phase = Phase::HostActive;
        Ok(vec![Effect::StartAdvertising {
            local_name: self.local_name.clone(),
        }])
    }

    fn start_discovery(&mut self) -> Result<Vec<Effect>, SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyInSession);
        }
        Ok(vec![Effect::StartDiscovery])
    }

    fn select_troupe(&mut self, troupe: Troupe) -> Result<Vec<Effect>, SessionError> {
        let Some(session) = self.session.as_mut() else {
            return Err(SessionError::NoSession);
        };
        let cap = roster_cap(session.players.len());
        if troupe.characters.len() > cap {
            return Err(SessionError::RosterTooLarge {
                size: troupe.characters.len(),
                cap,
            });
        }

        let is_host = session.is_host;
        let device_id = self.own_device.clone().unwrap_or_else(|| {
            // No sync seen yet: fall back to the name-derived seat key.
            // The host's next sync overrides whatever this touches.
            DeviceId::endpoint(self.local_name.clone())
        });
        if let Some(player) = session.player_mut(&device_id) {
            player.troupe = Some(troupe.clone());
        }

        let mut effects = vec![Effect::Broadcast {
            message: SessionMessage::TroupeSelected { device_id, troupe },
        }];
        // The host never messages itself: its local copy just changed,
        // which is an accepted change to the canonical list, so the
        // snapshot goes out too.
        if is_host {
            effects.push(self.sync_effect());
        }
        Ok(effects)
    }

    fn start_game(&mut self) -> Result<Vec<Effect>, SessionError> {
        let Some(session) = self.session.as_ref() else {
            return Err(SessionError::NoSession);
        };
        if !session.is_host {
            return Err(SessionError::NotHost);
        }
        let mut effects = vec![Effect::Broadcast {
            message: SessionMessage::StartGame,
        }];
        // Apply locally as if received.
        effects.extend(self.begin_game());
        Ok(effects)
    }

    fn leave(&mut self) -> Vec<Effect> {
        if self.session.take().is_some() {
            info!("leaving session");
        }
        self.play = None;
        self.own_device = None;
        self.phase = Phase::NoSession;
        // Always halt the transport — leave must be idempotent and
        // must work even if hosting/joining never got off the ground.
        vec![Effect::StopTransport]
    }

    fn apply_play_update(
        &mut self,
        seat: usize,
        slot: usize,
        update: PlayUpdate,
    ) -> Result<Vec<Effect>, SessionError> {
        if self.session.is_none() {
            // An in-flight edit racing a leave is a no-op.
            return Err(SessionError::NoSession);
        }
        let Some(play) = self.play.as_mut() else {
            return Err(SessionError::NoActiveGame);
        };
        play.apply(SlotKey { seat, slot }, &update);
        Ok(vec![Effect::Broadcast {
            message: SessionMessage::GameplayUpdate { seat, slot, update },
        }])
    }

    fn advance_turn(
        &mut self,
        turn: u32,
        active_seat: usize,
    ) -> Result<Vec<Effect>, SessionError> {
        let Some(play) = self.play.as_mut() else {
            return Err(SessionError::NoActiveGame);
        };
        play.set_turn(turn, active_seat);
        Ok(vec![Effect::Broadcast {
            message: SessionMessage::TurnUpdate { turn, active_seat },
        }])
    }

    // -- Transport events -------------------------------------------------

    fn on_connected(&mut self, endpoint: EndpointId) -> Vec<Effect> {
        let hosting = self.session.as_ref().is_some_and(|s| s.is_host);
        if hosting {
            // The host waits for the join-request; nothing to send.
            return Vec::new();
        }
        // Not hosting (or no session yet): introduce ourselves.
        if self.session.is_none() {
            self.phase = Phase::AwaitingJoinAcceptance;
        }
        info!(%endpoint, "connected, requesting a seat");
        vec![Effect::SendTo {
            endpoint,
            message: SessionMessage::JoinRequest {
                player_name: self.local_name.clone(),
            },
        }]
    }

    fn on_message(&mut self, endpoint: EndpointId, message: SessionMessage) -> Vec<Effect> {
        match message {
            SessionMessage::JoinRequest { player_name } => {
                self.on_join_request(endpoint, player_name)
            }
            SessionMessage::SessionSync {
                session_id,
                players,
            } => self.on_session_sync(session_id, players),
            SessionMessage::TroupeSelected { device_id, troupe } => {
                self.on_troupe_selected(endpoint, device_id, troupe)
            }
            SessionMessage::StartGame => self.begin_game(),
            SessionMessage::GameplayUpdate { seat, slot, update } => {
                if let Some(play) = self.play.as_mut() {
                    play.apply(SlotKey { seat, slot }, &update);
                } else {
                    debug!(%endpoint, "gameplay update with no active game, dropping");
                }
                Vec::new()
            }
            SessionMessage::TurnUpdate { turn, active_seat } => {
                if let Some(play) = self.play.as_mut() {
                    play.set_turn(turn, active_seat);
                } else {
                    debug!(%endpoint, "turn update with no active game, dropping");
                }
                Vec::new()
            }
            // Reserved variants: decoded fine, deliberately unhandled.
            other @ (SessionMessage::Welcome { .. }
            | SessionMessage::ReadyForAction { .. }) => {
                debug!(%endpoint, tag = other.tag(), "reserved message variant, ignoring");
                Vec::new()
            }
        }
    }

    fn on_join_request(&mut self, endpoint: EndpointId, player_name: String) -> Vec<Effect> {
        let Some(session) = self.session.as_mut().filter(|s| s.is_host) else {
            debug!(%endpoint, "join request while not hosting, ignoring");
            return Vec::new();
        };
        if session.players.len() >= MAX_PLAYERS {
            // Known gap in the protocol: the requester gets no explicit
            // rejection, only silence.
            warn!(%endpoint, %player_name, "session full, dropping join request");
            return Vec::new();
        }
        session.players.push(Player::new(
            player_name.clone(),
            DeviceId::endpoint(endpoint.as_str()),
        ));
        info!(
            %endpoint,
            %player_name,
            player_count = session.players.len(),
            "player joined"
        );
        vec![self.sync_effect()]
    }

    fn on_session_sync(&mut self, session_id: String, players: Vec<Player>) -> Vec<Effect> {
        match self.session.as_mut() {
            None => {
                info!(session_id = %session_id, players = players.len(), "joined session");
                self.session = Some(Session::from_sync(session_id, players));
                self.phase = Phase::ClientActive;
                self.derive_own_device();
            }
            Some(session) if !session.is_host => {
                session.id = session_id;
                session.players = players;
                if self.own_device.is_none() {
                    self.derive_own_device();
                }
            }
            Some(_) => {
                // A host never takes dictation about its own session.
                debug!("sync received while hosting, ignoring");
            }
        }
        Vec::new()
    }

    fn on_troupe_selected(
        &mut self,
        endpoint: EndpointId,
        device_id: DeviceId,
        troupe: Troupe,
    ) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            debug!(%endpoint, "troupe selected with no session, ignoring");
            return Vec::new();
        };
        if session.is_host {
            // The originating seat is identified by who sent it, not by
            // what the message claims.
            let sender = DeviceId::endpoint(endpoint.as_str());
            let Some(player) = session.player_mut(&sender) else {
                debug!(%endpoint, "troupe selected from unseated endpoint, ignoring");
                return Vec::new();
            };
            info!(%endpoint, troupe = %troupe.name, "seat selected troupe");
            player.troupe = Some(troupe);
            vec![self.sync_effect()]
        } else {
            // Client echo path: trust the carried device id. The host's
            // next sync corrects any divergence.
            if let Some(player) = session.player_mut(&device_id) {
                player.troupe = Some(troupe);
            } else {
                debug!(%device_id, "troupe selected for unknown seat, ignoring");
            }
            Vec::new()
        }
    }

    // -- Shared helpers ---------------------------------------------------

    /// The authoritative snapshot broadcast. Host only; callers hold a
    /// session when they ask for this.
    fn sync_effect(&self) -> Effect {
        let session = self.session.as_ref().expect("sync without session");
        Effect::Broadcast {
            message: SessionMessage::SessionSync {
                session_id: session.id.clone(),
                players: session.players.clone(),
            },
        }
    }

    /// Starts the game from the current roster: troupes in player
    /// order, seats without one skipped.
    fn begin_game(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.as_ref() else {
            debug!("start game with no session, ignoring");
            return Vec::new();
        };
        let seats: Vec<(usize, Troupe)> = session
            .players
            .iter()
            .enumerate()
            .filter_map(|(seat, p)| p.troupe.clone().map(|t| (seat, t)))
            .collect();
        info!(seats = seats.len(), "game starting");
        self.play = Some(PlayState::new(seats.clone(), &self.catalog));
        vec![Effect::Notify(Notification::GameStarted { seats })]
    }

    /// Works out which seat is ours from a host snapshot.
    ///
    /// A client never learns its endpoint id directly, so it takes the
    /// *last* non-host seat carrying its display name — joins are
    /// append-only with the host first, which makes this deterministic
    /// even when two players share a name.
    fn derive_own_device(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        self.own_device = session
            .players
            .iter()
            .rev()
            .find(|p| !p.device_id.is_host() && p.name == self.local_name)
            .map(|p| p.device_id.clone());
        if let Some(id) = &self.own_device {
            debug!(device_id = %id, "derived own seat");
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
