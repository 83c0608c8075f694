//! The session service: one task that owns all mutable session state.
//!
//! Two asynchronous sources feed it — user commands from
//! [`SessionHandle`] and transport callbacks from the driver's event
//! channel — and a `tokio::select!` loop applies them one at a time.
//! That single serialized path is the whole concurrency story: the
//! machine, the adapter bookkeeping, and the published snapshot are
//! never touched from anywhere else.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use muster_protocol::{Codec, JsonCodec, PlayUpdate, SessionMessage};
use muster_roster::{decode_share_code, CharacterCatalog, Troupe};
use muster_session::{Effect, Notification, SessionEvent, SessionMachine};
use muster_store::{sync_catalog, GameResult, GameResultSeat, Store};
use muster_transport::{EndpointId, LinkEvent, NearbyAdapter, NearbyDriver, NearbyEvent};

use crate::{AppEvent, AppState, MusterError, SessionView};

/// Command channel depth. Commands are small and the consumer is fast;
/// backpressure past this means the UI is flooding the core.
const COMMAND_CHANNEL_SIZE: usize = 64;

/// Commands sent from the handle to the service task.
enum Command {
    StartHosting,
    StartDiscovery,
    RequestJoin {
        endpoint: EndpointId,
    },
    SelectTroupe {
        troupe: Troupe,
    },
    StartGame,
    Leave,
    ApplyPlayUpdate {
        seat: usize,
        slot: usize,
        update: PlayUpdate,
    },
    AdvanceTurn {
        turn: u32,
        active_seat: usize,
    },
    ImportShareCode {
        code: String,
    },
    DismissImportError,
    SaveTroupe {
        troupe: Troupe,
        reply: oneshot::Sender<Result<Troupe, MusterError>>,
    },
    DeleteTroupe {
        id: String,
    },
    SaveGameResult,
    Snapshot {
        reply: oneshot::Sender<AppState>,
    },
    Subscribe {
        sender: mpsc::UnboundedSender<AppEvent>,
    },
    Shutdown,
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Cheap-to-clone handle for driving a [`SessionService`].
///
/// Every method enqueues a command for the service task; none of them
/// touches session state directly.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    async fn send(&self, command: Command) -> Result<(), MusterError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| MusterError::ServiceStopped)
    }

    /// Host a new session under the local display name.
    pub async fn start_hosting(&self) -> Result<(), MusterError> {
        self.send(Command::StartHosting).await
    }

    /// Look for nearby hosts.
    pub async fn start_discovery(&self) -> Result<(), MusterError> {
        self.send(Command::StartDiscovery).await
    }

    /// Connect to a discovered host.
    pub async fn request_join(&self, endpoint: EndpointId) -> Result<(), MusterError> {
        self.send(Command::RequestJoin { endpoint }).await
    }

    /// Play this troupe in the current session.
    pub async fn select_troupe(&self, troupe: Troupe) -> Result<(), MusterError> {
        self.send(Command::SelectTroupe { troupe }).await
    }

    /// Host only: end setup and start the game everywhere.
    pub async fn start_game(&self) -> Result<(), MusterError> {
        self.send(Command::StartGame).await
    }

    /// Leave the session and halt the transport.
    pub async fn leave(&self) -> Result<(), MusterError> {
        self.send(Command::Leave).await
    }

    /// One live-play edit, applied locally and broadcast.
    pub async fn apply_play_update(
        &self,
        seat: usize,
        slot: usize,
        update: PlayUpdate,
    ) -> Result<(), MusterError> {
        self.send(Command::ApplyPlayUpdate { seat, slot, update }).await
    }

    /// Set the turn counter and active seat, locally and broadcast.
    pub async fn advance_turn(&self, turn: u32, active_seat: usize) -> Result<(), MusterError> {
        self.send(Command::AdvanceTurn { turn, active_seat }).await
    }

    /// Import a scanned/pasted share code into the saved troupes.
    ///
    /// Failures surface as [`AppState::import_error`], not as an error
    /// here — the import is user-initiated, so its failure is state the
    /// UI shows until dismissed.
    pub async fn import_share_code(&self, code: impl Into<String>) -> Result<(), MusterError> {
        self.send(Command::ImportShareCode { code: code.into() }).await
    }

    /// Clear the import error state.
    pub async fn dismiss_import_error(&self) -> Result<(), MusterError> {
        self.send(Command::DismissImportError).await
    }

    /// Save (or overwrite) a troupe, returning the stored record.
    pub async fn save_troupe(&self, troupe: Troupe) -> Result<Troupe, MusterError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::SaveTroupe {
            troupe,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| MusterError::ServiceStopped)?
    }

    /// Delete a saved troupe by id.
    pub async fn delete_troupe(&self, id: impl Into<String>) -> Result<(), MusterError> {
        self.send(Command::DeleteTroupe { id: id.into() }).await
    }

    /// Persist a snapshot of the finished game.
    pub async fn save_game_result(&self) -> Result<(), MusterError> {
        self.send(Command::SaveGameResult).await
    }

    /// The current application state.
    pub async fn snapshot(&self) -> Result<AppState, MusterError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Snapshot { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| MusterError::ServiceStopped)
    }

    /// Subscribe to state changes and one-shot notifications.
    pub async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<AppEvent>, MusterError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.send(Command::Subscribe { sender: tx }).await?;
        Ok(rx)
    }

    /// Stop the service task.
    pub async fn shutdown(&self) -> Result<(), MusterError> {
        self.send(Command::Shutdown).await
    }
}

// ---------------------------------------------------------------------------
// SessionService
// ---------------------------------------------------------------------------

/// Spawns the session service task.
pub struct SessionService;

impl SessionService {
    /// Starts the service for one device.
    ///
    /// `driver` is the platform nearby facility, already attached to
    /// the sender side of `nearby_events`. `store` is the owned,
    /// injected persistence dependency. The catalog is synchronized
    /// from the bundled definitions before the first event is
    /// processed.
    pub fn spawn<D, S>(
        local_name: impl Into<String>,
        driver: D,
        nearby_events: mpsc::UnboundedReceiver<NearbyEvent>,
        store: Arc<S>,
    ) -> SessionHandle
    where
        D: NearbyDriver,
        S: Store,
    {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let local_name = local_name.into();
        tokio::spawn(async move {
            let actor = match ServiceActor::start(local_name, driver, nearby_events, rx, store)
                .await
            {
                Ok(actor) => actor,
                Err(e) => {
                    warn!(error = %e, "session service failed to start");
                    return;
                }
            };
            actor.run().await;
        });
        SessionHandle { tx }
    }
}

struct ServiceActor<D: NearbyDriver, S: Store> {
    machine: SessionMachine,
    adapter: NearbyAdapter<D>,
    codec: JsonCodec,
    store: Arc<S>,
    commands: mpsc::Receiver<Command>,
    nearby: mpsc::UnboundedReceiver<NearbyEvent>,
    subscribers: Vec<mpsc::UnboundedSender<AppEvent>>,
    /// Cached saved-troupe list, refreshed after store writes.
    troupes: Vec<Troupe>,
    import_error: Option<String>,
    last_state: AppState,
}

impl<D: NearbyDriver, S: Store> ServiceActor<D, S> {
    async fn start(
        local_name: String,
        driver: D,
        nearby: mpsc::UnboundedReceiver<NearbyEvent>,
        commands: mpsc::Receiver<Command>,
        store: Arc<S>,
    ) -> Result<Self, MusterError> {
        // Bundled definitions overwrite stored rows on every open.
        sync_catalog(store.as_ref()).await?;
        let catalog = CharacterCatalog::new(store.characters().await?);
        let troupes = store.troupes().await?;
        info!(
            %local_name,
            characters = catalog.len(),
            troupes = troupes.len(),
            "session service starting"
        );
        Ok(Self {
            machine: SessionMachine::new(local_name, catalog),
            adapter: NearbyAdapter::new(driver),
            codec: JsonCodec,
            store,
            commands,
            nearby,
            subscribers: Vec::new(),
            troupes,
            import_error: None,
            last_state: AppState::idle(),
        })
    }

    async fn run(mut self) {
        let mut nearby_open = true;
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => {
                            if self.handle_command(command).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                event = self.nearby.recv(), if nearby_open => {
                    match event {
                        Some(event) => self.handle_nearby(event),
                        None => nearby_open = false,
                    }
                }
            }
            self.publish_if_changed();
        }
        self.adapter.stop_all();
        info!("session service stopped");
    }

    /// Handles one user command. Returns `true` on shutdown.
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::StartHosting => self.drive(SessionEvent::StartHosting),
            Command::StartDiscovery => self.drive(SessionEvent::StartDiscovery),
            Command::RequestJoin { endpoint } => {
                let local_name = self.machine.local_name().to_string();
                // Failure is logged inside the adapter; the user retries
                // by tapping the candidate again.
                let _ = self.adapter.request_connection(&local_name, &endpoint);
            }
            Command::SelectTroupe { troupe } => self.drive(SessionEvent::SelectTroupe { troupe }),
            Command::StartGame => self.drive(SessionEvent::StartGame),
            Command::Leave => self.drive(SessionEvent::Leave),
            Command::ApplyPlayUpdate { seat, slot, update } => {
                self.drive(SessionEvent::ApplyPlayUpdate { seat, slot, update });
            }
            Command::AdvanceTurn { turn, active_seat } => {
                self.drive(SessionEvent::AdvanceTurn { turn, active_seat });
            }
            Command::ImportShareCode { code } => self.import_share_code(&code).await,
            Command::DismissImportError => {
                self.import_error = None;
            }
            Command::SaveTroupe { troupe, reply } => {
                let result = self.save_troupe(troupe).await;
                let _ = reply.send(result);
            }
            Command::DeleteTroupe { id } => {
                match self.store.delete_troupe(&id).await {
                    Ok(()) => self.refresh_troupes().await,
                    Err(e) => warn!(%id, error = %e, "delete troupe failed"),
                }
            }
            Command::SaveGameResult => self.save_game_result().await,
            Command::Snapshot { reply } => {
                let _ = reply.send(self.build_state());
            }
            Command::Subscribe { sender } => {
                // New subscribers get the current state immediately.
                let _ = sender.send(AppEvent::StateChanged(self.build_state()));
                self.subscribers.push(sender);
            }
            Command::Shutdown => return true,
        }
        false
    }

    /// Feeds a driver event through the adapter and, where it surfaces
    /// a link event, on into the machine.
    fn handle_nearby(&mut self, event: NearbyEvent) {
        let Some(link) = self.adapter.handle_event(event) else {
            return;
        };
        match link {
            LinkEvent::Connected { endpoint } => self.drive(SessionEvent::Connected { endpoint }),
            LinkEvent::Disconnected { endpoint } => {
                self.drive(SessionEvent::Disconnected { endpoint });
            }
            LinkEvent::Payload { endpoint, payload } => {
                // Malformed payloads are dropped here and never reach
                // the machine — best-effort protocol.
                let message: SessionMessage = match self.codec.decode(&payload) {
                    Ok(message) => message,
                    Err(e) => {
                        debug!(%endpoint, error = %e, "undecodable payload, dropping");
                        return;
                    }
                };
                self.drive(SessionEvent::Message { endpoint, message });
            }
        }
    }

    /// Runs one event through the machine and executes its effects.
    fn drive(&mut self, event: SessionEvent) {
        match self.machine.handle(event) {
            Ok(effects) => self.run_effects(effects),
            Err(e) => {
                // Local precondition the UI should have enforced.
                warn!(error = %e, "rejected local action");
            }
        }
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartAdvertising { local_name } => {
                    let _ = self.adapter.start_advertising(&local_name);
                }
                Effect::StartDiscovery => {
                    let _ = self.adapter.start_discovery();
                }
                Effect::SendTo { endpoint, message } => match self.codec.encode(&message) {
                    Ok(text) => self.adapter.send_to(&endpoint, &text),
                    Err(e) => warn!(error = %e, "encode failed, dropping send"),
                },
                Effect::Broadcast { message } => match self.codec.encode(&message) {
                    Ok(text) => self.adapter.send_to_all(&text),
                    Err(e) => warn!(error = %e, "encode failed, dropping broadcast"),
                },
                Effect::StopTransport => self.adapter.stop_all(),
                Effect::Notify(Notification::GameStarted { seats }) => {
                    self.emit(AppEvent::GameStarted { seats });
                }
            }
        }
    }

    async fn import_share_code(&mut self, code: &str) {
        match decode_share_code(code, self.machine.catalog()) {
            Ok(troupe) => {
                let share_code = troupe.share_code.clone().unwrap_or_default();
                match self.store.troupe_by_share_code(&share_code).await {
                    Ok(Some(existing)) => {
                        debug!(troupe = %existing.name, "share code already imported");
                    }
                    Ok(None) => {
                        if let Err(e) = self.store.upsert_troupe(troupe).await {
                            warn!(error = %e, "saving imported troupe failed");
                        }
                        self.refresh_troupes().await;
                    }
                    Err(e) => warn!(error = %e, "import lookup failed"),
                }
                self.import_error = None;
            }
            Err(e) => {
                info!(error = %e, "share code import failed");
                self.import_error = Some(e.to_string());
            }
        }
    }

    async fn save_troupe(&mut self, troupe: Troupe) -> Result<Troupe, MusterError> {
        let saved = self.store.upsert_troupe(troupe).await?;
        self.refresh_troupes().await;
        Ok(saved)
    }

    async fn save_game_result(&mut self) {
        let (Some(session), Some(play)) = (self.machine.session(), self.machine.play()) else {
            warn!("no finished game to save");
            return;
        };
        let seats = play
            .seats()
            .iter()
            .map(|loadout| GameResultSeat {
                seat: loadout.seat,
                player_name: session
                    .players
                    .get(loadout.seat)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                faction: loadout.troupe.faction,
                troupe_name: loadout.troupe.name.clone(),
            })
            .collect();
        let result = GameResult {
            session_id: session.id.clone(),
            seats,
        };
        if let Err(e) = self.store.save_game_result(result).await {
            warn!(error = %e, "saving game result failed");
        }
    }

    async fn refresh_troupes(&mut self) {
        match self.store.troupes().await {
            Ok(troupes) => self.troupes = troupes,
            Err(e) => warn!(error = %e, "listing troupes failed"),
        }
    }

    fn build_state(&self) -> AppState {
        AppState {
            phase: self.machine.phase(),
            session: self.machine.session().map(|s| SessionView {
                id: s.id.clone(),
                is_host: s.is_host,
                players: s.players.clone(),
            }),
            discovered: self.adapter.discovered(),
            connected: self.adapter.connected(),
            troupes: self.troupes.clone(),
            play: self.machine.play().cloned(),
            import_error: self.import_error.clone(),
        }
    }

    fn publish_if_changed(&mut self) {
        let state = self.build_state();
        if state != self.last_state {
            self.last_state = state.clone();
            self.emit(AppEvent::StateChanged(state));
        }
    }

    fn emit(&mut self, event: AppEvent) {
        self.subscribers
            .retain(|sender| sender.send(event.clone()).is_ok());
    }
}
