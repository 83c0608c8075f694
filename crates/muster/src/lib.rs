//! # Muster
//!
//! The local-multiplayer core of a companion app for a tabletop
//! miniatures game: troupe building, share codes, and a
//! host-authoritative session protocol over a nearby-device transport.
//!
//! This meta crate ties the layers together:
//!
//! ```text
//! UI shell
//!    │  commands            snapshots / events
//!    ▼                          ▲
//! SessionHandle ──────▶ SessionService (one task, single writer)
//!                         │        │
//!                  SessionMachine  NearbyAdapter ── NearbyDriver (platform)
//!                         │
//!                    Store (platform)
//! ```
//!
//! The [`SessionService`] task is the single logical owner of session
//! state: local user actions (via [`SessionHandle`]) and transport
//! callbacks (via the driver's event channel) funnel into one
//! serialized loop, so no two events are ever applied concurrently.
//! The UI only ever sees immutable [`AppState`] snapshots and one-shot
//! [`AppEvent`]s.

mod error;
mod service;
mod state;

pub use error::MusterError;
pub use service::{SessionHandle, SessionService};
pub use state::{AppEvent, AppState, SessionView};

pub use muster_protocol::{DeviceId, PlayUpdate, Player, SessionMessage};
pub use muster_roster::{
    bundled_characters, decode_share_code, encode_share_code, Character, CharacterCatalog,
    CharacterId, Faction, Troupe,
};
pub use muster_session::{CharacterPlayState, Phase, PlayState, SeatLoadout, SlotKey};
pub use muster_store::{GameResult, MemoryStore, Store};
pub use muster_transport::{EndpointId, MemoryDriver, MemoryHub, NearbyDriver, NearbyEvent};
