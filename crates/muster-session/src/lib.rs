//! The session protocol core: host election, join handshake, roster
//! synchronization, the game-start barrier, and live-play propagation.
//!
//! # How it fits in the stack
//!
//! ```text
//! App layer (above)   ← drives local actions, observes snapshots
//!     ↕
//! Session (this crate) ← one machine per device, host or client
//!     ↕
//! Protocol / Transport (below) ← typed messages over nearby links
//! ```
//!
//! The heart is [`SessionMachine`]: a pure state machine fed
//! [`SessionEvent`]s (local user actions and inbound peer messages, one
//! at a time, on one serialized path) that returns [`Effect`]s (what to
//! send, what to start or stop, what to tell the UI). It performs no
//! I/O, which is what makes the protocol testable without a transport.
//!
//! # Authority model
//!
//! The host is the single writer of the canonical player list. Every
//! mutation by anyone else is a proposal — a message to the host — and
//! becomes real only when the host folds it in and re-broadcasts a full
//! [`SessionMessage::SessionSync`] snapshot. Clients replace their view
//! wholesale on every sync, so convergence never depends on
//! cross-endpoint message ordering, and a lost proposal is corrected by
//! the next snapshot. Conflict resolution is exactly "host wins, last
//! write per seat".

mod error;
mod game;
mod machine;
mod session;

pub use error::SessionError;
pub use game::{CharacterPlayState, PlayState, SeatLoadout, SlotKey};
pub use machine::{Effect, Notification, SessionEvent, SessionMachine};
pub use session::{generate_session_id, roster_cap, Phase, Session, MAX_PLAYERS};
