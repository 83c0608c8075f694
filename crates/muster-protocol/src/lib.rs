//! Wire protocol for Muster's local-multiplayer sessions.
//!
//! This crate defines the "language" nearby devices speak during match
//! setup and live play:
//!
//! - **Types** ([`SessionMessage`], [`Player`], [`DeviceId`],
//!   [`PlayUpdate`]) — the closed, tagged message set that travels as
//!   one textual payload per transport message.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages become
//!   text and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong encoding or
//!   decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (opaque payload
//! strings) and the session machine (seats, host authority). It knows
//! nothing about endpoints being connected or who the host is — it only
//! converts between typed messages and text.
//!
//! ```text
//! Transport (payload text) → Protocol (SessionMessage) → Session (seat context)
//! ```
//!
//! Decode failure is normal operation, not an exception path: a peer on
//! a newer app version may send variants this build can't parse, and the
//! session layer's contract is "drop what you can't read."

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{DeviceId, PlayUpdate, Player, SessionMessage};
