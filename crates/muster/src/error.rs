//! Unified error type for the Muster core.

use muster_protocol::ProtocolError;
use muster_roster::RosterError;
use muster_session::SessionError;
use muster_store::StoreError;
use muster_transport::TransportError;

/// Top-level error wrapping every layer's error type.
///
/// The `#[from]` impls let `?` lift sub-crate errors automatically, so
/// embedders deal with one type.
#[derive(Debug, thiserror::Error)]
pub enum MusterError {
    /// A transport-level error (advertise, discover, connect, send).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level precondition failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A roster or share-code error.
    #[error(transparent)]
    Roster(#[from] RosterError),

    /// A persistence error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The session service task is no longer running.
    #[error("session service stopped")]
    ServiceStopped,
}
