//! Transport layer for Muster: a thin adapter over the platform's
//! nearby-device facility.
//!
//! The actual radio stack (discovery broadcasts, connection setup,
//! payload delivery) is platform-supplied and injected behind the
//! [`NearbyDriver`] trait. What this crate owns is the part the session
//! protocol depends on exactly:
//!
//! - connection bookkeeping — which endpoints are *connected* vs merely
//!   *discovered* ([`NearbyAdapter`]),
//! - idempotent start/stop of advertising and discovery,
//! - unconditional auto-accept of incoming connection requests,
//! - fire-and-forget sends with failures logged, never raised.
//!
//! # Callback hand-off
//!
//! Drivers run in the platform's own concurrency domain. They never
//! touch shared state directly: every callback is pushed as a
//! [`NearbyEvent`] onto an unbounded channel handed over at attach
//! time, and the single session task drains that channel through
//! [`NearbyAdapter::handle_event`]. That keeps all bookkeeping
//! mutation on one serialized path.
//!
//! ```text
//! radio callbacks ──NearbyEvent──▶ mpsc ──▶ session task ──▶ handle_event ──▶ LinkEvent
//! ```
//!
//! Delivery guarantees assumed from the platform: in-order and
//! at-most-once per endpoint, nothing across endpoints, one complete
//! payload per message.

mod adapter;
mod error;
mod memory;

pub use adapter::{LinkEvent, NearbyAdapter};
pub use error::TransportError;
pub use memory::{MemoryDriver, MemoryHub};

use std::fmt;
use tokio::sync::mpsc;

/// Opaque identifier the transport assigns to a nearby device.
///
/// Ephemeral: it exists between discovery/connection and disconnection,
/// and a device that reconnects may come back under a different id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(String);

impl EndpointId {
    /// Wraps a raw transport-assigned id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A callback from the platform radio stack, reframed as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NearbyEvent {
    /// A nearby device advertising under `name` became visible.
    EndpointFound { endpoint: EndpointId, name: String },
    /// A previously visible device stopped advertising or went away.
    EndpointLost { endpoint: EndpointId },
    /// A device asked to connect to us.
    ConnectionRequested { endpoint: EndpointId },
    /// A connection (either direction) is established.
    Connected { endpoint: EndpointId },
    /// A connection attempt was rejected or errored.
    ConnectionFailed { endpoint: EndpointId, reason: String },
    /// An established connection dropped.
    Disconnected { endpoint: EndpointId },
    /// One complete textual payload arrived from a connected endpoint.
    Payload { endpoint: EndpointId, payload: String },
}

/// Where drivers deliver their events.
pub type NearbyEventSender = mpsc::UnboundedSender<NearbyEvent>;

/// The platform nearby-device facility.
///
/// Implementations wrap whatever the platform provides (the in-tree
/// [`MemoryDriver`] wires processes-local devices together for tests
/// and demos). All methods are called from the session task; event
/// delivery happens through the [`NearbyEventSender`] the driver was
/// attached with, from whatever threads the platform uses.
pub trait NearbyDriver: Send + Sync + 'static {
    /// Begins advertising under the given human-readable name.
    fn start_advertising(&self, local_name: &str) -> Result<(), TransportError>;

    /// Stops advertising. Must be safe to call when not advertising.
    fn stop_advertising(&self);

    /// Begins discovering nearby advertisers.
    fn start_discovery(&self) -> Result<(), TransportError>;

    /// Stops discovery. Must be safe to call when not discovering.
    fn stop_discovery(&self);

    /// Asks to connect to a discovered endpoint.
    fn request_connection(
        &self,
        local_name: &str,
        endpoint: &EndpointId,
    ) -> Result<(), TransportError>;

    /// Accepts an incoming connection request.
    fn accept_connection(&self, endpoint: &EndpointId) -> Result<(), TransportError>;

    /// Tears down the connection to an endpoint. Safe when already gone.
    fn disconnect(&self, endpoint: &EndpointId);

    /// Sends one complete textual payload to a connected endpoint.
    fn send(&self, endpoint: &EndpointId, payload: &str) -> Result<(), TransportError>;
}
