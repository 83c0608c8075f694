//! Error types for the transport layer.

use crate::EndpointId;

/// Errors that can occur in the transport layer.
///
/// None of these are fatal to a session: advertise/discover/connect
/// failures are surfaced as "couldn't find or host" and retried by the
/// user re-invoking the action; send failures are logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Starting advertising failed.
    #[error("advertising failed: {0}")]
    AdvertiseFailed(String),

    /// Starting discovery failed.
    #[error("discovery failed: {0}")]
    DiscoveryFailed(String),

    /// A connection request could not be issued.
    #[error("connect to {0} failed: {1}")]
    ConnectFailed(EndpointId, String),

    /// Sending a payload failed.
    #[error("send to {0} failed: {1}")]
    SendFailed(EndpointId, String),

    /// The endpoint is not connected.
    #[error("endpoint {0} is not connected")]
    NotConnected(EndpointId),
}
