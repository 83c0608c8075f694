//! The nearby adapter: connection bookkeeping over a [`NearbyDriver`].

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::{EndpointId, NearbyDriver, NearbyEvent, TransportError};

/// An event the adapter surfaces to the session layer.
///
/// Discovery traffic and connection-request plumbing stay inside the
/// adapter; only the three things the session machine reacts to come
/// out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// An endpoint is now connected (either side initiated).
    Connected { endpoint: EndpointId },
    /// A connected endpoint dropped.
    Disconnected { endpoint: EndpointId },
    /// One complete payload arrived.
    Payload { endpoint: EndpointId, payload: String },
}

/// Tracks connected and discovered endpoints over a platform driver.
///
/// All methods are called from the single session task; the adapter has
/// no interior locking because it never races with itself. The
/// connected set and the discovered map are the externally observable
/// state — [`NearbyAdapter::connected`] / [`NearbyAdapter::discovered`]
/// return fresh snapshots after every handled event.
pub struct NearbyAdapter<D: NearbyDriver> {
    driver: D,
    /// Endpoints with an established connection.
    connected: BTreeSet<EndpointId>,
    /// Discovered-but-not-connected endpoint → advertised name.
    discovered: BTreeMap<EndpointId, String>,
    advertising: bool,
    discovering: bool,
}

impl<D: NearbyDriver> NearbyAdapter<D> {
    /// Wraps a driver. Nothing starts until advertising or discovery is
    /// requested.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            connected: BTreeSet::new(),
            discovered: BTreeMap::new(),
            advertising: false,
            discovering: false,
        }
    }

    /// Starts advertising under `local_name`.
    ///
    /// Idempotent: any prior advertising is stopped first. Failure is
    /// logged and returned, but it is not fatal — re-invoking retries.
    pub fn start_advertising(&mut self, local_name: &str) -> Result<(), TransportError> {
        if self.advertising {
            self.driver.stop_advertising();
            self.advertising = false;
        }
        match self.driver.start_advertising(local_name) {
            Ok(()) => {
                self.advertising = true;
                debug!(local_name, "advertising started");
                Ok(())
            }
            Err(e) => {
                warn!(local_name, error = %e, "advertising failed");
                Err(e)
            }
        }
    }

    /// Starts discovery, resetting the discovered set first.
    ///
    /// Idempotent: stale candidates from an earlier discovery round
    /// never survive into a new one.
    pub fn start_discovery(&mut self) -> Result<(), TransportError> {
        if self.discovering {
            self.driver.stop_discovery();
            self.discovering = false;
        }
        self.discovered.clear();
        match self.driver.start_discovery() {
            Ok(()) => {
                self.discovering = true;
                debug!("discovery started");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "discovery failed");
                Err(e)
            }
        }
    }

    /// Asks to connect to a previously discovered endpoint.
    pub fn request_connection(
        &mut self,
        local_name: &str,
        endpoint: &EndpointId,
    ) -> Result<(), TransportError> {
        match self.driver.request_connection(local_name, endpoint) {
            Ok(()) => {
                debug!(%endpoint, "connection requested");
                Ok(())
            }
            Err(e) => {
                warn!(%endpoint, error = %e, "connection request failed");
                Err(e)
            }
        }
    }

    /// Sends one payload to one connected endpoint. Fire-and-forget:
    /// failures are logged, never raised, never retried.
    pub fn send_to(&self, endpoint: &EndpointId, payload: &str) {
        if !self.connected.contains(endpoint) {
            debug!(%endpoint, "send to unconnected endpoint, dropping");
            return;
        }
        if let Err(e) = self.driver.send(endpoint, payload) {
            warn!(%endpoint, error = %e, "send failed");
        }
    }

    /// Sends one payload to every connected endpoint.
    pub fn send_to_all(&self, payload: &str) {
        for endpoint in &self.connected {
            if let Err(e) = self.driver.send(endpoint, payload) {
                warn!(%endpoint, error = %e, "send failed");
            }
        }
    }

    /// Stops everything: advertising, discovery, all connections. Both
    /// endpoint sets end empty. Safe to call at any time, including
    /// before anything was started and repeatedly.
    pub fn stop_all(&mut self) {
        self.driver.stop_advertising();
        self.driver.stop_discovery();
        for endpoint in &self.connected {
            self.driver.disconnect(endpoint);
        }
        self.advertising = false;
        self.discovering = false;
        self.connected.clear();
        self.discovered.clear();
        debug!("transport stopped");
    }

    /// Applies one driver event to the bookkeeping and translates it
    /// into a session-visible [`LinkEvent`] where one applies.
    ///
    /// Incoming connection requests are accepted unconditionally — this
    /// protocol has no pairing step, so any nearby device may connect;
    /// the session machine decides what connected endpoints mean.
    pub fn handle_event(&mut self, event: NearbyEvent) -> Option<LinkEvent> {
        match event {
            NearbyEvent::EndpointFound { endpoint, name } => {
                debug!(%endpoint, %name, "endpoint found");
                self.discovered.insert(endpoint, name);
                None
            }
            NearbyEvent::EndpointLost { endpoint } => {
                self.discovered.remove(&endpoint);
                None
            }
            NearbyEvent::ConnectionRequested { endpoint } => {
                if let Err(e) = self.driver.accept_connection(&endpoint) {
                    warn!(%endpoint, error = %e, "accept failed");
                }
                None
            }
            NearbyEvent::Connected { endpoint } => {
                self.discovered.remove(&endpoint);
                self.connected.insert(endpoint.clone());
                debug!(%endpoint, connected = self.connected.len(), "endpoint connected");
                Some(LinkEvent::Connected { endpoint })
            }
            NearbyEvent::ConnectionFailed { endpoint, reason } => {
                warn!(%endpoint, %reason, "connection failed");
                None
            }
            NearbyEvent::Disconnected { endpoint } => {
                if self.connected.remove(&endpoint) {
                    debug!(%endpoint, "endpoint disconnected");
                    Some(LinkEvent::Disconnected { endpoint })
                } else {
                    None
                }
            }
            NearbyEvent::Payload { endpoint, payload } => {
                Some(LinkEvent::Payload { endpoint, payload })
            }
        }
    }

    /// Snapshot of connected endpoint ids, in stable order.
    pub fn connected(&self) -> Vec<EndpointId> {
        self.connected.iter().cloned().collect()
    }

    /// Snapshot of discovered-but-unconnected endpoints and their
    /// advertised names, in stable order.
    pub fn discovered(&self) -> Vec<(EndpointId, String)> {
        self.discovered
            .iter()
            .map(|(e, n)| (e.clone(), n.clone()))
            .collect()
    }

    /// Whether advertising is currently active.
    pub fn is_advertising(&self) -> bool {
        self.advertising
    }

    /// Whether discovery is currently active.
    pub fn is_discovering(&self) -> bool {
        self.discovering
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Bookkeeping tests against a driver stub that records calls.
    //! End-to-end behavior over a real (in-memory) driver lives in
    //! `tests/memory_link.rs`.

    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingDriver {
        calls: Mutex<Vec<String>>,
        fail_advertise: bool,
    }

    impl RecordingDriver {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    impl NearbyDriver for Arc<RecordingDriver> {
        fn start_advertising(&self, local_name: &str) -> Result<(), TransportError> {
            self.record(format!("advertise:{local_name}"));
            if self.fail_advertise {
                Err(TransportError::AdvertiseFailed("radio off".into()))
            } else {
                Ok(())
            }
        }
        fn stop_advertising(&self) {
            self.record("stop_advertising");
        }
        fn start_discovery(&self) -> Result<(), TransportError> {
            self.record("discover");
            Ok(())
        }
        fn stop_discovery(&self) {
            self.record("stop_discovery");
        }
        fn request_connection(
            &self,
            local_name: &str,
            endpoint: &EndpointId,
        ) -> Result<(), TransportError> {
            self.record(format!("connect:{local_name}:{endpoint}"));
            Ok(())
        }
        fn accept_connection(&self, endpoint: &EndpointId) -> Result<(), TransportError> {
            self.record(format!("accept:{endpoint}"));
            Ok(())
        }
        fn disconnect(&self, endpoint: &EndpointId) {
            self.record(format!("disconnect:{endpoint}"));
        }
        fn send(&self, endpoint: &EndpointId, payload: &str) -> Result<(), TransportError> {
            self.record(format!("send:{endpoint}:{payload}"));
            Ok(())
        }
    }

    fn driver() -> Arc<RecordingDriver> {
        Arc::new(RecordingDriver::default())
    }

    fn ep(id: &str) -> EndpointId {
        EndpointId::new(id)
    }

    #[test]
    fn test_start_advertising_restarts_when_already_active() {
        let d = driver();
        let mut adapter = NearbyAdapter::new(Arc::clone(&d));

        adapter.start_advertising("Alice").unwrap();
        adapter.start_advertising("Alice's Phone").unwrap();

        assert_eq!(
            d.calls(),
            vec!["advertise:Alice", "stop_advertising", "advertise:Alice's Phone"]
        );
        assert!(adapter.is_advertising());
    }

    #[test]
    fn test_start_advertising_failure_is_returned_not_fatal() {
        let d = Arc::new(RecordingDriver {
            fail_advertise: true,
            ..Default::default()
        });
        let mut adapter = NearbyAdapter::new(d);

        let result = adapter.start_advertising("Alice");

        assert!(matches!(result, Err(TransportError::AdvertiseFailed(_))));
        assert!(!adapter.is_advertising());
    }

    #[test]
    fn test_start_discovery_clears_previous_candidates() {
        let d = driver();
        let mut adapter = NearbyAdapter::new(Arc::clone(&d));

        adapter.start_discovery().unwrap();
        adapter.handle_event(NearbyEvent::EndpointFound {
            endpoint: ep("ep-1"),
            name: "Bob".into(),
        });
        assert_eq!(adapter.discovered().len(), 1);

        adapter.start_discovery().unwrap();
        assert!(adapter.discovered().is_empty());
    }

    #[test]
    fn test_connection_request_is_auto_accepted() {
        let d = driver();
        let mut adapter = NearbyAdapter::new(Arc::clone(&d));

        let out = adapter.handle_event(NearbyEvent::ConnectionRequested {
            endpoint: ep("ep-1"),
        });

        assert_eq!(out, None);
        assert_eq!(d.calls(), vec!["accept:ep-1"]);
    }

    #[test]
    fn test_connected_moves_endpoint_from_discovered_to_connected() {
        let d = driver();
        let mut adapter = NearbyAdapter::new(Arc::clone(&d));
        adapter.handle_event(NearbyEvent::EndpointFound {
            endpoint: ep("ep-1"),
            name: "Bob".into(),
        });

        let out = adapter.handle_event(NearbyEvent::Connected { endpoint: ep("ep-1") });

        assert_eq!(out, Some(LinkEvent::Connected { endpoint: ep("ep-1") }));
        assert!(adapter.discovered().is_empty());
        assert_eq!(adapter.connected(), vec![ep("ep-1")]);
    }

    #[test]
    fn test_disconnected_removes_from_connected() {
        let d = driver();
        let mut adapter = NearbyAdapter::new(Arc::clone(&d));
        adapter.handle_event(NearbyEvent::Connected { endpoint: ep("ep-1") });

        let out = adapter.handle_event(NearbyEvent::Disconnected { endpoint: ep("ep-1") });

        assert_eq!(out, Some(LinkEvent::Disconnected { endpoint: ep("ep-1") }));
        assert!(adapter.connected().is_empty());
    }

    #[test]
    fn test_disconnect_of_unknown_endpoint_is_silent() {
        let d = driver();
        let mut adapter = NearbyAdapter::new(Arc::clone(&d));

        let out = adapter.handle_event(NearbyEvent::Disconnected { endpoint: ep("ep-9") });

        assert_eq!(out, None);
    }

    #[test]
    fn test_connection_failed_is_logged_only() {
        let d = driver();
        let mut adapter = NearbyAdapter::new(Arc::clone(&d));

        let out = adapter.handle_event(NearbyEvent::ConnectionFailed {
            endpoint: ep("ep-1"),
            reason: "rejected".into(),
        });

        assert_eq!(out, None);
        assert!(adapter.connected().is_empty());
    }

    #[test]
    fn test_send_to_unconnected_endpoint_is_dropped() {
        let d = driver();
        let adapter = NearbyAdapter::new(Arc::clone(&d));

        adapter.send_to(&ep("ep-1"), "hello");

        assert!(d.calls().is_empty());
    }

    #[test]
    fn test_send_to_all_hits_every_connected_endpoint() {
        let d = driver();
        let mut adapter = NearbyAdapter::new(Arc::clone(&d));
        adapter.handle_event(NearbyEvent::Connected { endpoint: ep("ep-1") });
        adapter.handle_event(NearbyEvent::Connected { endpoint: ep("ep-2") });

        adapter.send_to_all("sync");

        assert_eq!(d.calls(), vec!["send:ep-1:sync", "send:ep-2:sync"]);
    }

    #[test]
    fn test_stop_all_disconnects_and_clears_everything() {
        let d = driver();
        let mut adapter = NearbyAdapter::new(Arc::clone(&d));
        adapter.start_advertising("Alice").unwrap();
        adapter.start_discovery().unwrap();
        adapter.handle_event(NearbyEvent::EndpointFound {
            endpoint: ep("ep-1"),
            name: "Bob".into(),
        });
        adapter.handle_event(NearbyEvent::Connected { endpoint: ep("ep-2") });

        adapter.stop_all();

        assert!(!adapter.is_advertising());
        assert!(!adapter.is_discovering());
        assert!(adapter.connected().is_empty());
        assert!(adapter.discovered().is_empty());
        let calls = d.calls();
        assert!(calls.contains(&"disconnect:ep-2".to_string()));
    }

    #[test]
    fn test_stop_all_before_start_is_safe() {
        let d = driver();
        let mut adapter = NearbyAdapter::new(Arc::clone(&d));
        adapter.stop_all();
        adapter.stop_all();
        assert!(adapter.connected().is_empty());
    }
}
