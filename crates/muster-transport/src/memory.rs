//! An in-process nearby-device fabric for tests and demos.
//!
//! [`MemoryHub`] plays the role of the airspace: every attached
//! [`MemoryDriver`] is one "device". Advertising, discovery, connection
//! requests and payloads are routed synchronously through the hub and
//! delivered as [`NearbyEvent`]s on each device's attached channel —
//! in order, at most once, per endpoint pair, matching the guarantees
//! the real radio stack is assumed to provide.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::{EndpointId, NearbyDriver, NearbyEvent, NearbyEventSender, TransportError};

#[derive(Default)]
struct HubInner {
    next_id: u64,
    devices: HashMap<EndpointId, Device>,
    /// Established links, stored as ordered pairs (both directions).
    links: HashSet<(EndpointId, EndpointId)>,
}

struct Device {
    sender: NearbyEventSender,
    /// `Some(name)` while advertising under that name.
    advertising: Option<String>,
    discovering: bool,
}

impl HubInner {
    fn deliver(&self, to: &EndpointId, event: NearbyEvent) {
        if let Some(device) = self.devices.get(to) {
            // A dropped receiver just means the device is gone.
            let _ = device.sender.send(event);
        }
    }

    fn linked(&self, a: &EndpointId, b: &EndpointId) -> bool {
        self.links.contains(&(a.clone(), b.clone()))
    }
}

/// The shared fabric connecting [`MemoryDriver`] devices.
#[derive(Clone, Default)]
pub struct MemoryHub {
    inner: Arc<Mutex<HubInner>>,
}

impl MemoryHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a new device, returning its driver.
    ///
    /// `events` is where the hub delivers this device's callbacks; the
    /// session side drains it and feeds the adapter.
    pub fn attach(&self, events: NearbyEventSender) -> MemoryDriver {
        let mut inner = self.inner.lock().expect("hub lock");
        inner.next_id += 1;
        let id = EndpointId::new(format!("ep-{}", inner.next_id));
        inner.devices.insert(
            id.clone(),
            Device {
                sender: events,
                advertising: None,
                discovering: false,
            },
        );
        trace!(endpoint = %id, "device attached");
        MemoryDriver {
            hub: Arc::clone(&self.inner),
            id,
        }
    }
}

/// One simulated device on a [`MemoryHub`].
pub struct MemoryDriver {
    hub: Arc<Mutex<HubInner>>,
    id: EndpointId,
}

impl MemoryDriver {
    /// The endpoint id the hub assigned to this device.
    pub fn endpoint_id(&self) -> &EndpointId {
        &self.id
    }
}

impl NearbyDriver for MemoryDriver {
    fn start_advertising(&self, local_name: &str) -> Result<(), TransportError> {
        let mut inner = self.hub.lock().expect("hub lock");
        let Some(device) = inner.devices.get_mut(&self.id) else {
            return Err(TransportError::AdvertiseFailed("device detached".into()));
        };
        device.advertising = Some(local_name.to_string());

        // Everyone already discovering sees the new advertiser at once.
        let watchers: Vec<EndpointId> = inner
            .devices
            .iter()
            .filter(|(id, d)| **id != self.id && d.discovering)
            .map(|(id, _)| id.clone())
            .collect();
        for watcher in watchers {
            inner.deliver(
                &watcher,
                NearbyEvent::EndpointFound {
                    endpoint: self.id.clone(),
                    name: local_name.to_string(),
                },
            );
        }
        Ok(())
    }

    fn stop_advertising(&self) {
        let mut inner = self.hub.lock().expect("hub lock");
        let was_advertising = match inner.devices.get_mut(&self.id) {
            Some(device) => device.advertising.take().is_some(),
            None => false,
        };
        if was_advertising {
            let watchers: Vec<EndpointId> = inner
                .devices
                .iter()
                .filter(|(id, d)| **id != self.id && d.discovering)
                .map(|(id, _)| id.clone())
                .collect();
            for watcher in watchers {
                inner.deliver(
                    &watcher,
                    NearbyEvent::EndpointLost {
                        endpoint: self.id.clone(),
                    },
                );
            }
        }
    }

    fn start_discovery(&self) -> Result<(), TransportError> {
        let mut inner = self.hub.lock().expect("hub lock");
        let Some(device) = inner.devices.get_mut(&self.id) else {
            return Err(TransportError::DiscoveryFailed("device detached".into()));
        };
        device.discovering = true;

        // Snapshot of current advertisers.
        let found: Vec<(EndpointId, String)> = inner
            .devices
            .iter()
            .filter(|(id, _)| **id != self.id)
            .filter_map(|(id, d)| d.advertising.clone().map(|n| (id.clone(), n)))
            .collect();
        for (endpoint, name) in found {
            inner.deliver(&self.id, NearbyEvent::EndpointFound { endpoint, name });
        }
        Ok(())
    }

    fn stop_discovery(&self) {
        let mut inner = self.hub.lock().expect("hub lock");
        if let Some(device) = inner.devices.get_mut(&self.id) {
            device.discovering = false;
        }
    }

    fn request_connection(
        &self,
        _local_name: &str,
        endpoint: &EndpointId,
    ) -> Result<(), TransportError> {
        let inner = self.hub.lock().expect("hub lock");
        if !inner.devices.contains_key(endpoint) {
            return Err(TransportError::ConnectFailed(
                endpoint.clone(),
                "no such endpoint".into(),
            ));
        }
        inner.deliver(
            endpoint,
            NearbyEvent::ConnectionRequested {
                endpoint: self.id.clone(),
            },
        );
        Ok(())
    }

    fn accept_connection(&self, endpoint: &EndpointId) -> Result<(), TransportError> {
        let mut inner = self.hub.lock().expect("hub lock");
        if !inner.devices.contains_key(endpoint) {
            return Err(TransportError::ConnectFailed(
                endpoint.clone(),
                "requester gone".into(),
            ));
        }
        inner.links.insert((self.id.clone(), endpoint.clone()));
        inner.links.insert((endpoint.clone(), self.id.clone()));
        inner.deliver(
            &self.id,
            NearbyEvent::Connected {
                endpoint: endpoint.clone(),
            },
        );
        inner.deliver(
            endpoint,
            NearbyEvent::Connected {
                endpoint: self.id.clone(),
            },
        );
        Ok(())
    }

    fn disconnect(&self, endpoint: &EndpointId) {
        let mut inner = self.hub.lock().expect("hub lock");
        let removed = inner.links.remove(&(self.id.clone(), endpoint.clone()));
        inner.links.remove(&(endpoint.clone(), self.id.clone()));
        if removed {
            inner.deliver(
                endpoint,
                NearbyEvent::Disconnected {
                    endpoint: self.id.clone(),
                },
            );
            inner.deliver(
                &self.id,
                NearbyEvent::Disconnected {
                    endpoint: endpoint.clone(),
                },
            );
        }
    }

    fn send(&self, endpoint: &EndpointId, payload: &str) -> Result<(), TransportError> {
        let inner = self.hub.lock().expect("hub lock");
        if !inner.linked(&self.id, endpoint) {
            return Err(TransportError::NotConnected(endpoint.clone()));
        }
        inner.deliver(
            endpoint,
            NearbyEvent::Payload {
                endpoint: self.id.clone(),
                payload: payload.to_string(),
            },
        );
        Ok(())
    }
}

impl Drop for MemoryDriver {
    fn drop(&mut self) {
        // Tear down as if the device vanished: drop links, notify peers.
        let mut inner = self.hub.lock().expect("hub lock");
        let peers: Vec<EndpointId> = inner
            .links
            .iter()
            .filter(|(a, _)| *a == self.id)
            .map(|(_, b)| b.clone())
            .collect();
        for peer in &peers {
            inner.links.remove(&(self.id.clone(), peer.clone()));
            inner.links.remove(&(peer.clone(), self.id.clone()));
            inner.deliver(
                peer,
                NearbyEvent::Disconnected {
                    endpoint: self.id.clone(),
                },
            );
        }
        inner.devices.remove(&self.id);
    }
}
