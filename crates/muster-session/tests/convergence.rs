//! Multi-machine convergence tests.
//!
//! A small in-test fabric wires one host machine to N client machines
//! in a star topology (clients only ever talk to the host, as the
//! nearby transport connects them). Effects from one machine become
//! `Message` events on its peers. Per-link ordering is preserved —
//! that is the transport's guarantee — but the tests deliberately vary
//! *cross-link* interleaving and drop individual messages, because the
//! protocol's claim is that the host's full-snapshot re-broadcasts make
//! final state independent of both.

use std::collections::VecDeque;

use muster_protocol::{DeviceId, SessionMessage};
use muster_roster::{bundled_characters, CharacterCatalog, CharacterId, Faction, Troupe};
use muster_session::{Effect, Phase, SessionEvent, SessionMachine};
use muster_transport::EndpointId;

/// One in-flight message on the fabric.
#[derive(Debug, Clone)]
enum Wire {
    /// From client `from` to the host.
    ToHost { from: usize, message: SessionMessage },
    /// From the host to client `to`.
    ToClient { to: usize, message: SessionMessage },
}

struct Fabric {
    host: SessionMachine,
    clients: Vec<SessionMachine>,
    /// How many clients have an established connection; host
    /// broadcasts only reach those.
    connected: usize,
    /// One FIFO queue per link and direction, so per-link ordering is
    /// preserved while tests pick which link delivers next.
    to_host: Vec<VecDeque<SessionMessage>>,
    to_client: Vec<VecDeque<SessionMessage>>,
}

fn catalog() -> CharacterCatalog {
    CharacterCatalog::new(bundled_characters())
}

/// The endpoint id the host sees for client `i`.
fn client_endpoint(i: usize) -> EndpointId {
    EndpointId::new(format!("ep-{}", i + 1))
}

/// The endpoint id every client sees for the host.
fn host_endpoint() -> EndpointId {
    EndpointId::new("ep-host")
}

impl Fabric {
    /// Builds a host plus joined clients: hosting started, connections
    /// established, join handshakes fully delivered.
    fn with_clients(names: &[&str]) -> Self {
        let mut fabric = Self {
            host: SessionMachine::new("Alice", catalog()),
            clients: names
                .iter()
                .map(|n| SessionMachine::new(*n, catalog()))
                .collect(),
            connected: 0,
            to_host: names.iter().map(|_| VecDeque::new()).collect(),
            to_client: names.iter().map(|_| VecDeque::new()).collect(),
        };
        fabric.host.handle(SessionEvent::StartHosting).unwrap();
        for i in 0..fabric.clients.len() {
            // Both sides observe the connection.
            fabric.connected = i + 1;
            let effects = fabric.clients[i]
                .handle(SessionEvent::Connected {
                    endpoint: host_endpoint(),
                })
                .unwrap();
            fabric.queue_client_effects(i, effects);
            let effects = fabric
                .host
                .handle(SessionEvent::Connected {
                    endpoint: client_endpoint(i),
                })
                .unwrap();
            fabric.queue_host_effects(effects);
            fabric.run_to_idle();
        }
        fabric
    }

    fn queue_host_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Broadcast { message } => {
                    for q in self.to_client.iter_mut().take(self.connected) {
                        q.push_back(message.clone());
                    }
                }
                Effect::SendTo { endpoint, message } => {
                    let i = (0..self.clients.len())
                        .position(|i| client_endpoint(i) == endpoint)
                        .expect("host sent to unknown endpoint");
                    self.to_client[i].push_back(message);
                }
                // Transport control and notifications don't travel.
                _ => {}
            }
        }
    }

    fn queue_client_effects(&mut self, from: usize, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                // A client's only link is the host.
                Effect::Broadcast { message } | Effect::SendTo { message, .. } => {
                    self.to_host[from].push_back(message);
                }
                _ => {}
            }
        }
    }

    /// Delivers one message from the chosen link, if any is pending.
    fn step(&mut self, wire: Wire) {
        match wire {
            Wire::ToHost { from, message } => {
                let effects = self
                    .host
                    .handle(SessionEvent::Message {
                        endpoint: client_endpoint(from),
                        message,
                    })
                    .unwrap();
                self.queue_host_effects(effects);
            }
            Wire::ToClient { to, message } => {
                let effects = self.clients[to]
                    .handle(SessionEvent::Message {
                        endpoint: host_endpoint(),
                        message,
                    })
                    .unwrap();
                self.queue_client_effects(to, effects);
            }
        }
    }

    fn pop_toward_host(&mut self) -> Option<Wire> {
        for (from, q) in self.to_host.iter_mut().enumerate() {
            if let Some(message) = q.pop_front() {
                return Some(Wire::ToHost { from, message });
            }
        }
        None
    }

    fn pop_toward_clients(&mut self) -> Option<Wire> {
        for (to, q) in self.to_client.iter_mut().enumerate() {
            if let Some(message) = q.pop_front() {
                return Some(Wire::ToClient { to, message });
            }
        }
        None
    }

    /// Pops the next message on some link. Which direction drains
    /// first is the knob tests turn to vary cross-link interleaving.
    fn pop(&mut self, host_inbound_first: bool) -> Option<Wire> {
        if host_inbound_first {
            self.pop_toward_host().or_else(|| self.pop_toward_clients())
        } else {
            self.pop_toward_clients().or_else(|| self.pop_toward_host())
        }
    }

    /// Delivers everything until the fabric is quiet.
    fn run_to_idle(&mut self) {
        self.run_to_idle_with(true);
    }

    fn run_to_idle_with(&mut self, host_inbound_first: bool) {
        let mut remaining = 1000;
        while let Some(wire) = self.pop(host_inbound_first) {
            self.step(wire);
            remaining -= 1;
            assert!(remaining > 0, "fabric did not quiesce");
        }
    }

    fn assert_converged(&self) {
        let host_session = self.host.session().expect("host session");
        for (i, client) in self.clients.iter().enumerate() {
            let session = client
                .session()
                .unwrap_or_else(|| panic!("client {i} has no session"));
            assert_eq!(session.id, host_session.id, "client {i} session id");
            assert_eq!(
                session.players, host_session.players,
                "client {i} player list"
            );
        }
    }
}

fn troupe(name: &str) -> Troupe {
    Troupe::new(
        name,
        Faction::Dominion,
        vec![CharacterId(5), CharacterId(6), CharacterId(7)],
    )
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_host_starts_and_bob_joins() {
    let fabric = Fabric::with_clients(&["Bob"]);

    let host_session = fabric.host.session().unwrap();
    assert_eq!(host_session.players.len(), 2);
    assert_eq!(host_session.players[0].name, "Alice");
    assert!(host_session.players[0].device_id.is_host());
    assert_eq!(host_session.players[1].name, "Bob");
    assert_eq!(
        host_session.players[1].device_id,
        DeviceId::endpoint("ep-1")
    );

    // Bob's local list equals the host's after the sync.
    assert_eq!(fabric.clients[0].phase(), Phase::ClientActive);
    fabric.assert_converged();
}

#[test]
fn test_bob_selects_troupe_and_alice_sees_it() {
    let mut fabric = Fabric::with_clients(&["Bob"]);

    let effects = fabric.clients[0]
        .handle(SessionEvent::SelectTroupe {
            troupe: troupe("Raiders"),
        })
        .unwrap();
    fabric.queue_client_effects(0, effects);
    fabric.run_to_idle();

    let host_session = fabric.host.session().unwrap();
    assert_eq!(
        host_session.players[1].troupe.as_ref().unwrap().name,
        "Raiders"
    );
    fabric.assert_converged();
}

#[test]
fn test_three_devices_converge_regardless_of_interleaving() {
    for host_inbound_first in [true, false] {
        let mut fabric = Fabric::with_clients(&["Bob", "Carol"]);

        let effects = fabric.clients[0]
            .handle(SessionEvent::SelectTroupe {
                troupe: troupe("Raiders"),
            })
            .unwrap();
        fabric.queue_client_effects(0, effects);
        let effects = fabric.clients[1]
            .handle(SessionEvent::SelectTroupe {
                troupe: troupe("Wardens"),
            })
            .unwrap();
        fabric.queue_client_effects(1, effects);

        fabric.run_to_idle_with(host_inbound_first);

        let host_session = fabric.host.session().unwrap();
        assert_eq!(
            host_session.players[1].troupe.as_ref().unwrap().name,
            "Raiders"
        );
        assert_eq!(
            host_session.players[2].troupe.as_ref().unwrap().name,
            "Wardens"
        );
        fabric.assert_converged();
    }
}

#[test]
fn test_lost_selection_echo_is_corrected_by_next_sync() {
    let mut fabric = Fabric::with_clients(&["Bob", "Carol"]);

    // Bob selects; Carol's copy of the troupe-selected echo is lost.
    let effects = fabric.clients[0]
        .handle(SessionEvent::SelectTroupe {
            troupe: troupe("Raiders"),
        })
        .unwrap();
    fabric.queue_client_effects(0, effects);

    // Deliver Bob→host, then lose the snapshot the host sent Carol.
    let wire = fabric.pop(true).unwrap();
    fabric.step(wire);
    fabric.to_client[1].pop_front();

    fabric.run_to_idle();

    // Carol still converges: any later sync carries the full list.
    // Force one more accepted change so a fresh snapshot goes out.
    let effects = fabric
        .host
        .handle(SessionEvent::SelectTroupe {
            troupe: troupe("Vanguard"),
        })
        .unwrap();
    fabric.queue_host_effects(effects);
    fabric.run_to_idle();

    fabric.assert_converged();
}

#[test]
fn test_host_full_session_drops_fifth_join() {
    let mut fabric = Fabric::with_clients(&["Bob", "Carol", "Dave"]);
    assert_eq!(fabric.host.session().unwrap().players.len(), 4);

    // A fifth device connects and asks to join.
    let effects = fabric
        .host
        .handle(SessionEvent::Message {
            endpoint: EndpointId::new("ep-99"),
            message: SessionMessage::JoinRequest {
                player_name: "Eve".into(),
            },
        })
        .unwrap();

    assert_eq!(fabric.host.session().unwrap().players.len(), 4);
    assert!(effects.is_empty(), "no rejection and no sync go out");
    fabric.run_to_idle();
    fabric.assert_converged();
}

#[test]
fn test_start_game_reaches_every_device_in_seat_order() {
    let mut fabric = Fabric::with_clients(&["Bob"]);

    let effects = fabric
        .host
        .handle(SessionEvent::SelectTroupe {
            troupe: troupe("Vanguard"),
        })
        .unwrap();
    fabric.queue_host_effects(effects);
    let effects = fabric.clients[0]
        .handle(SessionEvent::SelectTroupe {
            troupe: troupe("Raiders"),
        })
        .unwrap();
    fabric.queue_client_effects(0, effects);
    fabric.run_to_idle();

    let effects = fabric.host.handle(SessionEvent::StartGame).unwrap();
    fabric.queue_host_effects(effects);
    fabric.run_to_idle();

    for machine in std::iter::once(&fabric.host).chain(fabric.clients.iter()) {
        let play = machine.play().expect("game started everywhere");
        let seats: Vec<usize> = play.seats().iter().map(|l| l.seat).collect();
        assert_eq!(seats, vec![0, 1], "troupes in player order");
    }
}

#[test]
fn test_gameplay_update_propagates_host_to_client() {
    let mut fabric = Fabric::with_clients(&["Bob"]);
    let effects = fabric
        .host
        .handle(SessionEvent::SelectTroupe {
            troupe: troupe("Vanguard"),
        })
        .unwrap();
    fabric.queue_host_effects(effects);
    fabric.run_to_idle();
    let effects = fabric.host.handle(SessionEvent::StartGame).unwrap();
    fabric.queue_host_effects(effects);
    fabric.run_to_idle();

    let effects = fabric
        .host
        .handle(SessionEvent::ApplyPlayUpdate {
            seat: 0,
            slot: 0,
            update: muster_protocol::PlayUpdate::Health { value: 4 },
        })
        .unwrap();
    fabric.queue_host_effects(effects);
    fabric.run_to_idle();

    let play = fabric.clients[0].play().unwrap();
    let state = play
        .get(muster_session::SlotKey { seat: 0, slot: 0 })
        .unwrap();
    assert_eq!(state.health, 4);
}
