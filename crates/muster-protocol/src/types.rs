//! Core protocol types for Muster's wire format.
//!
//! Everything in this module travels "on the wire": serialized to JSON
//! text, handed to the nearby-device transport as one payload, and
//! deserialized on the other side.
//!
//! Consumers must tolerate unknown *fields* (a newer build may add
//! some) but an unknown message *tag* fails the decode — the receiver
//! drops the payload, which is the protocol's forward-compatibility
//! story.

use serde::{Deserialize, Serialize};
use std::fmt;

use muster_roster::Troupe;

// ---------------------------------------------------------------------------
// DeviceId
// ---------------------------------------------------------------------------

/// Identifies a seat's device within a session.
///
/// The hosting device is always the literal `"HOST"`; every other seat
/// carries the endpoint id the transport assigned to that device *as
/// seen by the host*. The value is opaque — only equality matters.
///
/// `#[serde(transparent)]` keeps the wire shape a plain string, so a
/// seat's device id in JSON is just `"HOST"` or `"ep-3"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// The sentinel value marking the hosting seat.
    pub const HOST: &'static str = "HOST";

    /// The hosting device's id.
    pub fn host() -> Self {
        Self(Self::HOST.to_string())
    }

    /// A non-host device id, from the endpoint id the host sees.
    pub fn endpoint(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns `true` if this is the hosting seat's id.
    pub fn is_host(&self) -> bool {
        self.0 == Self::HOST
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One seat in a session.
///
/// Player lists are ordered: insertion order is the seat order used for
/// player slots everywhere in the app, and the host is conventionally
/// first. The whole list is re-broadcast by the host on every accepted
/// change, so this struct is both the session's bookkeeping record and
/// a wire type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name, as advertised by the joining device.
    pub name: String,
    /// `"HOST"` for the hosting seat, else the endpoint id as seen by
    /// the host.
    pub device_id: DeviceId,
    /// The troupe this seat will play, once selected. A copy — never a
    /// reference into anyone's saved data.
    #[serde(default)]
    pub troupe: Option<Troupe>,
    /// Set when the seat has confirmed it is ready.
    #[serde(default)]
    pub ready: bool,
}

impl Player {
    /// Creates an unready seat with no troupe.
    pub fn new(name: impl Into<String>, device_id: DeviceId) -> Self {
        Self {
            name: name.into(),
            device_id,
            troupe: None,
            ready: false,
        }
    }
}

// ---------------------------------------------------------------------------
// PlayUpdate
// ---------------------------------------------------------------------------

/// One live-play edit to a single character's play state.
///
/// These are the only mutations that touch character state during a
/// game; they target one `(seat, slot)` overlay and are broadcast
/// best-effort to keep every device's view roughly current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PlayUpdate {
    /// Set current health to an absolute value.
    Health { value: u32 },
    /// Set current energy to an absolute value.
    Energy { value: u32 },
    /// Mark an ability used (or reset it).
    Ability { name: String, used: bool },
    /// Card flipped face-down/up in the UI.
    Flip { flipped: bool },
    /// Card expanded/collapsed in the UI.
    Expand { expanded: bool },
}

// ---------------------------------------------------------------------------
// SessionMessage — the closed tagged union
// ---------------------------------------------------------------------------

/// Every message the session protocol can put on the wire.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
///
/// ```json
/// { "type": "JoinRequest", "player_name": "Bob" }
/// ```
///
/// The variant set is closed and the tag is the explicit discriminant —
/// no reflection, no polymorphic decoding. `Welcome` and
/// `ReadyForAction` are defined by the protocol but currently have no
/// specified handling; receivers treat them as deliberate, logged
/// no-ops (reserved extension points, not silent fallthrough).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionMessage {
    /// Client → Host, right after the connection is established:
    /// "seat me, please."
    JoinRequest { player_name: String },

    /// Host → Client greeting. Reserved; receivers no-op.
    Welcome { session_id: String },

    /// Any device → all: "this seat plays this troupe."
    ///
    /// The host matches the originating seat by *sender endpoint* (or
    /// its own `"HOST"` seat); the embedded `device_id` exists for the
    /// client-to-client echo path, where there is no sender identity
    /// the host vouches for.
    TroupeSelected { device_id: DeviceId, troupe: Troupe },

    /// Host → all: the authoritative session snapshot. Clients replace
    /// their local view wholesale; the host never accepts one.
    SessionSync {
        session_id: String,
        players: Vec<Player>,
    },

    /// Host → all: match setup is over, move every device to the game
    /// screen with the troupes selected so far.
    StartGame,

    /// Any device → all: one live-play edit to one character overlay.
    GameplayUpdate {
        /// Seat index into the session's player order.
        seat: usize,
        /// Character slot index within that seat's troupe.
        slot: usize,
        update: PlayUpdate,
    },

    /// Any device → all: the turn counter and whose activation it is.
    TurnUpdate { turn: u32, active_seat: usize },

    /// A seat signalling it is ready to act. Reserved; receivers no-op.
    ReadyForAction { device_id: DeviceId },
}

impl SessionMessage {
    /// The message's wire tag, for logging.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::JoinRequest { .. } => "JoinRequest",
            Self::Welcome { .. } => "Welcome",
            Self::TroupeSelected { .. } => "TroupeSelected",
            Self::SessionSync { .. } => "SessionSync",
            Self::StartGame => "StartGame",
            Self::GameplayUpdate { .. } => "GameplayUpdate",
            Self::TurnUpdate { .. } => "TurnUpdate",
            Self::ReadyForAction { .. } => "ReadyForAction",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire contract is the JSON shape, not just Rust round-trips —
    //! a mismatch here means devices on different builds stop
    //! understanding each other. So: one shape test per interesting
    //! variant, round-trips for the rest, and a malformed-input section
    //! proving decode failures stay failures.

    use super::*;
    use muster_roster::{CharacterId, Faction};

    fn troupe() -> Troupe {
        Troupe::new(
            "Raiders",
            Faction::Dominion,
            vec![CharacterId(5), CharacterId(6), CharacterId(7)],
        )
    }

    fn round_trip(msg: &SessionMessage) -> SessionMessage {
        let text = serde_json::to_string(msg).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    // =====================================================================
    // DeviceId
    // =====================================================================

    #[test]
    fn test_device_id_host_sentinel() {
        assert!(DeviceId::host().is_host());
        assert!(!DeviceId::endpoint("ep-1").is_host());
        assert_eq!(DeviceId::host().as_str(), "HOST");
    }

    #[test]
    fn test_device_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&DeviceId::endpoint("ep-3")).unwrap();
        assert_eq!(json, "\"ep-3\"");
        let back: DeviceId = serde_json::from_str("\"HOST\"").unwrap();
        assert!(back.is_host());
    }

    // =====================================================================
    // Player
    // =====================================================================

    #[test]
    fn test_player_new_is_unready_without_troupe() {
        let p = Player::new("Alice", DeviceId::host());
        assert_eq!(p.name, "Alice");
        assert!(p.troupe.is_none());
        assert!(!p.ready);
    }

    #[test]
    fn test_player_decodes_without_optional_fields() {
        // `troupe` and `ready` default — older senders omit them.
        let json = r#"{"name":"Bob","device_id":"ep-2"}"#;
        let p: Player = serde_json::from_str(json).unwrap();
        assert_eq!(p.device_id, DeviceId::endpoint("ep-2"));
        assert!(p.troupe.is_none());
        assert!(!p.ready);
    }

    // =====================================================================
    // SessionMessage — JSON shapes
    // =====================================================================

    #[test]
    fn test_join_request_json_format() {
        let msg = SessionMessage::JoinRequest {
            player_name: "Bob".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "JoinRequest");
        assert_eq!(json["player_name"], "Bob");
    }

    #[test]
    fn test_session_sync_json_format() {
        let msg = SessionMessage::SessionSync {
            session_id: "a1b2c3d4".into(),
            players: vec![
                Player::new("Alice", DeviceId::host()),
                Player::new("Bob", DeviceId::endpoint("ep-2")),
            ],
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "SessionSync");
        assert_eq!(json["session_id"], "a1b2c3d4");
        assert_eq!(json["players"][0]["device_id"], "HOST");
        assert_eq!(json["players"][1]["name"], "Bob");
    }

    #[test]
    fn test_troupe_selected_json_format() {
        let msg = SessionMessage::TroupeSelected {
            device_id: DeviceId::endpoint("ep-2"),
            troupe: troupe(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "TroupeSelected");
        assert_eq!(json["device_id"], "ep-2");
        assert_eq!(json["troupe"]["name"], "Raiders");
        assert_eq!(json["troupe"]["faction"], "Dominion");
    }

    #[test]
    fn test_gameplay_update_json_format() {
        let msg = SessionMessage::GameplayUpdate {
            seat: 1,
            slot: 2,
            update: PlayUpdate::Health { value: 7 },
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "GameplayUpdate");
        assert_eq!(json["seat"], 1);
        assert_eq!(json["slot"], 2);
        assert_eq!(json["update"]["kind"], "Health");
        assert_eq!(json["update"]["value"], 7);
    }

    #[test]
    fn test_start_game_json_format() {
        let json: serde_json::Value =
            serde_json::to_value(SessionMessage::StartGame).unwrap();
        assert_eq!(json["type"], "StartGame");
    }

    // =====================================================================
    // SessionMessage — round trips
    // =====================================================================

    #[test]
    fn test_every_variant_round_trips() {
        let msgs = [
            SessionMessage::JoinRequest {
                player_name: "Bob".into(),
            },
            SessionMessage::Welcome {
                session_id: "a1b2c3d4".into(),
            },
            SessionMessage::TroupeSelected {
                device_id: DeviceId::host(),
                troupe: troupe(),
            },
            SessionMessage::SessionSync {
                session_id: "a1b2c3d4".into(),
                players: vec![Player::new("Alice", DeviceId::host())],
            },
            SessionMessage::StartGame,
            SessionMessage::GameplayUpdate {
                seat: 0,
                slot: 3,
                update: PlayUpdate::Ability {
                    name: "Firestorm".into(),
                    used: true,
                },
            },
            SessionMessage::TurnUpdate {
                turn: 4,
                active_seat: 2,
            },
            SessionMessage::ReadyForAction {
                device_id: DeviceId::endpoint("ep-9"),
            },
        ];
        for msg in &msgs {
            assert_eq!(&round_trip(msg), msg, "{} did not round-trip", msg.tag());
        }
    }

    #[test]
    fn test_play_update_variants_round_trip() {
        let updates = [
            PlayUpdate::Health { value: 0 },
            PlayUpdate::Energy { value: 5 },
            PlayUpdate::Ability {
                name: "Rally".into(),
                used: false,
            },
            PlayUpdate::Flip { flipped: true },
            PlayUpdate::Expand { expanded: false },
        ];
        for update in &updates {
            let text = serde_json::to_string(update).unwrap();
            let back: PlayUpdate = serde_json::from_str(&text).unwrap();
            assert_eq!(&back, update);
        }
    }

    // =====================================================================
    // Forward compatibility and malformed input
    // =====================================================================

    #[test]
    fn test_decode_tolerates_unknown_extra_fields() {
        // A newer build may add fields; this build must ignore them.
        let json = r#"{"type":"JoinRequest","player_name":"Bob","avatar":"wolf","v":2}"#;
        let msg: SessionMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            SessionMessage::JoinRequest {
                player_name: "Bob".into()
            }
        );
    }

    #[test]
    fn test_decode_unknown_tag_returns_error() {
        let json = r#"{"type":"TeleportEveryone","to":"moon"}"#;
        let result: Result<SessionMessage, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let result: Result<SessionMessage, _> =
            serde_json::from_str("not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_missing_required_field_returns_error() {
        // JoinRequest without player_name.
        let result: Result<SessionMessage, _> =
            serde_json::from_str(r#"{"type":"JoinRequest"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_tag_names_match_wire_tags() {
        let msg = SessionMessage::TurnUpdate {
            turn: 1,
            active_seat: 0,
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], msg.tag());
    }
}
