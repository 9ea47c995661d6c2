//! Control frames sent by the relay.
//!
//! Every control frame is one JSON text message:
//!
//! ```text
//! {"type":"relay","event":"channel.created","channelId":"..."}
//! ```
//!
//! Anything that is not a control frame is opaque payload and never
//! inspected.

use serde::{Deserialize, Serialize};

use crate::session::Role;

/// Constant discriminator carried by every control frame.
pub const RELAY_TYPE: &str = "relay";

/// Events the relay emits to bound connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RelayEvent {
    /// Channel created; the recipient is its host.
    #[serde(rename = "channel.created", rename_all = "camelCase")]
    ChannelCreated { channel_id: String },

    /// Recipient joined a channel as client.
    #[serde(rename = "channel.joined", rename_all = "camelCase")]
    ChannelJoined {
        channel_id: String,
        role: Role,
        host_connected: bool,
    },

    /// Recipient joined a room. Exactly one of the presence flags is set,
    /// describing the opposite role.
    #[serde(rename = "room.joined", rename_all = "camelCase")]
    RoomJoined {
        room_id: String,
        role: Role,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_connected: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        host_connected: Option<bool>,
    },

    #[serde(rename = "host.connected")]
    HostConnected,

    #[serde(rename = "host.disconnected")]
    HostDisconnected,

    #[serde(rename = "client.connected", rename_all = "camelCase")]
    ClientConnected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_count: Option<u32>,
    },

    #[serde(rename = "client.disconnected", rename_all = "camelCase")]
    ClientDisconnected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_count: Option<u32>,
    },

    /// A newer connection took over the recipient's slot.
    #[serde(rename = "replaced")]
    Replaced { reason: String },

    /// Connection refused; closure follows.
    #[serde(rename = "error")]
    Error { error: String },
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    event: &'a RelayEvent,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    event: RelayEvent,
}

impl RelayEvent {
    /// Encode as a control frame.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&EnvelopeRef {
            kind: RELAY_TYPE,
            event: self,
        })
    }

    /// Decode a text frame. Returns `None` for anything that is not a
    /// relay control frame, including opaque text payloads that happen to
    /// be JSON.
    pub fn decode(text: &str) -> Option<Self> {
        let envelope: Envelope = serde_json::from_str(text).ok()?;
        (envelope.kind == RELAY_TYPE).then_some(envelope.event)
    }

    /// The `event` name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChannelCreated { .. } => "channel.created",
            Self::ChannelJoined { .. } => "channel.joined",
            Self::RoomJoined { .. } => "room.joined",
            Self::HostConnected => "host.connected",
            Self::HostDisconnected => "host.disconnected",
            Self::ClientConnected { .. } => "client.connected",
            Self::ClientDisconnected { .. } => "client.disconnected",
            Self::Replaced { .. } => "replaced",
            Self::Error { .. } => "error",
        }
    }
}
