//! The seam between the pairing engine and live connections.
//!
//! The hub never touches sockets. It holds [`Link`] handles in its slots and
//! pushes [`Outbound`] items into them; the transport drains those items in
//! order. Every method here must return without waiting on the network.

use std::fmt;

use bytes::Bytes;

use crate::event::RelayEvent;

/// Process-unique identity of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(u64);

impl ConnId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// An opaque frame relayed between endpoints byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Binary(Bytes),
    Text(String),
}

/// Why the relay is closing a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Refused at accept time. The matching `error` event precedes it.
    Rejected(String),
    /// A newer connection took the slot.
    Replaced,
    /// The session was reaped.
    Expired,
    /// The relay is stopping.
    Shutdown,
}

impl CloseReason {
    /// WebSocket close code.
    pub fn code(&self) -> u16 {
        match self {
            Self::Rejected(_) => 1008,
            Self::Replaced | Self::Expired | Self::Shutdown => 1000,
        }
    }

    /// Human-readable close reason.
    pub fn text(&self) -> &str {
        match self {
            Self::Rejected(reason) => reason,
            Self::Replaced => "replaced",
            Self::Expired => "expired",
            Self::Shutdown => "server shutting down",
        }
    }
}

/// Items queued towards one connection, delivered in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Event(RelayEvent),
    Payload(Payload),
    /// Protocol-level keepalive.
    Ping,
    /// Final item; nothing is written after it.
    Close(CloseReason),
}

/// A live connection as seen by the hub.
pub trait Link: Clone + Send + Sync {
    fn id(&self) -> ConnId;

    /// False once the connection has closed or [`Link::close`] was called.
    fn is_open(&self) -> bool;

    /// Queue an item without blocking. Returns `false` if it was dropped.
    fn send(&self, out: Outbound) -> bool;

    /// Queue the close and mark the link closed immediately.
    fn close(&self, reason: CloseReason);

    /// Queue a control event.
    fn notify(&self, event: RelayEvent) -> bool {
        self.send(Outbound::Event(event))
    }
}
