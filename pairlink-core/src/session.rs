//! Session records held by the registry.
//!
//! A session has two role slots. Each slot holds at most one [`Link`]; the
//! hub is the only writer. Connections keep a [`Binding`] back-reference and
//! never own the session.

use std::fmt;
use std::net::IpAddr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::link::{ConnId, Link};

/// Role of a bound connection. Fixed for the connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Client,
}

impl Role {
    pub fn peer(self) -> Self {
        match self {
            Self::Host => Self::Client,
            Self::Client => Self::Host,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle policy of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Single-use. Deleted when the host leaves or the session expires.
    Channel,
    /// Named. Survives departures until idle expiry.
    Room,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Channel => "channel",
            Self::Room => "room",
        })
    }
}

/// Registry key of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub kind: SessionKind,
    pub id: String,
}

impl SessionKey {
    pub fn channel(id: impl Into<String>) -> Self {
        Self {
            kind: SessionKind::Channel,
            id: id.into(),
        }
    }

    pub fn room(name: impl Into<String>) -> Self {
        Self {
            kind: SessionKind::Room,
            id: name.into(),
        }
    }
}

/// Per-connection context created when a connection is bound to a slot.
///
/// Passed back to the hub with every frame and with the final disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub key: SessionKey,
    pub role: Role,
    pub conn: ConnId,
}

/// One pairing session.
#[derive(Debug)]
pub struct Session<L> {
    kind: SessionKind,
    host: Option<L>,
    client: Option<L>,
    created_at: Instant,
    last_activity: Instant,
    claimed: bool,
    creator: Option<IpAddr>,
}

impl<L: Link> Session<L> {
    /// A fresh channel with `host` bound and no client yet.
    pub(crate) fn channel(host: L, creator: IpAddr, now: Instant) -> Self {
        Self {
            kind: SessionKind::Channel,
            host: Some(host),
            client: None,
            created_at: now,
            last_activity: now,
            claimed: false,
            creator: Some(creator),
        }
    }

    /// An empty room.
    pub(crate) fn room(now: Instant) -> Self {
        Self {
            kind: SessionKind::Room,
            host: None,
            client: None,
            created_at: now,
            last_activity: now,
            claimed: false,
            creator: None,
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// True once a client has ever been accepted.
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    pub fn creator(&self) -> Option<IpAddr> {
        self.creator
    }

    pub fn slot(&self, role: Role) -> Option<&L> {
        match role {
            Role::Host => self.host.as_ref(),
            Role::Client => self.client.as_ref(),
        }
    }

    /// The link in `role`'s slot, if it is still open.
    pub fn open(&self, role: Role) -> Option<&L> {
        self.slot(role).filter(|l| l.is_open())
    }

    pub fn is_connected(&self, role: Role) -> bool {
        self.open(role).is_some()
    }

    /// Whether `conn` is the connection currently occupying `role`.
    pub fn holds(&self, role: Role, conn: ConnId) -> bool {
        self.slot(role).is_some_and(|l| l.id() == conn)
    }

    /// Put `link` in `role`'s slot, returning whatever was there.
    pub(crate) fn bind(&mut self, role: Role, link: L, now: Instant) -> Option<L> {
        self.last_activity = now;
        if role == Role::Client {
            self.claimed = true;
        }
        let slot = match role {
            Role::Host => &mut self.host,
            Role::Client => &mut self.client,
        };
        slot.replace(link)
    }

    pub(crate) fn release(&mut self, role: Role) -> Option<L> {
        match role {
            Role::Host => self.host.take(),
            Role::Client => self.client.take(),
        }
    }

    pub(crate) fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Links in both slots, host first.
    pub(crate) fn links(&self) -> impl Iterator<Item = &L> {
        self.host.iter().chain(self.client.iter())
    }

    /// Connections whose slot is held by an open link.
    pub fn open_count(&self) -> usize {
        self.links().filter(|l| l.is_open()).count()
    }
}
