//! The session registry.
//!
//! `Hub` owns every session and the rate limiter. All state transitions go
//! through `&mut self`, so whoever holds the hub (a single task, or a mutex
//! in a threaded server) gets each transition atomically. Pairing lives in
//! `pairing.rs`, sweeps in `reaper.rs`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::Limits;
use crate::id::short;
use crate::link::{CloseReason, Link, Outbound, Payload};
use crate::rate::RateLimiter;
use crate::session::{Binding, Session, SessionKind};

/// Snapshot of registry occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    pub channels: usize,
    pub rooms: usize,
    pub connections: usize,
    pub tracked_origins: usize,
}

/// Registry of channels and rooms.
pub struct Hub<L> {
    pub(crate) limits: Limits,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) channels: HashMap<String, Session<L>>,
    pub(crate) rooms: HashMap<String, Session<L>>,
    pub(crate) rate: RateLimiter,
}

impl<L: Link> Hub<L> {
    pub fn new(limits: Limits, clock: Arc<dyn Clock>) -> Self {
        let rate = RateLimiter::new(limits.create_cooldown, limits.max_channels_per_origin);
        Self {
            limits,
            clock,
            channels: HashMap::new(),
            rooms: HashMap::new(),
            rate,
        }
    }

    pub fn with_system_clock(limits: Limits) -> Self {
        Self::new(limits, Arc::new(SystemClock))
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn channel(&self, id: &str) -> Option<&Session<L>> {
        self.channels.get(id)
    }

    pub fn room(&self, name: &str) -> Option<&Session<L>> {
        self.rooms.get(name)
    }

    pub(crate) fn sessions_mut(&mut self, kind: SessionKind) -> &mut HashMap<String, Session<L>> {
        match kind {
            SessionKind::Channel => &mut self.channels,
            SessionKind::Room => &mut self.rooms,
        }
    }

    pub(crate) fn all_sessions(&self) -> impl Iterator<Item = &Session<L>> {
        self.channels.values().chain(self.rooms.values())
    }

    /// Relay `payload` from the bound sender to its peer.
    ///
    /// Returns `true` only if the frame was handed to an open peer. A
    /// missing session, a superseded sender, or an absent peer are all
    /// silent drops.
    pub fn forward(&mut self, binding: &Binding, payload: Payload) -> bool {
        let now = self.clock.now();
        let Some(session) = self.sessions_mut(binding.key.kind).get_mut(&binding.key.id) else {
            return false;
        };
        if !session.holds(binding.role, binding.conn) {
            return false;
        }
        session.touch(now);
        match session.open(binding.role.peer()) {
            Some(peer) => peer.send(Outbound::Payload(payload)),
            None => false,
        }
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            channels: self.channels.len(),
            rooms: self.rooms.len(),
            connections: self.all_sessions().map(Session::open_count).sum(),
            tracked_origins: self.rate.tracked(),
        }
    }

    /// Close every bound connection and empty the registry.
    ///
    /// Returns how many connections were closed.
    pub fn shutdown(&mut self) -> usize {
        let mut closed = 0;
        for (id, session) in self.channels.drain().chain(self.rooms.drain()) {
            for link in session.links().filter(|l| l.is_open()) {
                link.close(CloseReason::Shutdown);
                closed += 1;
            }
            debug!(session = short(&id), kind = %session.kind(), "session closed for shutdown");
        }
        info!(closed, "registry torn down");
        closed
    }
}
