//! Periodic sweeps: expiry and keepalive.
//!
//! Both are driven by the caller's timer; neither depends on connection
//! activity.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::Limits;
use crate::hub::Hub;
use crate::id::short;
use crate::link::{CloseReason, Link, Outbound};
use crate::session::{Session, SessionKind};

/// Counts from one reap pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub channels: usize,
    pub rooms: usize,
    pub origins: usize,
}

impl ReapReport {
    pub fn is_empty(&self) -> bool {
        self.channels == 0 && self.rooms == 0 && self.origins == 0
    }
}

fn older_than(since: Instant, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(since) > ttl
}

fn is_expired<L>(session: &Session<L>, now: Instant, limits: &Limits) -> bool
where
    L: Link,
{
    match session.kind() {
        SessionKind::Channel => {
            if !session.is_claimed()
                && older_than(session.created_at(), now, limits.unclaimed_channel_ttl)
            {
                return true;
            }
            older_than(session.last_activity(), now, limits.channel_idle_ttl)
        }
        SessionKind::Room => older_than(session.last_activity(), now, limits.room_idle_ttl),
    }
}

fn evict<L: Link>(id: &str, session: &Session<L>) {
    for link in session.links().filter(|l| l.is_open()) {
        link.close(CloseReason::Expired);
    }
    debug!(kind = %session.kind(), session = short(id), "session expired");
}

impl<L: Link> Hub<L> {
    /// Evict expired sessions and forget quiet origins.
    pub fn reap(&mut self) -> ReapReport {
        let now = self.clock.now();
        let limits = &self.limits;
        let mut report = ReapReport::default();

        self.channels.retain(|id, session| {
            let expired = is_expired(session, now, limits);
            if expired {
                evict(id, session);
                report.channels += 1;
            }
            !expired
        });
        self.rooms.retain(|id, session| {
            let expired = is_expired(session, now, limits);
            if expired {
                evict(id, session);
                report.rooms += 1;
            }
            !expired
        });
        report.origins = self.rate.prune(now, limits.rate_record_ttl);

        if !report.is_empty() {
            info!(
                channels = report.channels,
                rooms = report.rooms,
                origins = report.origins,
                "reaped"
            );
        }
        report
    }

    /// Ping every open connection. Returns how many pings were queued.
    pub fn keepalive(&self) -> usize {
        self.all_sessions()
            .flat_map(|s| s.links())
            .filter(|l| l.is_open())
            .filter(|l| l.send(Outbound::Ping))
            .count()
    }
}
