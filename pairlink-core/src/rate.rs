//! Per-origin gate on channel creation.
//!
//! Sliding-window approximation: one creation per cooldown and a ceiling on
//! live channels per origin. The bound is advisory abuse prevention, so the
//! records live in memory only and are pruned after a long quiet period.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::error::PairingError;

/// Tracks the last channel creation per origin address.
#[derive(Debug, Default)]
pub struct RateLimiter {
    last_create: HashMap<IpAddr, Instant>,
    cooldown: Duration,
    max_active: usize,
}

impl RateLimiter {
    pub fn new(cooldown: Duration, max_active: usize) -> Self {
        Self {
            last_create: HashMap::new(),
            cooldown,
            max_active,
        }
    }

    /// Decide whether `origin` may create a channel now, recording the
    /// attempt when allowed.
    ///
    /// `active` counts the origin's live channels. It is only evaluated once
    /// the cooldown has passed. A first-ever request is always allowed.
    pub fn check_and_record(
        &mut self,
        origin: IpAddr,
        now: Instant,
        active: impl FnOnce() -> usize,
    ) -> Result<(), PairingError> {
        let Some(last) = self.last_create.get_mut(&origin) else {
            self.last_create.insert(origin, now);
            return Ok(());
        };

        if now.saturating_duration_since(*last) < self.cooldown {
            return Err(PairingError::RateLimited);
        }
        if active() >= self.max_active {
            return Err(PairingError::TooManyActiveSessions);
        }
        *last = now;
        Ok(())
    }

    /// Drop records idle longer than `window`. Returns how many went.
    pub fn prune(&mut self, now: Instant, window: Duration) -> usize {
        let before = self.last_create.len();
        self.last_create
            .retain(|_, last| now.saturating_duration_since(*last) <= window);
        before - self.last_create.len()
    }

    /// Number of origins currently tracked.
    pub fn tracked(&self) -> usize {
        self.last_create.len()
    }
}
