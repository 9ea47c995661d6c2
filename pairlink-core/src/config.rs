//! Relay tunables.
//!
//! These are fixed at startup. Tests shrink them to drive expiry quickly.

use std::time::Duration;

/// Channel with no client is evicted after this long.
pub const UNCLAIMED_CHANNEL_TTL: Duration = Duration::from_secs(10 * 60);

/// Claimed channel with no forwarded traffic is evicted after this long.
pub const CHANNEL_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

/// Room with no activity is evicted after this long.
pub const ROOM_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Minimum spacing between channel creations from one origin.
pub const CREATE_COOLDOWN: Duration = Duration::from_secs(1);

/// Live channels one origin may own at once.
pub const MAX_CHANNELS_PER_ORIGIN: usize = 5;

/// Rate-limit bookkeeping for an origin is dropped after this much quiet.
pub const RATE_RECORD_TTL: Duration = Duration::from_secs(60 * 60);

/// Reaper cadence.
pub const REAP_INTERVAL: Duration = Duration::from_secs(60);

/// Keepalive ping cadence. Must stay under common proxy idle timeouts.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Expiry, rate-limit and sweep settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    pub unclaimed_channel_ttl: Duration,
    pub channel_idle_ttl: Duration,
    pub room_idle_ttl: Duration,
    pub create_cooldown: Duration,
    pub max_channels_per_origin: usize,
    pub rate_record_ttl: Duration,
    pub reap_interval: Duration,
    pub keepalive_interval: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            unclaimed_channel_ttl: UNCLAIMED_CHANNEL_TTL,
            channel_idle_ttl: CHANNEL_IDLE_TTL,
            room_idle_ttl: ROOM_IDLE_TTL,
            create_cooldown: CREATE_COOLDOWN,
            max_channels_per_origin: MAX_CHANNELS_PER_ORIGIN,
            rate_record_ttl: RATE_RECORD_TTL,
            reap_interval: REAP_INTERVAL,
            keepalive_interval: KEEPALIVE_INTERVAL,
        }
    }
}
