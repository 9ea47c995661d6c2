//! Server configuration.
//!
//! The port is the only value operators normally set. Expiry windows and
//! rate limits come from [`Limits::default`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use pairlink_core::Limits;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Largest inbound WebSocket message accepted, in bytes.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Errors while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT {0:?}: expected an integer in 1..=65535")]
    InvalidPort(String),

    #[error("invalid PAIRLINK_BIND {0:?}: expected an IP address")]
    InvalidBind(String),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    /// Take the origin address from `X-Forwarded-For` when set.
    pub trust_forwarded_for: bool,
    pub max_frame_bytes: usize,
    pub limits: Limits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            trust_forwarded_for: false,
            max_frame_bytes: MAX_FRAME_BYTES,
            limits: Limits::default(),
        }
    }
}

impl ServerConfig {
    /// Read `PORT`, `PAIRLINK_BIND` and `PAIRLINK_TRUST_PROXY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = get("PORT") {
            config.port = match raw.trim().parse::<u16>() {
                Ok(port) if port != 0 => port,
                _ => return Err(ConfigError::InvalidPort(raw)),
            };
        }
        if let Some(raw) = get("PAIRLINK_BIND") {
            config.bind = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidBind(raw.clone()))?;
        }
        config.trust_forwarded_for = get("PAIRLINK_TRUST_PROXY")
            .is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes"));

        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}
