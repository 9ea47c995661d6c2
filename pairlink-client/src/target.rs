//! Where a client connects.

use pairlink_core::{PairingError, Route};

/// The session a [`crate::RelayClient`] asks to be bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Create a fresh channel and become its host.
    NewChannel,
    /// Join an existing channel as its client.
    Channel(String),
    /// Join or create a named room.
    Room(String),
}

impl Target {
    /// Request path for this target, validated the way the relay
    /// validates it.
    pub fn path(&self) -> Result<String, PairingError> {
        let path = match self {
            Self::NewChannel => Route::NewChannel.path(),
            Self::Channel(id) => Route::JoinChannel(id.clone()).path(),
            Self::Room(name) => Route::Room(name.clone()).path(),
        };
        Route::parse(&path)?;
        Ok(path)
    }

    /// Full WebSocket URL under `base_url` (for example `ws://host:8080`).
    pub fn url(&self, base_url: &str) -> Result<String, PairingError> {
        Ok(format!("{}{}", base_url.trim_end_matches('/'), self.path()?))
    }
}
