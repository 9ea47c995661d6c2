//! Connection path grammar.
//!
//! ```text
//! /new              create a channel, caller becomes host
//! /channel/{id}     join a channel as client
//! /room/{name}      join or create a room
//! ```

use crate::error::PairingError;
use crate::id::{is_channel_id, validate_room_name};

/// A parsed connection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/new`
    NewChannel,
    /// `/channel/{id}`
    JoinChannel(String),
    /// `/room/{name}`
    Room(String),
}

impl Route {
    /// Parse a request path (without query string).
    pub fn parse(path: &str) -> Result<Self, PairingError> {
        if path == "/new" {
            return Ok(Self::NewChannel);
        }
        if let Some(id) = path.strip_prefix("/channel/") {
            return if is_channel_id(id) {
                Ok(Self::JoinChannel(id.to_owned()))
            } else {
                Err(PairingError::UnknownPath)
            };
        }
        if let Some(name) = path.strip_prefix("/room/") {
            return validate_room_name(name).map(|n| Self::Room(n.to_owned()));
        }
        Err(PairingError::UnknownPath)
    }

    /// Render the route back into a request path.
    pub fn path(&self) -> String {
        match self {
            Self::NewChannel => "/new".to_owned(),
            Self::JoinChannel(id) => format!("/channel/{id}"),
            Self::Room(name) => format!("/room/{name}"),
        }
    }
}
