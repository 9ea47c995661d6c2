//! Pairing errors.
//!
//! Every error is reported to the offending connection as an `error` event
//! followed by closure. None of them touch registry state.

/// Reasons a connection is refused by the pairing engine.
///
/// The `Display` text is sent verbatim as the `error` field of the control
/// frame, so it stays short and does not echo client input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PairingError {
    /// Creation attempted again before the per-origin cooldown elapsed.
    #[error("rate limited")]
    RateLimited,

    /// The origin already owns the maximum number of live channels.
    #[error("too many active sessions")]
    TooManyActiveSessions,

    /// No channel is registered under the requested id.
    #[error("channel not found or expired")]
    ChannelNotFound,

    /// The channel already has an open client bound.
    #[error("channel already has a connected client")]
    ChannelOccupied,

    /// Room name outside the allowed length or alphabet.
    #[error("invalid room name")]
    InvalidRoomName,

    /// Path does not match any known route.
    #[error("unknown path")]
    UnknownPath,
}

impl PairingError {
    /// Whether the error is an abuse-prevention refusal rather than a bad request.
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::TooManyActiveSessions | Self::ChannelOccupied
        )
    }
}
