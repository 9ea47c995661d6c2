//! Client errors.

use pairlink_core::PairingError;
use tokio_tungstenite::tungstenite;

/// Errors from connecting to or talking through the relay.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The target would be refused by the relay before connecting.
    #[error("invalid target: {0}")]
    InvalidTarget(#[from] PairingError),

    /// The WebSocket handshake failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(#[source] tungstenite::Error),

    /// The relay sent an `error` event and is closing the connection.
    #[error("refused by relay: {0}")]
    Refused(String),

    /// The connection closed. `code` is absent when no close frame arrived.
    #[error("connection closed ({}): {reason}", close_code(.code))]
    Closed {
        /// WebSocket close code.
        code: Option<u16>,
        /// Close reason text.
        reason: String,
    },

    /// An expected control frame did not arrive.
    #[error("unexpected frame while waiting for {0}")]
    Unexpected(&'static str),

    /// Transport failure after the handshake.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

fn close_code(code: &Option<u16>) -> String {
    code.map_or_else(|| "no code".to_owned(), |c| c.to_string())
}

impl ClientError {
    /// True when the connection is gone and further calls will fail.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InvalidTarget(_) | Self::Unexpected(_))
    }
}
