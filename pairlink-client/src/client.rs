//! Relay connection.
//!
//! One [`RelayClient`] wraps one WebSocket. Frames map 1:1 to
//! [`Incoming`] items; nothing is buffered or merged.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use pairlink_core::{Payload, RelayEvent};

use crate::error::ClientError;
use crate::target::Target;

/// One item received from the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A relay control frame.
    Event(RelayEvent),
    /// A frame forwarded from the peer.
    Payload(Payload),
}

/// A connection bound to a channel or room.
///
/// Does not implement `Clone`: the socket has exactly one owner.
pub struct RelayClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    target: Target,
}

impl std::fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayClient")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl RelayClient {
    /// Open a connection to `target` on the relay at `base_url`.
    ///
    /// Returns once the WebSocket is up. The relay's first control frame
    /// (or its refusal) is read with [`recv`](Self::recv).
    pub async fn connect(base_url: &str, target: Target) -> Result<Self, ClientError> {
        let url = target.url(base_url)?;
        let (ws, _response) = connect_async(url.as_str())
            .await
            .map_err(ClientError::ConnectionFailed)?;
        debug!(%url, "connected to relay");
        Ok(Self { ws, target })
    }

    /// Create a channel and wait for its id.
    pub async fn create_channel(base_url: &str) -> Result<(Self, String), ClientError> {
        let mut client = Self::connect(base_url, Target::NewChannel).await?;
        match client
            .wait_for(|e| matches!(e, RelayEvent::ChannelCreated { .. }))
            .await?
        {
            RelayEvent::ChannelCreated { channel_id } => Ok((client, channel_id)),
            _ => Err(ClientError::Unexpected("channel.created")),
        }
    }

    /// The target this connection was opened for.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Receive the next control frame or payload.
    ///
    /// Text frames that decode as relay control frames are reported as
    /// events; all other frames are payloads. Keepalive traffic is
    /// answered by the socket and not reported.
    ///
    /// The relay forwards peer text untouched, so a peer can send a text
    /// frame carrying `"type":"relay"` and it will surface here as an
    /// event indistinguishable from the relay's own. Applications that do
    /// not trust their peer should carry payloads as binary frames, or
    /// authenticate presence changes inside their own encrypted stream.
    pub async fn recv(&mut self) -> Result<Incoming, ClientError> {
        loop {
            let msg = match self.ws.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => return Err(ClientError::WebSocket(e)),
                None => {
                    return Err(ClientError::Closed {
                        code: None,
                        reason: String::new(),
                    })
                }
            };
            match msg {
                WsMessage::Text(text) => {
                    return Ok(match RelayEvent::decode(text.as_str()) {
                        Some(event) => Incoming::Event(event),
                        None => Incoming::Payload(Payload::Text(text.as_str().to_owned())),
                    });
                }
                WsMessage::Binary(data) => return Ok(Incoming::Payload(Payload::Binary(data))),
                WsMessage::Close(frame) => {
                    let (code, reason) = match frame {
                        Some(f) => (Some(u16::from(f.code)), f.reason.as_str().to_owned()),
                        None => (None, String::new()),
                    };
                    debug!(?code, %reason, "relay closed connection");
                    return Err(ClientError::Closed { code, reason });
                }
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => continue,
            }
        }
    }

    /// Skip frames until an event satisfies `pred`, and return it.
    ///
    /// Payloads received meanwhile are discarded. An `error` event ends the
    /// wait with [`ClientError::Refused`]. The same caveat as
    /// [`recv`](Self::recv) applies: once paired, a peer's relay-shaped
    /// text frame is treated as an event, including `error`.
    pub async fn wait_for<F>(&mut self, mut pred: F) -> Result<RelayEvent, ClientError>
    where
        F: FnMut(&RelayEvent) -> bool,
    {
        loop {
            match self.recv().await? {
                Incoming::Event(event) if pred(&event) => return Ok(event),
                Incoming::Event(RelayEvent::Error { error }) => {
                    return Err(ClientError::Refused(error))
                }
                _ => continue,
            }
        }
    }

    /// Send one frame to the peer.
    pub async fn send(&mut self, payload: Payload) -> Result<(), ClientError> {
        let msg = match payload {
            Payload::Binary(data) => WsMessage::Binary(data),
            Payload::Text(text) => WsMessage::text(text),
        };
        self.ws.send(msg).await?;
        Ok(())
    }

    /// Close the connection normally.
    pub async fn close(mut self) -> Result<(), ClientError> {
        match self.ws.close(None).await {
            Ok(()) | Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
