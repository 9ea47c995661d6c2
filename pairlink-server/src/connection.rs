//! Per-connection actor.
//!
//! Each accepted socket gets two tasks:
//!
//! - the reader (this module's `run`) owns the connection's [`Binding`],
//!   feeds inbound frames to the hub in order and reports the single
//!   terminal disconnect;
//! - the writer drains the connection's queue of [`Outbound`] items into
//!   the socket. It is the only code that writes to the WebSocket.
//!
//! The hub only ever sees the [`ConnHandle`], which never blocks. The queue
//! is unbounded: a frame accepted for an open peer is always delivered, and
//! TCP backpressure on the peer's socket is absorbed here rather than
//! turning into loss.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use bytes::Bytes;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use pairlink_core::{
    Binding, CloseReason, ConnId, Link, Outbound, PairingError, Payload, RelayEvent, Route,
};

use crate::AppState;

#[derive(Debug)]
struct ConnState {
    open: AtomicBool,
    /// Fired when the relay closes the connection or the writer fails.
    closed: CancellationToken,
    /// Items handed over after the connection closed.
    dropped: AtomicU64,
}

/// Hub-side handle to one live connection.
#[derive(Debug, Clone)]
pub struct ConnHandle {
    id: ConnId,
    tx: mpsc::UnboundedSender<Outbound>,
    state: Arc<ConnState>,
}

impl ConnHandle {
    fn new(id: ConnId, tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            id,
            tx,
            state: Arc::new(ConnState {
                open: AtomicBool::new(true),
                closed: CancellationToken::new(),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    fn mark_closed(&self) {
        self.state.open.store(false, Ordering::Release);
    }

    /// Items dropped because the connection had already closed.
    pub fn drop_count(&self) -> u64 {
        self.state.dropped.load(Ordering::Relaxed)
    }
}

impl Link for ConnHandle {
    fn id(&self) -> ConnId {
        self.id
    }

    fn is_open(&self) -> bool {
        self.state.open.load(Ordering::Acquire) && !self.tx.is_closed()
    }

    fn send(&self, out: Outbound) -> bool {
        if self.is_open() && self.tx.send(out).is_ok() {
            return true;
        }
        self.state.dropped.fetch_add(1, Ordering::Relaxed);
        false
    }

    fn close(&self, reason: CloseReason) {
        if self.state.open.swap(false, Ordering::AcqRel) {
            if self.tx.send(Outbound::Close(reason)).is_err() {
                self.state.dropped.fetch_add(1, Ordering::Relaxed);
            }
            self.state.closed.cancel();
        }
    }
}

fn to_message(out: Outbound, conn: ConnId) -> Option<Message> {
    let msg = match out {
        Outbound::Event(event) => match event.to_json() {
            Ok(json) => Message::Text(json.into()),
            Err(e) => {
                warn!(%conn, event = event.name(), error = %e, "failed to encode control frame");
                return None;
            }
        },
        Outbound::Payload(Payload::Binary(data)) => Message::Binary(data),
        Outbound::Payload(Payload::Text(text)) => Message::Text(text.into()),
        Outbound::Ping => Message::Ping(Bytes::new()),
        Outbound::Close(reason) => Message::Close(Some(CloseFrame {
            code: reason.code(),
            reason: Utf8Bytes::from(reason.text().to_owned()),
        })),
    };
    Some(msg)
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    state: Arc<ConnState>,
    conn: ConnId,
) {
    while let Some(out) = rx.recv().await {
        let last = matches!(out, Outbound::Close(_));
        let Some(msg) = to_message(out, conn) else {
            continue;
        };
        if let Err(e) = sink.send(msg).await {
            debug!(%conn, error = %e, "write failed");
            break;
        }
        if last {
            break;
        }
    }
    state.open.store(false, Ordering::Release);
    state.closed.cancel();
    let _ = sink.close().await;
}

fn refuse(handle: &ConnHandle, origin: IpAddr, error: &PairingError) {
    if error.is_policy() {
        warn!(conn = %handle.id, %origin, %error, "connection refused");
    } else {
        debug!(conn = %handle.id, %origin, %error, "connection refused");
    }
    handle.notify(RelayEvent::Error {
        error: error.to_string(),
    });
    handle.close(CloseReason::Rejected(error.to_string()));
}

/// Drive one upgraded socket from accept to disconnect.
pub(crate) async fn run(
    socket: WebSocket,
    route: Result<Route, PairingError>,
    origin: IpAddr,
    app: AppState,
) {
    let conn = app.next_conn_id();
    let (sink, mut stream) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = ConnHandle::new(conn, tx);
    let writer = tokio::spawn(write_loop(sink, rx, handle.state.clone(), conn));

    let accepted = route.and_then(|route| app.hub.lock().accept(route, origin, handle.clone()));
    let binding: Binding = match accepted {
        Ok(binding) => binding,
        Err(error) => {
            refuse(&handle, origin, &error);
            drop(handle);
            let _ = writer.await;
            return;
        }
    };

    loop {
        tokio::select! {
            () = handle.state.closed.cancelled() => break,
            msg = stream.next() => match msg {
                Some(Ok(Message::Binary(data))) => {
                    app.hub.lock().forward(&binding, Payload::Binary(data));
                }
                Some(Ok(Message::Text(text))) => {
                    app.hub.lock().forward(&binding, Payload::Text(text.as_str().to_owned()));
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(%conn, error = %e, "read failed");
                    break;
                }
            }
        }
    }

    handle.mark_closed();
    app.hub.lock().disconnect(&binding);
    let dropped = handle.drop_count();
    if dropped > 0 {
        debug!(%conn, dropped, "outbound items dropped");
    }
    drop(handle);
    let _ = writer.await;
}
