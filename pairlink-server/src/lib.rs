//! pairlink relay server.
//!
//! Serves the three pairing routes over WebSocket plus a plain HTTP health
//! report on the same port. All pairing state lives in one
//! [`pairlink_core::Hub`] behind a mutex; sockets only ever talk to it
//! through their [`connection::ConnHandle`].

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
mod connection;
mod routes;
mod sweep;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use pairlink_core::{ConnId, Hub};

pub use config::{ConfigError, ServerConfig};
pub use connection::ConnHandle;

pub(crate) type SharedHub = Arc<Mutex<Hub<ConnHandle>>>;

/// State shared by every request handler and connection task.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) hub: SharedHub,
    pub(crate) config: Arc<ServerConfig>,
    pub(crate) started_at: Instant,
    next_conn: Arc<AtomicU64>,
}

impl AppState {
    fn new(config: ServerConfig) -> Self {
        let hub = Hub::with_system_clock(config.limits.clone());
        Self {
            hub: Arc::new(Mutex::new(hub)),
            config: Arc::new(config),
            started_at: Instant::now(),
            next_conn: Arc::new(AtomicU64::new(1)),
        }
    }

    pub(crate) fn next_conn_id(&self) -> ConnId {
        ConnId::new(self.next_conn.fetch_add(1, Ordering::Relaxed))
    }
}

/// Serve on `listener` until the process exits.
pub async fn run_server(listener: TcpListener, config: ServerConfig) -> std::io::Result<()> {
    run_server_with_shutdown(listener, config, std::future::pending()).await
}

/// Serve on `listener` until `signal` resolves, then close every session.
pub async fn run_server_with_shutdown<F>(
    listener: TcpListener,
    config: ServerConfig,
    signal: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::new(config);
    let token = CancellationToken::new();
    let sweeps = sweep::spawn(state.hub.clone(), &state.config.limits, token.clone());

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "relay listening");
    }

    let hub = state.hub.clone();
    let app = routes::router(state);
    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        signal.await;
        token.cancel();
        let closed = hub.lock().shutdown();
        info!(closed, "shutting down");
    })
    .await;

    for task in sweeps {
        let _ = task.await;
    }
    info!("relay stopped");
    result
}
