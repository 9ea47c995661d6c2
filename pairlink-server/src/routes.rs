//! HTTP entry point.
//!
//! One handler sees every request. WebSocket upgrades are routed by the
//! pairing path grammar, so an unknown path still gets an `error` event
//! before closure. Plain HTTP requests get the banner, the health report,
//! or 404.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts, Request, State, WebSocketUpgrade};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;

use pairlink_core::Route;

use crate::{connection, AppState};

const BANNER: &str = "pairlink relay\n";

const X_FORWARDED_FOR: &str = "x-forwarded-for";

pub(crate) fn router(state: AppState) -> Router {
    Router::new().fallback(entry).with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Health {
    status: &'static str,
    channels: usize,
    rooms: usize,
    connections: usize,
    uptime_secs: u64,
}

fn health(state: &AppState) -> Health {
    let stats = state.hub.lock().stats();
    Health {
        status: "ok",
        channels: stats.channels,
        rooms: stats.rooms,
        connections: stats.connections,
        uptime_secs: state.started_at.elapsed().as_secs(),
    }
}

/// Origin address used for rate limiting.
fn origin_of(headers: &HeaderMap, peer: SocketAddr, trust_forwarded_for: bool) -> IpAddr {
    if trust_forwarded_for {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|first| first.trim().parse().ok());
        if let Some(ip) = forwarded {
            return ip;
        }
    }
    peer.ip()
}

async fn entry(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    req: Request,
) -> Response {
    let (mut parts, _body) = req.into_parts();

    match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
        Ok(ws) => {
            let origin = origin_of(&parts.headers, peer, state.config.trust_forwarded_for);
            let route = Route::parse(parts.uri.path());
            ws.max_message_size(state.config.max_frame_bytes)
                .on_upgrade(move |socket| connection::run(socket, route, origin, state))
        }
        Err(_) if parts.method != Method::GET => StatusCode::NOT_FOUND.into_response(),
        Err(_) => match parts.uri.path() {
            "/" => BANNER.into_response(),
            "/health" => Json(health(&state)).into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        },
    }
}
