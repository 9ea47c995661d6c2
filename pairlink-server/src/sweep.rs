//! Background timers: session expiry and keepalive pings.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use pairlink_core::Limits;

use crate::SharedHub;

pub(crate) fn spawn(
    hub: SharedHub,
    limits: &Limits,
    token: CancellationToken,
) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(reap_loop(hub.clone(), limits.reap_interval, token.clone())),
        tokio::spawn(keepalive_loop(hub, limits.keepalive_interval, token)),
    ]
}

fn ticker(period: Duration) -> time::Interval {
    // The first tick of an interval completes immediately.
    let mut interval = time::interval_at(time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn reap_loop(hub: SharedHub, period: Duration, token: CancellationToken) {
    let mut interval = ticker(period);
    loop {
        tokio::select! {
            () = token.cancelled() => break,
            _ = interval.tick() => {
                hub.lock().reap();
            }
        }
    }
    debug!("reaper stopped");
}

async fn keepalive_loop(hub: SharedHub, period: Duration, token: CancellationToken) {
    let mut interval = ticker(period);
    loop {
        tokio::select! {
            () = token.cancelled() => break,
            _ = interval.tick() => {
                let pinged = hub.lock().keepalive();
                debug!(pinged, "keepalive");
            }
        }
    }
    debug!("keepalive stopped");
}
