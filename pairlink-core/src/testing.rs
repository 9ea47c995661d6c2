//! Recording [`Link`] for unit tests.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::RelayEvent;
use crate::link::{CloseReason, ConnId, Link, Outbound, Payload};

pub const ORIGIN: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10));
pub const OTHER_ORIGIN: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 20));

static NEXT: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub struct TestLink {
    id: ConnId,
    open: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<Outbound>>>,
}

impl TestLink {
    pub fn new() -> Self {
        Self {
            id: ConnId::new(NEXT.fetch_add(1, Ordering::Relaxed)),
            open: Arc::new(AtomicBool::new(true)),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Simulate the transport dropping without the hub being told yet.
    pub fn drop_transport(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Drain everything queued so far.
    pub fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Drain and keep only control events.
    pub fn events(&self) -> Vec<RelayEvent> {
        self.take()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Event(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    /// Drain and keep only payloads.
    pub fn payloads(&self) -> Vec<Payload> {
        self.take()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Payload(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// The close reason, if a close was queued.
    pub fn closed_with(&self) -> Option<CloseReason> {
        self.sent.lock().iter().find_map(|o| match o {
            Outbound::Close(r) => Some(r.clone()),
            _ => None,
        })
    }
}

impl Link for TestLink {
    fn id(&self) -> ConnId {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send(&self, out: Outbound) -> bool {
        if !self.is_open() {
            return false;
        }
        self.sent.lock().push(out);
        true
    }

    fn close(&self, reason: CloseReason) {
        if self.open.swap(false, Ordering::SeqCst) {
            self.sent.lock().push(Outbound::Close(reason));
        }
    }
}
