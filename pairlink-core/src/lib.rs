//! pairlink pairing engine
//!
//! Pairs exactly two endpoints, a host and a client, under a session id so
//! they can exchange opaque frames through a relay neither of them can
//! reach past. This crate holds the whole state machine and no I/O:
//!
//! - Identifier generation and validation
//! - Path grammar for the three connection routes
//! - Control-frame encoding
//! - Per-origin rate limiting
//! - Session registry, pairing transitions, forwarding, reaping
//!
//! # Invariants
//!
//! - At most one connection holds each role slot
//! - A channel never has two open clients
//! - A room's open host is never displaced by a newcomer
//! - Only the connection currently in a slot can clear it
//! - Payloads are never parsed, buffered or altered

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod hub;
pub mod id;
pub mod link;
pub mod pairing;
pub mod rate;
pub mod reaper;
pub mod route;
pub mod session;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Limits;
pub use error::PairingError;
pub use event::RelayEvent;
pub use hub::{Hub, HubStats};
pub use link::{CloseReason, ConnId, Link, Outbound, Payload};
pub use pairing::Departure;
pub use reaper::ReapReport;
pub use route::Route;
pub use session::{Binding, Role, SessionKey, SessionKind};
