//! pairlink client
//!
//! Async endpoint library for the pairlink relay. A [`RelayClient`] is one
//! WebSocket connection bound to a channel or room; it surfaces the
//! relay's control frames as [`RelayEvent`]s and everything else as opaque
//! [`Payload`]s.
//!
//! ```no_run
//! # async fn demo() -> Result<(), pairlink_client::ClientError> {
//! use pairlink_client::{Payload, RelayClient, Target};
//!
//! let (mut host, id) = RelayClient::create_channel("ws://127.0.0.1:8080").await?;
//! let mut client = RelayClient::connect("ws://127.0.0.1:8080", Target::Channel(id)).await?;
//! client.send(Payload::Text("hello".into())).await?;
//! let _ = host.recv().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

mod client;
pub mod error;
pub mod target;

pub use client::{Incoming, RelayClient};
pub use error::ClientError;
pub use target::Target;

pub use pairlink_core::{Payload, RelayEvent, Role};
