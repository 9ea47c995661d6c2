//! Binding connections to session slots.
//!
//! Channel lifecycle:
//!
//! ```text
//! NONE --/new--> CREATED --/channel/{id}--> PAIRED
//!   PAIRED --client leaves--> CREATED (claimed)
//!   any    --host leaves----> NONE
//! ```
//!
//! Room lifecycle:
//!
//! ```text
//! NONE --/room/{name}--> one party --/room/{name}--> PAIRED
//!   PAIRED <--> one party <--> empty   (until reaped)
//! ```
//!
//! Rooms take the host slot whenever it has no open connection, so a host
//! that restarts reclaims its room. A second client replaces the first;
//! the host is never evicted by a newcomer.

use std::net::IpAddr;

use tracing::{debug, info};

use crate::error::PairingError;
use crate::event::RelayEvent;
use crate::hub::Hub;
use crate::id::{new_channel_id, short};
use crate::link::{CloseReason, Link};
use crate::route::Route;
use crate::session::{Binding, Role, Session, SessionKey, SessionKind};

const REPLACED_REASON: &str = "another client joined this room";

/// What a disconnect did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The departing role's slot was cleared; the session remains.
    Released,
    /// The session was deleted.
    Deleted,
    /// The slot is held by a newer connection; nothing changed.
    Stale,
    /// The session no longer exists.
    Gone,
}

impl<L: Link> Hub<L> {
    /// Bind an inbound connection according to its route.
    ///
    /// On error nothing has been mutated and nothing has been sent to
    /// `link`; the caller reports the error and closes.
    pub fn accept(
        &mut self,
        route: Route,
        origin: IpAddr,
        link: L,
    ) -> Result<Binding, PairingError> {
        match route {
            Route::NewChannel => self.create_channel(origin, link),
            Route::JoinChannel(id) => self.join_channel(id, link),
            Route::Room(name) => Ok(self.join_room(name, link)),
        }
    }

    fn create_channel(&mut self, origin: IpAddr, link: L) -> Result<Binding, PairingError> {
        let now = self.clock.now();
        let channels = &self.channels;
        self.rate.check_and_record(origin, now, || {
            channels
                .values()
                .filter(|s| s.creator() == Some(origin))
                .count()
        })?;

        let id = new_channel_id();
        let conn = link.id();
        link.notify(RelayEvent::ChannelCreated {
            channel_id: id.clone(),
        });
        self.channels
            .insert(id.clone(), Session::channel(link, origin, now));
        info!(%conn, channel = short(&id), %origin, "channel created");

        Ok(Binding {
            key: SessionKey::channel(id),
            role: Role::Host,
            conn,
        })
    }

    fn join_channel(&mut self, id: String, link: L) -> Result<Binding, PairingError> {
        let now = self.clock.now();
        let session = self
            .channels
            .get_mut(&id)
            .ok_or(PairingError::ChannelNotFound)?;
        if session.is_connected(Role::Client) {
            return Err(PairingError::ChannelOccupied);
        }

        let conn = link.id();
        let host_connected = session.is_connected(Role::Host);
        link.notify(RelayEvent::ChannelJoined {
            channel_id: id.clone(),
            role: Role::Client,
            host_connected,
        });
        session.bind(Role::Client, link, now);
        if let Some(host) = session.open(Role::Host) {
            host.notify(RelayEvent::ClientConnected { client_count: None });
        }
        info!(%conn, channel = short(&id), host_connected, "client joined channel");

        Ok(Binding {
            key: SessionKey::channel(id),
            role: Role::Client,
            conn,
        })
    }

    fn join_room(&mut self, name: String, link: L) -> Binding {
        let now = self.clock.now();
        let session = self
            .rooms
            .entry(name.clone())
            .or_insert_with(|| Session::room(now));

        let role = if session.is_connected(Role::Host) {
            Role::Client
        } else {
            Role::Host
        };
        if role == Role::Client {
            if let Some(previous) = session.open(Role::Client) {
                previous.notify(RelayEvent::Replaced {
                    reason: REPLACED_REASON.to_owned(),
                });
                previous.close(CloseReason::Replaced);
                info!(conn = %previous.id(), room = short(&name), "room client replaced");
            }
        }

        let conn = link.id();
        let peer_connected = session.is_connected(role.peer());
        link.notify(RelayEvent::RoomJoined {
            room_id: name.clone(),
            role,
            client_connected: (role == Role::Host).then_some(peer_connected),
            host_connected: (role == Role::Client).then_some(peer_connected),
        });
        session.bind(role, link, now);
        if let Some(peer) = session.open(role.peer()) {
            peer.notify(match role {
                Role::Host => RelayEvent::HostConnected,
                Role::Client => RelayEvent::ClientConnected {
                    client_count: Some(1),
                },
            });
        }
        info!(%conn, room = short(&name), %role, peer_connected, "joined room");

        Binding {
            key: SessionKey::room(name),
            role,
            conn,
        }
    }

    /// Handle the terminal close of a bound connection.
    ///
    /// Only the connection that still occupies its slot may change state.
    /// A superseded connection whose close arrives late is ignored.
    pub fn disconnect(&mut self, binding: &Binding) -> Departure {
        let Binding { key, role, conn } = binding;
        let role = *role;
        let sessions = self.sessions_mut(key.kind);
        let Some(session) = sessions.get_mut(&key.id) else {
            return Departure::Gone;
        };
        if !session.holds(role, *conn) {
            debug!(%conn, %role, session = short(&key.id), "stale disconnect ignored");
            return Departure::Stale;
        }

        let departure = match (key.kind, role) {
            (SessionKind::Channel, Role::Host) => {
                if let Some(client) = session.open(Role::Client) {
                    client.notify(RelayEvent::HostDisconnected);
                }
                sessions.remove(&key.id);
                Departure::Deleted
            }
            (SessionKind::Channel, Role::Client) => {
                session.release(Role::Client);
                if let Some(host) = session.open(Role::Host) {
                    host.notify(RelayEvent::ClientDisconnected { client_count: None });
                }
                Departure::Released
            }
            (SessionKind::Room, _) => {
                session.release(role);
                if let Some(peer) = session.open(role.peer()) {
                    peer.notify(match role {
                        Role::Host => RelayEvent::HostDisconnected,
                        Role::Client => RelayEvent::ClientDisconnected {
                            client_count: Some(0),
                        },
                    });
                }
                Departure::Released
            }
        };
        info!(%conn, %role, kind = %key.kind, session = short(&key.id), ?departure, "disconnected");
        departure
    }
}
