//! Process-wide chat state
//!
//! `ChatState` owns the session directory and the channel registry and only
//! exposes operations that change both sides together: after any call
//! returns, every session's current channel exists and lists that session as
//! a member, and every channel member has a session pointing back at it.
//! The server keeps a single instance behind a lock, so each operation is one
//! atomic step with respect to other readers.

use crate::channels::{ChannelRegistry, ChannelSummary};
use crate::directory::SessionDirectory;
use crate::session::Session;
use log::info;
use shared::{chat_line, departed_line, joined_line};
use std::net::SocketAddr;
use std::time::Duration;

/// A session leaving its channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub channel: String,
    pub name: String,
    /// Address of the session that left
    pub peer: SocketAddr,
    /// Remaining members to notify
    pub recipients: Vec<SocketAddr>,
    /// True when the channel was deleted because it became empty
    pub closed: bool,
}

/// A session entering a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrival {
    pub channel: String,
    pub name: String,
    /// History as it stood before this join
    pub history: Vec<String>,
    /// Other members to notify
    pub recipients: Vec<SocketAddr>,
    /// Channel the session left first, if it was in one
    pub departure: Option<Departure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Registered {
        /// Channel left by the session this registration replaced
        departure: Option<Departure>,
    },
    NameTaken,
}

/// Where a chat line goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relay {
    Channel {
        channel: String,
        line: String,
        recipients: Vec<SocketAddr>,
    },
    Global {
        name: String,
        recipients: Vec<SocketAddr>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivateDelivery {
    Deliver { sender: String, recipient: SocketAddr },
    UnknownRecipient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub name: String,
    pub departure: Option<Departure>,
}

#[derive(Debug, Default)]
pub struct ChatState {
    directory: SessionDirectory,
    channels: ChannelRegistry,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(&self) -> &SessionDirectory {
        &self.directory
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Refreshes the sender's activity timestamp if it has a session
    pub fn touch(&mut self, peer: SocketAddr) -> bool {
        self.directory.touch(peer)
    }

    /// Registers `peer` under `name` unless another peer holds that name
    ///
    /// A previous session of the same peer is taken out of its channel and
    /// replaced by a fresh one with no channel.
    pub fn register(&mut self, peer: SocketAddr, name: &str) -> Registration {
        if self.directory.is_taken_by_other(name, peer) {
            return Registration::NameTaken;
        }

        let departure = self.leave_current(peer);
        if let Some(previous) = self.directory.remove_by_peer(peer) {
            info!("{} re-registering as {}", previous.name, name);
        }

        self.directory.insert(Session::new(peer, name.to_string()));
        info!("{} has joined the chat", name);

        Registration::Registered { departure }
    }

    /// Moves the sender into `channel`, leaving its current channel first
    pub fn join(&mut self, peer: SocketAddr, channel: &str) -> Option<Arrival> {
        self.directory.by_peer(peer)?;
        let departure = self.leave_current(peer);

        let session = self.directory.by_peer_mut(peer)?;
        session.current_channel = Some(channel.to_string());
        let name = session.name.clone();

        let history = self.channels.add_member(channel, &name).history.clone();
        let recipients = self.peers_of(self.channels.members_except(channel, Some(&name)));
        self.channels.append(channel, joined_line(&name));

        Some(Arrival {
            channel: channel.to_string(),
            name,
            history,
            recipients,
            departure,
        })
    }

    /// Leaves `channel` if, and only if, it is the sender's current channel
    pub fn leave(&mut self, peer: SocketAddr, channel: &str) -> Option<Departure> {
        let session = self.directory.by_peer_mut(peer)?;
        if session.current_channel.as_deref() != Some(channel) {
            return None;
        }
        session.current_channel = None;
        let name = session.name.clone();

        self.channels.remove_member(channel, &name);
        let recipients = self.peers_of(self.channels.members_except(channel, None));
        self.channels.append(channel, departed_line(&name));
        let closed = self.channels.remove_if_empty(channel);

        Some(Departure {
            channel: channel.to_string(),
            name,
            peer,
            recipients,
            closed,
        })
    }

    /// Resolves the audience of a chat line and records it in channel history
    pub fn relay(&mut self, peer: SocketAddr, text: &str) -> Option<Relay> {
        let session = self.directory.by_peer(peer)?;
        let name = session.name.clone();

        match session.current_channel.clone() {
            Some(channel) => {
                let line = chat_line(&name, text);
                let recipients =
                    self.peers_of(self.channels.members_except(&channel, Some(&name)));
                self.channels.append(&channel, line.clone());
                Some(Relay::Channel {
                    channel,
                    line,
                    recipients,
                })
            }
            None => Some(Relay::Global {
                recipients: self.directory.peers_except(peer),
                name,
            }),
        }
    }

    /// Resolves a private message; `None` when the sender is unregistered
    pub fn private_message(&self, peer: SocketAddr, to: &str) -> Option<PrivateDelivery> {
        let sender = self.directory.by_peer(peer)?.name.clone();

        Some(match self.directory.get(to) {
            Some(recipient) => PrivateDelivery::Deliver {
                sender,
                recipient: recipient.peer,
            },
            None => PrivateDelivery::UnknownRecipient,
        })
    }

    /// Takes the sender out of its channel and deletes its session
    pub fn remove(&mut self, peer: SocketAddr) -> Option<Removal> {
        self.directory.by_peer(peer)?;
        let departure = self.leave_current(peer);
        let session = self.directory.remove_by_peer(peer)?;
        info!("{} has left the chat", session.name);

        Some(Removal {
            name: session.name,
            departure,
        })
    }

    /// Removes the session from `peer` only if it is still idle
    ///
    /// Expiry decisions are taken under a read lock and applied later, so a
    /// packet handled in between may already have refreshed the session.
    pub fn remove_if_idle(&mut self, peer: SocketAddr, timeout: Duration) -> Option<Removal> {
        if !self.directory.by_peer(peer)?.is_idle(timeout) {
            return None;
        }
        self.remove(peer)
    }

    pub fn channel_summaries(&self) -> Vec<ChannelSummary> {
        self.channels.summaries()
    }

    pub fn idle_peers(&self, timeout: Duration) -> Vec<SocketAddr> {
        self.directory.idle_peers(timeout)
    }

    /// Checks the two-way link between sessions and channel members
    pub fn is_consistent(&self) -> bool {
        let sessions_ok = self.directory.iter().all(|session| match &session.current_channel {
            Some(channel) => self.channels.is_member(channel, &session.name),
            None => true,
        });

        let members_ok = self.channels.iter().all(|(channel, entry)| {
            !entry.members.is_empty()
                && entry.members.iter().all(|member| {
                    self.directory
                        .get(member)
                        .is_some_and(|s| s.current_channel.as_deref() == Some(channel.as_str()))
                })
        });

        sessions_ok && members_ok
    }

    fn leave_current(&mut self, peer: SocketAddr) -> Option<Departure> {
        let channel = self.directory.by_peer(peer)?.current_channel.clone()?;
        self.leave(peer, &channel)
    }

    fn peers_of(&self, names: Vec<String>) -> Vec<SocketAddr> {
        names
            .iter()
            .filter_map(|name| self.directory.get(name))
            .map(|session| session.peer)
            .collect()
    }
}
