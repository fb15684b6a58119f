//! Session directory: who is connected, and from where
//!
//! Sessions are keyed by display name, with a secondary index from peer
//! address to name so that every inbound packet resolves its sender without
//! scanning. Both maps are only ever changed together.

use crate::session::Session;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

/// Live sessions indexed by name and by peer address
#[derive(Debug, Default)]
pub struct SessionDirectory {
    /// Sessions indexed by their display name
    sessions: HashMap<String, Session>,
    /// Peer address -> display name, kept in lockstep with `sessions`
    names_by_peer: HashMap<SocketAddr, String>,
}

impl SessionDirectory {
    /// Creates an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `name` belongs to a session of some other peer
    ///
    /// A peer asking again for the name it already holds is not a conflict;
    /// that request simply replaces its own session.
    pub fn is_taken_by_other(&self, name: &str, peer: SocketAddr) -> bool {
        self.sessions
            .get(name)
            .is_some_and(|session| session.peer != peer)
    }

    /// Inserts a session, displacing any entry that shares its name or peer
    ///
    /// Callers check `is_taken_by_other` first; the displacement only keeps
    /// the two indexes consistent.
    pub fn insert(&mut self, session: Session) {
        self.remove_by_peer(session.peer);
        if let Some(previous) = self.sessions.remove(&session.name) {
            self.names_by_peer.remove(&previous.peer);
        }

        self.names_by_peer.insert(session.peer, session.name.clone());
        self.sessions.insert(session.name.clone(), session);
    }

    /// Removes the session registered from `peer`
    ///
    /// Both indexes are cleared. Returns the removed session so the caller
    /// can log or announce the departure, or None if the peer had none.
    pub fn remove_by_peer(&mut self, peer: SocketAddr) -> Option<Session> {
        let name = self.names_by_peer.remove(&peer)?;
        self.sessions.remove(&name)
    }

    /// Looks up a session by display name
    ///
    /// Used to resolve `/msg` recipients and channel members, which are
    /// stored by name, back to an address.
    pub fn get(&self, name: &str) -> Option<&Session> {
        self.sessions.get(name)
    }

    /// Mutable lookup by display name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Session> {
        self.sessions.get_mut(name)
    }

    /// Finds the session registered from a network address
    ///
    /// Every inbound packet is attributed to its sender through this lookup.
    /// Returns None if the peer never registered or has since quit.
    pub fn by_peer(&self, peer: SocketAddr) -> Option<&Session> {
        self.names_by_peer
            .get(&peer)
            .and_then(|name| self.sessions.get(name))
    }

    /// Mutable variant of `by_peer`
    pub fn by_peer_mut(&mut self, peer: SocketAddr) -> Option<&mut Session> {
        let name = self.names_by_peer.get(&peer)?;
        self.sessions.get_mut(name)
    }

    /// Refreshes the activity timestamp; returns false for unknown peers
    pub fn touch(&mut self, peer: SocketAddr) -> bool {
        match self.by_peer_mut(peer) {
            Some(session) => {
                session.touch();
                true
            }
            None => false,
        }
    }

    /// Addresses of every live session except `peer`
    ///
    /// This is the audience of a global chat line. Order is unspecified.
    pub fn peers_except(&self, peer: SocketAddr) -> Vec<SocketAddr> {
        self.names_by_peer
            .keys()
            .copied()
            .filter(|addr| *addr != peer)
            .collect()
    }

    /// Peers that have been silent for longer than `timeout`
    ///
    /// Only a snapshot: a peer listed here may send a packet before its
    /// expiry is applied, so the removal has to check again.
    pub fn idle_peers(&self, timeout: Duration) -> Vec<SocketAddr> {
        self.sessions
            .values()
            .filter(|session| session.is_idle(timeout))
            .map(|session| session.peer)
            .collect()
    }

    /// Iterates over all live sessions in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
