//! Per-peer session record

use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A registered peer and the channel it currently sits in
///
/// The peer address is the identity; the name is only a label that a later
/// `/nick` may replace with a fresh session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Network address replies are sent to
    pub peer: SocketAddr,
    /// Display name, unique among live sessions
    pub name: String,
    /// Channel the session belongs to, if any
    pub current_channel: Option<String>,
    /// Last time we received any packet from this peer
    pub last_active: Instant,
}

impl Session {
    /// Creates a session for `peer` registered under `name`
    ///
    /// A new session sits in no channel and counts as active right away, so
    /// a freshly registered peer is never reported idle.
    pub fn new(peer: SocketAddr, name: String) -> Self {
        Self {
            peer,
            name,
            current_channel: None,
            last_active: Instant::now(),
        }
    }

    /// Marks the session as active now
    ///
    /// Called for every packet from the peer, whatever the command, so that
    /// idle expiry only ever hits peers that really went silent.
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// Checks if the session has exceeded the idle timeout
    ///
    /// Returns true if no packet arrived from this peer within `timeout`.
    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.last_active.elapsed() > timeout
    }
}
