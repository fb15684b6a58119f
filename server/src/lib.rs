//! # Chat Relay Server Library
//!
//! This library provides the server side of a connectionless multi-user chat
//! relay. Clients send unsolicited UDP datagrams; each one is either a command
//! (`/nick`, `/join`, `/leave`, `/channels`, `/msg`, `/quit`) or a chat line.
//! The server keeps sessions, channel membership and channel history in
//! memory and answers with plain-text datagrams.
//!
//! ## Architecture Design
//!
//! ### Single Consumer
//! Every inbound datagram is dequeued by one main loop and fully processed
//! (parsed, routed, all resulting sends queued) before the next one is read.
//! Two packets can therefore never interleave their changes to the same
//! session or channel.
//!
//! ### Shared State Behind One Lock
//! The chat state is a single object constructed at server start. It lives
//! behind an `Arc<RwLock<_>>` so that background tasks (the idle checker)
//! can read it, and every mutating operation happens under one write-lock
//! acquisition.
//!
//! ### Fire-and-Forget Delivery
//! The router returns the datagrams to send; a separate sender task writes
//! them to the socket. A failed send is logged and the remaining recipients
//! are still served. There is no acknowledgment or retransmission.
//!
//! ## Module Organization
//!
//! - `session`: per-peer record (name, current channel, last activity)
//! - `directory`: sessions by name, with a peer-address index
//! - `channels`: member sets and append-only history per channel
//! - `state`: the combined store and its atomic operations
//! - `router`: command dispatch and reply formatting
//! - `network`: UDP receiver, sender and idle-checker tasks plus the main loop
//! - `config`, `error`: server configuration and startup errors
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default().with_idle_timeout_secs(300);
//!     let mut server = Server::new(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod channels;
pub mod config;
pub mod directory;
pub mod error;
pub mod network;
pub mod router;
pub mod session;
pub mod state;
