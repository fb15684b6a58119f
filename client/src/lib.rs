//! # Chat Client Library
//!
//! Interactive line client for the chat relay. It reads lines from stdin,
//! forwards them to the server as single UDP datagrams and prints every
//! datagram the server sends back.
//!
//! ## Module Organization
//!
//! ### Input Module (`input`)
//! Decides what to do with a typed line: the client handles `/help`,
//! `/reconnect` and `/quit` itself (case-insensitive) and forwards
//! everything else verbatim.
//!
//! ### Network Module (`network`)
//! Owns the UDP socket, registers the nickname on start-up and on
//! `/reconnect`, and multiplexes stdin and the socket in one loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::new("127.0.0.1:9876", Some("alice".to_string())).await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod input;
pub mod network;
