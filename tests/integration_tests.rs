//! Integration tests for the chat relay
//!
//! These tests run a real server on a loopback port and talk to it over UDP,
//! the same way the interactive client does.

use server::config::ServerConfig;
use server::network::{Server, ServerMessage};
use server::state::ChatState;
use shared::MAX_PACKET_SIZE;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::timeout;

struct TestServer {
    addr: SocketAddr,
    state: Arc<RwLock<ChatState>>,
    control: mpsc::UnboundedSender<ServerMessage>,
}

impl TestServer {
    async fn start() -> Self {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        let mut server = tokio_test::assert_ok!(Server::new(config).await);
        let addr = server.local_addr().unwrap();
        let state = server.state();
        let control = server.control();

        tokio::spawn(async move { server.run().await });

        TestServer {
            addr,
            state,
            control,
        }
    }

    async fn peer(&self) -> TestPeer {
        TestPeer {
            socket: UdpSocket::bind("127.0.0.1:0").await.unwrap(),
            server: self.addr,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.control.send(ServerMessage::Shutdown);
    }
}

struct TestPeer {
    socket: UdpSocket,
    server: SocketAddr,
}

impl TestPeer {
    async fn send(&self, text: &str) {
        self.socket.send_to(text.as_bytes(), self.server).await.unwrap();
    }

    async fn recv(&self) -> String {
        let mut buf = [0u8; MAX_PACKET_SIZE];
        let (len, _) = timeout(Duration::from_secs(2), self.socket.recv_from(&mut buf))
            .await
            .expect("timed out waiting for a datagram")
            .unwrap();
        String::from_utf8_lossy(&buf[..len]).into_owned()
    }

    async fn recv_n(&self, n: usize) -> Vec<String> {
        let mut lines = Vec::with_capacity(n);
        for _ in 0..n {
            lines.push(self.recv().await);
        }
        lines
    }

    async fn expect_silence(&self) {
        let mut buf = [0u8; MAX_PACKET_SIZE];
        let result = timeout(Duration::from_millis(200), self.socket.recv_from(&mut buf)).await;
        if let Ok(Ok((len, _))) = result {
            panic!(
                "unexpected datagram: {}",
                String::from_utf8_lossy(&buf[..len])
            );
        }
    }

    async fn register(&self, name: &str) {
        self.send(&format!("/nick {}", name)).await;
        assert_eq!(
            self.recv().await,
            format!("Welcome {}! Type /join <channel> to join a channel.", name)
        );
    }
}

/// Registers alice and bob and puts both into `general`
async fn alice_and_bob_in_general(server: &TestServer) -> (TestPeer, TestPeer) {
    let alice = server.peer().await;
    let bob = server.peer().await;
    alice.register("alice").await;
    bob.register("bob").await;

    alice.send("/join general").await;
    assert_eq!(
        alice.recv_n(2).await,
        vec!["--- Channel history for general ---", "--- End of history ---"]
    );

    bob.send("/join general").await;
    assert_eq!(
        bob.recv_n(3).await,
        vec![
            "--- Channel history for general ---",
            "alice has joined the channel",
            "--- End of history ---",
        ]
    );
    assert_eq!(alice.recv().await, "[general] bob has joined the channel");

    (alice, bob)
}

/// CHANNEL ROUTING TESTS
mod channel_tests {
    use super::*;

    #[tokio::test]
    async fn channel_chat_is_relayed_to_others_only() {
        let server = TestServer::start().await;
        let (alice, bob) = alice_and_bob_in_general(&server).await;

        alice.send("hello").await;
        assert_eq!(bob.recv().await, "[general] alice: hello");
        alice.expect_silence().await;
    }

    #[tokio::test]
    async fn leave_notifies_remaining_members() {
        let server = TestServer::start().await;
        let (alice, bob) = alice_and_bob_in_general(&server).await;

        alice.send("/leave general").await;
        assert_eq!(alice.recv().await, "You left channel: general");
        assert_eq!(bob.recv().await, "[general] alice has left the channel");

        let state = server.state.read().await;
        let members = &state.channels().get("general").unwrap().members;
        assert_eq!(members.len(), 1);
        assert!(members.contains("bob"));
        assert!(state.is_consistent());
    }

    #[tokio::test]
    async fn history_is_replayed_in_order() {
        let server = TestServer::start().await;
        let (alice, bob) = alice_and_bob_in_general(&server).await;

        alice.send("one").await;
        assert_eq!(bob.recv().await, "[general] alice: one");
        bob.send("two").await;
        assert_eq!(alice.recv().await, "[general] bob: two");

        let carol = server.peer().await;
        carol.register("carol").await;
        carol.send("/join general").await;
        assert_eq!(
            carol.recv_n(6).await,
            vec![
                "--- Channel history for general ---",
                "alice has joined the channel",
                "bob has joined the channel",
                "alice: one",
                "bob: two",
                "--- End of history ---",
            ]
        );
    }

    #[tokio::test]
    async fn empty_channel_disappears_from_listing() {
        let server = TestServer::start().await;
        let (alice, bob) = alice_and_bob_in_general(&server).await;

        alice.send("/leave general").await;
        alice.recv().await;
        bob.recv().await;
        bob.send("/leave general").await;
        assert_eq!(bob.recv().await, "You left channel: general");

        // Listing is answered even for peers without a session
        let stranger = server.peer().await;
        stranger.send("/channels").await;
        assert_eq!(stranger.recv().await, "No active channels");
    }
}

/// SESSION TESTS
mod session_tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_nickname_rejected() {
        let server = TestServer::start().await;
        let first = server.peer().await;
        let second = server.peer().await;

        first.register("alice").await;
        second.send("/nick alice").await;
        assert_eq!(second.recv().await, "Nickname alice is already taken");

        let state = server.state.read().await;
        assert_eq!(state.directory().len(), 1);
        assert_eq!(
            state.directory().get("alice").unwrap().peer,
            first.socket.local_addr().unwrap()
        );
    }

    #[tokio::test]
    async fn private_message_to_unknown_name() {
        let server = TestServer::start().await;
        let alice = server.peer().await;
        let carol = server.peer().await;
        alice.register("alice").await;
        carol.register("carol").await;

        alice.send("/msg bob hi there").await;
        assert_eq!(alice.recv().await, "User bob not found");
        carol.expect_silence().await;
    }

    #[tokio::test]
    async fn private_message_delivered_with_confirmation() {
        let server = TestServer::start().await;
        let (alice, bob) = alice_and_bob_in_general(&server).await;

        alice.send("/msg bob hi there").await;
        assert_eq!(bob.recv().await, "[PM from alice] hi there");
        assert_eq!(alice.recv().await, "[PM to bob] hi there");
    }

    #[tokio::test]
    async fn global_chat_without_channel() {
        let server = TestServer::start().await;
        let (alice, bob) = alice_and_bob_in_general(&server).await;
        let carol = server.peer().await;
        carol.register("carol").await;

        carol.send("hi all").await;
        assert_eq!(alice.recv().await, "[Global] carol: hi all");
        assert_eq!(bob.recv().await, "[Global] carol: hi all");
        carol.expect_silence().await;
    }

    #[tokio::test]
    async fn unregistered_chat_is_dropped() {
        let server = TestServer::start().await;
        let alice = server.peer().await;
        let stranger = server.peer().await;
        alice.register("alice").await;

        stranger.send("hello?").await;
        stranger.send("/join general").await;
        alice.expect_silence().await;
        stranger.expect_silence().await;
        assert!(server.state.read().await.channels().is_empty());
    }

    #[tokio::test]
    async fn quit_frees_name_and_leaves_channel() {
        let server = TestServer::start().await;
        let (alice, bob) = alice_and_bob_in_general(&server).await;

        alice.send("/quit").await;
        assert_eq!(alice.recv().await, "You left channel: general");
        assert_eq!(bob.recv().await, "[general] alice has left the channel");

        let newcomer = server.peer().await;
        newcomer.register("alice").await;

        let state = server.state.read().await;
        assert_eq!(state.directory().len(), 2);
        assert!(state.is_consistent());
    }
}

/// CLIENT-SERVER INTEGRATION TESTS
mod client_server_tests {
    use super::*;
    use client::input::InputAction;

    /// Lines the client forwards arrive at the server exactly as typed
    #[tokio::test]
    async fn forwarded_client_lines_are_routed() {
        let server = TestServer::start().await;
        let peer = server.peer().await;

        for line in ["/nick alice", "/join general"] {
            match InputAction::from_line(line) {
                InputAction::Forward(text) => peer.send(&text).await,
                other => panic!("line should be forwarded: {:?}", other),
            }
        }

        assert_eq!(
            peer.recv_n(3).await,
            vec![
                "Welcome alice! Type /join <channel> to join a channel.",
                "--- Channel history for general ---",
                "--- End of history ---",
            ]
        );
    }

    /// Client-local commands never reach the server
    #[test]
    fn local_commands_are_not_forwarded() {
        for line in ["/help", "/reconnect", "/quit", "   "] {
            assert!(!matches!(
                InputAction::from_line(line),
                InputAction::Forward(_)
            ));
        }
    }
}
