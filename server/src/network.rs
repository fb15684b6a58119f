//! Server network layer handling UDP communications and routing coordination

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::router::{self, Outbound};
use crate::state::ChatState;
use log::{debug, error, info, warn};
use shared::MAX_PACKET_SIZE;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { payload: String, addr: SocketAddr },
    SessionExpired { peer: SocketAddr },
    Shutdown,
}

/// Messages sent from the main loop to the sender task
#[derive(Debug)]
pub enum DeliveryMessage {
    Send(Outbound),
    Batch(Vec<Outbound>),
}

/// Main server coordinating networking and chat routing
pub struct Server {
    socket: Arc<UdpSocket>,
    state: Arc<RwLock<ChatState>>,
    config: ServerConfig,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    delivery_tx: mpsc::UnboundedSender<DeliveryMessage>,
    delivery_rx: mpsc::UnboundedReceiver<DeliveryMessage>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let socket = UdpSocket::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket: Arc::new(socket),
            state: Arc::new(RwLock::new(ChatState::new())),
            config,
            server_tx,
            server_rx,
            delivery_tx,
            delivery_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.socket.local_addr()?)
    }

    /// Shared handle to the chat state, for inspection
    pub fn state(&self) -> Arc<RwLock<ChatState>> {
        Arc::clone(&self.state)
    }

    /// Sender into the main loop; `ServerMessage::Shutdown` stops `run`
    pub fn control(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            // Datagrams longer than the buffer are truncated by the socket
            let mut buffer = [0u8; MAX_PACKET_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        let payload = String::from_utf8_lossy(&buffer[..len]).into_owned();
                        if let Err(e) = server_tx.send(ServerMessage::PacketReceived { payload, addr })
                        {
                            error!("Failed to send packet to main loop: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        })
    }

    /// Spawns task that processes outgoing datagram queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut delivery_rx = std::mem::replace(&mut self.delivery_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = delivery_rx.recv().await {
                match message {
                    DeliveryMessage::Send(outbound) => Self::send_datagram(&socket, &outbound).await,
                    DeliveryMessage::Batch(batch) => {
                        for outbound in &batch {
                            Self::send_datagram(&socket, outbound).await;
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that reports sessions which went silent
    ///
    /// The checker only reads the state. Whether a reported session is still
    /// idle is decided again by the main loop when the expiry is applied.
    fn spawn_idle_checker(&self, timeout: Duration) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let idle = {
                    let state_guard = state.read().await;
                    state_guard.idle_peers(timeout)
                };

                for peer in idle {
                    if let Err(e) = server_tx.send(ServerMessage::SessionExpired { peer }) {
                        error!("Failed to send expiry message: {}", e);
                        return;
                    }
                }
            }
        })
    }

    /// Sends one datagram; failures are logged and never propagated
    async fn send_datagram(socket: &UdpSocket, outbound: &Outbound) {
        if let Err(e) = socket.send_to(outbound.text.as_bytes(), outbound.addr).await {
            error!("Failed to send to {}: {}", outbound.addr, e);
        }
    }

    fn deliver(&self, mut outbound: Vec<Outbound>) {
        let message = if outbound.len() > 1 {
            DeliveryMessage::Batch(outbound)
        } else {
            match outbound.pop() {
                Some(single) => DeliveryMessage::Send(single),
                None => return,
            }
        };

        if let Err(e) = self.delivery_tx.send(message) {
            error!("Failed to queue outbound datagrams: {}", e);
        }
    }

    /// Routes one inbound payload under the state write lock
    async fn handle_packet(&mut self, payload: String, addr: SocketAddr) {
        debug!("Packet from {}: {:?}", addr, payload);

        let outbound = {
            let mut state = self.state.write().await;
            router::route(&mut state, addr, &payload)
        };

        self.deliver(outbound);
    }

    async fn handle_expiry(&mut self, peer: SocketAddr) {
        let Some(timeout) = self.config.idle_timeout else {
            return;
        };

        let outbound = {
            let mut state = self.state.write().await;
            router::expire(&mut state, peer, timeout)
        };

        if !outbound.is_empty() {
            warn!("Session from {} expired after inactivity", peer);
        }
        self.deliver(outbound);
    }

    /// Main server loop: one message is fully handled before the next
    pub async fn run(&mut self) -> Result<(), ServerError> {
        // Tasks that never finish on their own; stopped when the loop ends
        let mut background = vec![self.spawn_network_receiver()];
        self.spawn_network_sender();
        if let Some(timeout) = self.config.idle_timeout {
            info!("Expiring sessions idle for more than {:?}", timeout);
            background.push(self.spawn_idle_checker(timeout));
        }

        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::PacketReceived { payload, addr } => {
                    self.handle_packet(payload, addr).await;
                }
                ServerMessage::SessionExpired { peer } => {
                    self.handle_expiry(peer).await;
                }
                ServerMessage::Shutdown => break,
            }
        }

        info!("Server shutting down");
        for task in background {
            task.abort();
        }
        Ok(())
    }
}
