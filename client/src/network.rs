use crate::input::{parse_nickname, InputAction, HELP_TEXT};
use log::{error, info, warn};
use shared::MAX_PACKET_SIZE;
use std::io::Write;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::net::UdpSocket;

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    nick: Option<String>,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        nick: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            nick,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Sends one line; failures are reported but never end the session
    async fn send_line(&self, line: &str) {
        if let Err(e) = self.socket.send_to(line.as_bytes(), self.server_addr).await {
            error!("Error sending message: {}", e);
        }
    }

    async fn register(&self, nick: &str) {
        self.send_line(&format!("/nick {}", nick)).await;
    }

    /// Replaces the socket with a fresh one and registers again
    async fn reconnect(&mut self) {
        match UdpSocket::bind("0.0.0.0:0").await {
            Ok(socket) => {
                self.socket = socket;
                if let Some(nick) = self.nick.clone() {
                    self.register(&nick).await;
                }
                println!("Reconnected to server");
            }
            Err(e) => warn!("Reconnection failed: {}", e),
        }
    }

    async fn prompt_nickname(
        lines: &mut Lines<BufReader<Stdin>>,
    ) -> Result<Option<String>, Box<dyn std::error::Error>> {
        loop {
            print!("Enter your nickname: ");
            std::io::stdout().flush()?;

            match lines.next_line().await? {
                Some(line) => {
                    if let Some(nick) = parse_nickname(&line) {
                        return Ok(Some(nick));
                    }
                }
                None => return Ok(None),
            }
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        if self.nick.is_none() {
            self.nick = Self::prompt_nickname(&mut lines).await?;
        }
        let Some(nick) = self.nick.clone() else {
            return Ok(());
        };

        info!("Registering as {} with {}", nick, self.server_addr);
        self.register(&nick).await;
        println!("Connected to server. Type /help for commands.");

        let mut buffer = [0u8; MAX_PACKET_SIZE];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => {
                            println!("{}", String::from_utf8_lossy(&buffer[..len]));
                        }
                        Err(e) => error!("Error receiving message: {}", e),
                    }
                },

                line = lines.next_line() => {
                    let Some(line) = line? else {
                        self.send_line("/quit").await;
                        break;
                    };

                    match InputAction::from_line(&line) {
                        InputAction::Quit => {
                            self.send_line("/quit").await;
                            break;
                        }
                        InputAction::Reconnect => self.reconnect().await,
                        InputAction::Help => println!("{}", HELP_TEXT),
                        InputAction::Forward(text) => self.send_line(&text).await,
                        InputAction::Skip => {}
                    }
                },
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = Client::new("127.0.0.1:9876", Some("alice".to_string()))
            .await
            .unwrap();
        assert_eq!(client.server_addr(), "127.0.0.1:9876".parse().unwrap());
    }

    #[tokio::test]
    async fn test_invalid_server_address() {
        assert!(Client::new("not an address", None).await.is_err());
    }

    #[tokio::test]
    async fn test_register_sends_nick_command() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap().to_string();

        let client = Client::new(&server_addr, Some("alice".to_string()))
            .await
            .unwrap();
        client.register("alice").await;

        let mut buf = [0u8; MAX_PACKET_SIZE];
        let (len, _) = server.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"/nick alice");
    }
}
