//! Server configuration

use shared::DEFAULT_PORT;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind to
    pub host: String,
    /// UDP port to listen on; 0 picks an ephemeral port
    pub port: u16,
    /// Sessions silent for longer than this are removed (None = never)
    pub idle_timeout: Option<Duration>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the timeout from a seconds count where 0 disables expiry
    pub fn with_idle_timeout_secs(mut self, secs: u64) -> Self {
        self.idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            idle_timeout: None,
        }
    }
}
