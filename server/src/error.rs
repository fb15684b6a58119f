use std::io;
use thiserror::Error;

/// Failures surfaced by the server library
///
/// Per-packet problems never show up here; they are logged where they
/// happen and the server keeps running.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}
