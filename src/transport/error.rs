//! Transport layer error types.

use std::io;

use thiserror::Error;

/// Transport layer errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP connect was refused or unreachable.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Address that was dialled.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// TCP connect did not complete in time.
    #[error("connection to {0} timed out")]
    ConnectTimeout(String),

    /// I/O error on an established connection.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The remote ended the stream.
    #[error("connection closed by remote")]
    RemoteClosed,

    /// No live connection to send on.
    #[error("not connected")]
    NotConnected,
}

impl TransportError {
    /// Check if this error ends the connection.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TransportError::NotConnected)
    }

    /// Check if this error happened before the connection was established.
    pub fn is_connect_error(&self) -> bool {
        matches!(
            self,
            TransportError::Connect { .. } | TransportError::ConnectTimeout(_)
        )
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
