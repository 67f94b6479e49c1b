//! Error types for the Remote Trigger Link.

use thiserror::Error;

/// Errors that can occur when decoding a received message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Received an empty message.
    #[error("empty message")]
    Empty,

    /// Message bytes are not valid UTF-8.
    #[error("message is not valid UTF-8")]
    InvalidUtf8,

    /// No `;` separates flag and payload.
    #[error("missing ';' delimiter in {0:?}")]
    MissingDelimiter(String),
}

/// Errors from the clock sync estimator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// Pong payload is not a finite decimal number of seconds.
    #[error("invalid server timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// A pong arrived without a ping awaiting its reply.
    #[error("pong received with no pending ping")]
    NoPendingPing,
}

/// Errors when validating a flag token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlagError {
    /// Flag is empty.
    #[error("flag is empty")]
    Empty,

    /// Flag contains the `;` delimiter.
    #[error("flag {0:?} contains the ';' delimiter")]
    ContainsDelimiter(String),

    /// Flag is reserved by the heartbeat protocol.
    #[error("flag {0:?} is reserved")]
    Reserved(String),
}

/// Configuration and settings errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port string is not an integer in 1-65535.
    #[error("invalid port: {0:?}")]
    InvalidPort(String),

    /// Host string is empty.
    #[error("host is empty")]
    EmptyHost,

    /// A link configuration value is out of range.
    #[error("invalid link configuration: {0}")]
    Invalid(String),

    /// Settings file could not be parsed.
    #[error("failed to parse settings: {0}")]
    Parse(String),

    /// Settings could not be serialized.
    #[error("failed to serialize settings: {0}")]
    Serialize(String),

    /// No platform configuration directory could be determined.
    #[error("no configuration directory available")]
    NoConfigDir,

    /// I/O error reading or writing settings.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Short status line shown to the presentation layer.
    pub fn status(&self) -> String {
        match self {
            ConfigError::InvalidPort(port) => format!("Invalid port: {port}"),
            ConfigError::EmptyHost => "Invalid host".to_string(),
            other => format!("Configuration error: {other}"),
        }
    }

    /// Check if this error concerns the endpoint (host/port) rather than files.
    pub fn is_endpoint_error(&self) -> bool {
        matches!(self, ConfigError::InvalidPort(_) | ConfigError::EmptyHost)
    }
}
