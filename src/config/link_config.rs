//! Link tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::constants::{
    CONNECT_TIMEOUT, HEARTBEAT_INTERVAL, MAX_CONNECT_TIMEOUT, MAX_HEARTBEAT_INTERVAL,
    READ_BUFFER_SIZE, RECENT_CAPACITY,
};
use crate::core::ConfigError;
use crate::protocol::Framing;
use crate::reconnect::ReconnectPolicy;

/// Heartbeat, framing and reconnect settings for a link.
///
/// Loadable from TOML; every field is optional:
///
/// ```toml
/// heartbeat_interval_ms = 2000
/// framing = "newline"
///
/// [reconnect]
/// enabled = true
/// max_attempts = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// Interval between heartbeat pings, in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// TCP connect timeout, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Maximum bytes taken per socket read.
    pub read_buffer_size: usize,
    /// How messages are delimited on the stream.
    pub framing: Framing,
    /// Number of recent events kept in the published state.
    pub recent_capacity: usize,
    /// Record each accepted pong as `[RX]<time> pong <server time>`.
    pub log_pongs: bool,
    /// Automatic reconnect behaviour.
    pub reconnect: ReconnectPolicy,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: millis(HEARTBEAT_INTERVAL),
            connect_timeout_ms: millis(CONNECT_TIMEOUT),
            read_buffer_size: READ_BUFFER_SIZE,
            framing: Framing::default(),
            recent_capacity: RECENT_CAPACITY,
            log_pongs: false,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl LinkConfig {
    /// Heartbeat interval.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Set the heartbeat interval.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval_ms = millis(interval);
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = millis(timeout);
        self
    }

    /// Set the framing mode.
    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Record accepted pongs in the recent log.
    pub fn with_pong_log(mut self, enabled: bool) -> Self {
        self.log_pongs = enabled;
        self
    }

    /// Set the reconnect policy.
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Invalid("heartbeat_interval_ms must be positive".into()));
        }
        if self.heartbeat_interval_ms > millis(MAX_HEARTBEAT_INTERVAL) {
            return Err(ConfigError::Invalid(format!(
                "heartbeat_interval_ms must be at most {}",
                millis(MAX_HEARTBEAT_INTERVAL)
            )));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid("connect_timeout_ms must be positive".into()));
        }
        if self.connect_timeout_ms > millis(MAX_CONNECT_TIMEOUT) {
            return Err(ConfigError::Invalid(format!(
                "connect_timeout_ms must be at most {}",
                millis(MAX_CONNECT_TIMEOUT)
            )));
        }
        if self.read_buffer_size == 0 {
            return Err(ConfigError::Invalid("read_buffer_size must be positive".into()));
        }
        if self.recent_capacity == 0 {
            return Err(ConfigError::Invalid("recent_capacity must be positive".into()));
        }
        if self.reconnect.enabled && self.reconnect.base_delay_ms == 0 {
            return Err(ConfigError::Invalid("reconnect.base_delay_ms must be positive".into()));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "file-settings")]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    #[cfg(feature = "file-settings")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// Whole milliseconds in `duration`, saturating.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
