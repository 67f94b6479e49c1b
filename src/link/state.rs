//! Published link state.

use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::clock::ClockEstimate;
use crate::config::EndpointConfig;
use crate::core::constants::RECENT_CAPACITY;
use crate::transport::LinkPhase;

/// Bounded log of the most recent human-readable events, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for RecentLog {
    fn default() -> Self {
        Self::new(RECENT_CAPACITY)
    }
}

impl RecentLog {
    /// Create an empty log holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest when full.
    pub fn push(&mut self, entry: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry.into());
    }

    /// Entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// Check if any entry equals or starts with `prefix`.
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.iter().any(|entry| entry.starts_with(prefix))
    }

    /// Entries as owned strings, oldest first.
    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Snapshot of the link, as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkState {
    /// Connection phase.
    pub phase: LinkPhase,
    /// Endpoint of the current or most recent connection.
    pub endpoint: Option<EndpointConfig>,
    /// Latest clock estimate for the current connection.
    pub estimate: Option<ClockEstimate>,
    /// Pongs accepted on the current connection.
    pub pong_count: u64,
    /// Most recent human-readable events.
    pub recent: RecentLog,
}

impl LinkState {
    /// Initial state with a log of `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            recent: RecentLog::new(capacity),
            ..Self::default()
        }
    }

    /// Whether a live connection exists.
    pub fn is_connected(&self) -> bool {
        self.phase.is_connected()
    }

    /// Whether a pong has produced an estimate yet.
    pub fn has_sample(&self) -> bool {
        self.estimate.is_some()
    }

    /// Latency in seconds, zero before the first sample.
    pub fn latency(&self) -> f64 {
        self.estimate.map(|e| e.latency).unwrap_or(0.0)
    }

    /// Offset in seconds, zero before the first sample.
    pub fn offset(&self) -> f64 {
        self.estimate.map(|e| e.offset).unwrap_or(0.0)
    }
}

/// Local time as `HH:MM:SS.mmm`.
pub fn timestamp() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}

/// Render epoch seconds as local `HH:MM:SS.mmm`.
pub fn format_epoch(secs: f64) -> Option<String> {
    if !secs.is_finite() {
        return None;
    }
    let millis = (secs * 1000.0).round() as i64;
    DateTime::from_timestamp_millis(millis)
        .map(|utc| utc.with_timezone(&Local).format("%H:%M:%S%.3f").to_string())
}

/// Recent-log entry for a sent message.
pub fn tx_event(text: &str) -> String {
    format!("[TX]{} {text}", timestamp())
}

/// Recent-log entry for a received message.
pub fn rx_event(text: &str) -> String {
    format!("[RX]{} {text}", timestamp())
}

/// Recent-log entry for an accepted pong; `server_time` is shown as sent
/// when it is not a valid epoch.
pub fn pong_event(server_time: &str) -> String {
    let shown = crate::clock::parse_server_time(server_time)
        .ok()
        .and_then(format_epoch)
        .unwrap_or_else(|| server_time.to_string());
    rx_event(&format!("pong {shown}"))
}
