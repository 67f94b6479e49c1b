//! Clock sync estimation from ping/pong heartbeats.
//!
//! Uses the two-timestamp NTP-style estimate. With `tx_ping` the local send
//! time, `tx_pong` the server's clock when it saw the ping and `rx_pong` the
//! local receive time:
//!
//! - latency = (rx_pong - tx_ping) / 2
//! - offset  = (rx_pong + tx_ping) / 2 - tx_pong
//!
//! Both assume a symmetric path. No ordering between the three timestamps is
//! assumed, since the two clocks may be skewed.

use std::time::Duration;

use crate::core::ClockError;

/// Timestamps of one ping/pong round trip, in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartbeatSample {
    /// Local time the ping was sent.
    pub tx_ping: f64,
    /// Server time reported in the pong.
    pub tx_pong: f64,
    /// Local time the pong was received.
    pub rx_pong: f64,
}

impl HeartbeatSample {
    /// One-way delay estimate in seconds.
    pub fn latency(&self) -> f64 {
        (self.rx_pong - self.tx_ping) / 2.0
    }

    /// Local clock minus remote clock, in seconds.
    pub fn offset(&self) -> f64 {
        (self.rx_pong + self.tx_ping) / 2.0 - self.tx_pong
    }

    /// Latency and offset of this sample.
    pub fn estimate(&self) -> ClockEstimate {
        ClockEstimate {
            latency: self.latency(),
            offset: self.offset(),
        }
    }
}

/// Published latency/offset pair, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClockEstimate {
    /// One-way delay estimate.
    pub latency: f64,
    /// Local clock minus remote clock. Negative when the remote runs ahead.
    pub offset: f64,
}

impl ClockEstimate {
    /// Latency in milliseconds.
    pub fn latency_ms(&self) -> f64 {
        self.latency * 1000.0
    }

    /// Offset in milliseconds.
    pub fn offset_ms(&self) -> f64 {
        self.offset * 1000.0
    }

    /// Latency as a [`Duration`], clamped at zero.
    pub fn latency_duration(&self) -> Duration {
        if self.latency.is_finite() && self.latency > 0.0 {
            Duration::from_secs_f64(self.latency)
        } else {
            Duration::ZERO
        }
    }
}

/// Parse a pong payload as decimal epoch seconds.
pub fn parse_server_time(payload: &str) -> Result<f64, ClockError> {
    let trimmed = payload.trim();
    match trimmed.parse::<f64>() {
        Ok(secs) if secs.is_finite() => Ok(secs),
        _ => Err(ClockError::InvalidTimestamp(payload.to_string())),
    }
}

/// Tracks the outstanding ping and the latest estimate.
#[derive(Debug, Clone, Default)]
pub struct ClockEstimator {
    /// Send time of the ping awaiting a pong.
    pending_ping: Option<f64>,
    /// Latest estimate, `None` until the first good pong.
    last: Option<ClockEstimate>,
    /// Number of samples accepted.
    samples: u64,
}

impl ClockEstimator {
    /// Create an estimator with no samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a ping was sent at `tx_ping`.
    ///
    /// A newer ping replaces one whose pong never arrived.
    pub fn on_ping_sent(&mut self, tx_ping: f64) {
        self.pending_ping = Some(tx_ping);
    }

    /// Process a pong payload received at `rx_pong`.
    ///
    /// On error the estimate is left unchanged.
    pub fn on_pong(&mut self, payload: &str, rx_pong: f64) -> Result<ClockEstimate, ClockError> {
        let tx_pong = parse_server_time(payload)?;
        let tx_ping = self.pending_ping.take().ok_or(ClockError::NoPendingPing)?;

        let estimate = HeartbeatSample {
            tx_ping,
            tx_pong,
            rx_pong,
        }
        .estimate();
        self.last = Some(estimate);
        self.samples = self.samples.saturating_add(1);
        Ok(estimate)
    }

    /// Latest estimate, if any pong has been processed.
    pub fn estimate(&self) -> Option<ClockEstimate> {
        self.last
    }

    /// Check if the estimator has at least one sample.
    pub fn has_sample(&self) -> bool {
        self.last.is_some()
    }

    /// Number of samples accepted so far.
    pub fn sample_count(&self) -> u64 {
        self.samples
    }

    /// Check if a ping is awaiting its pong.
    pub fn has_pending_ping(&self) -> bool {
        self.pending_ping.is_some()
    }

    /// Forget the outstanding ping (e.g. on teardown).
    pub fn clear_pending(&mut self) {
        self.pending_ping = None;
    }

    /// Forget everything, for a fresh connection.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
