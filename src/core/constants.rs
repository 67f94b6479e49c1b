//! Protocol constants for the Remote Trigger Link.
//!
//! Wire tokens are fixed by the companion controller and MUST NOT be changed.
//! Timings are defaults and can be overridden through
//! [`LinkConfig`](crate::config::LinkConfig).

use std::time::Duration;

// =============================================================================
// WIRE TOKENS
// =============================================================================

/// Separator between a message's flag and its payload.
pub const DELIMITER: char = ';';

/// Heartbeat probe sent by the client. No delimiter, no payload.
pub const PING: &str = "ping";

/// Flag of the heartbeat reply (`pong;<server epoch seconds>`).
pub const PONG_FLAG: &str = "pong";

/// Line terminator used by newline framing.
pub const LINE_TERMINATOR: u8 = b'\n';

// =============================================================================
// SETTINGS DEFAULTS
// =============================================================================

/// Host used when the settings store has none.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Port used when the settings store has none.
pub const DEFAULT_PORT: &str = "8888";

/// Flag that starts a recording session.
pub const START_FLAG: &str = "a";

/// Flag that stops a recording session.
pub const STOP_FLAG: &str = "b";

// =============================================================================
// TIMING AND SIZES
// =============================================================================

/// Interval between heartbeat pings.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);

/// How long a TCP connect may take before it is reported as failed.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest heartbeat interval a link accepts.
pub const MAX_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest connect timeout a link accepts.
pub const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Maximum bytes taken from the socket per read.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Longest line the framer accepts; longer lines are discarded.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Number of human-readable events kept in the published state.
pub const RECENT_CAPACITY: usize = 3;
