//! Connection lifecycle phases.

use std::fmt;

/// Connection lifecycle phase.
///
/// ```text
/// Disconnected ─▶ Connecting ─▶ Ready ─▶ Failed ─┐
///      ▲              │           │  ╲           │
///      │              ▼           │   ▶ Closed ──┤
///      │            Failed        │              │
///      └──────────────────────────┴──────────────┘
/// ```
///
/// `disconnect()` is accepted from every phase and always ends in
/// `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinkPhase {
    /// No socket.
    #[default]
    Disconnected,
    /// TCP connect in progress.
    Connecting,
    /// Connected; heartbeat and receive loop running.
    Ready,
    /// Connect or I/O failed. Cleanup pending.
    Failed,
    /// Remote ended the stream. Cleanup pending.
    Closed,
}

impl LinkPhase {
    /// Check if a live connection exists.
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkPhase::Ready)
    }

    /// Check if `connect()` is accepted in this phase.
    pub fn accepts_connect(&self) -> bool {
        matches!(self, LinkPhase::Disconnected)
    }

    /// Check if this phase only waits for cleanup.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LinkPhase::Failed | LinkPhase::Closed)
    }

    /// Check if moving to `next` is a legal transition.
    pub fn can_transition_to(&self, next: LinkPhase) -> bool {
        use LinkPhase::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Ready)
                | (Connecting, Failed)
                | (Ready, Failed)
                | (Ready, Closed)
                | (_, Disconnected)
        )
    }
}

impl fmt::Display for LinkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkPhase::Disconnected => "disconnected",
            LinkPhase::Connecting => "connecting",
            LinkPhase::Ready => "ready",
            LinkPhase::Failed => "failed",
            LinkPhase::Closed => "closed",
        };
        f.write_str(name)
    }
}
