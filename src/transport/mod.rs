//! Remote Trigger Link - Connection State Machine
//!
//! Owns the TCP socket lifecycle for one link:
//!
//! - **Phases**: [`LinkPhase`] and its legal transitions
//! - **Socket**: [`open`] with timeout and `TCP_NODELAY`
//! - **Connection**: [`Connection`], the live socket with its heartbeat,
//!   receive loop and send queue, reporting [`ConnectionEvent`]s
//!
//! # Architecture
//!
//! Each live connection runs three tasks that never touch link state
//! directly. They only emit events, tagged with the connection's generation,
//! into the link's single event queue:
//!
//! ```text
//!   heartbeat task ──HeartbeatDue──┐
//!   read task ──────Frame/Closed───┼──▶ link actor (single consumer)
//!   write task ─────Written/Failed─┘         │
//!        ▲                                   │
//!        └────────── outbound queue ◀────────┘
//! ```
//!
//! Dropping a [`Connection`] cancels the heartbeat first, then the read and
//! write tasks, which closes the socket.

mod connection;
mod error;
mod phase;
mod socket;

pub use connection::*;
pub use error::*;
pub use phase::*;
pub use socket::*;
