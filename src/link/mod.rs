//! Link façade.
//!
//! [`TriggerLink`] is the only type most callers need. It owns an actor task
//! that holds every piece of mutable link state:
//!
//! ```text
//!   TriggerLink ──commands──▶ ┌───────────┐ ◀──events── Connection tasks
//!   (any task)                │ LinkActor │             (heartbeat, read, write)
//!   watch::Receiver ◀─state── └───────────┘ ──actions─▶ ActionTable
//! ```
//!
//! Commands and connection events are consumed one at a time, so a message
//! handler never overlaps another handler or a state transition. Every
//! connection event carries the generation of the connection that raised it;
//! events from a torn-down connection are dropped.

mod actor;
mod handle;
mod state;

pub use actor::ConnectOutcome;
pub use handle::{LinkError, LinkResult, TriggerLink};
pub use state::{format_epoch, pong_event, rx_event, timestamp, tx_event, LinkState, RecentLog};
