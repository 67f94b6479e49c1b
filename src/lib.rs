//! # Trigger Link
//!
//! A long-lived TCP control channel between a capture device and a companion
//! controller. Over one connection the link:
//!
//! - sends a `ping` heartbeat every couple of seconds and turns each
//!   `pong;<server time>` reply into a latency and clock-offset estimate
//! - decodes inbound `flag;payload` messages and runs the action registered
//!   for the flag (start or stop recording, or anything else)
//! - sends caller messages verbatim
//! - publishes its phase, latest estimate and recent events for a UI
//!
//! ## Feature Flags
//!
//! - `transport` (default): TCP connection, heartbeat and receive loop
//! - `link` (default): the [`TriggerLink`] façade (requires `transport`)
//! - `file-settings` (default): TOML-backed [`config::FileSettings`]
//!
//! ## Modules
//!
//! - [`core`]: constants, error types and the wall-clock trait (always included)
//! - [`protocol`]: message codec and stream framing
//! - [`clock`]: ping/pong latency and offset estimation
//! - [`dispatch`]: flag to action table
//! - [`config`]: endpoint, settings store and link tuning
//! - [`capture`]: start/stop wiring for a recording controller
//! - [`transport`]: connection phases and the live connection (requires `transport`)
//! - [`link`]: the actor-backed façade (requires `link`)
//!
//! ## Example Usage
//!
//! ```no_run
//! use trigger_link::prelude::*;
//!
//! # async fn run() -> Result<(), LinkError> {
//! let table = ActionTable::builder()
//!     .on("a", |payload| println!("start recording {payload}"))?
//!     .on("b", |_| println!("stop recording"))?
//!     .build();
//!
//! let link = TriggerLink::new(table, LinkConfig::default())?;
//! link.connect_to("192.168.1.20", "8888").await?;
//!
//! let ready = link.wait_for(|state| state.is_connected()).await?;
//! println!("connected to {:?}", ready.endpoint);
//! link.send("hello;world")?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

pub mod capture;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod protocol;
pub mod reconnect;

// Transport layer (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

// Link façade (feature-gated)
#[cfg(feature = "link")]
#[cfg_attr(docsrs, doc(cfg(feature = "link")))]
pub mod link;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::capture::{default_recording_actions, recording_actions, CaptureController};
    pub use crate::clock::{ClockEstimate, ClockEstimator};
    pub use crate::config::{EndpointConfig, LinkConfig, MemorySettings, SettingsStore};
    pub use crate::core::*;
    pub use crate::dispatch::{ActionTable, ActionTableBuilder, Flag};
    pub use crate::protocol::{decode, encode, Framing, Message};
    pub use crate::reconnect::ReconnectPolicy;

    #[cfg(feature = "file-settings")]
    pub use crate::config::FileSettings;

    #[cfg(feature = "transport")]
    pub use crate::transport::{LinkPhase, TransportError, TransportResult};

    #[cfg(feature = "link")]
    pub use crate::link::{ConnectOutcome, LinkError, LinkResult, LinkState, TriggerLink};
}

// Re-export commonly used items at crate root
pub use config::{EndpointConfig, LinkConfig};
pub use dispatch::{ActionTable, Flag};
pub use protocol::Message;

#[cfg(feature = "transport")]
pub use transport::LinkPhase;

#[cfg(feature = "link")]
pub use link::{LinkError, LinkState, TriggerLink};
