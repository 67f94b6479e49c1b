//! Configuration for the Remote Trigger Link.
//!
//! - [`EndpointConfig`]: a validated host/port pair
//! - [`SettingsStore`]: where the host application keeps host/port strings
//! - [`LinkConfig`]: heartbeat, framing and reconnect tuning

mod endpoint;
mod link_config;
mod settings;

pub use endpoint::EndpointConfig;
pub use link_config::LinkConfig;
pub use settings::{MemorySettings, SettingsStore};

#[cfg(feature = "file-settings")]
pub use settings::FileSettings;
