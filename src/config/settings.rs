//! Settings store for the persisted host/port strings.
//!
//! Values are kept as the raw strings the user typed. Validation happens when
//! a connection is attempted, not when a value is stored.

use crate::core::constants::{DEFAULT_HOST, DEFAULT_PORT};
use crate::core::ConfigError;

use super::EndpointConfig;

/// Persisted host and port strings.
pub trait SettingsStore {
    /// Stored host, or `"0.0.0.0"` when unset.
    fn host(&self) -> String;

    /// Stored port, or `"8888"` when unset.
    fn port(&self) -> String;

    /// Store a new host.
    fn set_host(&mut self, host: &str) -> Result<(), ConfigError>;

    /// Store a new port.
    fn set_port(&mut self, port: &str) -> Result<(), ConfigError>;

    /// Validate the stored values as an endpoint.
    fn endpoint(&self) -> Result<EndpointConfig, ConfigError> {
        EndpointConfig::parse(&self.host(), &self.port())
    }
}

/// In-memory settings, lost on exit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySettings {
    host: Option<String>,
    port: Option<String>,
}

impl MemorySettings {
    /// Empty settings (defaults apply).
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings pre-filled with `host` and `port`.
    pub fn with(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port.into()),
        }
    }
}

impl SettingsStore for MemorySettings {
    fn host(&self) -> String {
        self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    fn port(&self) -> String {
        self.port.clone().unwrap_or_else(|| DEFAULT_PORT.to_string())
    }

    fn set_host(&mut self, host: &str) -> Result<(), ConfigError> {
        self.host = Some(host.to_string());
        Ok(())
    }

    fn set_port(&mut self, port: &str) -> Result<(), ConfigError> {
        self.port = Some(port.to_string());
        Ok(())
    }
}

#[cfg(feature = "file-settings")]
mod file {
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    use directories::ProjectDirs;
    use serde::{Deserialize, Serialize};
    use tracing::debug;

    use super::{SettingsStore, DEFAULT_HOST, DEFAULT_PORT};
    use crate::core::ConfigError;

    /// File name used under the platform configuration directory.
    pub const SETTINGS_FILE: &str = "settings.toml";

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct Stored {
        #[serde(skip_serializing_if = "Option::is_none")]
        host: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        port: Option<String>,
    }

    /// Settings persisted as TOML.
    ///
    /// Every `set_*` call writes the file immediately.
    #[derive(Debug, Clone)]
    pub struct FileSettings {
        path: PathBuf,
        stored: Stored,
    }

    impl FileSettings {
        /// Open settings at `path`. A missing file means defaults.
        pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
            let path = path.into();
            let stored = match fs::read_to_string(&path) {
                Ok(text) => {
                    toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no settings file, using defaults");
                    Stored::default()
                }
                Err(e) => return Err(e.into()),
            };
            Ok(Self { path, stored })
        }

        /// Open settings in the platform configuration directory.
        pub fn open_default() -> Result<Self, ConfigError> {
            Self::open(Self::default_path()?)
        }

        /// Platform location of the settings file.
        pub fn default_path() -> Result<PathBuf, ConfigError> {
            let dirs =
                ProjectDirs::from("", "", "trigger-link").ok_or(ConfigError::NoConfigDir)?;
            Ok(dirs.config_dir().join(SETTINGS_FILE))
        }

        /// Path of the backing file.
        pub fn path(&self) -> &Path {
            &self.path
        }

        /// Write the current values to disk.
        pub fn save(&self) -> Result<(), ConfigError> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let text = toml::to_string(&self.stored)
                .map_err(|e| ConfigError::Serialize(e.to_string()))?;
            fs::write(&self.path, text)?;
            Ok(())
        }
    }

    impl SettingsStore for FileSettings {
        fn host(&self) -> String {
            self.stored
                .host
                .clone()
                .unwrap_or_else(|| DEFAULT_HOST.to_string())
        }

        fn port(&self) -> String {
            self.stored
                .port
                .clone()
                .unwrap_or_else(|| DEFAULT_PORT.to_string())
        }

        fn set_host(&mut self, host: &str) -> Result<(), ConfigError> {
            self.stored.host = Some(host.to_string());
            self.save()
        }

        fn set_port(&mut self, port: &str) -> Result<(), ConfigError> {
            self.stored.port = Some(port.to_string());
            self.save()
        }
    }
}

#[cfg(feature = "file-settings")]
pub use file::FileSettings;
