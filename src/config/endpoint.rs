//! Endpoint validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::SettingsStore;
use crate::core::ConfigError;

/// Address of the companion controller.
///
/// Only constructible through validation: the host is non-empty and the port
/// is in 1-65535.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointConfig {
    host: String,
    port: u16,
}

impl EndpointConfig {
    /// Validate a host and numeric port.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, ConfigError> {
        let host = host.into().trim().to_string();
        if host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if port == 0 {
            return Err(ConfigError::InvalidPort(port.to_string()));
        }
        Ok(Self { host, port })
    }

    /// Validate the two strings a settings store holds.
    pub fn parse(host: &str, port: &str) -> Result<Self, ConfigError> {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(port.to_string()))?;
        Self::new(host, port)
    }

    /// Read and validate the endpoint held by `settings`.
    pub fn from_settings<S: SettingsStore + ?Sized>(settings: &S) -> Result<Self, ConfigError> {
        Self::parse(&settings.host(), &settings.port())
    }

    /// Host name or address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let endpoint = EndpointConfig::parse("192.168.0.10", "8888").unwrap();
        assert_eq!(endpoint.host(), "192.168.0.10");
        assert_eq!(endpoint.port(), 8888);
        assert_eq!(endpoint.to_string(), "192.168.0.10:8888");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let endpoint = EndpointConfig::parse(" localhost ", " 9000 ").unwrap();
        assert_eq!(endpoint.host(), "localhost");
        assert_eq!(endpoint.port(), 9000);
    }

    #[test]
    fn test_parse_not_a_number() {
        let err = EndpointConfig::parse("localhost", "not-a-number").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(ref p) if p == "not-a-number"));
    }

    #[test]
    fn test_port_out_of_range() {
        assert!(matches!(
            EndpointConfig::parse("localhost", "0"),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            EndpointConfig::parse("localhost", "65536"),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(EndpointConfig::parse("localhost", "65535").is_ok());
    }

    #[test]
    fn test_empty_host() {
        assert!(matches!(
            EndpointConfig::parse("  ", "8888"),
            Err(ConfigError::EmptyHost)
        ));
    }

    #[test]
    fn test_ipv6_display() {
        let endpoint = EndpointConfig::new("::1", 8888).unwrap();
        assert_eq!(endpoint.to_string(), "[::1]:8888");
    }
}
