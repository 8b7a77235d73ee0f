//! Network configuration types for the broker server.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Top-level network configuration for the server.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Maximum time to wait for a request to complete.
    pub request_timeout: Duration,
    /// Basic-auth credentials for the `/v2` routes. `None` disables the check.
    pub credentials: Option<BrokerCredentials>,
    /// Oldest `X-Broker-API-Version` the platform may send.
    pub min_api_version: ApiVersion,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            request_timeout: Duration::from_secs(30),
            credentials: None,
            min_api_version: ApiVersion::MINIMUM,
        }
    }
}

/// Username and password the platform must present.
#[derive(Clone, PartialEq, Eq)]
pub struct BrokerCredentials {
    pub username: String,
    pub password: String,
}

impl BrokerCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for BrokerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ApiVersion
// ---------------------------------------------------------------------------

/// A `major.minor` broker API version, as carried in `X-Broker-API-Version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u16,
    pub minor: u16,
}

impl ApiVersion {
    pub const MINIMUM: Self = Self {
        major: 2,
        minor: 13,
    };
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("malformed API version {0:?}, expected MAJOR.MINOR")]
pub struct ApiVersionParseError(String);

impl FromStr for ApiVersion {
    type Err = ApiVersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ApiVersionParseError(s.to_string());
        let (major, minor) = s.trim().split_once('.').ok_or_else(malformed)?;
        Ok(Self {
            major: major.parse().map_err(|_| malformed())?,
            minor: minor.parse().map_err(|_| malformed())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_config_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 0);
        assert!(config.credentials.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.min_api_version, ApiVersion::MINIMUM);
    }

    #[test]
    fn api_version_parses_and_orders() {
        let v: ApiVersion = "2.14".parse().unwrap();
        assert_eq!(v, ApiVersion { major: 2, minor: 14 });
        assert!(v > ApiVersion::MINIMUM);
        assert!("2.9".parse::<ApiVersion>().unwrap() < ApiVersion::MINIMUM);
        assert!("3.0".parse::<ApiVersion>().unwrap() > ApiVersion::MINIMUM);
        assert_eq!(ApiVersion::MINIMUM.to_string(), "2.13");
    }

    #[test]
    fn api_version_rejects_garbage() {
        assert!("2".parse::<ApiVersion>().is_err());
        assert!("two.13".parse::<ApiVersion>().is_err());
        assert!("".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = BrokerCredentials::new("admin", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }
}
