//! Command-line and environment configuration for the broker binary.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::network::{BrokerCredentials, NetworkConfig};
use crate::observability::LogFormat;

/// Open Service Broker router
#[derive(Parser, Debug, Clone)]
#[command(name = "osb-broker", version)]
#[command(about = "Routes Open Service Broker requests to the services it hosts")]
pub struct BrokerArgs {
    /// Address to bind
    #[arg(long, env = "BROKER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on (0 picks a free port)
    #[arg(long, env = "BROKER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Basic-auth username the platform must present
    #[arg(long, env = "BROKER_USER")]
    pub username: Option<String>,

    /// Basic-auth password the platform must present
    #[arg(long, env = "BROKER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Log output format
    #[arg(long, env = "BROKER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Seconds before an HTTP request is answered with 408
    #[arg(long, env = "BROKER_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Address for the Prometheus metrics listener (disabled if unset)
    #[arg(long, env = "BROKER_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

impl BrokerArgs {
    /// Converts the arguments into the transport configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if only one of username and password is set.
    pub fn network_config(&self) -> anyhow::Result<NetworkConfig> {
        let credentials = match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Some(BrokerCredentials::new(username.clone(), password.clone()))
            }
            (None, None) => None,
            _ => anyhow::bail!("BROKER_USER and BROKER_PASSWORD must be set together"),
        };

        Ok(NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            credentials,
            ..NetworkConfig::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = BrokerArgs::try_parse_from([
            "osb-broker",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--username",
            "admin",
            "--password",
            "secret",
            "--log-format",
            "json",
            "--request-timeout-secs",
            "5",
        ])
        .unwrap();

        assert_eq!(args.log_format, LogFormat::Json);
        let config = args.network_config().unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(
            config.credentials,
            Some(BrokerCredentials::new("admin", "secret"))
        );
    }

    #[test]
    fn username_without_password_is_rejected() {
        let args =
            BrokerArgs::try_parse_from(["osb-broker", "--username", "admin", "--password", "x"])
                .unwrap();
        let lone = BrokerArgs {
            password: None,
            ..args
        };
        assert!(lone.network_config().is_err());
    }

    #[test]
    fn invalid_metrics_addr_is_a_parse_error() {
        assert!(BrokerArgs::try_parse_from(["osb-broker", "--metrics-addr", "nope"]).is_err());
    }
}
