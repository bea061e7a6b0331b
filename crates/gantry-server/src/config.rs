//! Bootstrap configuration for the plugin server.
//!
//! When launched by the gateway, the process receives `--address` and
//! `--network` on the command line and `--address` is mandatory. For
//! standalone testing, [`ServeConfig::standalone`] listens on all-interfaces
//! TCP using the fixed default port, overridable through `PLUGIN_PORT`.

use std::ffi::OsString;
use std::fmt;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::ServerError;

/// Default TCP port used in standalone mode.
pub const DEFAULT_PORT: u16 = 50051;

/// Default upper bound on concurrent call handling.
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Default drain timeout after a termination signal.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

// ─────────────────────────────────────────────────────────────────────────────
// Network
// ─────────────────────────────────────────────────────────────────────────────

/// Transport family of the listening endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Network {
    /// Unix domain socket; the address is a filesystem path.
    Unix,
    /// TCP; the address is `host:port` (empty host means all interfaces).
    Tcp,
}

impl Network {
    /// The lowercase wire spelling used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Unix => "unix",
            Network::Tcp => "tcp",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ServeConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime configuration for [`PluginServer`](crate::PluginServer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    /// Transport family to bind.
    pub network: Network,
    /// Socket path (unix) or `host:port` (tcp).
    pub address: String,
    /// Upper bound on concurrent call-handling capacity (default: 10).
    pub max_workers: usize,
    /// Drain timeout after a termination signal (default: 5 s).
    pub grace_period: Duration,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            network: Network::Tcp,
            address: format!("[::]:{DEFAULT_PORT}"),
            max_workers: DEFAULT_MAX_WORKERS,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl ServeConfig {
    /// Configuration for a unix-domain-socket endpoint at `path`.
    pub fn unix(path: impl Into<String>) -> Self {
        Self {
            network: Network::Unix,
            address: path.into(),
            ..Self::default()
        }
    }

    /// Configuration for a TCP endpoint at `addr` (`host:port`).
    pub fn tcp(addr: impl Into<String>) -> Self {
        Self {
            network: Network::Tcp,
            address: addr.into(),
            ..Self::default()
        }
    }

    /// Standalone-testing configuration: all-interfaces TCP on
    /// [`DEFAULT_PORT`], overridable through the `PLUGIN_PORT` environment
    /// variable.
    pub fn standalone() -> Self {
        let port = std::env::var("PLUGIN_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        Self::tcp(format!("[::]:{port}"))
    }

    /// Parse gateway-supplied command-line arguments (`--address`,
    /// `--network`). The first element is the program name.
    ///
    /// `--address` is required in this mode; a missing address is a
    /// configuration error surfaced before any bind attempt.
    pub fn from_args<I, S>(args: I) -> Result<Self, ServerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString> + Clone,
    {
        let parsed = ServeArgs::try_parse_from(args)
            .map_err(|e| ServerError::Configuration(e.to_string()))?;

        let Some(address) = parsed.address else {
            return Err(ServerError::Configuration(
                "--address is required when running with command-line arguments; \
                 for standalone testing use ServeConfig::standalone()"
                    .to_string(),
            ));
        };

        // A bare port on tcp means all interfaces.
        let address = match parsed.network {
            Network::Tcp if !address.contains(':') => format!("[::]:{address}"),
            _ => address,
        };

        Ok(Self {
            network: parsed.network,
            address,
            ..Self::default()
        })
    }

    /// Builder helper: set the concurrent-call bound.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Builder helper: set the drain timeout.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }
}

/// Command-line arguments the gateway passes when it spawns a plugin.
#[derive(Parser, Debug)]
#[command(name = "gantry-plugin", about = "Plugin server for the Gantry gateway")]
struct ServeArgs {
    /// Listening address (socket path for unix, host:port for tcp).
    #[arg(long)]
    address: Option<String>,

    /// Network type of the listening endpoint.
    #[arg(long, value_enum, default_value_t = Network::Unix)]
    network: Network,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_contract() {
        let config = ServeConfig::default();
        assert_eq!(config.network, Network::Tcp);
        assert_eq!(config.address, "[::]:50051");
        assert_eq!(config.max_workers, 10);
        assert_eq!(config.grace_period, Duration::from_secs(5));
    }

    #[test]
    fn args_without_address_are_a_configuration_error() {
        let err = ServeConfig::from_args(["plugin"]).unwrap_err();
        assert!(matches!(err, ServerError::Configuration(_)));
        assert!(err.to_string().contains("--address"));
    }

    #[test]
    fn network_defaults_to_unix_in_managed_mode() {
        let config =
            ServeConfig::from_args(["plugin", "--address", "/tmp/plugin.sock"]).unwrap();
        assert_eq!(config.network, Network::Unix);
        assert_eq!(config.address, "/tmp/plugin.sock");
    }

    #[test]
    fn bare_tcp_port_means_all_interfaces() {
        let config =
            ServeConfig::from_args(["plugin", "--address", "9000", "--network", "tcp"]).unwrap();
        assert_eq!(config.address, "[::]:9000");
    }

    #[test]
    fn explicit_tcp_host_port_is_kept() {
        let config = ServeConfig::from_args([
            "plugin",
            "--address",
            "127.0.0.1:9000",
            "--network",
            "tcp",
        ])
        .unwrap();
        assert_eq!(config.address, "127.0.0.1:9000");
    }

    #[test]
    fn unknown_network_is_rejected() {
        let err = ServeConfig::from_args([
            "plugin",
            "--address",
            "x",
            "--network",
            "carrier-pigeon",
        ])
        .unwrap_err();
        assert!(matches!(err, ServerError::Configuration(_)));
    }
}
