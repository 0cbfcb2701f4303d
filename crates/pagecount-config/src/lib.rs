//! Shared configuration for the pagecount daemon and CLI.
//!
//! Both binaries resolve the same [`Config`] through `ortho_config`, layering
//! defaults, an optional TOML file (`--config-path` or
//! `PAGECOUNT_CONFIG_PATH`), `PAGECOUNT_*` environment variables and command
//! line flags in rising precedence. The daemon additionally reads the
//! inventory location and SNMP polling parameters; the CLI only needs the
//! socket endpoint.

mod defaults;
mod logging;
mod snmp;
mod socket;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_COUNTER_OID, DEFAULT_INVENTORY_PATH, DEFAULT_LOG_FILTER, DEFAULT_POLL_WORKERS,
    DEFAULT_SNMP_COMMUNITY, DEFAULT_SNMP_PORT, DEFAULT_SNMP_TIMEOUT_MS, DEFAULT_TCP_PORT,
    default_counter_oid, default_inventory_path, default_log_filter, default_log_filter_string,
    default_log_format, default_poll_workers, default_snmp_community, default_snmp_port,
    default_snmp_timeout_ms, default_snmp_version, default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use snmp::{SnmpVersion, SnmpVersionParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration shared by `pagecountd` and `pagecount`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PAGECOUNT")]
pub struct Config {
    /// Socket the daemon listens on and the CLI connects to.
    #[ortho_config(default = default_socket_endpoint())]
    #[serde(default = "default_socket_endpoint")]
    pub daemon_socket: SocketEndpoint,
    /// JSON file holding the printer inventory.
    #[ortho_config(default = default_inventory_path())]
    #[serde(default = "default_inventory_path")]
    pub inventory_path: Utf8PathBuf,
    /// SNMP community used for counter reads.
    #[ortho_config(default = default_snmp_community())]
    #[serde(default = "default_snmp_community")]
    pub snmp_community: String,
    /// UDP port of the printers' SNMP agents.
    #[ortho_config(default = default_snmp_port())]
    #[serde(default = "default_snmp_port")]
    pub snmp_port: u16,
    /// Receive timeout for a single counter read, in milliseconds.
    #[ortho_config(default = default_snmp_timeout_ms())]
    #[serde(default = "default_snmp_timeout_ms")]
    pub snmp_timeout_ms: u64,
    /// SNMP message version (`v1` or `v2c`).
    #[ortho_config(default = default_snmp_version())]
    #[serde(default = "default_snmp_version")]
    pub snmp_version: SnmpVersion,
    /// Object identifier of the page counter.
    #[ortho_config(default = default_counter_oid())]
    #[serde(default = "default_counter_oid")]
    pub counter_oid: String,
    /// Upper bound on printers polled concurrently by `/contadores`.
    #[ortho_config(default = default_poll_workers())]
    #[serde(default = "default_poll_workers")]
    pub poll_workers: usize,
    /// `tracing_subscriber` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_socket: default_socket_endpoint(),
            inventory_path: default_inventory_path(),
            snmp_community: default_snmp_community(),
            snmp_port: default_snmp_port(),
            snmp_timeout_ms: default_snmp_timeout_ms(),
            snmp_version: default_snmp_version(),
            counter_oid: default_counter_oid(),
            poll_workers: default_poll_workers(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Socket endpoint shared by the daemon and the CLI.
    #[must_use]
    pub fn daemon_socket(&self) -> &SocketEndpoint {
        &self.daemon_socket
    }

    /// Location of the inventory snapshot.
    #[must_use]
    pub fn inventory_path(&self) -> &Utf8Path {
        self.inventory_path.as_path()
    }

    /// SNMP community string.
    #[must_use]
    pub fn snmp_community(&self) -> &str {
        &self.snmp_community
    }

    /// SNMP agent port.
    #[must_use]
    pub fn snmp_port(&self) -> u16 {
        self.snmp_port
    }

    /// Receive timeout for one counter read.
    #[must_use]
    pub fn snmp_timeout(&self) -> Duration {
        Duration::from_millis(self.snmp_timeout_ms)
    }

    /// SNMP message version.
    #[must_use]
    pub fn snmp_version(&self) -> SnmpVersion {
        self.snmp_version
    }

    /// Dotted-decimal page counter OID.
    #[must_use]
    pub fn counter_oid(&self) -> &str {
        &self.counter_oid
    }

    /// Concurrency bound for bulk polls; never below one.
    #[must_use]
    pub fn poll_workers(&self) -> usize {
        self.poll_workers.max(1)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.inventory_path(), Utf8Path::new("printers.json"));
        assert_eq!(config.snmp_community(), "public");
        assert_eq!(config.snmp_port(), 161);
        assert_eq!(config.snmp_timeout(), Duration::from_secs(2));
        assert_eq!(config.snmp_version(), SnmpVersion::V1);
        assert_eq!(config.counter_oid(), "1.3.6.1.2.1.43.10.2.1.4.1.1");
        assert_eq!(config.poll_workers(), 8);
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn poll_workers_never_drops_to_zero() {
        let config = Config {
            poll_workers: 0,
            ..Config::default()
        };
        assert_eq!(config.poll_workers(), 1);
    }
}
