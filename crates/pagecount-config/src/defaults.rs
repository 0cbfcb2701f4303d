use camino::Utf8PathBuf;
use std::env;

#[cfg(unix)]
use libc::geteuid;

#[cfg(unix)]
use dirs::runtime_dir;

use crate::socket::SocketEndpoint;

/// Default TCP port used when Unix domain sockets are not available.
pub const DEFAULT_TCP_PORT: u16 = 9781;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default location of the inventory snapshot, relative to the working directory.
pub const DEFAULT_INVENTORY_PATH: &str = "printers.json";

/// Read-only community most printers ship with.
pub const DEFAULT_SNMP_COMMUNITY: &str = "public";

/// Well-known SNMP agent port.
pub const DEFAULT_SNMP_PORT: u16 = 161;

/// Receive timeout for one counter read.
pub const DEFAULT_SNMP_TIMEOUT_MS: u64 = 2_000;

/// Printer-MIB `prtMarkerLifeCount` for the first marker.
pub const DEFAULT_COUNTER_OID: &str = "1.3.6.1.2.1.43.10.2.1.4.1.1";

/// Printers polled concurrently by a bulk counter query.
pub const DEFAULT_POLL_WORKERS: usize = 8;

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default inventory snapshot path.
pub fn default_inventory_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_INVENTORY_PATH)
}

/// Default SNMP community.
pub fn default_snmp_community() -> String {
    DEFAULT_SNMP_COMMUNITY.to_owned()
}

/// Default SNMP agent port.
pub fn default_snmp_port() -> u16 {
    DEFAULT_SNMP_PORT
}

/// Default counter read timeout in milliseconds.
pub fn default_snmp_timeout_ms() -> u64 {
    DEFAULT_SNMP_TIMEOUT_MS
}

/// Default SNMP message version.
pub fn default_snmp_version() -> crate::snmp::SnmpVersion {
    crate::snmp::SnmpVersion::V1
}

/// Default page counter OID.
pub fn default_counter_oid() -> String {
    DEFAULT_COUNTER_OID.to_owned()
}

/// Default bulk poll concurrency.
pub fn default_poll_workers() -> usize {
    DEFAULT_POLL_WORKERS
}

/// Computes the default socket endpoint for the daemon.
pub fn default_socket_endpoint() -> SocketEndpoint {
    default_socket_endpoint_inner()
}

#[cfg(unix)]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("pagecount");
    if apply_namespace {
        base.push(user_namespace());
    }

    let socket_path = base.join("pagecountd.sock");
    SocketEndpoint::unix(socket_path)
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}
