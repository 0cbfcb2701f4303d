//! Printer page-counter daemon.
//!
//! `pagecountd` keeps the printer inventory in memory, reads page counters
//! over SNMP and answers chat commands such as `/contadores` or
//! `/atualizarIP NID:100 PARA:10.0.0.2`. Chat front-ends and the `pagecount`
//! CLI talk to it over a Unix or TCP socket using one JSONL request per
//! connection; see [`dispatch`] for the wire format.
//!
//! Startup follows a fixed sequence: load configuration through
//! `ortho_config`, install structured telemetry, prepare the socket
//! directory, parse the counter OID and load the inventory file. Any failure
//! aborts startup. Messages are then handled strictly one at a time, so an
//! inventory mutation is always persisted before the next message is read.

mod bootstrap;
pub mod dispatch;
mod health;
mod process;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, DaemonDispatcher, StaticConfigLoader,
    SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
