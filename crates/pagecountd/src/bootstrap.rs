//! Daemon bootstrap orchestration.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use pagecount_config::{Config, SocketPreparationError};
use pagecount_config::SnmpVersion as ConfiguredVersion;
use pagecount_inventory::{Inventory, InventoryBackend, InventoryError, JsonFileBackend};
use pagecount_snmp::{ObjectIdentifier, OidParseError, SnmpCounterFetcher, SnmpVersion};
use thiserror::Error;

use crate::dispatch::Dispatcher;
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Dispatcher wired to the production inventory and SNMP fetcher.
pub type DaemonDispatcher = Dispatcher<JsonFileBackend, SnmpCounterFetcher>;

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when no valid configuration can be built.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare daemon socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
    /// The configured counter OID is not a valid object identifier.
    #[error("invalid counter OID '{oid}': {source}")]
    CounterOid {
        /// Configured value.
        oid: String,
        /// Parse failure.
        #[source]
        source: OidParseError,
    },
    /// The inventory could not be loaded.
    #[error("failed to load inventory: {source}")]
    Inventory {
        /// Underlying inventory error.
        #[source]
        source: InventoryError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Daemon {
    config: Config,
    dispatcher: DaemonDispatcher,
    telemetry: TelemetryHandle,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Dispatcher holding the loaded inventory.
    #[must_use]
    pub fn dispatcher(&self) -> &DaemonDispatcher {
        &self.dispatcher
    }

    /// Splits the daemon into its configuration and dispatcher.
    #[must_use]
    pub fn into_parts(self) -> (Config, DaemonDispatcher) {
        (self.config, self.dispatcher)
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// Loads configuration, installs telemetry, prepares the socket directory,
/// then loads the inventory. Any failure is reported to `reporter` and
/// aborts startup; the daemon never runs with an empty fallback inventory.
///
/// # Errors
///
/// Returns the first [`BootstrapError`] encountered.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();
    let result = bootstrap_steps(loader, reporter.as_ref());
    match &result {
        Ok(daemon) => reporter.bootstrap_succeeded(daemon.config()),
        Err(error) => reporter.bootstrap_failed(error),
    }
    result
}

fn bootstrap_steps(
    loader: &dyn ConfigLoader,
    reporter: &dyn HealthReporter,
) -> Result<Daemon, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    config
        .daemon_socket()
        .prepare_filesystem()
        .map_err(|source| BootstrapError::Socket { source })?;

    let oid: ObjectIdentifier =
        config
            .counter_oid()
            .parse()
            .map_err(|source| BootstrapError::CounterOid {
                oid: config.counter_oid().to_owned(),
                source,
            })?;
    let fetcher = SnmpCounterFetcher::new(
        config.snmp_community().as_bytes(),
        config.snmp_port(),
        config.snmp_timeout(),
        oid,
    )
    .with_version(snmp_version(config.snmp_version()));

    let backend = JsonFileBackend::new(config.inventory_path().as_std_path());
    let inventory =
        Inventory::load(backend).map_err(|source| BootstrapError::Inventory { source })?;
    reporter.inventory_loaded(&inventory.backend().describe(), inventory.len());

    let dispatcher = Dispatcher::new(inventory, fetcher, config.poll_workers());
    Ok(Daemon {
        config,
        dispatcher,
        telemetry,
    })
}

fn snmp_version(configured: ConfiguredVersion) -> SnmpVersion {
    match configured {
        ConfiguredVersion::V1 => SnmpVersion::V1,
        ConfiguredVersion::V2c => SnmpVersion::V2c,
    }
}
