//! Fixtures shared by the daemon test suites.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use ortho_config::{OrthoConfig, OrthoError};
use pagecount_config::{Config, SocketEndpoint};
use pagecount_inventory::{AssetId, Inventory, MemoryBackend, PrinterRecord};
use pagecount_snmp::{CounterFetcher, FetchError, PageCount};
use tempfile::TempDir;

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::health::HealthReporter;

/// Inventory file written by [`TestConfigLoader`].
pub(crate) const SEED_INVENTORY: &str = r#"{
    "10.0.0.1": ["Contabilidade", "100"],
    "10.0.0.5": ["Recepção", "200"]
}
"#;

pub(crate) fn asset(value: &str) -> AssetId {
    AssetId::parse(value).expect("valid asset id")
}

pub(crate) fn record(octets: [u8; 4], label: &str, asset_id: &str) -> PrinterRecord {
    PrinterRecord::new(Ipv4Addr::from(octets), label, asset(asset_id))
}

/// Fetcher answering from a fixed table; unknown printers time out.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedFetcher {
    counts: HashMap<Ipv4Addr, u64>,
}

impl ScriptedFetcher {
    pub(crate) fn with(mut self, address: [u8; 4], count: u64) -> Self {
        self.counts.insert(Ipv4Addr::from(address), count);
        self
    }
}

impl CounterFetcher for ScriptedFetcher {
    fn fetch(&self, address: Ipv4Addr) -> Result<PageCount, FetchError> {
        self.counts
            .get(&address)
            .copied()
            .map(PageCount)
            .ok_or_else(|| FetchError::Request {
                address,
                message: String::from("Receive timed out"),
            })
    }
}

/// Dispatcher over an in-memory inventory, plus a handle on its storage.
pub(crate) struct DispatchHarness {
    pub(crate) dispatcher: Dispatcher<MemoryBackend, ScriptedFetcher>,
    pub(crate) storage: MemoryBackend,
}

impl DispatchHarness {
    pub(crate) fn new(records: Vec<PrinterRecord>, fetcher: ScriptedFetcher) -> Self {
        let storage = MemoryBackend::with_records(records);
        let inventory = Inventory::load(storage.clone()).expect("memory inventory loads");
        Self {
            dispatcher: Dispatcher::new(inventory, fetcher, 4),
            storage,
        }
    }

    /// Sends one message and returns its outcome and replies.
    pub(crate) fn send(&mut self, text: &str) -> (DispatchOutcome, Vec<String>) {
        let mut replies = Vec::new();
        let outcome = self
            .dispatcher
            .handle(text, &mut replies)
            .expect("vector sink never fails");
        (outcome, replies)
    }
}

/// Loader with an inventory file and socket under a temporary directory.
pub(crate) struct TestConfigLoader {
    dir: TempDir,
    config: Config,
}

impl TestConfigLoader {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().expect("create temporary directory");
        let inventory = dir.path().join("printers.json");
        fs::write(&inventory, SEED_INVENTORY).expect("write seed inventory");

        let config = Config {
            daemon_socket: test_socket(&dir),
            inventory_path: inventory.to_str().expect("utf8 inventory path").into(),
            log_filter: String::from("off"),
            ..Config::default()
        };
        Self { dir, config }
    }

    /// Adjusts the configuration handed out by the loader.
    pub(crate) fn configure(mut self, change: impl FnOnce(&mut Config)) -> Self {
        change(&mut self.config);
        self
    }

    pub(crate) fn inventory_path(&self) -> PathBuf {
        self.config.inventory_path.clone().into_std_path_buf()
    }

    pub(crate) fn missing_file(&self) -> String {
        self.dir
            .path()
            .join("absent.json")
            .to_str()
            .expect("utf8 path")
            .to_owned()
    }
}

#[cfg(unix)]
fn test_socket(dir: &TempDir) -> SocketEndpoint {
    SocketEndpoint::unix(
        dir.path()
            .join("pagecountd.sock")
            .to_str()
            .expect("utf8 socket path"),
    )
}

#[cfg(not(unix))]
fn test_socket(_dir: &TempDir) -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", 0)
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Loader that fails the way a bad command line does.
pub(crate) struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("pagecountd"),
            OsString::from("--daemon-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}

/// Records health events for assertions.
#[derive(Default)]
pub(crate) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub(crate) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Endpoint reported by the most recent `listener_ready` event.
    pub(crate) fn ready_endpoint(&self) -> Option<SocketEndpoint> {
        self.events().into_iter().rev().find_map(|event| match event {
            HealthEvent::ListenerReady(endpoint) => Some(endpoint),
            _ => None,
        })
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn inventory_loaded(&self, _source: &str, printers: usize) {
        self.record(HealthEvent::InventoryLoaded(printers));
    }

    fn listener_ready(&self, endpoint: &SocketEndpoint) {
        self.record(HealthEvent::ListenerReady(endpoint.clone()));
    }

    fn shutdown_requested(&self) {
        self.record(HealthEvent::ShutdownRequested);
    }
}

/// Lifecycle events captured by [`RecordingHealthReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    InventoryLoaded(usize),
    ListenerReady(SocketEndpoint),
    ShutdownRequested,
}
