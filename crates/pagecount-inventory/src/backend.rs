//! Persistence backends for the inventory snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write as _;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::ser::PrettyFormatter;

use crate::error::InventoryError;
use crate::record::{AssetId, PrinterRecord};

/// Storage for the full inventory snapshot.
///
/// Backends persist whole snapshots; there are no partial updates.
pub trait InventoryBackend: Send {
    /// Reads every record from storage.
    ///
    /// # Errors
    ///
    /// Returns an error when the snapshot is missing or malformed. Callers
    /// treat this as fatal; there is no empty fallback.
    fn load(&self) -> Result<Vec<PrinterRecord>, InventoryError>;

    /// Replaces the stored snapshot with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error when the snapshot could not be written.
    fn store(&self, records: &[PrinterRecord]) -> Result<(), InventoryError>;

    /// Human-readable location used in logs.
    fn describe(&self) -> String;
}

/// JSON snapshot on the local filesystem.
///
/// The file holds one object keyed by address; each value is a
/// `[label, asset_id]` pair. Writes replace the file atomically through a
/// temporary sibling.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

const INDENT: &[u8] = b"    ";

impl JsonFileBackend {
    /// Creates a backend for the snapshot at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(&self, raw: &[u8]) -> Result<Vec<PrinterRecord>, InventoryError> {
        let entries: BTreeMap<String, (String, String)> =
            serde_json::from_slice(raw).map_err(|source| InventoryError::Decode {
                path: self.path.clone(),
                source,
            })?;

        entries
            .into_iter()
            .map(|(key, (label, asset_id))| {
                let address: Ipv4Addr =
                    key.parse().map_err(|_| InventoryError::InvalidAddress {
                        path: self.path.clone(),
                        value: key.clone(),
                    })?;
                let asset_id = AssetId::from_snapshot(&asset_id).map_err(|source| {
                    InventoryError::InvalidAssetId {
                        path: self.path.clone(),
                        address,
                        source,
                    }
                })?;
                Ok(PrinterRecord::new(address, label, asset_id))
            })
            .collect()
    }

    fn write_error(&self, source: std::io::Error) -> InventoryError {
        InventoryError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl InventoryBackend for JsonFileBackend {
    fn load(&self) -> Result<Vec<PrinterRecord>, InventoryError> {
        let raw = fs::read(&self.path).map_err(|source| InventoryError::Read {
            path: self.path.clone(),
            source,
        })?;
        self.decode(&raw)
    }

    fn store(&self, records: &[PrinterRecord]) -> Result<(), InventoryError> {
        let mut buffer = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(INDENT));
        SnapshotRef(records)
            .serialize(&mut serializer)
            .map_err(InventoryError::Encode)?;
        buffer.push(b'\n');

        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp_file =
            tempfile::NamedTempFile::new_in(parent).map_err(|source| self.write_error(source))?;
        // The replacement keeps the mode of the snapshot it overwrites.
        if let Ok(existing) = fs::metadata(&self.path) {
            temp_file
                .as_file()
                .set_permissions(existing.permissions())
                .map_err(|source| self.write_error(source))?;
        }
        temp_file
            .write_all(&buffer)
            .map_err(|source| self.write_error(source))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|source| self.write_error(source))?;
        temp_file
            .persist(&self.path)
            .map_err(|error| self.write_error(error.error))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Serialises records as the address-keyed snapshot object, in slice order.
struct SnapshotRef<'a>(&'a [PrinterRecord]);

impl Serialize for SnapshotRef<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for record in self.0 {
            map.serialize_entry(
                &record.address().to_string(),
                &(record.label(), record.asset_id().as_str()),
            )?;
        }
        map.end()
    }
}

/// In-memory backend for tests and embedding.
///
/// Clones share the same state, so a test can keep one handle to inspect
/// what the inventory stored.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<PrinterRecord>,
    stores: usize,
    fail_next_store: bool,
}

impl MemoryBackend {
    /// Creates a backend whose snapshot already holds `records`.
    #[must_use]
    pub fn with_records(records: Vec<PrinterRecord>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                records,
                ..MemoryState::default()
            })),
        }
    }

    /// Returns the last stored snapshot.
    #[must_use]
    pub fn stored(&self) -> Vec<PrinterRecord> {
        self.lock().records.clone()
    }

    /// Number of successful stores so far.
    #[must_use]
    pub fn store_count(&self) -> usize {
        self.lock().stores
    }

    /// Makes the next [`InventoryBackend::store`] call fail.
    pub fn fail_next_store(&self) {
        self.lock().fail_next_store = true;
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InventoryBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<PrinterRecord>, InventoryError> {
        Ok(self.lock().records.clone())
    }

    fn store(&self, records: &[PrinterRecord]) -> Result<(), InventoryError> {
        let mut state = self.lock();
        if state.fail_next_store {
            state.fail_next_store = false;
            return Err(InventoryError::backend("simulated store failure"));
        }
        state.records = records.to_vec();
        state.stores += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_owned()
    }
}
