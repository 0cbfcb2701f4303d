//! The printer inventory and its mutation operations.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use tracing::{info, warn};

use crate::backend::InventoryBackend;
use crate::error::InventoryError;
use crate::record::{AssetId, Lookup, PrinterRecord};

const INVENTORY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");

/// In-memory printer inventory backed by a persistent snapshot.
///
/// Records are kept in ascending address order, which is also the order used
/// by iteration, search results and asset identifier lookups.
#[derive(Debug)]
pub struct Inventory<B> {
    backend: B,
    records: BTreeMap<Ipv4Addr, PrinterRecord>,
}

impl<B: InventoryBackend> Inventory<B> {
    /// Loads the snapshot from `backend`.
    ///
    /// # Errors
    ///
    /// Propagates the backend's load error; a missing or malformed snapshot
    /// is never replaced with an empty inventory.
    pub fn load(backend: B) -> Result<Self, InventoryError> {
        let records: BTreeMap<Ipv4Addr, PrinterRecord> = backend
            .load()?
            .into_iter()
            .map(|record| (record.address(), record))
            .collect();
        let inventory = Self { backend, records };
        inventory.warn_on_duplicate_asset_ids();
        info!(
            target: INVENTORY_TARGET,
            source = %inventory.backend.describe(),
            printers = inventory.records.len(),
            "inventory loaded"
        );
        Ok(inventory)
    }

    /// Number of registered printers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when no printer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over every record in address order.
    pub fn records(&self) -> impl Iterator<Item = &PrinterRecord> {
        self.records.values()
    }

    /// Borrow of the persistence backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Looks up a record by address.
    #[must_use]
    pub fn get(&self, address: Ipv4Addr) -> Option<&PrinterRecord> {
        self.records.get(&address)
    }

    /// Finds the record carrying `asset_id`, lowest address first.
    #[must_use]
    pub fn find_by_asset_id(&self, asset_id: &AssetId) -> Option<&PrinterRecord> {
        self.records
            .values()
            .find(|record| record.asset_id() == asset_id)
    }

    /// Resolves a lookup by address or asset identifier.
    #[must_use]
    pub fn resolve(&self, lookup: &Lookup) -> Option<&PrinterRecord> {
        match lookup {
            Lookup::Address(address) => self.get(*address),
            Lookup::AssetId(asset_id) => self.find_by_asset_id(asset_id),
        }
    }

    /// Records whose label contains `needle`, ignoring case.
    #[must_use]
    pub fn search(&self, needle: &str) -> Vec<&PrinterRecord> {
        let needle = needle.to_lowercase();
        self.records
            .values()
            .filter(|record| record.label().to_lowercase().contains(&needle))
            .collect()
    }

    /// Registers a new printer.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::AddressTaken`] or
    /// [`InventoryError::AssetIdTaken`] when the record clashes with an
    /// existing one, or the backend's error if the snapshot cannot be written.
    pub fn insert(&mut self, record: PrinterRecord) -> Result<(), InventoryError> {
        if self.records.contains_key(&record.address()) {
            return Err(InventoryError::AddressTaken {
                address: record.address(),
            });
        }
        self.ensure_asset_id_free(record.asset_id(), None)?;

        let mut staged = self.records.clone();
        info!(target: INVENTORY_TARGET, printer = %record, "adding printer");
        staged.insert(record.address(), record);
        self.commit(staged)
    }

    /// Replaces the asset identifier `old` with `new`.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::NotFound`] when no record carries `old`,
    /// [`InventoryError::AssetIdTaken`] when another record already carries
    /// `new`, or the backend's write error.
    pub fn update_asset_id(
        &mut self,
        old: &AssetId,
        new: AssetId,
    ) -> Result<PrinterRecord, InventoryError> {
        let address = self.address_of(old)?;
        self.ensure_asset_id_free(&new, Some(address))?;
        self.modify(address, |record| record.set_asset_id(new))
    }

    /// Moves the printer tagged `asset_id` to `new_address`.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::NotFound`] when no record carries
    /// `asset_id`, [`InventoryError::AddressTaken`] when a different printer
    /// already uses `new_address`, or the backend's write error.
    pub fn update_address(
        &mut self,
        asset_id: &AssetId,
        new_address: Ipv4Addr,
    ) -> Result<PrinterRecord, InventoryError> {
        let address = self.address_of(asset_id)?;
        if address != new_address && self.records.contains_key(&new_address) {
            return Err(InventoryError::AddressTaken {
                address: new_address,
            });
        }

        let mut staged = self.records.clone();
        let Some(mut record) = staged.remove(&address) else {
            return Err(InventoryError::not_found(Lookup::AssetId(asset_id.clone())));
        };
        record.set_address(new_address);
        info!(
            target: INVENTORY_TARGET,
            from = %address,
            to = %new_address,
            "moving printer"
        );
        staged.insert(new_address, record.clone());
        self.commit(staged)?;
        Ok(record)
    }

    /// Changes the label of the printer tagged `asset_id`.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::NotFound`] when no record carries
    /// `asset_id`, or the backend's write error.
    pub fn update_label(
        &mut self,
        asset_id: &AssetId,
        label: impl Into<String>,
    ) -> Result<PrinterRecord, InventoryError> {
        let address = self.address_of(asset_id)?;
        let label = label.into();
        self.modify(address, |record| record.set_label(label))
    }

    /// Deletes the record matching `lookup` and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::NotFound`] when nothing matches, or the
    /// backend's write error.
    pub fn remove(&mut self, lookup: &Lookup) -> Result<PrinterRecord, InventoryError> {
        let address = self
            .resolve(lookup)
            .map(PrinterRecord::address)
            .ok_or_else(|| InventoryError::not_found(lookup.clone()))?;

        let mut staged = self.records.clone();
        let Some(removed) = staged.remove(&address) else {
            return Err(InventoryError::not_found(lookup.clone()));
        };
        info!(target: INVENTORY_TARGET, printer = %removed, "removing printer");
        self.commit(staged)?;
        Ok(removed)
    }

    /// Writes the current snapshot through the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend's write error.
    pub fn persist(&self) -> Result<(), InventoryError> {
        let snapshot: Vec<PrinterRecord> = self.records.values().cloned().collect();
        self.backend.store(&snapshot)
    }

    fn address_of(&self, asset_id: &AssetId) -> Result<Ipv4Addr, InventoryError> {
        self.find_by_asset_id(asset_id)
            .map(PrinterRecord::address)
            .ok_or_else(|| InventoryError::not_found(Lookup::AssetId(asset_id.clone())))
    }

    fn ensure_asset_id_free(
        &self,
        asset_id: &AssetId,
        owner: Option<Ipv4Addr>,
    ) -> Result<(), InventoryError> {
        match self
            .records
            .values()
            .find(|record| record.asset_id() == asset_id && Some(record.address()) != owner)
        {
            Some(holder) => Err(InventoryError::AssetIdTaken {
                asset_id: asset_id.clone(),
                address: holder.address(),
            }),
            None => Ok(()),
        }
    }

    fn modify(
        &mut self,
        address: Ipv4Addr,
        change: impl FnOnce(&mut PrinterRecord),
    ) -> Result<PrinterRecord, InventoryError> {
        let mut staged = self.records.clone();
        let Some(record) = staged.get_mut(&address) else {
            return Err(InventoryError::not_found(Lookup::Address(address)));
        };
        change(record);
        let updated = record.clone();
        info!(target: INVENTORY_TARGET, printer = %updated, "updating printer");
        self.commit(staged)?;
        Ok(updated)
    }

    /// Persists `staged` and adopts it only once the write succeeded.
    fn commit(&mut self, staged: BTreeMap<Ipv4Addr, PrinterRecord>) -> Result<(), InventoryError> {
        let snapshot: Vec<PrinterRecord> = staged.values().cloned().collect();
        self.backend.store(&snapshot)?;
        self.records = staged;
        Ok(())
    }

    fn warn_on_duplicate_asset_ids(&self) {
        let mut holders: BTreeMap<&AssetId, Vec<Ipv4Addr>> = BTreeMap::new();
        for record in self.records.values() {
            if !record.asset_id().is_unassigned() {
                holders
                    .entry(record.asset_id())
                    .or_default()
                    .push(record.address());
            }
        }
        for (asset_id, addresses) in holders.into_iter().filter(|(_, list)| list.len() > 1) {
            warn!(
                target: INVENTORY_TARGET,
                nid = %asset_id,
                addresses = ?addresses,
                "duplicate NID in inventory; lookups resolve to the lowest address"
            );
        }
    }
}
