//! Fixtures shared by the inventory suites.

use std::net::Ipv4Addr;

use rstest::fixture;

use crate::{AssetId, Inventory, MemoryBackend, PrinterRecord};

pub(super) fn asset(value: &str) -> AssetId {
    AssetId::parse(value).expect("test asset id should be valid")
}

pub(super) fn record(address: [u8; 4], label: &str, asset_id: &str) -> PrinterRecord {
    PrinterRecord::new(Ipv4Addr::from(address), label, asset(asset_id))
}

/// Two printers registered before each test.
#[fixture]
pub(super) fn seeded() -> (Inventory<MemoryBackend>, MemoryBackend) {
    let backend = MemoryBackend::with_records(vec![
        record([10, 0, 0, 1], "Contabilidade", "100"),
        record([10, 0, 0, 5], "Recepção", "200"),
    ]);
    let inventory = Inventory::load(backend.clone()).expect("memory load should succeed");
    (inventory, backend)
}
