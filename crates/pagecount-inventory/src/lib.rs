//! Printer inventory for the pagecount bot.
//!
//! The inventory maps each printer's IPv4 address to a sector label and an
//! asset identifier ("NID"). [`Inventory`] owns the in-memory mapping and
//! writes the full snapshot through an [`InventoryBackend`] after every
//! successful mutation. Mutations are staged: the backend sees the new
//! snapshot first and the in-memory state only changes once the write
//! succeeded, so a failed write never leaves memory and disk disagreeing.
//!
//! Two backends ship with the crate:
//!
//! - [`JsonFileBackend`] stores the snapshot as a JSON object keyed by
//!   address, each value a `[label, asset_id]` pair, replaced atomically on
//!   every write.
//! - [`MemoryBackend`] keeps the snapshot in memory for tests and can be told
//!   to fail writes.
//!
//! Addresses are unique by construction. Asset identifiers are kept unique by
//! every mutation; snapshots written by other tools may still contain
//! duplicates; in that case lookups by asset identifier resolve to the record
//! with the lowest address.

mod backend;
mod error;
mod record;
mod store;

pub use backend::{InventoryBackend, JsonFileBackend, MemoryBackend};
pub use error::InventoryError;
pub use record::{AssetId, AssetIdError, Lookup, PrinterRecord};
pub use store::Inventory;

#[cfg(test)]
mod tests;
