//! Errors raised by the inventory and its backends.

use std::io;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use thiserror::Error;

use crate::record::{AssetId, AssetIdError, Lookup};

/// Errors surfaced by [`crate::Inventory`] operations and backends.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// No record matched the lookup.
    #[error("no printer registered with {lookup}")]
    NotFound {
        /// Lookup that failed.
        lookup: Lookup,
    },
    /// A record already uses the address.
    #[error("a printer with IP {address} already exists")]
    AddressTaken {
        /// Conflicting address.
        address: Ipv4Addr,
    },
    /// A record already uses the asset identifier.
    #[error("NID {asset_id} is already assigned to the printer at {address}")]
    AssetIdTaken {
        /// Conflicting identifier.
        asset_id: AssetId,
        /// Address of the record holding it.
        address: Ipv4Addr,
    },
    /// The snapshot could not be read.
    #[error("failed to read inventory '{path}': {source}")]
    Read {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The snapshot is not valid JSON of the expected shape.
    #[error("failed to decode inventory '{path}': {source}")]
    Decode {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A snapshot key is not an IPv4 address.
    #[error("inventory '{path}' contains '{value}', which is not an IPv4 address")]
    InvalidAddress {
        /// Snapshot path.
        path: PathBuf,
        /// Offending key.
        value: String,
    },
    /// A snapshot value carries a malformed asset identifier.
    #[error("inventory '{path}' has a malformed NID for {address}: {source}")]
    InvalidAssetId {
        /// Snapshot path.
        path: PathBuf,
        /// Record address.
        address: Ipv4Addr,
        /// Validation failure.
        #[source]
        source: AssetIdError,
    },
    /// The snapshot could not be serialised.
    #[error("failed to encode inventory: {0}")]
    Encode(#[source] serde_json::Error),
    /// The snapshot could not be written.
    #[error("failed to write inventory '{path}': {source}")]
    Write {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A non-file backend failed.
    #[error("inventory backend failure: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

impl InventoryError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(lookup: Lookup) -> Self {
        Self::NotFound { lookup }
    }

    /// Creates a backend failure.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns true for outcomes the operator caused and can correct:
    /// unknown printers and conflicting identifiers.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::AddressTaken { .. } | Self::AssetIdTaken { .. }
        )
    }
}
