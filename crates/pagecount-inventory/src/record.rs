//! Printer records and the identifiers used to look them up.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;

/// Human-assigned asset identifier ("NID") of a printer.
///
/// Identifiers entered by operators are non-empty strings of ASCII digits.
/// Snapshots may also carry the empty identifier for printers that were
/// never tagged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(String);

/// Reasons an asset identifier was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetIdError {
    /// No digits were supplied.
    #[error("the NID must not be empty")]
    Empty,
    /// The value contained something other than ASCII digits.
    #[error("the NID '{value}' must contain only digits")]
    NonDigit {
        /// Rejected input.
        value: String,
    },
}

impl AssetId {
    /// Parses an operator-supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AssetIdError::Empty`] for empty input and
    /// [`AssetIdError::NonDigit`] when any character is not an ASCII digit.
    pub fn parse(value: &str) -> Result<Self, AssetIdError> {
        if value.is_empty() {
            return Err(AssetIdError::Empty);
        }
        Self::from_snapshot(value)
    }

    /// Accepts identifiers read from a snapshot, where empty means untagged.
    pub(crate) fn from_snapshot(value: &str) -> Result<Self, AssetIdError> {
        if value.chars().all(|ch| ch.is_ascii_digit()) {
            Ok(Self(value.to_owned()))
        } else {
            Err(AssetIdError::NonDigit {
                value: value.to_owned(),
            })
        }
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for printers that were never tagged.
    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for AssetId {
    type Err = AssetIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// One physical printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterRecord {
    address: Ipv4Addr,
    label: String,
    asset_id: AssetId,
}

impl PrinterRecord {
    /// Builds a record.
    #[must_use]
    pub fn new(address: Ipv4Addr, label: impl Into<String>, asset_id: AssetId) -> Self {
        Self {
            address,
            label: label.into(),
            asset_id,
        }
    }

    /// Network address; the inventory's primary key.
    #[must_use]
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Sector or location name.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Asset identifier.
    #[must_use]
    pub fn asset_id(&self) -> &AssetId {
        &self.asset_id
    }

    pub(crate) fn set_address(&mut self, address: Ipv4Addr) {
        self.address = address;
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }

    pub(crate) fn set_asset_id(&mut self, asset_id: AssetId) {
        self.asset_id = asset_id;
    }
}

impl fmt::Display for PrinterRecord {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} ({}, NID: {})",
            self.label, self.address, self.asset_id
        )
    }
}

/// Identifies a record either by address or by asset identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Match on the primary key.
    Address(Ipv4Addr),
    /// Match on the asset identifier.
    AssetId(AssetId),
}

impl fmt::Display for Lookup {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => write!(formatter, "IP {address}"),
            Self::AssetId(asset_id) => write!(formatter, "NID {asset_id}"),
        }
    }
}
