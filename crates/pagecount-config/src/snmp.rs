//! SNMP protocol version selection.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// SNMP message version used for counter reads.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SnmpVersion {
    /// SNMPv1, understood by older printer agents.
    #[default]
    V1,
    /// SNMPv2c.
    V2c,
}

/// Errors encountered while parsing an [`SnmpVersion`] from text.
pub type SnmpVersionParseError = strum::ParseError;
