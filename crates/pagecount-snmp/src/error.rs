//! Error types for counter reads.

use std::io;
use std::net::Ipv4Addr;

use thiserror::Error;

/// Reasons a page counter could not be read.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The UDP session could not be opened.
    #[error("failed to open SNMP session to {address}: {source}")]
    Session {
        /// Printer address.
        address: Ipv4Addr,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The request timed out or the response could not be decoded.
    #[error("SNMP request to {address} failed: {message}")]
    Request {
        /// Printer address.
        address: Ipv4Addr,
        /// Library error description.
        message: String,
    },
    /// The agent answered with a non-zero error status.
    #[error("SNMP agent at {address} returned error status {status}")]
    ErrorStatus {
        /// Printer address.
        address: Ipv4Addr,
        /// Error status from the response PDU.
        status: i64,
    },
    /// The response carried no variable bindings.
    #[error("SNMP response from {address} contained no values")]
    EmptyResponse {
        /// Printer address.
        address: Ipv4Addr,
    },
    /// The agent does not expose the requested object.
    #[error("SNMP agent at {address} has no object {oid}")]
    NoSuchObject {
        /// Printer address.
        address: Ipv4Addr,
        /// Requested identifier.
        oid: String,
    },
    /// The value is not a non-negative number.
    #[error("SNMP agent at {address} returned a non-numeric counter ({kind})")]
    UnsupportedValue {
        /// Printer address.
        address: Ipv4Addr,
        /// Description of the value received.
        kind: String,
    },
}

impl FetchError {
    /// Address of the printer that failed.
    #[must_use]
    pub fn address(&self) -> Ipv4Addr {
        match self {
            Self::Session { address, .. }
            | Self::Request { address, .. }
            | Self::ErrorStatus { address, .. }
            | Self::EmptyResponse { address }
            | Self::NoSuchObject { address, .. }
            | Self::UnsupportedValue { address, .. } => *address,
        }
    }
}

/// Errors raised while parsing a dotted-decimal object identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OidParseError {
    /// No arcs were supplied.
    #[error("object identifier must not be empty")]
    Empty,
    /// An arc is empty or not a decimal number.
    #[error("object identifier '{input}' has an invalid arc '{arc}'")]
    InvalidArc {
        /// Full input.
        input: String,
        /// Offending arc.
        arc: String,
    },
    /// Fewer than two arcs were supplied.
    #[error("object identifier '{input}' needs at least two arcs")]
    TooShort {
        /// Full input.
        input: String,
    },
    /// The arcs cannot be BER-encoded, for example a first arc above 2.
    #[error("object identifier '{input}' cannot be encoded")]
    Unencodable {
        /// Full input.
        input: String,
    },
}
