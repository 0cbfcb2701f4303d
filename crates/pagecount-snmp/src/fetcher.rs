//! Single-printer counter reads.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use snmp2::{SyncSession, Value};
use tracing::debug;

use crate::error::FetchError;
use crate::oid::ObjectIdentifier;

const FETCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::fetch");

/// Cumulative number of pages a printer reports having printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageCount(pub u64);

impl fmt::Display for PageCount {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Reads a printer's page counter.
pub trait CounterFetcher: Send + Sync {
    /// Performs one read against `address`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for any transport, protocol or value failure.
    fn fetch(&self, address: Ipv4Addr) -> Result<PageCount, FetchError>;
}

/// SNMP message version used for counter reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnmpVersion {
    /// SNMPv1, answered by every printer agent including older ones.
    #[default]
    V1,
    /// SNMPv2c.
    V2c,
}

/// [`CounterFetcher`] backed by SNMP GET requests.
///
/// A session is opened per read and dropped afterwards; nothing is retried.
/// Requests are sent as SNMPv1 unless another version is selected.
#[derive(Debug, Clone)]
pub struct SnmpCounterFetcher {
    community: Vec<u8>,
    port: u16,
    timeout: Duration,
    oid: ObjectIdentifier,
    version: SnmpVersion,
}

impl SnmpCounterFetcher {
    /// Creates a fetcher reading `oid` with `community` on `port`.
    #[must_use]
    pub fn new(
        community: impl Into<Vec<u8>>,
        port: u16,
        timeout: Duration,
        oid: ObjectIdentifier,
    ) -> Self {
        Self {
            community: community.into(),
            port,
            timeout,
            oid,
            version: SnmpVersion::default(),
        }
    }

    /// Selects the SNMP message version.
    #[must_use]
    pub fn with_version(mut self, version: SnmpVersion) -> Self {
        self.version = version;
        self
    }

    /// SNMP message version in use.
    #[must_use]
    pub fn version(&self) -> SnmpVersion {
        self.version
    }

    /// Identifier requested from every printer.
    #[must_use]
    pub fn oid(&self) -> &ObjectIdentifier {
        &self.oid
    }
}

impl CounterFetcher for SnmpCounterFetcher {
    fn fetch(&self, address: Ipv4Addr) -> Result<PageCount, FetchError> {
        let agent = SocketAddr::V4(SocketAddrV4::new(address, self.port));
        debug!(
            target: FETCH_TARGET,
            %agent,
            oid = %self.oid,
            version = ?self.version,
            "requesting page counter"
        );

        let oid = self.oid.to_snmp().map_err(|error| FetchError::Request {
            address,
            message: error.to_string(),
        })?;
        let timeout = Some(self.timeout);
        let mut session = match self.version {
            SnmpVersion::V1 => SyncSession::new_v1(agent, &self.community, timeout, 0),
            SnmpVersion::V2c => SyncSession::new_v2c(agent, &self.community, timeout, 0),
        }
        .map_err(|source| FetchError::Session { address, source })?;
        let mut response = session.get(&oid).map_err(|error| FetchError::Request {
            address,
            message: format!("{error:?}"),
        })?;

        if response.error_status != 0 {
            return Err(FetchError::ErrorStatus {
                address,
                status: i64::from(response.error_status),
            });
        }
        let Some((_, value)) = response.varbinds.next() else {
            return Err(FetchError::EmptyResponse { address });
        };
        let count = page_count_from_value(address, &self.oid, &value)?;
        debug!(target: FETCH_TARGET, %agent, count = count.0, "page counter read");
        Ok(count)
    }
}

/// Converts a returned SNMP value into a page count.
///
/// Integer types, timeticks and octet strings holding decimal digits are
/// accepted; negative integers and every other type are rejected.
///
/// # Errors
///
/// Returns [`FetchError::NoSuchObject`] for the SNMPv2 exception values and
/// [`FetchError::UnsupportedValue`] for anything not numeric.
pub fn page_count_from_value(
    address: Ipv4Addr,
    oid: &ObjectIdentifier,
    value: &Value<'_>,
) -> Result<PageCount, FetchError> {
    let unsupported = |kind: &str| FetchError::UnsupportedValue {
        address,
        kind: kind.to_owned(),
    };
    match value {
        Value::Integer(raw) => u64::try_from(*raw)
            .map(PageCount)
            .map_err(|_| unsupported("negative integer")),
        Value::Counter32(raw) | Value::Unsigned32(raw) | Value::Timeticks(raw) => {
            Ok(PageCount(u64::from(*raw)))
        }
        Value::Counter64(raw) => Ok(PageCount(*raw)),
        Value::OctetString(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|text| text.trim().parse::<u64>().ok())
            .map(PageCount)
            .ok_or_else(|| unsupported("non-numeric octet string")),
        Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
            Err(FetchError::NoSuchObject {
                address,
                oid: oid.to_string(),
            })
        }
        Value::Null => Err(unsupported("null")),
        Value::Boolean(_) => Err(unsupported("boolean")),
        Value::IpAddress(_) => Err(unsupported("ip address")),
        _ => Err(unsupported("non-scalar value")),
    }
}
