//! Page counter reads over SNMP.
//!
//! [`SnmpCounterFetcher`] issues a single SNMP GET (v1 by default) for the
//! configured object identifier and turns the returned value into a
//! [`PageCount`]. Every way a read can go wrong surfaces as a [`FetchError`];
//! callers are expected to treat them alike and report the printer as
//! unreachable.
//!
//! [`poll_all`] reads many printers at once with a bounded number of worker
//! threads and hands the results back in input order.

mod error;
mod fetcher;
mod oid;
mod poll;

pub use error::{FetchError, OidParseError};
pub use fetcher::{
    CounterFetcher, PageCount, SnmpCounterFetcher, SnmpVersion, page_count_from_value,
};
pub use oid::ObjectIdentifier;
pub use poll::poll_all;

#[cfg(test)]
mod tests;
