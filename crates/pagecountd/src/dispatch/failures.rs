//! Process-lifetime record of failed counter reads.

use std::net::Ipv4Addr;

/// Append-only list of addresses whose counter read failed.
///
/// Entries are never pruned or merged; the log only resets when the daemon
/// restarts.
#[derive(Debug, Default, Clone)]
pub struct FailureLog {
    entries: Vec<Ipv4Addr>,
}

/// One distinct failing address and how often it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureSummary {
    /// Printer address.
    pub address: Ipv4Addr,
    /// Number of failed reads recorded for the address.
    pub failures: usize,
}

impl FailureLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a failed read.
    pub fn record(&mut self, address: Ipv4Addr) {
        self.entries.push(address);
    }

    /// Every recorded failure, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[Ipv4Addr] {
        &self.entries
    }

    /// Number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing has failed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct addresses in order of first failure, with their counts.
    #[must_use]
    pub fn summary(&self) -> Vec<FailureSummary> {
        let mut summary: Vec<FailureSummary> = Vec::new();
        for address in &self.entries {
            match summary.iter_mut().find(|entry| entry.address == *address) {
                Some(entry) => entry.failures += 1,
                None => summary.push(FailureSummary {
                    address: *address,
                    failures: 1,
                }),
            }
        }
        summary
    }
}
