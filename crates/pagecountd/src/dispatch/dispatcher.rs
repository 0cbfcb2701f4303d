//! Command execution against the inventory and the counter fetcher.

use std::net::Ipv4Addr;

use pagecount_inventory::{Inventory, InventoryBackend, InventoryError, Lookup, PrinterRecord};
use pagecount_snmp::{CounterFetcher, FetchError, PageCount, poll_all};
use tracing::{debug, info, warn};

use super::DISPATCH_TARGET;
use super::command::{self, Command, ParseError};
use super::errors::DispatchError;
use super::failures::FailureLog;
use super::replies;

/// Destination for reply lines.
pub trait ReplySink {
    /// Delivers one reply to the operator.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply could not be delivered; the dispatcher
    /// stops handling the message and propagates it.
    fn reply(&mut self, text: &str) -> Result<(), DispatchError>;
}

impl ReplySink for Vec<String> {
    fn reply(&mut self, text: &str) -> Result<(), DispatchError> {
        self.push(text.to_owned());
        Ok(())
    }
}

/// Classification of a handled message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The command ran to completion.
    Completed,
    /// The message was not understood or named something that does not exist
    /// or clashes with an existing printer.
    Rejected,
    /// The command hit an internal fault, such as a failed inventory write.
    Failed,
}

impl DispatchOutcome {
    /// Exit status reported to socket clients.
    #[must_use]
    pub fn exit_status(self) -> i32 {
        match self {
            Self::Completed => 0,
            Self::Rejected => 1,
            Self::Failed => 2,
        }
    }
}

/// Parses chat messages and runs them to completion.
///
/// The only state kept between messages is the [`FailureLog`]; everything
/// else lives in the inventory.
#[derive(Debug)]
pub struct Dispatcher<B, F> {
    inventory: Inventory<B>,
    fetcher: F,
    failures: FailureLog,
    poll_workers: usize,
}

impl<B, F> Dispatcher<B, F>
where
    B: InventoryBackend,
    F: CounterFetcher,
{
    /// Builds a dispatcher around a loaded inventory.
    #[must_use]
    pub fn new(inventory: Inventory<B>, fetcher: F, poll_workers: usize) -> Self {
        Self {
            inventory,
            fetcher,
            failures: FailureLog::new(),
            poll_workers: poll_workers.max(1),
        }
    }

    /// Current inventory.
    #[must_use]
    pub fn inventory(&self) -> &Inventory<B> {
        &self.inventory
    }

    /// Counter fetcher used for reads.
    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Failed reads recorded so far.
    #[must_use]
    pub fn failures(&self) -> &FailureLog {
        &self.failures
    }

    /// Handles one chat message, writing replies to `sink`.
    ///
    /// Inventory faults are turned into an error reply and reported as
    /// [`DispatchOutcome::Failed`].
    ///
    /// # Errors
    ///
    /// Returns an error only when `sink` fails to deliver a reply.
    pub fn handle(
        &mut self,
        text: &str,
        sink: &mut dyn ReplySink,
    ) -> Result<DispatchOutcome, DispatchError> {
        let command = match command::parse(text) {
            Ok(command) => command,
            Err(error) => return reject_parse(&error, sink),
        };
        let name = command.name();
        debug!(target: DISPATCH_TARGET, command = %name, "handling command");

        match self.execute(command, sink) {
            Err(DispatchError::Inventory(error)) => {
                warn!(
                    target: DISPATCH_TARGET,
                    command = %name,
                    %error,
                    "command failed"
                );
                sink.reply(&replies::fault(&error))?;
                Ok(DispatchOutcome::Failed)
            }
            other => other,
        }
    }

    fn execute(
        &mut self,
        command: Command,
        sink: &mut dyn ReplySink,
    ) -> Result<DispatchOutcome, DispatchError> {
        match command {
            Command::Start => complete(sink, &replies::start()),
            Command::Help => complete(sink, &replies::help()),
            Command::Counters => self.poll_every_printer(sink),
            Command::Counter(lookup) => self.poll_one_printer(&lookup, sink),
            Command::RenameAssetId { from, to } => {
                let result = self.inventory.update_asset_id(&from, to);
                mutation_outcome(result, replies::asset_id_changed, sink)
            }
            Command::Move { asset_id, address } => {
                let result = self.inventory.update_address(&asset_id, address);
                mutation_outcome(result, replies::moved, sink)
            }
            Command::Relabel { asset_id, label } => {
                let result = self.inventory.update_label(&asset_id, label);
                mutation_outcome(result, replies::relabelled, sink)
            }
            Command::Add {
                asset_id,
                address,
                label,
            } => {
                let record = PrinterRecord::new(address, label, asset_id);
                let result = self.inventory.insert(record.clone()).map(|()| record);
                mutation_outcome(result, replies::added, sink)
            }
            Command::Search { text } => {
                let matches = self.inventory.search(&text);
                complete(sink, &replies::search_results(&text, &matches))
            }
            Command::ListFailures => self.list_failures(sink),
            Command::Remove(lookup) => {
                let result = self.inventory.remove(&lookup);
                mutation_outcome(result, replies::removed, sink)
            }
        }
    }

    fn poll_every_printer(
        &mut self,
        sink: &mut dyn ReplySink,
    ) -> Result<DispatchOutcome, DispatchError> {
        let records: Vec<PrinterRecord> = self.inventory.records().cloned().collect();
        if records.is_empty() {
            return complete(sink, replies::EMPTY_INVENTORY);
        }

        let addresses: Vec<Ipv4Addr> = records.iter().map(PrinterRecord::address).collect();
        let results = poll_all(&self.fetcher, &addresses, self.poll_workers);
        let mut failed = 0_usize;
        for (record, result) in records.iter().zip(results) {
            if result.is_err() {
                failed += 1;
            }
            self.report_read(record, result, sink)?;
        }
        info!(
            target: DISPATCH_TARGET,
            printers = records.len(),
            failed,
            "counter poll finished"
        );
        Ok(DispatchOutcome::Completed)
    }

    fn poll_one_printer(
        &mut self,
        lookup: &Lookup,
        sink: &mut dyn ReplySink,
    ) -> Result<DispatchOutcome, DispatchError> {
        let Some(record) = self.inventory.resolve(lookup).cloned() else {
            sink.reply(&replies::not_found(lookup))?;
            return Ok(DispatchOutcome::Rejected);
        };
        let result = self.fetcher.fetch(record.address());
        self.report_read(&record, result, sink)?;
        Ok(DispatchOutcome::Completed)
    }

    fn report_read(
        &mut self,
        record: &PrinterRecord,
        result: Result<PageCount, FetchError>,
        sink: &mut dyn ReplySink,
    ) -> Result<(), DispatchError> {
        match result {
            Ok(count) => sink.reply(&replies::counter(record, count)),
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    address = %record.address(),
                    %error,
                    "counter read failed"
                );
                self.failures.record(record.address());
                sink.reply(&replies::counter_failure(record))
            }
        }
    }

    fn list_failures(&self, sink: &mut dyn ReplySink) -> Result<DispatchOutcome, DispatchError> {
        if self.failures.is_empty() {
            return complete(sink, replies::NO_FAILURES);
        }
        let entries = self
            .failures
            .summary()
            .into_iter()
            .map(|summary| (summary, self.inventory.get(summary.address)));
        complete(sink, &replies::failures(entries))
    }
}

fn complete(sink: &mut dyn ReplySink, text: &str) -> Result<DispatchOutcome, DispatchError> {
    sink.reply(text)?;
    Ok(DispatchOutcome::Completed)
}

fn reject_parse(
    error: &ParseError,
    sink: &mut dyn ReplySink,
) -> Result<DispatchOutcome, DispatchError> {
    debug!(target: DISPATCH_TARGET, %error, "message rejected");
    sink.reply(&replies::parse_failure(error))?;
    Ok(DispatchOutcome::Rejected)
}

fn mutation_outcome(
    result: Result<PrinterRecord, InventoryError>,
    success: fn(&PrinterRecord) -> String,
    sink: &mut dyn ReplySink,
) -> Result<DispatchOutcome, DispatchError> {
    match result {
        Ok(record) => complete(sink, &success(&record)),
        Err(error) if error.is_rejection() => {
            sink.reply(&replies::inventory_rejection(&error))?;
            Ok(DispatchOutcome::Rejected)
        }
        Err(error) => Err(DispatchError::Inventory(error)),
    }
}
