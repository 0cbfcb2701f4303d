//! Chat command dispatch for the daemon.
//!
//! Clients send one JSONL request per connection carrying the operator's chat
//! text:
//!
//! ```json
//! {"text":"/contador ip:10.0.0.1","sender":"ana"}
//! ```
//!
//! The daemon parses the text into a [`Command`], runs it against the printer
//! inventory and the counter fetcher, and answers with zero or more reply
//! messages followed by a terminal exit message:
//!
//! ```json
//! {"kind":"reply","text":"Contabilidade (10.0.0.1, NID: 100) - Contador: 48213"}
//! {"kind":"exit","status":0}
//! ```
//!
//! Exit status 0 means the command completed, 1 that it was rejected (not
//! understood, unknown printer, conflicting identifiers or a malformed
//! request) and 2 that it failed on an internal fault.

mod command;
mod dispatcher;
mod errors;
mod failures;
mod handler;
mod replies;
mod request;
mod response;
mod shared;

pub use self::command::{Command, CommandName, ParseError, parse};
pub use self::dispatcher::{DispatchOutcome, Dispatcher, ReplySink};
pub use self::errors::DispatchError;
pub use self::failures::{FailureLog, FailureSummary};
pub use self::handler::DispatchConnectionHandler;
pub use self::shared::SharedDispatcher;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
