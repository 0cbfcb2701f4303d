//! Connection handler that dispatches chat requests.
//!
//! This module provides the `DispatchConnectionHandler` which implements the
//! `ConnectionHandler` trait from the transport layer. It reads one JSONL
//! request, hands the chat text to the dispatcher and streams the replies
//! back to the client.

use std::io::{self, Read};
use std::time::Duration;

use pagecount_inventory::InventoryBackend;
use pagecount_snmp::CounterFetcher;
use tracing::{debug, info, warn};

use crate::transport::{ConnectionHandler, ConnectionStream};

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::request::ChatRequest;
use super::response::ResponseWriter;
use super::shared::SharedDispatcher;

/// Maximum size of a single request line in bytes.
pub(crate) const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// How long a client may take to send its request line.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection handler that parses chat requests and dispatches them.
///
/// Each connection is handled synchronously: the handler reads a single JSONL
/// request line, runs it through the dispatcher and writes the response
/// stream before closing the connection.
#[derive(Debug)]
pub struct DispatchConnectionHandler<B, F> {
    dispatcher: SharedDispatcher<B, F>,
}

impl<B, F> DispatchConnectionHandler<B, F>
where
    B: InventoryBackend,
    F: CounterFetcher,
{
    /// Creates a handler backed by `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: SharedDispatcher<B, F>) -> Self {
        Self { dispatcher }
    }

    fn dispatch(&self, mut stream: ConnectionStream) {
        let peer = stream.peer();
        if let Err(error) = stream.set_read_timeout(Some(REQUEST_READ_TIMEOUT)) {
            warn!(target: DISPATCH_TARGET, %peer, %error, "failed to set read timeout");
        }
        let request_bytes = match read_request_line(&mut stream) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, %peer, "client disconnected without request");
                return;
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %peer, %error, "failed to read request");
                let mut writer = ResponseWriter::new(&mut stream);
                let _ = writer.write_error(&error);
                return;
            }
        };

        let mut writer = ResponseWriter::new(&mut stream);

        let request = match ChatRequest::parse(&request_bytes) {
            Ok(request) => request,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "malformed request");
                let _ = writer.write_error(&error);
                return;
            }
        };

        if let Err(error) = request.validate() {
            warn!(target: DISPATCH_TARGET, %error, "invalid request");
            let _ = writer.write_error(&error);
            return;
        }

        info!(
            target: DISPATCH_TARGET,
            %peer,
            sender = request.sender(),
            text = %request.text,
            "message received"
        );

        let outcome = self
            .dispatcher
            .with_dispatcher(|dispatcher| dispatcher.handle(&request.text, &mut writer));

        match outcome {
            Ok(Ok(outcome)) => {
                debug!(target: DISPATCH_TARGET, ?outcome, "message handled");
                if let Err(error) = writer.write_exit(outcome.exit_status()) {
                    warn!(target: DISPATCH_TARGET, %error, "failed to write exit");
                }
            }
            Ok(Err(error)) => {
                warn!(target: DISPATCH_TARGET, %error, "dispatch failed");
                let _ = writer.write_error(&error);
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "dispatcher unavailable");
                let _ = writer.write_error(&error);
            }
        }
    }
}

impl<B, F> ConnectionHandler for DispatchConnectionHandler<B, F>
where
    B: InventoryBackend + 'static,
    F: CounterFetcher + 'static,
{
    fn handle(&self, stream: ConnectionStream) {
        self.dispatch(stream);
    }
}

/// Reads a bounded JSONL request line from the stream.
///
/// Returns `Ok(None)` if the client disconnects without sending data.
/// Returns `Ok(Some(bytes))` when a complete line (or EOF with partial data)
/// is received. Returns an error if reading fails or the request exceeds the
/// maximum size.
fn read_request_line(stream: &mut impl Read) -> Result<Option<Vec<u8>>, DispatchError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];

    loop {
        let bytes_read = read_with_retry(stream, &mut chunk)?;
        let Some(received) = chunk.get(..bytes_read) else {
            return Err(DispatchError::internal("read past buffer end"));
        };

        if received.is_empty() {
            return Ok(if buffer.is_empty() {
                None
            } else {
                Some(buffer)
            });
        }

        if let Some(newline_pos) = received.iter().position(|b| *b == b'\n') {
            buffer.extend(received.iter().take(newline_pos + 1));
            enforce_limit(buffer.len())?;
            return Ok(Some(buffer));
        }

        buffer.extend_from_slice(received);
        enforce_limit(buffer.len())?;
    }
}

/// Reads from the stream, retrying on interrupts.
fn read_with_retry(stream: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Enforces the maximum request size limit.
fn enforce_limit(size: usize) -> Result<(), DispatchError> {
    if size > MAX_REQUEST_BYTES {
        return Err(DispatchError::request_too_large(size, MAX_REQUEST_BYTES));
    }
    Ok(())
}
