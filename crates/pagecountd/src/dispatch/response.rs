//! Response serialization helpers for the dispatch loop.
//!
//! This module provides the `DaemonMessage` type and `ResponseWriter` helper
//! for streaming JSONL responses back to clients. The message format matches
//! the protocol expected by `pagecount`.

use std::io::Write;

use serde::Serialize;

use super::dispatcher::ReplySink;
use super::errors::DispatchError;

/// Response messages sent to clients.
///
/// Each message is serialized as a single JSONL line. The client reads these
/// lines until it receives an `Exit` message, which signals the end of the
/// response stream.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DaemonMessage {
    /// One reply for the operator.
    Reply {
        /// Reply text, possibly spanning several lines.
        text: String,
    },
    /// Protocol-level failure that prevented dispatch.
    Error {
        /// Error description.
        message: String,
    },
    /// Terminal message signalling completion with an exit status.
    Exit {
        /// Exit status code (0 for success, non-zero for failure).
        status: i32,
    },
}

/// Writer that serializes daemon messages to a stream.
///
/// The writer handles JSONL framing (appending newlines) and provides
/// convenience methods for common message patterns.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a daemon message as a JSONL line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_message(&mut self, message: &DaemonMessage) -> Result<(), DispatchError> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Writes a reply line.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_reply(&mut self, text: impl Into<String>) -> Result<(), DispatchError> {
        self.write_message(&DaemonMessage::Reply { text: text.into() })?;
        self.writer.flush()?;
        Ok(())
    }

    /// Writes an exit message and flushes the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or flushing fails.
    pub fn write_exit(&mut self, status: i32) -> Result<(), DispatchError> {
        self.write_message(&DaemonMessage::Exit { status })?;
        self.writer.flush()?;
        Ok(())
    }

    /// Writes an error message followed by an exit message.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_error(&mut self, error: &DispatchError) -> Result<(), DispatchError> {
        self.write_message(&DaemonMessage::Error {
            message: error.to_string(),
        })?;
        self.write_exit(error.exit_status())
    }
}

impl<W: Write> ReplySink for ResponseWriter<W> {
    fn reply(&mut self, text: &str) -> Result<(), DispatchError> {
        self.write_reply(text)
    }
}
