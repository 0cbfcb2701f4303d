//! Request deserialization for the dispatch loop.
//!
//! Clients send one JSONL line per connection holding the chat text and,
//! optionally, who sent it. The sender only appears in logs.

use serde::Deserialize;

use super::errors::DispatchError;

/// Chat message submitted by a client.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Message text exactly as the operator typed it.
    pub text: String,
    /// Optional operator name for logging.
    #[serde(default)]
    pub sender: Option<String>,
}

impl ChatRequest {
    /// Parses a JSONL line into a chat request.
    ///
    /// Trailing whitespace (including the newline delimiter) is trimmed before
    /// parsing.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::MalformedJsonl` if the line is empty or cannot
    /// be parsed as JSON matching the request schema.
    pub fn parse(line: &[u8]) -> Result<Self, DispatchError> {
        let trimmed = trim_trailing_whitespace(line);
        if trimmed.is_empty() {
            return Err(DispatchError::malformed("empty request line"));
        }

        serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)
    }

    /// Validates that the message carries some text.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidStructure` if the text is empty or only
    /// whitespace.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.text.trim().is_empty() {
            return Err(DispatchError::invalid_structure("text field is empty"));
        }
        Ok(())
    }

    /// Sender name used in logs, `-` when absent.
    #[must_use]
    pub fn sender(&self) -> &str {
        self.sender.as_deref().unwrap_or("-")
    }
}

/// Trims trailing ASCII whitespace from a byte slice.
fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    bytes.get(..end).unwrap_or_default()
}
