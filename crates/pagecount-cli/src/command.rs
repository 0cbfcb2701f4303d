//! Chat request sent to the daemon.

use std::env;
use std::io::Write;

use serde::Serialize;

use crate::AppError;
use crate::cli::Cli;

/// One JSONL request line.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct ChatRequest {
    pub(crate) text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) sender: Option<String>,
}

impl ChatRequest {
    /// Joins the message words with single spaces.
    pub(crate) fn from_words(words: &[String], sender: Option<String>) -> Result<Self, AppError> {
        let text = words
            .iter()
            .map(|word| word.trim())
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return Err(AppError::EmptyMessage);
        }
        Ok(Self { text, sender })
    }

    pub(crate) fn write_jsonl<W>(&self, writer: &mut W) -> Result<(), AppError>
    where
        W: Write,
    {
        serde_json::to_writer(&mut *writer, self).map_err(AppError::SerialiseRequest)?;
        writer.write_all(b"\n").map_err(AppError::SendRequest)?;
        writer.flush().map_err(AppError::SendRequest)
    }
}

impl TryFrom<Cli> for ChatRequest {
    type Error = AppError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let sender = cli
            .sender
            .or_else(|| env::var("USER").ok())
            .filter(|name| !name.trim().is_empty());
        Self::from_words(&cli.text, sender)
    }
}
