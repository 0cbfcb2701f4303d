//! Daemon response handling.
//!
//! Replies go to stdout, protocol errors to stderr; the terminal `exit`
//! message supplies the status.

use std::io::{self, BufRead, Read, Write};

use serde::Deserialize;

use crate::{AppError, IoStreams};

pub(crate) const EMPTY_LINE_LIMIT: usize = 10;

pub(crate) fn read_daemon_messages<R, W, E>(
    connection: &mut R,
    io: &mut IoStreams<'_, W, E>,
) -> Result<i32, AppError>
where
    R: Read,
    W: Write,
    E: Write,
{
    let mut reader = io::BufReader::new(connection);
    let mut line = String::new();
    let mut exit_status: Option<i32> = None;
    let mut consecutive_empty_lines = 0;

    while reader
        .read_line(&mut line)
        .map_err(AppError::ReadResponse)?
        != 0
    {
        if line.trim().is_empty() {
            consecutive_empty_lines += 1;
            if consecutive_empty_lines >= EMPTY_LINE_LIMIT {
                writeln!(
                    io.stderr,
                    "Warning: received {EMPTY_LINE_LIMIT} consecutive empty lines from daemon; aborting."
                )
                .map_err(AppError::ForwardResponse)?;
                break;
            }
            line.clear();
            continue;
        }
        consecutive_empty_lines = 0;
        let message: DaemonMessage = serde_json::from_str(&line).map_err(AppError::ParseMessage)?;
        match message {
            DaemonMessage::Reply { text } => writeln!(io.stdout, "{text}"),
            DaemonMessage::Error { message } => writeln!(io.stderr, "{message}"),
            DaemonMessage::Exit { status } => {
                exit_status = Some(status);
                line.clear();
                break;
            }
        }
        .map_err(AppError::ForwardResponse)?;
        line.clear();
    }

    io.stdout.flush().map_err(AppError::ForwardResponse)?;
    io.stderr.flush().map_err(AppError::ForwardResponse)?;

    exit_status.ok_or(AppError::MissingExit)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum DaemonMessage {
    Reply { text: String },
    Error { message: String },
    Exit { status: i32 },
}
