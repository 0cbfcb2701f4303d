//! Command-line client for the pagecount daemon.
//!
//! The client turns its arguments into one chat message, sends it to the
//! daemon as a JSONL request and prints every reply until the daemon reports
//! an exit status. Configuration loading and IO streams can be substituted so
//! the runtime can be exercised from tests.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

mod cli;
mod command;
mod config;
mod daemon_output;
mod errors;
mod transport;

use cli::Cli;
use command::ChatRequest;
use config::split_config_arguments;
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
use daemon_output::read_daemon_messages;
pub(crate) use errors::AppError;
use transport::connect;

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(&split.cli_arguments) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, io),
    };

    match send_message(cli, &split.config_arguments, io, loader) {
        Ok(status) => exit_code_from_status(status),
        Err(error) => {
            report_error(&error, io);
            ExitCode::FAILURE
        }
    }
}

fn send_message<W, E, L>(
    cli: Cli,
    config_arguments: &[OsString],
    io: &mut IoStreams<'_, W, E>,
    loader: &L,
) -> Result<i32, AppError>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let config = loader.load(config_arguments)?;
    let request = ChatRequest::try_from(cli)?;
    let mut connection = connect(config.daemon_socket())?;
    request.write_jsonl(&mut connection)?;
    read_daemon_messages(&mut connection, io)
}

/// Help and version output goes to stdout and succeeds; usage errors fail.
fn report_usage<W, E>(error: &clap::Error, io: &mut IoStreams<'_, W, E>) -> ExitCode
where
    W: Write,
    E: Write,
{
    let rendered = error.render();
    if error.use_stderr() {
        let _ = write!(io.stderr, "{rendered}");
        ExitCode::from(2)
    } else {
        let _ = write!(io.stdout, "{rendered}");
        ExitCode::SUCCESS
    }
}

fn report_error<W, E>(error: &AppError, io: &mut IoStreams<'_, W, E>)
where
    W: Write,
    E: Write,
{
    let _ = match error.hint() {
        Some(hint) => writeln!(io.stderr, "pagecount: {error} ({hint})"),
        None => writeln!(io.stderr, "pagecount: {error}"),
    };
}

fn exit_code_from_status(status: i32) -> ExitCode {
    u8::try_from(status).map_or(ExitCode::FAILURE, ExitCode::from)
}

#[cfg(test)]
mod tests;
