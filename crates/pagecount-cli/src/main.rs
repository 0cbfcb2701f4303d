//! Entry point for the `pagecount` chat client.
//!
//! Delegates to [`pagecount_cli::run`], which sends one message to the
//! daemon and prints its replies.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    pagecount_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
