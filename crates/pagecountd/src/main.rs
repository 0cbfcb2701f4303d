//! Entry point for the `pagecountd` daemon.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match pagecountd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(io::stderr(), "pagecountd: {error}");
            ExitCode::FAILURE
        }
    }
}
