//! Command-line surface of `pagecount`.

use clap::Parser;

/// Sends one chat message to the pagecount daemon and prints the replies.
///
/// Configuration flags (`--config-path`, `--daemon-socket`, ...) must come
/// first; everything after them belongs to the message.
#[derive(Parser, Debug)]
#[command(name = "pagecount", version)]
pub(crate) struct Cli {
    /// Name recorded in the daemon logs; defaults to `$USER`.
    #[arg(long, value_name = "NAME")]
    pub(crate) sender: Option<String>,
    /// Chat message, for example `/contador ip:10.0.0.1`.
    #[arg(
        value_name = "TEXT",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub(crate) text: Vec<String>,
}
