//! Test support for the CLI runtime.
//!
//! Supplies a fake daemon that answers one connection with canned JSONL
//! lines and a configuration loader that returns a fixed [`Config`].

use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use pagecount_config::{Config, SocketEndpoint};

use crate::{AppError, ConfigLoader, IoStreams, run_with_loader};

/// A config loader that returns a fixed configuration.
pub(super) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(super) fn new(config: Config) -> Self {
        Self { config }
    }

    pub(super) fn tcp(port: u16) -> Self {
        Self::new(Config {
            daemon_socket: SocketEndpoint::tcp("127.0.0.1", port),
            ..Config::default()
        })
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Captured result of one CLI run.
pub(super) struct Outcome {
    pub(super) exit_code: ExitCode,
    pub(super) stdout: String,
    pub(super) stderr: String,
}

pub(super) fn run_cli(args: &[&str], loader: &StaticConfigLoader) -> Outcome {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit_code = {
        let mut io = IoStreams::new(&mut stdout, &mut stderr);
        let args = std::iter::once("pagecount")
            .chain(args.iter().copied())
            .map(OsString::from);
        run_with_loader(args, &mut io, loader)
    };
    Outcome {
        exit_code,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    }
}

/// A daemon stand-in that accepts one connection, records the request line
/// and streams canned responses.
pub(super) struct FakeDaemon {
    port: u16,
    request: Arc<Mutex<Option<String>>>,
    handle: Option<thread::JoinHandle<Result<()>>>,
}

impl FakeDaemon {
    pub(super) fn spawn(lines: &[&str]) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake daemon")?;
        listener
            .set_nonblocking(true)
            .context("fake daemon nonblocking")?;
        let port = listener.local_addr().context("local addr")?.port();
        let lines: Vec<String> = lines.iter().map(|line| (*line).to_owned()).collect();
        let request = Arc::new(Mutex::new(None));
        let recorded = Arc::clone(&request);
        let handle = thread::spawn(move || serve_once(&listener, &lines, &recorded));
        Ok(Self {
            port,
            request,
            handle: Some(handle),
        })
    }

    pub(super) fn port(&self) -> u16 {
        self.port
    }

    /// Waits for the connection to finish and returns the request line.
    pub(super) fn take_request(&mut self) -> Result<Option<String>> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("fake daemon thread panicked"))?
                .context("fake daemon failed")?;
        }
        let request = self
            .request
            .lock()
            .map_err(|error| anyhow!("lock request: {error}"))?
            .take();
        Ok(request)
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve_once(
    listener: &TcpListener,
    lines: &[String],
    recorded: &Arc<Mutex<Option<String>>>,
) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                stream
                    .set_nonblocking(false)
                    .context("fake daemon blocking stream")?;
                return respond(stream, lines, recorded);
            }
            Err(ref error)
                if error.kind() == io::ErrorKind::WouldBlock && Instant::now() < deadline =>
            {
                thread::sleep(Duration::from_millis(10));
            }
            // Nobody connected; the CLI gave up before reaching the daemon.
            Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(error) => return Err(error).context("accept connection"),
        }
    }
}

fn respond(
    mut stream: TcpStream,
    lines: &[String],
    recorded: &Arc<Mutex<Option<String>>>,
) -> Result<()> {
    let mut line = String::new();
    BufReader::new(stream.try_clone().context("clone stream")?)
        .read_line(&mut line)
        .context("read chat request")?;
    *recorded
        .lock()
        .map_err(|error| anyhow!("lock request: {error}"))? = Some(line);
    for response in lines {
        stream.write_all(response.as_bytes())?;
        stream.write_all(b"\n")?;
    }
    stream.flush().context("flush responses")
}

/// Reserves a local TCP port that nothing listens on.
pub(super) fn closed_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind a throwaway listener")?;
    let port = listener.local_addr().context("read throwaway listener address")?.port();
    drop(listener);
    Ok(port)
}
