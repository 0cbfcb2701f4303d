//! Full daemon lifecycle: bootstrap, serve over the socket, shut down.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use pagecount_config::SocketEndpoint;
use pagecount_inventory::{Inventory, JsonFileBackend};

use crate::process::{LaunchError, ShutdownError, ShutdownSignal, run_daemon_with};

use super::support::{HealthEvent, RecordingHealthReporter, TestConfigLoader};

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Shutdown signal triggered from the test thread.
struct ChannelShutdown {
    receiver: Mutex<Receiver<()>>,
}

impl ChannelShutdown {
    fn new() -> (Sender<()>, Self) {
        let (sender, receiver) = mpsc::channel();
        (
            sender,
            Self {
                receiver: Mutex::new(receiver),
            },
        )
    }
}

impl ShutdownSignal for ChannelShutdown {
    fn wait(&self) -> Result<(), ShutdownError> {
        let receiver = self.receiver.lock().expect("shutdown receiver poisoned");
        let _ = receiver.recv();
        Ok(())
    }
}

fn wait_for_endpoint(reporter: &RecordingHealthReporter) -> SocketEndpoint {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while Instant::now() < deadline {
        if let Some(endpoint) = reporter.ready_endpoint() {
            return endpoint;
        }
        thread::sleep(POLL_INTERVAL);
    }
    panic!("daemon never reported a ready listener: {:?}", reporter.events());
}

fn exchange(mut stream: impl Read + Write, text: &str) -> Vec<String> {
    let request = format!("{}\n", serde_json::json!({ "text": text }));
    stream.write_all(request.as_bytes()).expect("send request");
    BufReader::new(stream)
        .lines()
        .map(|line| line.expect("read response line"))
        .collect()
}

fn send(endpoint: &SocketEndpoint, text: &str) -> Vec<String> {
    match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            exchange(TcpStream::connect((host.as_str(), *port)).expect("connect"), text)
        }
        #[cfg(unix)]
        SocketEndpoint::Unix { path } => exchange(
            std::os::unix::net::UnixStream::connect(path.as_std_path()).expect("connect"),
            text,
        ),
        #[cfg(not(unix))]
        SocketEndpoint::Unix { .. } => panic!("unix sockets are unavailable"),
    }
}

#[test]
fn daemon_serves_requests_until_shutdown() {
    let loader = Arc::new(TestConfigLoader::new());
    let inventory_path = loader.inventory_path();
    let reporter = Arc::new(RecordingHealthReporter::default());
    let (trigger, shutdown) = ChannelShutdown::new();

    let daemon_loader = Arc::clone(&loader);
    let daemon_reporter = Arc::clone(&reporter);
    let daemon =
        thread::spawn(move || run_daemon_with(&*daemon_loader, daemon_reporter, &shutdown));

    let endpoint = wait_for_endpoint(&reporter);
    let lines = send(&endpoint, "/adicionar NID:400 IP:10.0.0.3 SETOR:Warehouse");
    assert_eq!(
        lines,
        vec![
            r#"{"kind":"reply","text":"Impressora adicionada: Warehouse (10.0.0.3, NID: 400)"}"#,
            r#"{"kind":"exit","status":0}"#,
        ]
    );

    trigger.send(()).expect("trigger shutdown");
    daemon
        .join()
        .expect("daemon thread panicked")
        .expect("daemon should stop cleanly");

    let reloaded = Inventory::load(JsonFileBackend::new(inventory_path)).expect("reload inventory");
    assert_eq!(reloaded.len(), 3);
    assert!(
        reporter
            .events()
            .contains(&HealthEvent::ShutdownRequested)
    );
    #[cfg(unix)]
    if let Some(path) = endpoint.unix_path() {
        assert!(!path.exists(), "socket file should be removed on shutdown");
    }
}

#[test]
fn bootstrap_failures_stop_the_launch() {
    let loader = TestConfigLoader::new();
    let missing = loader.missing_file();
    let loader = loader.configure(|config| config.inventory_path = missing.into());
    let reporter = Arc::new(RecordingHealthReporter::default());
    let (_trigger, shutdown) = ChannelShutdown::new();

    let error = run_daemon_with(&loader, reporter.clone(), &shutdown).expect_err("launch fails");

    assert!(matches!(error, LaunchError::Bootstrap { .. }));
    assert!(reporter.ready_endpoint().is_none());
}
