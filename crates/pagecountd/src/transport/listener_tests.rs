//! Tests for the socket listener.

use std::io::{BufRead, BufReader};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use pagecount_config::SocketEndpoint;
use rstest::{fixture, rstest};

use super::listener::SocketListener;
use super::{ConnectionHandler, CountingHandler, ListenerError};

#[fixture]
fn tcp_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", 0)
}

fn wait_for_count(count: &AtomicUsize, expected: usize) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if count.load(Ordering::SeqCst) >= expected {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

fn tcp_port(endpoint: &SocketEndpoint) -> u16 {
    match endpoint {
        SocketEndpoint::Tcp { port, .. } => *port,
        SocketEndpoint::Unix { .. } => panic!("expected a TCP endpoint, got {endpoint}"),
    }
}

#[rstest]
fn bound_endpoint_reports_the_assigned_port(tcp_endpoint: SocketEndpoint) {
    let listener = SocketListener::bind(&tcp_endpoint).expect("bind tcp listener");
    assert_ne!(tcp_port(&listener.endpoint()), 0);
}

#[rstest]
fn tcp_listener_serves_each_connection(tcp_endpoint: SocketEndpoint) {
    let listener = SocketListener::bind(&tcp_endpoint).expect("bind tcp listener");
    let port = tcp_port(&listener.endpoint());
    let (count, handler) = CountingHandler::new();
    let handler: Arc<dyn ConnectionHandler> = handler;
    let handle = listener.start(handler).expect("start listener");

    for _ in 0..2 {
        let stream = TcpStream::connect(("127.0.0.1", port)).expect("connect client");
        let mut line = String::new();
        BufReader::new(stream)
            .read_line(&mut line)
            .expect("read handler reply");
        assert_eq!(line, "ok\n");
    }

    assert!(wait_for_count(&count, 2), "expected two connections");
    handle.shutdown();
    handle.join().expect("join listener");
}

#[cfg(unix)]
#[fixture]
fn unix_tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("temp dir")
}

#[cfg(unix)]
#[rstest]
fn unix_listener_replaces_stale_socket_and_removes_it_on_shutdown(
    unix_tempdir: tempfile::TempDir,
) {
    let path = unix_tempdir.path().join("pagecountd.sock");
    {
        let _stale = std::os::unix::net::UnixListener::bind(&path).expect("bind stale listener");
    }
    assert!(path.exists(), "stale socket should remain");

    let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path"));
    let listener = SocketListener::bind(&endpoint).expect("bind new listener");
    let (count, handler) = CountingHandler::new();
    let handle = listener.start(handler).expect("start listener");

    std::os::unix::net::UnixStream::connect(&path).expect("connect unix client");
    assert!(wait_for_count(&count, 1), "expected one connection");

    handle.shutdown();
    handle.join().expect("join listener");
    assert!(!path.exists(), "socket file should be removed on shutdown");
}

#[cfg(unix)]
#[rstest]
fn unix_listener_refuses_a_live_socket(unix_tempdir: tempfile::TempDir) {
    let path = unix_tempdir.path().join("pagecountd.sock");
    let _existing = std::os::unix::net::UnixListener::bind(&path).expect("bind existing listener");

    let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path"));
    let error = SocketListener::bind(&endpoint).expect_err("bind should fail");
    assert!(matches!(error, ListenerError::UnixInUse { .. }));
}

#[cfg(unix)]
#[rstest]
fn unix_listener_refuses_a_regular_file(unix_tempdir: tempfile::TempDir) {
    let path = unix_tempdir.path().join("pagecountd.sock");
    std::fs::write(&path, b"not a socket").expect("write placeholder");

    let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path"));
    let error = SocketListener::bind(&endpoint).expect_err("bind should fail");
    assert!(matches!(error, ListenerError::UnixNotSocket { .. }));
}
