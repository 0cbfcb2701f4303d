//! Layering of defaults, configuration file, environment and CLI flags.

use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard};

use camino::Utf8PathBuf;
use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use pagecount_config::{
    Config, DEFAULT_SNMP_PORT, LogFormat, SnmpVersion, SocketEndpoint, default_inventory_path,
    default_socket_endpoint,
};
use rstest::{fixture, rstest};
use tempfile::TempDir;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct Harness {
    temp_dir: TempDir,
    args: Vec<OsString>,
    env_overrides: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
            args: vec![OsString::from("pagecountd")],
            env_overrides: Vec::new(),
            _guard: guard,
        }
    }

    fn write_config(&mut self, contents: &str) {
        let path = self.temp_dir.path().join("pagecount.toml");
        fs::write(&path, contents).expect("write configuration");
        self.args.push(OsString::from("--config-path"));
        self.args.push(path.into_os_string());
    }

    fn set_env(&mut self, key: &str, value: &str) {
        let previous = std::env::var_os(key);
        // The harness restores every override in `Drop`.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides.push((key.to_owned(), previous));
    }

    fn push_arg(&mut self, arg: &str) {
        self.args.push(OsString::from(arg));
    }

    fn load(&self) -> Config {
        Config::load_from_iter(self.args.clone()).expect("configuration should load")
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        while let Some((key, value)) = self.env_overrides.pop() {
            match value {
                Some(previous) => unsafe { std::env::set_var(&key, previous) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
fn defaults_apply_without_sources(harness: Harness) {
    let config = harness.load();
    assert_eq!(config.daemon_socket(), &default_socket_endpoint());
    assert_eq!(config.inventory_path(), default_inventory_path());
    assert_eq!(config.snmp_port(), DEFAULT_SNMP_PORT);
}

#[rstest]
fn file_values_override_defaults(mut harness: Harness) {
    harness.write_config(
        "inventory_path = \"/srv/pagecount/printers.json\"\n\
         snmp_community = \"inventory\"\n\
         log_format = \"compact\"\n\
         snmp_version = \"v2c\"\n\
         daemon_socket = { transport = \"tcp\", host = \"127.0.0.1\", port = 9800 }\n",
    );

    let config = harness.load();
    assert_eq!(
        config.inventory_path(),
        Utf8PathBuf::from("/srv/pagecount/printers.json")
    );
    assert_eq!(config.snmp_community(), "inventory");
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.snmp_version(), SnmpVersion::V2c);
    assert_eq!(config.daemon_socket(), &SocketEndpoint::tcp("127.0.0.1", 9800));
}

#[rstest]
fn environment_overrides_file(mut harness: Harness) {
    harness.write_config("snmp_port = 1161\n");
    harness.set_env("PAGECOUNT_SNMP_PORT", "2161");

    assert_eq!(harness.load().snmp_port(), 2161);
}

#[rstest]
fn cli_overrides_environment(mut harness: Harness) {
    harness.set_env("PAGECOUNT_POLL_WORKERS", "4");
    harness.push_arg("--poll-workers");
    harness.push_arg("2");

    assert_eq!(harness.load().poll_workers(), 2);
}

#[rstest]
fn snmp_version_comes_from_the_environment(mut harness: Harness) {
    harness.set_env("PAGECOUNT_SNMP_VERSION", "v2c");

    assert_eq!(harness.load().snmp_version(), SnmpVersion::V2c);
}
