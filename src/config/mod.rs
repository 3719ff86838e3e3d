//! Configuration module for the classroom points server.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DATA_FILE: &str = "./data/classroom-data.json";
const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3001);
const DEFAULT_SAVE_INTERVAL_SECS: u64 = 30;
const DEFAULT_ROLLOVER_INTERVAL_SECS: u64 = 3600;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the JSON snapshot of the roster store
    pub data_file: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// How often the persistence sidecar writes a snapshot
    pub save_interval: Duration,
    /// How often the weekly rollover is evaluated
    pub rollover_interval: Duration,
    /// Seed a sample class when no snapshot exists
    pub seed_sample: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let data_file = env::var("CLASSROOM_DATA_FILE")
            .unwrap_or_else(|_| DEFAULT_DATA_FILE.to_string())
            .into();

        let bind_addr = parse_or_default("CLASSROOM_BIND_ADDR", DEFAULT_BIND_ADDR);

        let log_level = env::var("CLASSROOM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let save_interval =
            parse_interval("CLASSROOM_SAVE_INTERVAL_SECS", DEFAULT_SAVE_INTERVAL_SECS);

        let rollover_interval =
            parse_interval("CLASSROOM_ROLLOVER_INTERVAL_SECS", DEFAULT_ROLLOVER_INTERVAL_SECS);

        let seed_sample = parse_or_default("CLASSROOM_SEED_SAMPLE", true);

        Self {
            data_file,
            bind_addr,
            log_level,
            save_interval,
            rollover_interval,
            seed_sample,
        }
    }

    /// Configuration suitable for tests: ephemeral port, given snapshot path, no seed.
    pub fn for_data_file(data_file: PathBuf) -> Self {
        Self {
            data_file,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            log_level: "warn".to_string(),
            save_interval: Duration::from_secs(DEFAULT_SAVE_INTERVAL_SECS),
            rollover_interval: Duration::from_secs(DEFAULT_ROLLOVER_INTERVAL_SECS),
            seed_sample: false,
        }
    }
}

/// Read and parse a variable, warning and falling back when the value is malformed.
fn parse_or_default<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Invalid {} value {:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

/// Read a period in whole seconds. Timers cannot tick at zero, so 0 falls back too.
fn parse_interval(key: &str, default_secs: u64) -> Duration {
    match parse_or_default(key, default_secs) {
        0 => {
            tracing::warn!("{} must be at least 1 second, using {}", key, default_secs);
            Duration::from_secs(default_secs)
        }
        secs => Duration::from_secs(secs),
    }
}
