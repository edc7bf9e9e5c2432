//! Configuration for the bank connectivity gateway binary.

use clap::Parser;
use gateway_types::model::connection::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI arguments for the gateway binary.
#[derive(Parser, Debug)]
#[command(name = "gateway")]
#[command(about = "Bank connectivity gateway: EBICS client, ISO 20022 translation, scheduler")]
struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    config: PathBuf,
}

/// One bank connection as configured on disk, before it is seeded into the
/// connection repository on startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfiguredConnection {
    pub connection_id: String,
    #[serde(flatten)]
    pub config: ConnectionConfig,
}

/// Gateway server configuration.
///
/// Fields use serde defaults that fall back to environment variables, then
/// to hardcoded defaults, mirroring how chain/scheme config is resolved
/// elsewhere in this codebase.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "config_defaults::default_port")]
    port: u16,
    #[serde(default = "config_defaults::default_host")]
    host: IpAddr,
    #[serde(default = "config_defaults::default_tick_interval_secs")]
    tick_interval_secs: u64,
    #[serde(default = "config_defaults::default_transport_timeout_secs")]
    transport_timeout_secs: u64,
    #[serde(default)]
    connections: Vec<ConfiguredConnection>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            port: config_defaults::default_port(),
            host: config_defaults::default_host(),
            tick_interval_secs: config_defaults::default_tick_interval_secs(),
            transport_timeout_secs: config_defaults::default_transport_timeout_secs(),
            connections: Vec::new(),
        }
    }
}

pub mod config_defaults {
    use std::env;
    use std::net::IpAddr;

    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 1;
    pub const DEFAULT_TRANSPORT_TIMEOUT_SECS: u64 = 60;

    /// Returns the default port value with fallback: $PORT env var -> 8080.
    ///
    /// Kept for the JSON HTTP surface this binary does not yet serve; the
    /// scheduler itself has no use for a bind address.
    pub fn default_port() -> u16 {
        env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }

    /// Returns the default host value with fallback: $HOST env var -> "0.0.0.0".
    pub fn default_host() -> IpAddr {
        env::var("HOST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(IpAddr::V4(DEFAULT_HOST.parse().unwrap()))
    }

    /// Returns the scheduler tick interval with fallback:
    /// $TICK_INTERVAL_SECS env var -> 1.
    pub fn default_tick_interval_secs() -> u64 {
        env::var("TICK_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TICK_INTERVAL_SECS)
    }

    /// Returns the per-call EBICS transport timeout with fallback:
    /// $TRANSPORT_TIMEOUT_SECS env var -> 60 (per the hard upstream-call
    /// timeout this binary's transport enforces).
    pub fn default_transport_timeout_secs() -> u64 {
        env::var("TRANSPORT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TRANSPORT_TIMEOUT_SECS)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl GatewayConfig {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn transport_timeout(&self) -> Duration {
        Duration::from_secs(self.transport_timeout_secs)
    }

    pub fn connections(&self) -> &[ConfiguredConnection] {
        &self.connections
    }

    /// Load configuration from CLI arguments and a JSON file.
    ///
    /// The config file path is `--config <path>` (or `$CONFIG`), defaulting
    /// to `./config.json`. Fields absent from the file fall back to
    /// environment variables or hardcoded defaults during deserialization.
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        let config_path = Path::new(&cli_args.config)
            .canonicalize()
            .map_err(|e| ConfigError::FileRead(cli_args.config, e))?;
        Self::load_from_path(config_path)
    }

    fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileRead(path, e))?;
        let config: GatewayConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}
