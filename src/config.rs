use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration loaded from environment variables or TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path to the DuckDB database file. `:memory:` keeps the visit log
    /// in memory (useful for local evaluation only — nothing survives a
    /// restart).
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Bearer token for the admin routes (stats summary, purge).
    /// If not set, admin routes refuse all requests.
    #[serde(default)]
    pub admin_token: Option<String>,
    /// Substring identifying the service's own internal agent; matching
    /// user agents are recorded as empty.
    #[serde(default = "default_agent_marker")]
    pub agent_marker: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/visits.duckdb")
}

fn default_agent_marker() -> String {
    "SimpleStats".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            admin_token: None,
            agent_marker: default_agent_marker(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults.
    ///
    /// Environment variables override file values:
    /// - `SST_HOST` → host
    /// - `SST_PORT` → port
    /// - `SST_DB_PATH` → db_path
    /// - `SST_ADMIN_TOKEN` → admin_token
    /// - `SST_AGENT_MARKER` → agent_marker
    pub fn load(config_path: Option<&Path>) -> Self {
        let mut config =
            config_path.map_or_else(Self::default, |path| match std::fs::read_to_string(path) {
                Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                    tracing::warn!("Failed to parse config file: {e}, using defaults");
                    Self::default()
                }),
                Err(e) => {
                    tracing::warn!("Failed to read config file: {e}, using defaults");
                    Self::default()
                }
            });

        // Environment variable overrides
        if let Ok(host) = std::env::var("SST_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("SST_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }
        if let Ok(db_path) = std::env::var("SST_DB_PATH") {
            config.db_path = PathBuf::from(db_path);
        }
        if let Ok(token) = std::env::var("SST_ADMIN_TOKEN") {
            config.admin_token = Some(token);
        }
        if let Ok(marker) = std::env::var("SST_AGENT_MARKER") {
            config.agent_marker = marker;
        }

        config
    }
}
