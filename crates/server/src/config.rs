//! Service configuration
//!
//! Read from an optional TOML file (`SABRES_CONFIG`), then overridden by
//! environment variables. Every field has a default so an empty file, or
//! no file at all, gives a working local setup.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "SABRES_CONFIG";

/// Default control port of the network service
pub const DEFAULT_NETWORK_PORT: u16 = 15025;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_inventory_url")]
    pub inventory_url: String,

    /// `host:port` of the solver, if known at startup
    #[serde(default)]
    pub solver_address: Option<String>,

    #[serde(default)]
    pub store: StoreConfig,

    /// Timeout for inventory requests, in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub debug: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_NETWORK_PORT
}

fn default_inventory_url() -> String {
    inventory_client::DEFAULT_INVENTORY_URL.to_string()
}

fn default_timeout() -> u64 {
    5
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            inventory_url: default_inventory_url(),
            solver_address: None,
            store: StoreConfig::default(),
            timeout: default_timeout(),
            debug: false,
        }
    }
}

/// Where slices are kept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    #[default]
    Memory,
    Sqlite {
        path: PathBuf,
    },
}

impl ServiceConfig {
    pub fn from_toml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw, path)
    }

    /// Defaults, or the file named by `SABRES_CONFIG`, with environment
    /// overrides applied on top. Also returns the overrides that were
    /// ignored, for logging once tracing is up.
    pub fn load() -> Result<(Self, Vec<String>), ConfigError> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        let ignored = config.apply_env(|key| std::env::var(key).ok());
        Ok((config, ignored))
    }

    /// Apply `NETWORKPORT`, `INVENTORY_URL`, `CBS_ADDR` and `DEBUG`.
    /// Values that do not parse are left out and reported back.
    pub fn apply_env<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut ignored = Vec::new();

        if let Some(port) = get("NETWORKPORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => ignored.push(format!(
                    "failed to convert NETWORKPORT to a port, ignored: {}",
                    port
                )),
            }
        }

        if let Some(url) = get("INVENTORY_URL") {
            self.inventory_url = url;
        }

        if let Some(addr) = get("CBS_ADDR") {
            self.solver_address = Some(addr);
        }

        if let Some(debug) = get("DEBUG") {
            match parse_bool(&debug) {
                Some(debug) => self.debug = debug,
                None => {
                    ignored.push(format!("failed to convert DEBUG to bool, ignored: {}", debug))
                }
            }
        }

        ignored
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
