//! Configuration management for the SABRES CLI
//!
//! Handles loading and saving configuration from ~/.sabres/config.toml

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the SABRES CLI
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub solver: SolverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_server_url() -> String {
    "http://localhost:15025".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout: default_timeout(),
        }
    }
}

/// Solver location used when a command does not name one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<String>,
}

impl SolverConfig {
    /// `host:port` when both halves are configured
    pub fn address(&self) -> Option<String> {
        match (&self.host, &self.port) {
            (Some(host), Some(port)) if !host.is_empty() && !port.is_empty() => {
                Some(format!("{}:{}", host, port))
            }
            _ => None,
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sabres")
            .join("config.toml")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get a configuration value by key path (e.g., "server.url")
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["server", "url"] => Some(self.server.url.clone()),
            ["server", "timeout"] => Some(self.server.timeout.to_string()),
            ["solver", "host"] => self.solver.host.clone(),
            ["solver", "port"] => self.solver.port.clone(),
            _ => None,
        }
    }

    /// Set a configuration value by key path
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["server", "url"] => self.server.url = value.trim_end_matches('/').to_string(),
            ["server", "timeout"] => match value.parse() {
                Ok(secs) => self.server.timeout = secs,
                Err(_) => bail!("server.timeout must be a number of seconds, got {}", value),
            },
            ["solver", "host"] => self.solver.host = Some(value.to_string()),
            ["solver", "port"] => self.solver.port = Some(value.to_string()),
            _ => bail!("Unknown configuration key: {}", key),
        }

        Ok(())
    }
}
