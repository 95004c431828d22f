//! Configuration management for blockledger

use crate::blockchain::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| LedgerError::Config(format!("invalid listen address {}:{}: {}", self.host, self.port, e)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Leading hex zeros required of a mined block hash.
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
        }
    }
}

/// Load `config.toml` from the working directory, falling back to defaults
/// when it is absent.
pub fn load_config() -> Result<Config> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let mut config: Config = if path.exists() {
        toml::from_str(&fs::read_to_string(path)?)?
    } else {
        Config::default()
    };

    if let Ok(port) = std::env::var("PORT") {
        config.server.port = port
            .parse()
            .map_err(|e| LedgerError::Config(format!("PORT must be a port number, got {:?}: {}", port, e)))?;
    }

    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(LedgerError::Config("server.host must not be empty".to_string()));
        }

        if self.ledger.difficulty == 0 || self.ledger.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::Config(format!(
                "ledger.difficulty must be between 1 and {}, got {}",
                MAX_DIFFICULTY, self.ledger.difficulty
            )));
        }

        Ok(())
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_difficulty() -> usize {
    DEFAULT_DIFFICULTY
}
