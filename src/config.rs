//! Server configuration, read from the environment

use std::env;
use thiserror::Error;

pub const ENV_DB_PATH: &str = "CLUB_LEDGER_DB";
pub const ENV_HOST: &str = "CLUB_LEDGER_HOST";
pub const ENV_PORT: &str = "CLUB_LEDGER_PORT";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{name} is not a valid port: '{value}'")]
    InvalidPort { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// SQLite file path, or ":memory:"
    pub db_path: String,
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: "club_ledger.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup(ENV_PORT) {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort {
                name: ENV_PORT,
                value: value.clone(),
            })?,
            None => defaults.port,
        };

        let config = Self {
            db_path: lookup(ENV_DB_PATH).unwrap_or(defaults.db_path),
            host: lookup(ENV_HOST).unwrap_or(defaults.host),
            port,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.trim().is_empty() {
            return Err(ConfigError::Empty(ENV_DB_PATH));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Empty(ENV_HOST));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort {
                name: ENV_PORT,
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
