//! Client Configuration

use alloy::primitives::Address;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub rpc_url: String,
    pub log_level: String,
    /// Protocol contract granted spending rights by authorizations.
    pub spender_address: Address,
    /// Directory holding the persisted session record.
    pub storage_dir: PathBuf,
    /// Debounce quiet period for the quote pipeline, milliseconds.
    pub quote_quiet_period_ms: u64,
    /// Upper bound on a single confirmation wait, seconds.
    pub confirmation_timeout_seconds: u64,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
    #[error("Failed to parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),
    #[error("Failed to parse log level: {0}")]
    LogLevelParseError(String),
}

impl ClientConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    pub fn rpc_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.rpc_url).map_err(ConfigError::from)
    }

    pub fn log_level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.log_level)
            .map_err(|_| ConfigError::LogLevelParseError(self.log_level.clone()))
    }

    pub fn quote_quiet_period(&self) -> Duration {
        Duration::from_millis(self.quote_quiet_period_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let raw = r#"{
            "rpc_url": "http://localhost:8545",
            "log_level": "info",
            "spender_address": "0x00000000000000000000000000000000000000aa",
            "storage_dir": "/tmp/ledgerflow",
            "quote_quiet_period_ms": 2000,
            "confirmation_timeout_seconds": 120
        }"#;
        let config: ClientConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.log_level().unwrap(), Level::INFO);
        assert_eq!(config.quote_quiet_period(), Duration::from_millis(2000));
        assert!(config.rpc_url().is_ok());
    }
}
