use std::io::IsTerminal;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::assets::DEFAULT_GATEWAY_BASE;
use crate::constants::auth::{
    DEFAULT_NONCE_EXPIRATION_SECONDS, DEFAULT_NONCE_SWEEP_INTERVAL_SECONDS,
};
use crate::constants::ownership::{
    DEFAULT_CONNECTION_TIMEOUT_SECS, DEFAULT_DATABASE_URL, DEFAULT_MAX_CONNECTIONS,
};
use crate::constants::server::{DEFAULT_HOST, DEFAULT_PORT};
use crate::models::tier::{TierThreshold, DEFAULT_TIER_THRESHOLDS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub log_format: LogFormat,
    pub auth: AuthConfig,
    pub ownership: OwnershipConfig,
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierThreshold>,
    #[serde(default)]
    pub assets: AssetsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Seconds an issued nonce remains consumable
    pub nonce_expiration_seconds: u64,
    /// Seconds between two sweeps of expired nonces
    pub nonce_sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipConfig {
    pub database_url: String,
    pub max_connections: Option<u32>,
    pub connection_timeout_secs: Option<u64>,
    #[cfg(feature = "mocks")]
    pub mock_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    pub gateway_base: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            gateway_base: DEFAULT_GATEWAY_BASE.to_string(),
        }
    }
}

fn default_tiers() -> Vec<TierThreshold> {
    DEFAULT_TIER_THRESHOLDS.to_vec()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_format: LogFormat::Auto,
            auth: AuthConfig {
                nonce_expiration_seconds: DEFAULT_NONCE_EXPIRATION_SECONDS,
                nonce_sweep_interval_seconds: DEFAULT_NONCE_SWEEP_INTERVAL_SECONDS,
            },
            ownership: OwnershipConfig {
                database_url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: Some(DEFAULT_MAX_CONNECTIONS),
                connection_timeout_secs: Some(DEFAULT_CONNECTION_TIMEOUT_SECS),
                #[cfg(feature = "mocks")]
                mock_mode: true,
            },
            tiers: default_tiers(),
            assets: AssetsConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// Output format of the process logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON when stdout is not a terminal, text otherwise
    #[default]
    Auto,
    Json,
    Text,
}

impl LogFormat {
    /// Replace [`LogFormat::Auto`] with the concrete format for the current stdout
    pub fn resolve(self) -> Self {
        match self {
            LogFormat::Auto if std::io::stdout().is_terminal() => LogFormat::Text,
            LogFormat::Auto => LogFormat::Json,
            concrete => concrete,
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(LogFormat::Auto),
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format '{other}', expected auto, json or text")),
        }
    }
}
