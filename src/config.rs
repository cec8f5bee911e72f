use crate::resource_load::WindowPolicy;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const HTTP_ADDR_VAR: &str = "RELEASE_SCHEDULE_HTTP_ADDR";
pub const DATABASE_VAR: &str = "RELEASE_SCHEDULE_DB";
pub const SEED_FILE_VAR: &str = "RELEASE_SCHEDULE_SEED";
pub const CLIP_WINDOW_VAR: &str = "RELEASE_SCHEDULE_CLIP_WINDOW";
pub const LOG_VAR: &str = "RELEASE_SCHEDULE_LOG";

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddress { var: &'static str, value: String },
    #[error("{var} must be true or false, got '{value}'")]
    InvalidFlag { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    Sqlite(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalyzerConfig {
    pub window_policy: WindowPolicy,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub http_addr: SocketAddr,
    pub store: StoreLocation,
    pub seed_file: Option<PathBuf>,
    pub analyzer: AnalyzerConfig,
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000))),
            store: StoreLocation::Memory,
            seed_file: None,
            analyzer: AnalyzerConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(HTTP_ADDR_VAR) {
            config.http_addr = value.trim().parse().map_err(|_| ConfigError::InvalidAddress {
                var: HTTP_ADDR_VAR,
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup(DATABASE_VAR) {
            let value = value.trim();
            if !value.is_empty() && value != ":memory:" {
                config.store = StoreLocation::Sqlite(PathBuf::from(value));
            }
        }

        config.seed_file = lookup(SEED_FILE_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        if let Some(value) = lookup(CLIP_WINDOW_VAR) {
            config.analyzer.window_policy = if parse_flag(CLIP_WINDOW_VAR, &value)? {
                WindowPolicy::Clipped
            } else {
                WindowPolicy::Unclipped
            };
        }

        if let Some(value) = lookup(LOG_VAR) {
            if !value.trim().is_empty() {
                config.log_filter = value.trim().to_string();
            }
        }

        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: value.to_string(),
        }),
    }
}
