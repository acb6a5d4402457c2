//! Server configuration.
//!
//! Loaded from an optional TOML file, then overridden by the `BIND_ADDR`
//! and `PORT` environment variables:
//!
//! ```toml
//! bind_addr = "0.0.0.0"
//! port = 8080
//! locale = "indonesian"
//!
//! [store]
//! type = "http"
//! base_url = "http://localhost:8000/api"
//! timeout_secs = 10
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use safety_map_report_models::MonthLocale;
use safety_map_store::http::HttpReportStore;
use safety_map_store::memory::MemoryStore;
use safety_map_store::retry::RetryPolicy;
use safety_map_store::{ReportStore, StoreError};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SAFETY_MAP_CONFIG";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`ServerConfig`].
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// `PORT` is not a port number.
    #[error("Invalid port '{value}'")]
    InvalidPort {
        /// The rejected value.
        value: String,
    },
}

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
    /// Language of trend labels.
    pub locale: MonthLocale,
    /// Where reports come from.
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            locale: MonthLocale::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Report store backend, tagged by `type` in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// JSON dataset file loaded into memory at startup.
    Memory {
        /// Dataset path.
        path: PathBuf,
    },
    /// The dashboard's REST backend.
    Http {
        /// API base URL (e.g., `"http://localhost:8000/api"`).
        base_url: String,
        /// Per-request timeout in seconds.
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
        /// Retries on transient failures.
        #[serde(default = "default_max_retries")]
        max_retries: u32,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Memory {
            path: PathBuf::from("data/dataset.json"),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    15
}

const fn default_max_retries() -> u32 {
    3
}

impl ServerConfig {
    /// Parses a TOML config. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the TOML is malformed or has
    /// unknown keys.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(s)?)
    }

    /// Loads the config file at `path`, or at `$SAFETY_MAP_CONFIG` when no
    /// path is given, falling back to defaults when neither is set. The
    /// `BIND_ADDR` and `PORT` environment variables take precedence over
    /// the file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or
    /// `PORT` is not a valid port.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let config = match path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                let contents = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Io { path, source })?;
                Self::from_toml_str(&contents)?
            }
            None => Self::default(),
        };

        config.with_overrides(
            std::env::var("BIND_ADDR").ok(),
            std::env::var("PORT").ok(),
        )
    }

    /// Applies bind address and port overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] if `port` is not a `u16`.
    pub fn with_overrides(
        mut self,
        bind_addr: Option<String>,
        port: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(bind_addr) = bind_addr {
            self.bind_addr = bind_addr;
        }
        if let Some(port) = port {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { value: port })?;
        }
        Ok(self)
    }
}

impl StoreConfig {
    /// Opens the configured store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the dataset cannot be loaded or the HTTP
    /// client cannot be built.
    pub async fn open(&self) -> Result<Arc<dyn ReportStore>, StoreError> {
        match self {
            Self::Memory { path } => Ok(Arc::new(MemoryStore::load(path).await?)),
            Self::Http {
                base_url,
                timeout_secs,
                max_retries,
            } => {
                log::info!("Using report backend at {base_url}");
                let retry = RetryPolicy {
                    max_retries: *max_retries,
                    ..RetryPolicy::default()
                };
                Ok(Arc::new(HttpReportStore::new(
                    base_url,
                    Duration::from_secs(*timeout_secs),
                    retry,
                )?))
            }
        }
    }
}
