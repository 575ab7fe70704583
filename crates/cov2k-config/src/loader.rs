//! Loading configuration from TOML and the environment.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::AppConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Environment variables that override file values.
pub const ENV_HOST: &str = "COV2K_HOST";
pub const ENV_PORT: &str = "COV2K_PORT";
pub const ENV_KB_PATH: &str = "COV2K_KB_PATH";
pub const ENV_DB_PATH: &str = "COV2K_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "COV2K_LOG_LEVEL";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Read, override from the process environment, and validate.
    pub async fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<AppConfig> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), "loaded configuration file");
        let mut config = Self::from_toml_str(&contents)?;
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Like [`ConfigLoader::load_from_file`], falling back to defaults when
    /// the file does not exist.
    pub async fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<AppConfig> {
        let path = path.as_ref();
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Self::load_from_file(path).await;
        }
        debug!(path = %path.display(), "config file not found, using defaults");
        let mut config = AppConfig::default();
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        Self::validate(&config)?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<AppConfig> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply overrides read through `lookup`.
    pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            config.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_PORT.to_string(),
                reason: format!("'{port}' is not a port number"),
            })?;
        }
        if let Some(kb) = lookup(ENV_KB_PATH) {
            config.storage.knowledge_base = PathBuf::from(kb);
        }
        if let Some(db) = lookup(ENV_DB_PATH) {
            config.storage.sqlite.path = PathBuf::from(db);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.logging.level = level;
        }
        Ok(())
    }

    pub fn validate(config: &AppConfig) -> ConfigResult<()> {
        let invalid = |field: &str, reason: &str| ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        };
        if config.server.port == 0 {
            return Err(invalid("server.port", "must not be 0"));
        }
        if config.server.max_filter_params == 0 {
            return Err(invalid("server.max_filter_params", "must be at least 1"));
        }
        if config.chain.fan_out_concurrency == 0 {
            return Err(invalid("chain.fan_out_concurrency", "must be at least 1"));
        }
        if config.chain.max_intermediate_values == 0 {
            return Err(invalid("chain.max_intermediate_values", "must be at least 1"));
        }
        if config.chain.default_limit == 0 {
            return Err(invalid("chain.default_limit", "must be at least 1"));
        }
        Ok(())
    }
}
