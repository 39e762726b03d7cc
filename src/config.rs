//! Engine configuration with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Optional TOML file (`max.ws.size = 9000`)
//! 3. Environment variables: `DTREE_*` prefix, `__` between key parts
//!    (`DTREE_MAX__WS__SIZE`)

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use thiserror::Error;

/// Default bound on the number of records a collection may select.
pub const DEFAULT_MAX_WS_SIZE: usize = 9000;

const MAX_WS_SIZE_KEY: &str = "max.ws.size";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("max.ws.size must be positive, got {0}")]
    InvalidMaxWsSize(i64),
}

/// Settings consulted during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    max_ws_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_ws_size: DEFAULT_MAX_WS_SIZE,
        }
    }
}

impl EngineConfig {
    /// Config with an explicit working-set bound.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMaxWsSize`] for a zero bound.
    pub fn with_max_ws_size(max_ws_size: usize) -> Result<Self, ConfigError> {
        if max_ws_size == 0 {
            return Err(ConfigError::InvalidMaxWsSize(0));
        }
        Ok(Self { max_ws_size })
    }

    /// Upper bound (exclusive) on the size of a selected record set.
    #[must_use]
    pub fn max_ws_size(&self) -> usize {
        self.max_ws_size
    }

    /// Load defaults, then `path` if given, then `DTREE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or a value is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::build(path, env_source())
    }

    /// Parse settings from TOML text, without consulting the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed TOML or an invalid value.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default(MAX_WS_SIZE_KEY, default_bound())?
            .add_source(File::from_str(toml, FileFormat::Toml));
        Self::from_config(&builder.build()?)
    }

    fn build(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().set_default(MAX_WS_SIZE_KEY, default_bound())?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let config = builder.add_source(env).build()?;
        Self::from_config(&config)
    }

    fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let raw = config.get::<i64>(MAX_WS_SIZE_KEY)?;
        match usize::try_from(raw) {
            Ok(bound) if bound > 0 => Ok(Self { max_ws_size: bound }),
            _ => Err(ConfigError::InvalidMaxWsSize(raw)),
        }
    }
}

fn default_bound() -> i64 {
    i64::try_from(DEFAULT_MAX_WS_SIZE).unwrap_or(i64::MAX)
}

fn env_source() -> Environment {
    Environment::with_prefix("DTREE")
        .prefix_separator("_")
        .separator("__")
}
