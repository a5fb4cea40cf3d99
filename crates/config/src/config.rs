use std::{
    fs, io,
    path::{Path, PathBuf},
    thread,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default value for `name` in [`TreeDbConfig`].
pub const DEFAULT_TREE_NAME: &str = "zkl2";

/// Default value for `batch_reload_size` in [`TreeDbConfig`].
pub const DEFAULT_BATCH_RELOAD_SIZE: usize = 1000;

/// Default sled page cache, in bytes.
const DEFAULT_SLED_CACHE_CAPACITY: u64 = 1024 * 1024 * 1024;

/// Default sled background flush interval.
const DEFAULT_SLED_FLUSH_EVERY_MS: u64 = 500;

/// Bootstrap workers used when the host parallelism is unknown.
const FALLBACK_BOOTSTRAP_WORKERS: usize = 4;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_name() -> String {
    DEFAULT_TREE_NAME.to_owned()
}

fn default_batch_reload_size() -> usize {
    DEFAULT_BATCH_RELOAD_SIZE
}

fn default_bootstrap_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_BOOTSTRAP_WORKERS)
}

fn default_sled_cache_capacity() -> u64 {
    DEFAULT_SLED_CACHE_CAPACITY
}

fn default_sled_flush_every_ms() -> Option<u64> {
    Some(DEFAULT_SLED_FLUSH_EVERY_MS)
}

/// Key/value driver backing the state trees, with its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum DriverConfig {
    /// Process-local maps. Nothing survives a restart.
    Memory,

    /// Embedded sled database under `path`.
    Sled {
        path: PathBuf,
        #[serde(default = "default_sled_cache_capacity")]
        cache_capacity: u64,
        #[serde(default = "default_sled_flush_every_ms")]
        flush_every_ms: Option<u64>,
    },

    /// Remote redis server.
    Redis {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDbConfig {
    /// Name prefixed to every tree namespace, so several forests can share
    /// one driver.
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(flatten)]
    pub driver: DriverConfig,

    /// Leaves read from the leaf source per bootstrap batch.
    #[serde(default = "default_batch_reload_size")]
    pub batch_reload_size: usize,

    /// Threads building asset trees during bootstrap.
    #[serde(default = "default_bootstrap_workers")]
    pub bootstrap_workers: usize,

    /// Versions kept behind the latest commit. `None` keeps the full
    /// history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retain_versions: Option<u64>,
}

impl TreeDbConfig {
    /// In-memory configuration with default tuning.
    pub fn memory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: DriverConfig::Memory,
            batch_reload_size: DEFAULT_BATCH_RELOAD_SIZE,
            bootstrap_workers: default_bootstrap_workers(),
            retain_versions: None,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("tree_db.name is empty".into()));
        }
        if self.batch_reload_size == 0 {
            return Err(ConfigError::Invalid(
                "tree_db.batch_reload_size must be positive".into(),
            ));
        }
        if self.bootstrap_workers == 0 {
            return Err(ConfigError::Invalid(
                "tree_db.bootstrap_workers must be positive".into(),
            ));
        }
        match &self.driver {
            DriverConfig::Sled { path, .. } if path.as_os_str().is_empty() => {
                Err(ConfigError::Invalid("tree_db.path is empty".into()))
            }
            DriverConfig::Redis { url, .. } if url.is_empty() => {
                Err(ConfigError::Invalid("tree_db.url is empty".into()))
            }
            _ => Ok(()),
        }
    }
}

impl Default for TreeDbConfig {
    fn default() -> Self {
        Self::memory(DEFAULT_TREE_NAME)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Directory path for file-based logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_prefix: Option<String>,

    /// Use JSON format for logs instead of compact format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_format: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tree_db: TreeDbConfig,

    /// Logging configuration (optional section in TOML).
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.tree_db.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}
