//! TOML configuration of the tree database and logging.

mod config;

pub use config::{
    Config, ConfigError, ConfigResult, DriverConfig, LoggingConfig, TreeDbConfig,
    DEFAULT_BATCH_RELOAD_SIZE, DEFAULT_TREE_NAME,
};
