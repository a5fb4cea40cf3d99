//! Sled-backed tree store.

mod config;
mod init;
mod store;

pub use config::SledDbConfig;
pub use init::open_sled_database;
pub use store::SledTreeStore;

/// Name of the sled tree holding every state-tree namespace.
pub const SLED_TREE_NAME: &str = "zkl2-state";
