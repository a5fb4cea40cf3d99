//! Shared interface for the key/value drivers that back the state trees.

pub mod errors;
pub mod traits;
pub mod types;

pub use errors::{DbError, DbResult};
pub use traits::TreeStore;
pub use types::{BatchOp, Namespace, Version, WriteBatch};
