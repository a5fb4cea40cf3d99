//! Driver trait implemented by every tree backing store.

use std::fmt::Debug;

use crate::{errors::DbResult, types::WriteBatch};

/// Raw key/value store shared by the trees of a forest.
///
/// Drivers only need to provide point reads, atomic batch writes and prefix
/// scans; versioning, journaling and namespacing are layered on top by the
/// tree implementation so every driver observes identical semantics.
///
/// ## Invariants
///
/// - A batch passed to [`TreeStore::write_batch`] is applied atomically and in
///   order: readers never observe a partially applied batch.
/// - [`TreeStore::scan_prefix`] returns every live key starting with the
///   prefix, sorted by key.
pub trait TreeStore: Send + Sync + Debug {
    /// Reads the value stored under `key`.
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>>;

    /// Applies every operation in `batch` atomically.
    fn write_batch(&self, batch: WriteBatch) -> DbResult<()>;

    /// Returns all entries whose key starts with `prefix`, sorted by key.
    fn scan_prefix(&self, prefix: &[u8]) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Whether committed history survives a process restart.
    ///
    /// Stores that do not persist history have their trees stamped with the
    /// externally supplied block height instead of being rolled back.
    fn persists_history(&self) -> bool;

    /// Flushes buffered writes to durable storage, if the driver buffers.
    fn flush(&self) -> DbResult<()> {
        Ok(())
    }
}
