//! In-memory tree store.
//!
//! Nothing is persisted; trees opened on this store are stamped with the
//! block height supplied by the caller. Used for deterministic replay and in
//! tests.

use std::{collections::BTreeMap, ops::Bound};

use parking_lot::RwLock;
use zkl2_db_types::{BatchOp, DbResult, TreeStore, WriteBatch};

#[derive(Debug, Default)]
pub struct MemoryTreeStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys, across all namespaces.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl TreeStore for MemoryTreeStore {
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn write_batch(&self, batch: WriteBatch) -> DbResult<()> {
        let mut entries = self.entries.write();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put(k, v) => {
                    entries.insert(k, v);
                }
                BatchOp::Delete(k) => {
                    entries.remove(&k);
                }
            }
        }
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let entries = self.entries.read();
        let range = entries.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded));
        Ok(range
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn persists_history(&self) -> bool {
        false
    }
}
