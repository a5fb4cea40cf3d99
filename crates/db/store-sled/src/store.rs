use sled::{Batch, Error as SledError, Tree};
use zkl2_db_types::{BatchOp, DbError, DbResult, TreeStore, WriteBatch};

fn to_db_error(err: SledError) -> DbError {
    match err {
        SledError::Io(e) => DbError::IoError(e.to_string()),
        e => DbError::Backend(format!("sled error: {e:?}")),
    }
}

/// Tree store persisting every namespace into a single sled tree.
#[derive(Debug, Clone)]
pub struct SledTreeStore {
    tree: Tree,
}

impl SledTreeStore {
    pub fn new(tree: Tree) -> Self {
        Self { tree }
    }
}

impl TreeStore for SledTreeStore {
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        let value = self.tree.get(key).map_err(to_db_error)?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn write_batch(&self, batch: WriteBatch) -> DbResult<()> {
        let mut sled_batch = Batch::default();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put(k, v) => sled_batch.insert(k, v),
                BatchOp::Delete(k) => sled_batch.remove(k),
            }
        }
        self.tree.apply_batch(sled_batch).map_err(to_db_error)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.tree
            .scan_prefix(prefix)
            .map(|res| {
                res.map(|(k, v)| (k.to_vec(), v.to_vec()))
                    .map_err(to_db_error)
            })
            .collect()
    }

    fn persists_history(&self) -> bool {
        true
    }

    fn flush(&self) -> DbResult<()> {
        self.tree.flush().map_err(to_db_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{open_sled_database, SledDbConfig, SLED_TREE_NAME};

    fn setup() -> SledTreeStore {
        let db = SledDbConfig::test().to_sled_config().open().unwrap();
        SledTreeStore::new(db.open_tree(SLED_TREE_NAME).unwrap())
    }

    #[test]
    fn test_batch_put_delete() {
        let store = setup();
        let mut batch = WriteBatch::new();
        batch.put(b"x/1".to_vec(), b"a".to_vec());
        batch.put(b"x/2".to_vec(), b"b".to_vec());
        store.write_batch(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.delete(b"x/1".to_vec());
        store.write_batch(batch).unwrap();

        assert_eq!(store.get(b"x/1").unwrap(), None);
        assert_eq!(store.get(b"x/2").unwrap(), Some(b"b".to_vec()));
    }

    #[test]
    fn test_scan_prefix() {
        let store = setup();
        let mut batch = WriteBatch::new();
        batch.put(b"y/2".to_vec(), b"2".to_vec());
        batch.put(b"y/1".to_vec(), b"1".to_vec());
        batch.put(b"z/1".to_vec(), b"3".to_vec());
        store.write_batch(batch).unwrap();

        let scanned = store.scan_prefix(b"y/").unwrap();
        assert_eq!(
            scanned,
            vec![
                (b"y/1".to_vec(), b"1".to_vec()),
                (b"y/2".to_vec(), b"2".to_vec())
            ]
        );
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = SledDbConfig::new(8 * 1024 * 1024, None);
        {
            let store = open_sled_database(dir.path(), "state", &config).unwrap();
            let mut batch = WriteBatch::new();
            batch.put(b"k".to_vec(), b"v".to_vec());
            store.write_batch(batch).unwrap();
            store.flush().unwrap();
        }
        let store = open_sled_database(dir.path(), "state", &config).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(store.persists_history());
    }
}
