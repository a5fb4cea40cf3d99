use std::{collections::BTreeMap, fmt, sync::Arc};

use borsh::{BorshDeserialize, BorshSerialize};
use tracing::*;
use zkl2_db_types::{DbError, Namespace, TreeStore, Version, WriteBatch};
use zkl2_primitives::{mimc::hash_pair, Buf32};

use crate::{
    errors::{SmtError, SmtResult},
    keys::{aux_key, journal_key, meta_key, node_key, preimage_key},
    nil::NilHashes,
    proof::MerkleProof,
};

/// Persisted per-tree bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
struct TreeMeta {
    latest_version: Version,
    /// Oldest version rollback can still reach.
    earliest_version: Version,
    /// Versions with a retained undo journal, ascending.
    journaled: Vec<Version>,
}

/// Undo entries recorded by one commit: tree-local key and the value it held
/// before the commit.
type Journal = Vec<(Vec<u8>, Option<Vec<u8>>)>;

/// A fixed-height sparse Merkle tree with versioned persistence.
///
/// Writes accumulate in an in-memory overlay and are visible to reads
/// immediately. [`commit_with_version`](Self::commit_with_version) flushes
/// them to the store in one atomic batch.
pub struct SparseMerkleTree {
    store: Arc<dyn TreeStore>,
    ns: Namespace,
    nil: Arc<NilHashes>,
    meta: TreeMeta,
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl fmt::Debug for SparseMerkleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseMerkleTree")
            .field("ns", &self.ns)
            .field("height", &self.height())
            .field("latest_version", &self.meta.latest_version)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl SparseMerkleTree {
    /// Opens the tree stored under `ns`, or an empty one if nothing has been
    /// committed there yet.
    pub fn open(store: Arc<dyn TreeStore>, ns: Namespace, nil: Arc<NilHashes>) -> SmtResult<Self> {
        let meta = match store.get(&ns.key(&meta_key()))? {
            Some(raw) => decode(&ns, &raw)?,
            None => TreeMeta::default(),
        };
        Ok(Self {
            store,
            ns,
            nil,
            meta,
            pending: BTreeMap::new(),
        })
    }

    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    pub fn height(&self) -> u8 {
        self.nil.height()
    }

    pub fn nil_hashes(&self) -> &Arc<NilHashes> {
        &self.nil
    }

    pub fn latest_version(&self) -> Version {
        self.meta.latest_version
    }

    pub fn earliest_version(&self) -> Version {
        self.meta.earliest_version
    }

    /// Whether any undo journal is retained, i.e. rollback can still move.
    pub fn has_history(&self) -> bool {
        !self.meta.journaled.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drops every uncommitted write.
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    /// Current root, including uncommitted writes.
    pub fn root(&self) -> SmtResult<Buf32> {
        self.node(0, 0)
    }

    /// Whether the tree currently holds only empty leaves.
    pub fn is_empty(&self) -> SmtResult<bool> {
        Ok(self.root()? == self.nil.root())
    }

    /// Leaf digest at `index`, including uncommitted writes.
    pub fn get(&self, index: u64) -> SmtResult<Buf32> {
        self.check_index(index)?;
        self.node(self.height(), index)
    }

    /// Committed leaf digest at `index` as of `version`.
    pub fn get_at(&self, version: Version, index: u64) -> SmtResult<Buf32> {
        self.check_index(index)?;
        let height = self.height();
        let raw = self.read_at(version, &node_key(height, index))?;
        self.decode_node(height, raw)
    }

    /// Committed root as of `version`.
    pub fn root_at(&self, version: Version) -> SmtResult<Buf32> {
        let raw = self.read_at(version, &node_key(0, 0))?;
        self.decode_node(0, raw)
    }

    /// Leaf pre-image stored alongside the digest at `index`, if any.
    pub fn preimage(&self, index: u64) -> SmtResult<Option<Vec<u8>>> {
        self.check_index(index)?;
        self.read(&preimage_key(index))
    }

    pub fn preimage_at(&self, version: Version, index: u64) -> SmtResult<Option<Vec<u8>>> {
        self.check_index(index)?;
        self.read_at(version, &preimage_key(index))
    }

    pub fn aux(&self, name: &str) -> SmtResult<Option<Vec<u8>>> {
        self.read(&aux_key(name))
    }

    /// Stores a small versioned value next to the tree; it is journaled and
    /// rolled back together with the leaves.
    pub fn set_aux(&mut self, name: &str, value: Option<Vec<u8>>) {
        self.pending.insert(aux_key(name), value);
    }

    /// Sets the leaf digest at `index` and recomputes the path to the root.
    pub fn set(&mut self, index: u64, leaf: Buf32) -> SmtResult<()> {
        self.check_index(index)?;
        let height = self.height();
        let mut cur = leaf;
        let mut idx = index;
        self.write_node(height, idx, cur);
        for depth in (1..=height).rev() {
            let sibling = self.node(depth, idx ^ 1)?;
            cur = if idx & 1 == 0 {
                hash_pair(&cur, &sibling)
            } else {
                hash_pair(&sibling, &cur)
            };
            idx >>= 1;
            self.write_node(depth - 1, idx, cur);
        }
        Ok(())
    }

    /// Sets the leaf digest and its pre-image together. A `None` pre-image
    /// removes any stored one.
    pub fn set_with_preimage(
        &mut self,
        index: u64,
        leaf: Buf32,
        preimage: Option<Vec<u8>>,
    ) -> SmtResult<()> {
        self.set(index, leaf)?;
        self.pending.insert(preimage_key(index), preimage);
        Ok(())
    }

    pub fn multi_set(&mut self, items: impl IntoIterator<Item = (u64, Buf32)>) -> SmtResult<()> {
        for (index, leaf) in items {
            self.set(index, leaf)?;
        }
        Ok(())
    }

    /// Sibling path for `index` against the current root.
    pub fn get_proof(&self, index: u64) -> SmtResult<MerkleProof> {
        self.check_index(index)?;
        let height = self.height();
        let mut siblings = Vec::with_capacity(height as usize);
        let mut idx = index;
        for depth in (1..=height).rev() {
            siblings.push(self.node(depth, idx ^ 1)?);
            idx >>= 1;
        }
        Ok(MerkleProof::new(index, siblings))
    }

    /// Stamps a tree without history with an externally supplied version.
    ///
    /// Used by stores that do not persist history, where the version must
    /// track the block height the tree was built for.
    pub fn initialize_version(&mut self, version: Version) -> SmtResult<()> {
        self.stamp_version(version)?;
        let mut batch = WriteBatch::new();
        batch.put(self.ns.key(&meta_key()), encode(&self.meta)?);
        self.store.write_batch(batch)?;
        Ok(())
    }

    /// Like [`initialize_version`] but only in memory. The stamp reaches the
    /// store with the next commit.
    ///
    /// [`initialize_version`]: SparseMerkleTree::initialize_version
    pub fn stamp_version(&mut self, version: Version) -> SmtResult<()> {
        if !self.meta.journaled.is_empty() {
            return Err(DbError::AlreadyInitialized(self.ns.to_string()).into());
        }
        self.meta.latest_version = version;
        self.meta.earliest_version = version;
        Ok(())
    }

    /// Commits pending writes as `latest_version + 1`.
    pub fn commit(&mut self, prune_to: Option<Version>) -> SmtResult<Version> {
        let next = self.meta.latest_version + 1;
        self.commit_with_version(next, prune_to)
    }

    /// Commits pending writes as `version`.
    ///
    /// Committing again at the latest version folds the new writes into that
    /// version's journal, so a later rollback still restores the state from
    /// before the first commit. With `prune_to`, journals at or below that
    /// version are dropped and rollback can no longer go below it.
    pub fn commit_with_version(
        &mut self,
        version: Version,
        prune_to: Option<Version>,
    ) -> SmtResult<Version> {
        let latest = self.meta.latest_version;
        if version < latest {
            return Err(DbError::VersionNotIncreasing {
                new: version,
                latest,
            }
            .into());
        }

        let mut meta = self.meta.clone();
        let mut batch = WriteBatch::new();
        let existing: Journal = if version == latest && meta.journaled.last() == Some(&version) {
            self.load_journal(version)?
        } else {
            Vec::new()
        };
        let mut journal = existing.clone();
        let mut writes = 0usize;
        for (key, new_value) in &self.pending {
            let full_key = self.ns.key(key);
            let old_value = self.store.get(&full_key)?;
            if old_value == *new_value {
                continue;
            }
            if !existing.iter().any(|(k, _)| k == key) {
                journal.push((key.clone(), old_value));
            }
            batch.write(full_key, new_value.clone());
            writes += 1;
        }

        if !journal.is_empty() {
            batch.put(self.ns.key(&journal_key(version)), encode(&journal)?);
            if meta.journaled.last() != Some(&version) {
                meta.journaled.push(version);
            }
        }
        meta.latest_version = version;

        if let Some(prune_to) = prune_to {
            let prune_to = prune_to.min(version);
            let (dropped, kept): (Vec<Version>, Vec<Version>) = meta
                .journaled
                .iter()
                .copied()
                .partition(|v| *v <= prune_to);
            for v in dropped {
                batch.delete(self.ns.key(&journal_key(v)));
            }
            meta.journaled = kept;
            meta.earliest_version = meta.earliest_version.max(prune_to);
        }

        batch.put(self.ns.key(&meta_key()), encode(&meta)?);
        self.store.write_batch(batch)?;
        self.meta = meta;
        self.pending.clear();
        debug!(ns = %self.ns, version, writes, "committed tree");
        Ok(version)
    }

    /// Reverts the tree to its state as of `version`, discarding pending
    /// writes and every newer committed version.
    pub fn rollback(&mut self, version: Version) -> SmtResult<()> {
        let latest = self.meta.latest_version;
        if version > latest {
            return Err(DbError::RollbackAboveLatest(version, latest).into());
        }
        if version < self.meta.earliest_version {
            return Err(DbError::VersionPruned {
                requested: version,
                earliest: self.meta.earliest_version,
            }
            .into());
        }
        self.pending.clear();

        let mut batch = WriteBatch::new();
        let undone: Vec<Version> = self
            .meta
            .journaled
            .iter()
            .rev()
            .copied()
            .take_while(|v| *v > version)
            .collect();
        // Newest first, so the oldest recorded value of a key is written last.
        for v in &undone {
            for (key, old) in self.load_journal(*v)? {
                batch.write(self.ns.key(&key), old);
            }
            batch.delete(self.ns.key(&journal_key(*v)));
        }
        let mut meta = self.meta.clone();
        meta.journaled.retain(|v| *v <= version);
        meta.latest_version = version;
        batch.put(self.ns.key(&meta_key()), encode(&meta)?);
        self.store.write_batch(batch)?;
        self.meta = meta;

        info!(ns = %self.ns, from = latest, to = version, undone = undone.len(), "rolled back tree");
        Ok(())
    }

    fn check_index(&self, index: u64) -> SmtResult<()> {
        let height = self.height();
        if height < 64 && index >> height != 0 {
            return Err(SmtError::IndexOutOfRange { index, height });
        }
        Ok(())
    }

    fn node(&self, depth: u8, index: u64) -> SmtResult<Buf32> {
        let raw = self.read(&node_key(depth, index))?;
        self.decode_node(depth, raw)
    }

    fn decode_node(&self, depth: u8, raw: Option<Vec<u8>>) -> SmtResult<Buf32> {
        match raw {
            Some(bytes) => Buf32::try_from_slice("node", &bytes).map_err(|e| SmtError::CorruptEntry {
                namespace: self.ns.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(self.nil.at(depth)),
        }
    }

    fn write_node(&mut self, depth: u8, index: u64, hash: Buf32) {
        // Empty subtrees are implicit, so nil digests are never stored.
        let value = (hash != self.nil.at(depth)).then(|| hash.as_bytes().to_vec());
        self.pending.insert(node_key(depth, index), value);
    }

    fn read(&self, key: &[u8]) -> SmtResult<Option<Vec<u8>>> {
        if let Some(value) = self.pending.get(key) {
            return Ok(value.clone());
        }
        Ok(self.store.get(&self.ns.key(key))?)
    }

    /// Reads the committed value of `key` as of `version` by walking undo
    /// journals backwards from the latest version.
    fn read_at(&self, version: Version, key: &[u8]) -> SmtResult<Option<Vec<u8>>> {
        let latest = self.meta.latest_version;
        if version > latest {
            return Err(DbError::RollbackAboveLatest(version, latest).into());
        }
        if version < self.meta.earliest_version {
            return Err(DbError::VersionPruned {
                requested: version,
                earliest: self.meta.earliest_version,
            }
            .into());
        }

        let mut value = self.store.get(&self.ns.key(key))?;
        for v in self.meta.journaled.iter().rev().take_while(|v| **v > version) {
            if let Some((_, old)) = self.load_journal(*v)?.into_iter().find(|(k, _)| k == key) {
                value = old;
            }
        }
        Ok(value)
    }

    fn load_journal(&self, version: Version) -> SmtResult<Journal> {
        match self.store.get(&self.ns.key(&journal_key(version)))? {
            Some(raw) => decode(&self.ns, &raw),
            None => Err(SmtError::CorruptEntry {
                namespace: self.ns.to_string(),
                reason: format!("missing journal for version {version}"),
            }),
        }
    }
}

fn encode<T: BorshSerialize>(value: &T) -> SmtResult<Vec<u8>> {
    borsh::to_vec(value).map_err(|e| DbError::CodecError(e.to_string()).into())
}

fn decode<T: BorshDeserialize>(ns: &Namespace, raw: &[u8]) -> SmtResult<T> {
    borsh::from_slice(raw).map_err(|e| SmtError::CorruptEntry {
        namespace: ns.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use zkl2_db_store_memory::MemoryTreeStore;
    use zkl2_db_store_sled::SledTreeStore;
    use zkl2_primitives::{field::u64_to_block, mimc::hash_blocks};

    use super::*;
    use crate::proof::verify_proof;

    const HEIGHT: u8 = 8;

    fn leaf(v: u64) -> Buf32 {
        hash_blocks(&[u64_to_block(v)])
    }

    fn nil() -> Arc<NilHashes> {
        Arc::new(NilHashes::new(HEIGHT, leaf(0)))
    }

    fn open(store: &Arc<dyn TreeStore>, ns: &str) -> SparseMerkleTree {
        SparseMerkleTree::open(store.clone(), Namespace::new("test", ns), nil()).unwrap()
    }

    fn memory_store() -> Arc<dyn TreeStore> {
        Arc::new(MemoryTreeStore::new())
    }

    fn sled_store() -> Arc<dyn TreeStore> {
        let db = sled::Config::new().temporary(true).open().unwrap();
        Arc::new(SledTreeStore::new(db.open_tree("t").unwrap()))
    }

    mod basics {
        use super::*;

        #[test]
        fn test_empty_root_is_nil_root() {
            let store = memory_store();
            let tree = open(&store, "a");
            assert_eq!(tree.root().unwrap(), nil().root());
            assert!(tree.is_empty().unwrap());
            assert_eq!(tree.get(17).unwrap(), leaf(0));
        }

        #[test]
        fn test_unset_index_proves_empty_leaf() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            tree.set(3, leaf(9)).unwrap();
            let root = tree.root().unwrap();
            let proof = tree.get_proof(200).unwrap();
            assert_eq!(proof.siblings.len(), HEIGHT as usize);
            assert!(verify_proof(&root, &leaf(0), &proof, HEIGHT).unwrap());
            assert!(!verify_proof(&root, &leaf(1), &proof, HEIGHT).unwrap());
        }

        #[test]
        fn test_set_then_prove() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            tree.set(0, leaf(1)).unwrap();
            tree.set(255, leaf(2)).unwrap();
            let root = tree.root().unwrap();
            for (idx, v) in [(0, 1), (255, 2)] {
                let proof = tree.get_proof(idx).unwrap();
                assert!(verify_proof(&root, &leaf(v), &proof, HEIGHT).unwrap());
            }
        }

        #[test]
        fn test_index_out_of_range() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            assert_eq!(
                tree.set(256, leaf(1)).unwrap_err(),
                SmtError::IndexOutOfRange {
                    index: 256,
                    height: HEIGHT
                }
            );
        }

        #[test]
        fn test_resetting_to_empty_restores_nil_root() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            tree.set(5, leaf(5)).unwrap();
            tree.set(5, leaf(0)).unwrap();
            assert!(tree.is_empty().unwrap());
            tree.commit(None).unwrap();
            // Nothing but metadata and the journal should have been persisted.
            let nodes = store.scan_prefix(b"test:a/n").unwrap();
            assert!(nodes.is_empty());
        }

        #[test]
        fn test_namespaces_are_isolated() {
            let store = memory_store();
            let mut a = open(&store, "a");
            let b = open(&store, "b");
            a.set(1, leaf(1)).unwrap();
            a.commit(None).unwrap();
            let b = SparseMerkleTree::open(store.clone(), b.namespace().clone(), nil()).unwrap();
            assert!(b.is_empty().unwrap());
        }
    }

    mod versions {
        use super::*;

        #[test]
        fn test_commit_and_reopen() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            tree.set_with_preimage(4, leaf(4), Some(b"four".to_vec())).unwrap();
            assert_eq!(tree.commit(None).unwrap(), 1);
            let root = tree.root().unwrap();

            let reopened = open(&store, "a");
            assert_eq!(reopened.latest_version(), 1);
            assert_eq!(reopened.root().unwrap(), root);
            assert_eq!(reopened.preimage(4).unwrap(), Some(b"four".to_vec()));
        }

        #[test]
        fn test_rollback_restores_previous_state() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            tree.set(1, leaf(1)).unwrap();
            tree.commit_with_version(10, None).unwrap();
            let root10 = tree.root().unwrap();

            tree.set(1, leaf(2)).unwrap();
            tree.set(2, leaf(3)).unwrap();
            tree.commit_with_version(11, None).unwrap();
            tree.set(7, leaf(7)).unwrap();
            tree.commit_with_version(12, None).unwrap();

            tree.rollback(10).unwrap();
            assert_eq!(tree.latest_version(), 10);
            assert_eq!(tree.root().unwrap(), root10);
            assert_eq!(tree.get(2).unwrap(), leaf(0));

            let reopened = open(&store, "a");
            assert_eq!(reopened.root().unwrap(), root10);
        }

        #[test]
        fn test_rollback_discards_pending() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            tree.set(1, leaf(1)).unwrap();
            tree.commit(None).unwrap();
            let root = tree.root().unwrap();
            tree.set(1, leaf(2)).unwrap();
            tree.rollback(1).unwrap();
            assert!(!tree.has_pending());
            assert_eq!(tree.root().unwrap(), root);
        }

        #[test]
        fn test_rollback_above_latest_fails() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            tree.commit(None).unwrap();
            assert_eq!(
                tree.rollback(5).unwrap_err(),
                SmtError::Db(DbError::RollbackAboveLatest(5, 1))
            );
        }

        #[test]
        fn test_commit_below_latest_fails() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            tree.commit_with_version(5, None).unwrap();
            assert!(matches!(
                tree.commit_with_version(4, None),
                Err(SmtError::Db(DbError::VersionNotIncreasing { new: 4, latest: 5 }))
            ));
        }

        #[test]
        fn test_recommit_same_version_keeps_oldest_undo() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            tree.set(1, leaf(1)).unwrap();
            tree.commit_with_version(1, None).unwrap();
            let root1 = tree.root().unwrap();

            tree.set(1, leaf(2)).unwrap();
            tree.commit_with_version(2, None).unwrap();
            tree.set(1, leaf(3)).unwrap();
            tree.set(9, leaf(9)).unwrap();
            tree.commit_with_version(2, None).unwrap();

            tree.rollback(1).unwrap();
            assert_eq!(tree.root().unwrap(), root1);
            assert_eq!(tree.get(9).unwrap(), leaf(0));
        }

        #[test]
        fn test_get_at_reads_history() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            tree.set_with_preimage(3, leaf(30), Some(vec![30])).unwrap();
            tree.commit_with_version(1, None).unwrap();
            let root1 = tree.root().unwrap();
            tree.set_with_preimage(3, leaf(31), Some(vec![31])).unwrap();
            tree.commit_with_version(2, None).unwrap();
            tree.set_with_preimage(3, leaf(32), Some(vec![32])).unwrap();
            tree.commit_with_version(3, None).unwrap();

            assert_eq!(tree.get_at(1, 3).unwrap(), leaf(30));
            assert_eq!(tree.get_at(2, 3).unwrap(), leaf(31));
            assert_eq!(tree.get_at(3, 3).unwrap(), leaf(32));
            assert_eq!(tree.get_at(0, 3).unwrap(), leaf(0));
            assert_eq!(tree.preimage_at(1, 3).unwrap(), Some(vec![30]));
            assert_eq!(tree.preimage_at(0, 3).unwrap(), None);
            assert_eq!(tree.root_at(1).unwrap(), root1);
        }

        #[test]
        fn test_prune_blocks_deep_rollback() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            for v in 1..=5u64 {
                tree.set(v, leaf(v)).unwrap();
                tree.commit_with_version(v, None).unwrap();
            }
            tree.set(6, leaf(6)).unwrap();
            tree.commit_with_version(6, Some(4)).unwrap();
            assert_eq!(tree.earliest_version(), 4);
            assert_eq!(
                tree.rollback(3).unwrap_err(),
                SmtError::Db(DbError::VersionPruned {
                    requested: 3,
                    earliest: 4
                })
            );
            tree.rollback(4).unwrap();
            assert_eq!(tree.get(5).unwrap(), leaf(0));
            assert_eq!(tree.get(4).unwrap(), leaf(4));
        }

        #[test]
        fn test_initialize_version() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            tree.initialize_version(100).unwrap();
            assert_eq!(tree.latest_version(), 100);
            tree.set(1, leaf(1)).unwrap();
            tree.commit_with_version(101, None).unwrap();
            assert!(matches!(
                tree.initialize_version(200),
                Err(SmtError::Db(DbError::AlreadyInitialized(_)))
            ));
        }

        #[test]
        fn test_stamp_version_writes_nothing() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            tree.stamp_version(7).unwrap();
            assert_eq!(tree.latest_version(), 7);
            assert!(store.scan_prefix(tree.namespace().prefix().as_slice()).unwrap().is_empty());

            tree.set(1, leaf(1)).unwrap();
            tree.commit_with_version(8, None).unwrap();
            let reopened = open(&store, "a");
            assert_eq!(reopened.latest_version(), 8);
            assert_eq!(reopened.get(1).unwrap(), leaf(1));
        }

        #[test]
        fn test_aux_is_versioned() {
            let store = memory_store();
            let mut tree = open(&store, "a");
            tree.set_aux("count", Some(vec![1]));
            tree.commit_with_version(1, None).unwrap();
            tree.set_aux("count", Some(vec![2]));
            tree.commit_with_version(2, None).unwrap();
            tree.rollback(1).unwrap();
            assert_eq!(tree.aux("count").unwrap(), Some(vec![1]));
        }
    }

    mod drivers {
        use super::*;

        fn run_script(store: Arc<dyn TreeStore>) -> (Buf32, Buf32) {
            let mut tree = open(&store, "parity");
            tree.multi_set([(1, leaf(1)), (2, leaf(2)), (200, leaf(3))])
                .unwrap();
            tree.commit_with_version(1, None).unwrap();
            tree.set(2, leaf(20)).unwrap();
            tree.commit_with_version(2, None).unwrap();
            let root2 = tree.root().unwrap();
            tree.rollback(1).unwrap();
            (root2, tree.root().unwrap())
        }

        #[test]
        fn test_memory_and_sled_agree() {
            assert_eq!(run_script(memory_store()), run_script(sled_store()));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn proptest_replay_determinism(ops in prop::collection::vec((0u64..256, 0u64..50), 1..12)) {
            let store_a = memory_store();
            let store_b = memory_store();
            let mut a = open(&store_a, "x");
            let mut b = open(&store_b, "x");
            for (idx, v) in &ops {
                a.set(*idx, leaf(*v)).unwrap();
            }
            a.commit(None).unwrap();
            for (idx, v) in &ops {
                b.set(*idx, leaf(*v)).unwrap();
            }
            b.commit(None).unwrap();
            prop_assert_eq!(a.root().unwrap(), b.root().unwrap());
        }

        #[test]
        fn proptest_rollback_is_pure_undo(
            base in prop::collection::vec((0u64..256, 0u64..50), 0..6),
            step in prop::collection::vec((0u64..256, 0u64..50), 1..6),
        ) {
            let store = memory_store();
            let mut tree = open(&store, "x");
            for (idx, v) in &base {
                tree.set(*idx, leaf(*v)).unwrap();
            }
            tree.commit_with_version(1, None).unwrap();
            let before = tree.root().unwrap();

            for (idx, v) in &step {
                tree.set(*idx, leaf(*v)).unwrap();
            }
            tree.commit_with_version(2, None).unwrap();
            let after = tree.root().unwrap();

            tree.rollback(1).unwrap();
            prop_assert_eq!(tree.root().unwrap(), before);

            for (idx, v) in &step {
                tree.set(*idx, leaf(*v)).unwrap();
            }
            tree.commit_with_version(2, None).unwrap();
            prop_assert_eq!(tree.root().unwrap(), after);
        }
    }
}
