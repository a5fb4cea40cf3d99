//! Rebuilding a forest at a target height from an authoritative leaf source.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
};

use threadpool::ThreadPool;
use tracing::*;
use zkl2_db_types::{Namespace, TreeStore, Version};
use zkl2_primitives::{constants::LAST_ACCOUNT_ASSET_ID, Buf32};
use zkl2_smt::{NilHashes, SparseMerkleTree};

use crate::{
    errors::{StateError, StateResult},
    forest::{write_leaf, ForestConfig, TreeForest},
    leaf::{compute_state_root, AccountLeaf, AssetLeaf, LiquidityLeaf, NftLeaf},
};

/// Default number of leaves read from a [`LeafSource`] per batch.
pub const DEFAULT_BATCH_RELOAD_SIZE: usize = 1000;

/// Authoritative leaves of the forest as of some block height.
///
/// Paged methods return entries starting at position `offset` of the
/// source's own ordering; a page shorter than `limit` ends the stream.
pub trait LeafSource: Send + Sync {
    /// Number of registered accounts at `height`.
    fn account_count(&self, height: Version) -> StateResult<u64>;

    /// Account leaves. The `asset_root` of returned leaves is ignored and
    /// recomputed from the asset trees.
    fn accounts(
        &self,
        height: Version,
        offset: u64,
        limit: usize,
    ) -> StateResult<Vec<(u64, AccountLeaf)>>;

    /// Every non-empty asset leaf of one account.
    fn account_assets(&self, height: Version, account_index: u64)
        -> StateResult<Vec<(u64, AssetLeaf)>>;

    fn liquidity(
        &self,
        height: Version,
        offset: u64,
        limit: usize,
    ) -> StateResult<Vec<(u64, LiquidityLeaf)>>;

    fn nfts(&self, height: Version, offset: u64, limit: usize) -> StateResult<Vec<(u64, NftLeaf)>>;
}

/// Tuning of a forest bootstrap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Leaves read and committed per batch.
    pub batch_size: usize,

    /// Threads building asset trees.
    pub workers: usize,
}

impl BootstrapConfig {
    pub fn new(batch_size: usize, workers: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            workers: workers.max(1),
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(DEFAULT_BATCH_RELOAD_SIZE, workers)
    }
}

impl TreeForest {
    /// Builds a forest at `height` into an empty store namespace.
    ///
    /// Asset trees are built first on a bounded pool; the first failure
    /// cancels the remaining jobs. Account, liquidity and NFT leaves are then
    /// streamed in batches, each committed at `height` before the next batch
    /// is read.
    pub fn bootstrap(
        store: Arc<dyn TreeStore>,
        config: ForestConfig,
        source: Arc<dyn LeafSource>,
        height: Version,
        opts: &BootstrapConfig,
    ) -> StateResult<Self> {
        let mut forest = Self::open(store, config, height)?;
        if forest.account_count()? != 0 || forest.state_root()? != empty_state_root(&forest)? {
            return Err(StateError::TreeNotEmpty(forest.config.name.clone()));
        }

        let count = source.account_count(height)?;
        info!(height, accounts = count, workers = opts.workers, "bootstrapping tree forest");
        let asset_roots = build_asset_trees(&forest, source.clone(), height, count, opts.workers)?;

        forest.set_account_count(count);
        stream_batches(opts.batch_size, |offset, limit| {
            let batch = source.accounts(height, offset, limit)?;
            for (index, mut leaf) in batch.iter().cloned() {
                leaf.asset_root = *asset_roots
                    .get(index as usize)
                    .ok_or(StateError::AccountIndexGap { index, next: count })?;
                forest.set_account(index, &leaf)?;
            }
            forest.commit(height)?;
            Ok(batch.len())
        })?;

        stream_batches(opts.batch_size, |offset, limit| {
            let batch = source.liquidity(height, offset, limit)?;
            for (index, leaf) in &batch {
                forest.set_liquidity(*index, leaf)?;
            }
            forest.commit(height)?;
            Ok(batch.len())
        })?;

        stream_batches(opts.batch_size, |offset, limit| {
            let batch = source.nfts(height, offset, limit)?;
            for (index, leaf) in &batch {
                forest.set_nft(*index, leaf)?;
            }
            forest.commit(height)?;
            Ok(batch.len())
        })?;

        let root = forest.commit(height)?;
        info!(height, %root, "bootstrapped tree forest");
        Ok(forest)
    }
}

fn empty_state_root(forest: &TreeForest) -> StateResult<Buf32> {
    Ok(compute_state_root(
        &forest.nils.account.root(),
        &forest.nils.liquidity.root(),
        &forest.nils.nft.root(),
    ))
}

/// Calls `step(offset, limit)` until it reports a short batch.
fn stream_batches(
    batch_size: usize,
    mut step: impl FnMut(u64, usize) -> StateResult<usize>,
) -> StateResult<()> {
    let mut offset = 0u64;
    loop {
        let read = step(offset, batch_size)?;
        offset += read as u64;
        if read < batch_size {
            return Ok(());
        }
    }
}

/// Builds and commits every account's asset tree in parallel and returns
/// their roots indexed by account.
fn build_asset_trees(
    forest: &TreeForest,
    source: Arc<dyn LeafSource>,
    height: Version,
    count: u64,
    workers: usize,
) -> StateResult<Vec<Buf32>> {
    let pool = ThreadPool::new(workers.max(1));
    let (tx, rx) = mpsc::channel::<StateResult<(u64, Buf32)>>();
    let cancelled = Arc::new(AtomicBool::new(false));

    for index in 0..count {
        let tx = tx.clone();
        let source = source.clone();
        let store = forest.store.clone();
        let ns = forest.config.asset_namespace(index);
        let nil = forest.nils.asset.clone();
        let cancelled = cancelled.clone();
        pool.execute(move || {
            if cancelled.load(Ordering::Relaxed) {
                return;
            }
            let res = build_asset_tree(store, ns, nil, source.as_ref(), height, index)
                .map(|root| (index, root));
            if res.is_err() {
                cancelled.store(true, Ordering::Relaxed);
            }
            // receiver dropped after a failed job
            let _ = tx.send(res);
        });
    }
    drop(tx);

    let mut roots = vec![forest.nils.asset.root(); count as usize];
    let mut received = 0u64;
    for res in rx {
        match res {
            Ok((index, root)) => {
                roots[index as usize] = root;
                received += 1;
            }
            Err(err) => {
                cancelled.store(true, Ordering::Relaxed);
                error!(?err, "asset tree build failed, cancelling bootstrap");
                pool.join();
                return Err(err);
            }
        }
    }
    pool.join();

    if received != count {
        return Err(StateError::Bootstrap(format!(
            "{} of {count} asset tree jobs exited without a result",
            count - received
        )));
    }
    Ok(roots)
}

fn build_asset_tree(
    store: Arc<dyn TreeStore>,
    ns: Namespace,
    nil: Arc<NilHashes>,
    source: &dyn LeafSource,
    height: Version,
    account_index: u64,
) -> StateResult<Buf32> {
    let mut tree = SparseMerkleTree::open(store, ns, nil)?;
    if !tree.is_empty()? {
        return Err(StateError::TreeNotEmpty(tree.namespace().to_string()));
    }

    let assets = source.account_assets(height, account_index)?;
    if assets.is_empty() {
        return Ok(tree.root()?);
    }
    for (asset_id, leaf) in &assets {
        if *asset_id == LAST_ACCOUNT_ASSET_ID {
            return Err(StateError::SentinelIndex("asset id"));
        }
        let preimage = (!leaf.is_empty()).then_some(leaf);
        write_leaf(&mut tree, *asset_id, leaf.digest(), preimage)?;
    }
    tree.commit_with_version(height, None)?;
    trace!(account_index, assets = assets.len(), "built asset tree");
    Ok(tree.root()?)
}
