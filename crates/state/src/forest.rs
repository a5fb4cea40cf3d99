use std::{fmt, sync::Arc};

use tracing::*;
use zkl2_db_types::{Namespace, TreeStore, Version};
use zkl2_primitives::{
    constants::{
        ACCOUNT_TREE_HEIGHT, ASSET_TREE_HEIGHT, LAST_ACCOUNT_ASSET_ID, LAST_ACCOUNT_INDEX,
        LAST_NFT_INDEX, LAST_PAIR_INDEX, LIQUIDITY_TREE_HEIGHT, NFT_TREE_HEIGHT,
    },
    Buf32,
};
use zkl2_smt::{MerkleProof, NilHashes, SparseMerkleTree};

use crate::{
    errors::{StateError, StateResult},
    leaf::{compute_state_root, AccountLeaf, AssetLeaf, EmptyDigests, LiquidityLeaf, NftLeaf},
};

/// Aux entry in the account tree holding the number of account slots in use.
const ACCOUNT_COUNT_KEY: &str = "account_count";

/// Default namespace name for a forest.
pub const DEFAULT_FOREST_NAME: &str = "zkl2";

/// Construction-time options of a [`TreeForest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForestConfig {
    /// Namespace name shared by every tree of the forest.
    pub name: String,

    /// Number of versions kept below the latest one. `None` keeps every
    /// version; `Some(0)` keeps none, so rollback is impossible.
    pub retain_versions: Option<u64>,
}

impl ForestConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            retain_versions: None,
        }
    }

    pub fn with_retain_versions(mut self, retain: Option<u64>) -> Self {
        self.retain_versions = retain;
        self
    }

    fn namespace(&self, tree: impl Into<String>) -> Namespace {
        Namespace::new(self.name.clone(), tree)
    }

    pub(crate) fn asset_namespace(&self, account_index: u64) -> Namespace {
        self.namespace(format!("asset:{account_index}"))
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FOREST_NAME)
    }
}

/// Nil digests for every tree shape in the forest.
#[derive(Clone, Debug)]
pub(crate) struct ForestNils {
    pub(crate) account: Arc<NilHashes>,
    pub(crate) asset: Arc<NilHashes>,
    pub(crate) liquidity: Arc<NilHashes>,
    pub(crate) nft: Arc<NilHashes>,
}

impl ForestNils {
    fn new() -> Self {
        let empty = EmptyDigests::new();
        let asset = Arc::new(NilHashes::new(ASSET_TREE_HEIGHT, empty.asset));
        let account = Arc::new(NilHashes::new(
            ACCOUNT_TREE_HEIGHT,
            empty.account(asset.root()),
        ));
        Self {
            account,
            asset,
            liquidity: Arc::new(NilHashes::new(LIQUIDITY_TREE_HEIGHT, empty.liquidity)),
            nft: Arc::new(NilHashes::new(NFT_TREE_HEIGHT, empty.nft)),
        }
    }
}

/// The account tree, one asset tree per account, the liquidity tree and the
/// NFT tree, all versioned by block height.
///
/// Asset trees are opened lazily on first access and cached in an arena
/// indexed by account index. Reads see uncommitted writes; [`commit`] makes
/// them durable at a block height.
///
/// [`commit`]: TreeForest::commit
pub struct TreeForest {
    pub(crate) store: Arc<dyn TreeStore>,
    pub(crate) config: ForestConfig,
    pub(crate) nils: ForestNils,
    height: Version,
    account_tree: SparseMerkleTree,
    liquidity_tree: SparseMerkleTree,
    nft_tree: SparseMerkleTree,
    asset_trees: Vec<Option<SparseMerkleTree>>,
}

impl fmt::Debug for TreeForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeForest")
            .field("name", &self.config.name)
            .field("height", &self.height)
            .field(
                "open_asset_trees",
                &self.asset_trees.iter().filter(|t| t.is_some()).count(),
            )
            .finish()
    }
}

impl TreeForest {
    /// Opens the forest at block `height`.
    ///
    /// Trees whose latest version is above `height` are rolled back to it
    /// before any write. On stores without history every tree is stamped
    /// with `height` instead.
    pub fn open(
        store: Arc<dyn TreeStore>,
        config: ForestConfig,
        height: Version,
    ) -> StateResult<Self> {
        let nils = ForestNils::new();
        let persists = store.persists_history();

        let mut account_tree = SparseMerkleTree::open(
            store.clone(),
            config.namespace("account"),
            nils.account.clone(),
        )?;
        let mut liquidity_tree = SparseMerkleTree::open(
            store.clone(),
            config.namespace("liquidity"),
            nils.liquidity.clone(),
        )?;
        let mut nft_tree =
            SparseMerkleTree::open(store.clone(), config.namespace("nft"), nils.nft.clone())?;
        for tree in [&mut account_tree, &mut liquidity_tree, &mut nft_tree] {
            reload_tree(tree, height, persists)?;
        }

        let forest = Self {
            store,
            config,
            nils,
            height,
            account_tree,
            liquidity_tree,
            nft_tree,
            asset_trees: Vec::new(),
        };
        info!(
            name = %forest.config.name,
            height,
            accounts = forest.account_count()?,
            "opened tree forest"
        );
        Ok(forest)
    }

    /// Block height of the last commit, or the height the forest was opened
    /// at.
    pub fn height(&self) -> Version {
        self.height
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    /// Number of account slots in use; account indices below it are
    /// registered.
    pub fn account_count(&self) -> StateResult<u64> {
        match self.account_tree.aux(ACCOUNT_COUNT_KEY)? {
            Some(raw) => {
                let bytes: [u8; 8] = raw.as_slice().try_into().map_err(|_| {
                    StateError::CorruptLeaf {
                        tree: self.account_tree.namespace().to_string(),
                        index: 0,
                        reason: format!("account count has {} bytes", raw.len()),
                    }
                })?;
                Ok(u64::from_be_bytes(bytes))
            }
            None => Ok(0),
        }
    }

    pub fn nil_asset_root(&self) -> Buf32 {
        self.nils.asset.root()
    }

    pub fn empty_account_leaf(&self) -> AccountLeaf {
        AccountLeaf::empty(self.nil_asset_root())
    }

    pub fn account_root(&self) -> StateResult<Buf32> {
        Ok(self.account_tree.root()?)
    }

    pub fn liquidity_root(&self) -> StateResult<Buf32> {
        Ok(self.liquidity_tree.root()?)
    }

    pub fn nft_root(&self) -> StateResult<Buf32> {
        Ok(self.nft_tree.root()?)
    }

    /// `H(accountRoot, liquidityRoot, nftRoot)`, including uncommitted
    /// writes.
    pub fn state_root(&self) -> StateResult<Buf32> {
        Ok(compute_state_root(
            &self.account_root()?,
            &self.liquidity_root()?,
            &self.nft_root()?,
        ))
    }

    /// State root committed at `height`, read from tree history.
    pub fn state_root_at(&self, height: Version) -> StateResult<Buf32> {
        Ok(compute_state_root(
            &root_at(&self.account_tree, height)?,
            &root_at(&self.liquidity_tree, height)?,
            &root_at(&self.nft_tree, height)?,
        ))
    }

    pub fn has_pending(&self) -> bool {
        self.account_tree.has_pending()
            || self.liquidity_tree.has_pending()
            || self.nft_tree.has_pending()
            || self.asset_trees.iter().flatten().any(|t| t.has_pending())
    }

    /// Registered account leaf at `index`, or `None` if the slot is empty.
    pub fn account(&self, index: u64) -> StateResult<Option<AccountLeaf>> {
        read_preimage(&self.account_tree, index)
    }

    pub fn account_proof(&self, index: u64) -> StateResult<MerkleProof> {
        Ok(self.account_tree.get_proof(index)?)
    }

    /// Writes an account leaf and extends the registered range if needed.
    pub fn set_account(&mut self, index: u64, leaf: &AccountLeaf) -> StateResult<()> {
        if index == LAST_ACCOUNT_INDEX {
            return Err(StateError::SentinelIndex("account index"));
        }
        let count = self.account_count()?;
        if index > count {
            return Err(StateError::AccountIndexGap { index, next: count });
        }
        write_leaf(&mut self.account_tree, index, leaf.digest(), Some(leaf))?;
        if index == count {
            self.account_tree
                .set_aux(ACCOUNT_COUNT_KEY, Some((count + 1).to_be_bytes().to_vec()));
        }
        Ok(())
    }

    /// Prepares the asset tree of a newly registered account. Fails if the
    /// namespace already holds leaves.
    pub fn create_asset_tree(&mut self, account_index: u64) -> StateResult<Buf32> {
        let tree = self.asset_tree(account_index)?;
        if !tree.is_empty()? {
            return Err(StateError::TreeNotEmpty(tree.namespace().to_string()));
        }
        Ok(tree.root()?)
    }

    pub fn asset(&mut self, account_index: u64, asset_id: u64) -> StateResult<AssetLeaf> {
        let tree = self.asset_tree(account_index)?;
        Ok(read_preimage(tree, asset_id)?.unwrap_or_default())
    }

    pub fn asset_proof(&mut self, account_index: u64, asset_id: u64) -> StateResult<MerkleProof> {
        Ok(self.asset_tree(account_index)?.get_proof(asset_id)?)
    }

    pub fn asset_root(&mut self, account_index: u64) -> StateResult<Buf32> {
        Ok(self.asset_tree(account_index)?.root()?)
    }

    /// Proof for `asset_id` in an empty asset tree, used for slots of
    /// accounts that do not exist.
    pub fn nil_asset_proof(&self, asset_id: u64) -> MerkleProof {
        let siblings = (1..=ASSET_TREE_HEIGHT)
            .rev()
            .map(|depth| self.nils.asset.at(depth))
            .collect();
        MerkleProof::new(asset_id, siblings)
    }

    pub fn set_asset(
        &mut self,
        account_index: u64,
        asset_id: u64,
        leaf: &AssetLeaf,
    ) -> StateResult<()> {
        if asset_id == LAST_ACCOUNT_ASSET_ID {
            return Err(StateError::SentinelIndex("asset id"));
        }
        let preimage = (!leaf.is_empty()).then_some(leaf);
        let tree = self.asset_tree(account_index)?;
        write_leaf(tree, asset_id, leaf.digest(), preimage)
    }

    pub fn liquidity(&self, pair_index: u64) -> StateResult<LiquidityLeaf> {
        Ok(read_preimage(&self.liquidity_tree, pair_index)?.unwrap_or_default())
    }

    pub fn liquidity_proof(&self, pair_index: u64) -> StateResult<MerkleProof> {
        Ok(self.liquidity_tree.get_proof(pair_index)?)
    }

    pub fn set_liquidity(&mut self, pair_index: u64, leaf: &LiquidityLeaf) -> StateResult<()> {
        if pair_index == LAST_PAIR_INDEX {
            return Err(StateError::SentinelIndex("pair index"));
        }
        write_leaf(&mut self.liquidity_tree, pair_index, leaf.digest(), Some(leaf))
    }

    pub fn nft(&self, nft_index: u64) -> StateResult<NftLeaf> {
        Ok(read_preimage(&self.nft_tree, nft_index)?.unwrap_or_default())
    }

    pub fn nft_proof(&self, nft_index: u64) -> StateResult<MerkleProof> {
        Ok(self.nft_tree.get_proof(nft_index)?)
    }

    pub fn set_nft(&mut self, nft_index: u64, leaf: &NftLeaf) -> StateResult<()> {
        if nft_index == LAST_NFT_INDEX {
            return Err(StateError::SentinelIndex("nft index"));
        }
        let preimage = (!leaf.is_empty()).then_some(leaf);
        write_leaf(&mut self.nft_tree, nft_index, leaf.digest(), preimage)
    }

    /// Commits every tree with pending writes at block `height` and returns
    /// the new state root.
    ///
    /// The top-level trees are always committed so their version tracks the
    /// block height. Asset trees without writes keep their older version.
    pub fn commit(&mut self, height: Version) -> StateResult<Buf32> {
        if height < self.height {
            return Err(StateError::HeightRegression {
                new: height,
                current: self.height,
            });
        }
        let prune_to = self
            .config
            .retain_versions
            .map(|retain| height.saturating_sub(retain));

        let mut asset_commits = 0usize;
        for tree in self.asset_trees.iter_mut().flatten() {
            if tree.has_pending() {
                tree.commit_with_version(height, prune_to)?;
                asset_commits += 1;
            }
        }
        self.account_tree.commit_with_version(height, prune_to)?;
        self.liquidity_tree.commit_with_version(height, prune_to)?;
        self.nft_tree.commit_with_version(height, prune_to)?;
        self.height = height;

        let root = self.state_root()?;
        info!(height, %root, asset_commits, "committed tree forest");
        Ok(root)
    }

    /// Rolls every tree back to block `height`, discarding pending writes.
    pub fn rollback(&mut self, height: Version) -> StateResult<()> {
        // Asset trees of accounts registered after `height` must be undone
        // too, so walk the range known before the rollback.
        let count = self.account_count()?;
        for tree in [
            &mut self.account_tree,
            &mut self.liquidity_tree,
            &mut self.nft_tree,
        ] {
            rollback_tree(tree, height)?;
        }

        self.asset_trees.clear();
        for index in 0..count {
            let mut tree = SparseMerkleTree::open(
                self.store.clone(),
                self.config.asset_namespace(index),
                self.nils.asset.clone(),
            )?;
            rollback_tree(&mut tree, height)?;
        }
        self.height = height;
        warn!(height, accounts = count, "rolled back tree forest");
        Ok(())
    }

    /// Drops uncommitted writes on every tree.
    pub fn discard_pending(&mut self) {
        self.account_tree.discard_pending();
        self.liquidity_tree.discard_pending();
        self.nft_tree.discard_pending();
        for tree in self.asset_trees.iter_mut().flatten() {
            tree.discard_pending();
        }
    }

    /// Persists buffered driver writes.
    pub fn flush(&self) -> StateResult<()> {
        Ok(self.store.flush()?)
    }

    /// Returns the asset tree of `account_index`, opening it on first use.
    fn asset_tree(&mut self, account_index: u64) -> StateResult<&mut SparseMerkleTree> {
        let count = self.account_count()?;
        if account_index > count || account_index >= LAST_ACCOUNT_INDEX {
            return Err(StateError::AccountNotRegistered(account_index));
        }
        let slot = account_index as usize;
        if self.asset_trees.len() <= slot {
            self.asset_trees.resize_with(slot + 1, || None);
        }
        if self.asset_trees[slot].is_none() {
            let tree = self.open_asset_tree(account_index)?;
            self.asset_trees[slot] = Some(tree);
        }
        self.asset_trees[slot]
            .as_mut()
            .ok_or(StateError::AccountNotRegistered(account_index))
    }

    pub(crate) fn open_asset_tree(&self, account_index: u64) -> StateResult<SparseMerkleTree> {
        let mut tree = SparseMerkleTree::open(
            self.store.clone(),
            self.config.asset_namespace(account_index),
            self.nils.asset.clone(),
        )?;
        reload_tree(&mut tree, self.height, self.store.persists_history())?;
        trace!(account_index, "opened asset tree");
        Ok(tree)
    }

    pub(crate) fn top_trees_mut(
        &mut self,
    ) -> (
        &mut SparseMerkleTree,
        &mut SparseMerkleTree,
        &mut SparseMerkleTree,
    ) {
        (
            &mut self.account_tree,
            &mut self.liquidity_tree,
            &mut self.nft_tree,
        )
    }

    pub(crate) fn set_height(&mut self, height: Version) {
        self.height = height;
    }

    pub(crate) fn set_account_count(&mut self, count: u64) {
        self.account_tree
            .set_aux(ACCOUNT_COUNT_KEY, Some(count.to_be_bytes().to_vec()));
    }
}

/// Applies the reload rule to a freshly opened tree. Version stamps stay in
/// memory until the tree is next committed.
fn reload_tree(tree: &mut SparseMerkleTree, height: Version, persists: bool) -> StateResult<()> {
    let latest = tree.latest_version();
    if latest > height {
        if !tree.is_empty()? || tree.has_history() {
            debug!(ns = %tree.namespace(), latest, height, "rolling tree back to reload height");
            tree.rollback(height)?;
        } else {
            tree.stamp_version(height)?;
        }
    } else if latest < height && !persists && !tree.has_history() {
        tree.stamp_version(height)?;
    }
    Ok(())
}

fn rollback_tree(tree: &mut SparseMerkleTree, height: Version) -> StateResult<()> {
    if tree.latest_version() > height {
        tree.rollback(height)?;
    } else {
        tree.discard_pending();
    }
    Ok(())
}

fn root_at(tree: &SparseMerkleTree, height: Version) -> StateResult<Buf32> {
    // A tree last committed below `height` is unchanged since.
    let version = height.min(tree.latest_version());
    Ok(tree.root_at(version)?)
}

fn read_preimage<T: borsh::BorshDeserialize>(
    tree: &SparseMerkleTree,
    index: u64,
) -> StateResult<Option<T>> {
    match tree.preimage(index)? {
        Some(raw) => borsh::from_slice(&raw)
            .map(Some)
            .map_err(|e| StateError::CorruptLeaf {
                tree: tree.namespace().to_string(),
                index,
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

pub(crate) fn write_leaf<T: borsh::BorshSerialize>(
    tree: &mut SparseMerkleTree,
    index: u64,
    digest: Buf32,
    preimage: Option<&T>,
) -> StateResult<()> {
    let raw = preimage
        .map(borsh::to_vec)
        .transpose()
        .map_err(|e| StateError::CorruptLeaf {
            tree: tree.namespace().to_string(),
            index,
            reason: e.to_string(),
        })?;
    tree.set_with_preimage(index, digest, raw)?;
    Ok(())
}
