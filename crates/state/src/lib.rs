//! The state forest: typed leaves and their digests, the versioned forest of
//! account, asset, liquidity and NFT trees, bootstrap from a leaf source and
//! the block commitment.

mod bootstrap;
mod commitment;
mod errors;
mod forest;
mod leaf;
mod snapshot;

pub use bootstrap::{BootstrapConfig, LeafSource, DEFAULT_BATCH_RELOAD_SIZE};
pub use commitment::{block_commitment, BlockCommitmentInput};
pub use errors::{StateError, StateResult};
pub use forest::{ForestConfig, TreeForest, DEFAULT_FOREST_NAME};
pub use leaf::{
    compute_state_root, AccountLeaf, AssetLeaf, EmptyDigests, LiquidityLeaf, NftLeaf,
};
pub use snapshot::{AccountRecord, AssetRecord, LeafSnapshot, LiquidityRecord, NftRecord};
