//! Protocol-wide constants: tree shapes, witness slot counts and pubdata
//! chunking.

/// Height of the account tree.
pub const ACCOUNT_TREE_HEIGHT: u8 = 32;

/// Height of every per-account asset tree.
pub const ASSET_TREE_HEIGHT: u8 = 16;

/// Height of the liquidity pool tree.
pub const LIQUIDITY_TREE_HEIGHT: u8 = 16;

/// Height of the NFT tree.
pub const NFT_TREE_HEIGHT: u8 = 40;

/// Sentinel account index used for padded witness slots.
pub const LAST_ACCOUNT_INDEX: u64 = (1 << ACCOUNT_TREE_HEIGHT) - 1;

/// Sentinel asset id used for padded asset slots.
pub const LAST_ACCOUNT_ASSET_ID: u64 = (1 << ASSET_TREE_HEIGHT) - 1;

/// Sentinel pair index used when a transaction touches no pool.
pub const LAST_PAIR_INDEX: u64 = (1 << LIQUIDITY_TREE_HEIGHT) - 1;

/// Sentinel NFT index used when a transaction touches no NFT.
pub const LAST_NFT_INDEX: u64 = (1 << NFT_TREE_HEIGHT) - 1;

/// Number of account slots every transaction witness carries.
pub const NB_ACCOUNTS_PER_TX: usize = 5;

/// Number of asset slots carried for each account slot.
pub const NB_ACCOUNT_ASSETS_PER_ACCOUNT: usize = 4;

/// Width of one pubdata chunk in bytes.
pub const CHUNK_BYTES: usize = 32;

/// Number of chunks each transaction occupies in block pubdata.
pub const CHUNKS_PER_TX: usize = 6;

/// Fixed per-transaction pubdata width in bytes.
pub const PUBDATA_BYTES_PER_TX: usize = CHUNK_BYTES * CHUNKS_PER_TX;

/// Fixed per-transaction pubdata width in bits.
pub const PUBDATA_BITS_PER_TX: usize = PUBDATA_BYTES_PER_TX * 8;

/// Number of offer bits tracked per asset slot.
pub const OFFER_BITS_PER_ASSET: u64 = 128;
