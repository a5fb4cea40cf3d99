//! Fixed-shape witness bundles handed to the prover.

use serde::{Deserialize, Serialize};
use zkl2_primitives::Buf32;
use zkl2_pubdata::TxPubData;
use zkl2_smt::MerkleProof;
use zkl2_state::{AccountLeaf, AssetLeaf, LiquidityLeaf, NftLeaf};

/// Roots of the forest at one instant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestRoots {
    pub account: Buf32,
    pub liquidity: Buf32,
    pub nft: Buf32,
    pub state: Buf32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetWitness {
    pub asset_id: u64,
    pub before: AssetLeaf,
    pub after: AssetLeaf,
    /// Proof of `before` against the account's asset root before the tx.
    pub proof: MerkleProof,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountWitness {
    pub account_index: u64,
    pub before: AccountLeaf,
    pub after: AccountLeaf,
    /// Proof of `before` against the account root before the tx.
    pub proof: MerkleProof,
    /// Always [`NB_ACCOUNT_ASSETS_PER_ACCOUNT`] entries.
    ///
    /// [`NB_ACCOUNT_ASSETS_PER_ACCOUNT`]: zkl2_primitives::constants::NB_ACCOUNT_ASSETS_PER_ACCOUNT
    pub assets: Vec<AssetWitness>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityWitness {
    pub pair_index: u64,
    pub before: LiquidityLeaf,
    pub after: LiquidityLeaf,
    pub proof: MerkleProof,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftWitness {
    pub nft_index: u64,
    pub before: NftLeaf,
    pub after: NftLeaf,
    pub proof: MerkleProof,
}

/// Everything the transaction circuit needs for one tx.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxWitness {
    pub pubdata: TxPubData,
    pub roots_before: ForestRoots,
    pub roots_after: ForestRoots,
    /// Always [`NB_ACCOUNTS_PER_TX`] entries; unused slots sit at the
    /// sentinel account index.
    ///
    /// [`NB_ACCOUNTS_PER_TX`]: zkl2_primitives::constants::NB_ACCOUNTS_PER_TX
    pub accounts: Vec<AccountWitness>,
    pub liquidity: LiquidityWitness,
    pub nft: NftWitness,
}

impl TxWitness {
    pub fn state_root_before(&self) -> Buf32 {
        self.roots_before.state
    }

    pub fn state_root_after(&self) -> Buf32 {
        self.roots_after.state
    }
}

/// A padded block of transaction witnesses and its on-chain commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockWitness {
    pub height: u64,
    pub created_at: u64,
    pub old_state_root: Buf32,
    pub new_state_root: Buf32,
    #[serde(with = "hex::serde")]
    pub pubdata: Vec<u8>,
    pub on_chain_ops_count: u64,
    pub commitment: Buf32,
    pub txs: Vec<TxWitness>,
}
