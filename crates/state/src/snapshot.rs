//! A serializable leaf snapshot, usable as a [`LeafSource`].
//!
//! Big integers are decimal strings and byte fields are hex strings, the
//! way leaves are exported from the relational store.

use serde::{Deserialize, Serialize};
use zkl2_db_types::Version;
use zkl2_primitives::Buf32;

use crate::{
    bootstrap::LeafSource,
    errors::{StateError, StateResult},
    leaf::{AccountLeaf, AssetLeaf, LiquidityLeaf, NftLeaf},
};

fn zero() -> String {
    "0".to_owned()
}

fn decode_hex(field: &'static str, s: &str) -> StateResult<Vec<u8>> {
    let raw = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(raw).map_err(|e| StateError::Source(format!("{field}: {e}")))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub asset_id: u64,
    pub balance: String,
    #[serde(default = "zero")]
    pub lp_amount: String,
    #[serde(default = "zero")]
    pub offer_canceled_or_finalized: String,
}

impl AssetRecord {
    /// A plain balance entry without liquidity shares or offers.
    pub fn balance(asset_id: u64, balance: &str) -> Self {
        Self {
            asset_id,
            balance: balance.to_owned(),
            lp_amount: zero(),
            offer_canceled_or_finalized: zero(),
        }
    }

    pub fn to_leaf(&self) -> StateResult<AssetLeaf> {
        Ok(AssetLeaf::from_decimal(
            &self.balance,
            &self.lp_amount,
            &self.offer_canceled_or_finalized,
        )?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub index: u64,
    pub l1_address_hash: String,
    pub public_key: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub collection_nonce: u64,
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

impl AccountRecord {
    pub fn to_leaf(&self, asset_root: Buf32) -> StateResult<AccountLeaf> {
        Ok(AccountLeaf::from_raw(
            &decode_hex("l1_address_hash", &self.l1_address_hash)?,
            &decode_hex("public_key", &self.public_key)?,
            self.nonce,
            self.collection_nonce,
            asset_root,
        )?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityRecord {
    pub pair_index: u64,
    pub asset_a_id: u16,
    pub asset_a: String,
    pub asset_b_id: u16,
    pub asset_b: String,
    pub lp_amount: String,
    pub k_last: String,
    pub fee_rate: u16,
    pub treasury_account_index: u32,
    pub treasury_rate: u16,
}

impl LiquidityRecord {
    pub fn to_leaf(&self) -> StateResult<LiquidityLeaf> {
        Ok(LiquidityLeaf::from_decimal(
            self.asset_a_id,
            &self.asset_a,
            self.asset_b_id,
            &self.asset_b,
            &self.lp_amount,
            &self.k_last,
            self.fee_rate,
            self.treasury_account_index,
            self.treasury_rate,
        )?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftRecord {
    pub nft_index: u64,
    pub creator_account_index: u32,
    pub owner_account_index: u32,
    pub content_hash: String,
    pub l1_address: String,
    pub l1_token_id: String,
    #[serde(default)]
    pub creator_treasury_rate: u16,
    #[serde(default)]
    pub collection_id: u16,
}

impl NftRecord {
    pub fn to_leaf(&self) -> StateResult<NftLeaf> {
        Ok(NftLeaf::from_raw(
            self.creator_account_index,
            self.owner_account_index,
            &decode_hex("content_hash", &self.content_hash)?,
            &decode_hex("l1_address", &self.l1_address)?,
            &self.l1_token_id,
            self.creator_treasury_rate,
            self.collection_id,
        )?)
    }
}

/// Every non-empty leaf of a forest at one height.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafSnapshot {
    pub height: Version,
    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
    #[serde(default)]
    pub liquidity: Vec<LiquidityRecord>,
    #[serde(default)]
    pub nfts: Vec<NftRecord>,
}

impl LeafSnapshot {
    fn check_height(&self, height: Version) -> StateResult<()> {
        if height != self.height {
            return Err(StateError::Source(format!(
                "snapshot is at height {}, requested {height}",
                self.height
            )));
        }
        Ok(())
    }
}

fn page<T>(items: &[T], offset: u64, limit: usize) -> &[T] {
    let start = (offset as usize).min(items.len());
    let end = start.saturating_add(limit).min(items.len());
    &items[start..end]
}

impl LeafSource for LeafSnapshot {
    fn account_count(&self, height: Version) -> StateResult<u64> {
        self.check_height(height)?;
        Ok(self
            .accounts
            .iter()
            .map(|a| a.index + 1)
            .max()
            .unwrap_or(0))
    }

    fn accounts(
        &self,
        height: Version,
        offset: u64,
        limit: usize,
    ) -> StateResult<Vec<(u64, AccountLeaf)>> {
        self.check_height(height)?;
        page(&self.accounts, offset, limit)
            .iter()
            .map(|a| Ok((a.index, a.to_leaf(Buf32::zero())?)))
            .collect()
    }

    fn account_assets(
        &self,
        height: Version,
        account_index: u64,
    ) -> StateResult<Vec<(u64, AssetLeaf)>> {
        self.check_height(height)?;
        let Some(account) = self.accounts.iter().find(|a| a.index == account_index) else {
            return Ok(Vec::new());
        };
        account
            .assets
            .iter()
            .map(|a| Ok((a.asset_id, a.to_leaf()?)))
            .collect()
    }

    fn liquidity(
        &self,
        height: Version,
        offset: u64,
        limit: usize,
    ) -> StateResult<Vec<(u64, LiquidityLeaf)>> {
        self.check_height(height)?;
        page(&self.liquidity, offset, limit)
            .iter()
            .map(|l| Ok((l.pair_index, l.to_leaf()?)))
            .collect()
    }

    fn nfts(&self, height: Version, offset: u64, limit: usize) -> StateResult<Vec<(u64, NftLeaf)>> {
        self.check_height(height)?;
        page(&self.nfts, offset, limit)
            .iter()
            .map(|n| Ok((n.nft_index, n.to_leaf()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "height": 3,
            "accounts": [{
                "index": 0,
                "l1_address_hash": "0x0101010101010101010101010101010101010101010101010101010101010101",
                "public_key": "0202020202020202020202020202020202020202020202020202020202020202",
                "assets": [{"asset_id": 1, "balance": "42"}]
            }],
            "nfts": [{
                "nft_index": 9,
                "creator_account_index": 0,
                "owner_account_index": 0,
                "content_hash": "0303030303030303030303030303030303030303030303030303030303030303",
                "l1_address": "0x1111111111111111111111111111111111111111",
                "l1_token_id": "77"
            }]
        }"#;
        let snap: LeafSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.account_count(3).unwrap(), 1);
        let assets = snap.account_assets(3, 0).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].1.balance, alloy_primitives::U256::from(42));
        let nfts = snap.nfts(3, 0, 10).unwrap();
        assert_eq!(nfts[0].0, 9);
    }

    #[test]
    fn test_wrong_height_rejected() {
        let snap = LeafSnapshot {
            height: 3,
            ..Default::default()
        };
        assert!(matches!(snap.account_count(4), Err(StateError::Source(_))));
    }

    #[test]
    fn test_pages() {
        let items = [1, 2, 3, 4, 5];
        assert_eq!(page(&items, 0, 2), &[1, 2]);
        assert_eq!(page(&items, 4, 2), &[5]);
        assert!(page(&items, 9, 2).is_empty());
    }

    #[test]
    fn test_bad_hex_is_source_error() {
        let rec = AccountRecord {
            index: 0,
            l1_address_hash: "zz".into(),
            public_key: String::new(),
            nonce: 0,
            collection_nonce: 0,
            assets: Vec::new(),
        };
        assert!(matches!(
            rec.to_leaf(Buf32::zero()),
            Err(StateError::Source(_))
        ));
    }
}
