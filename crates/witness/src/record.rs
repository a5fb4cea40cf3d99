//! Decided effects of one transaction, as consumed by the witness builder.
//!
//! A record carries deltas only. Whether they are allowed (balances,
//! signatures, pool math) has already been decided upstream.

use alloy_primitives::{I256, U256};
use serde::{Deserialize, Serialize};
use zkl2_primitives::{field::parse_decimal, Buf32, CodecError, CodecResult};
use zkl2_pubdata::{TxPubData, TxType};
use zkl2_state::NftLeaf;

fn parse_signed(s: &str) -> CodecResult<I256> {
    I256::from_dec_str(s).map_err(|_| CodecError::MalformedNumber(s.to_owned()))
}

/// Signed change to one account asset leaf.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDelta {
    pub balance: I256,
    pub lp_amount: I256,
    /// Replaces the offer bitmask when set; otherwise the old value is kept.
    pub offer_canceled_or_finalized: Option<U256>,
}

impl AssetDelta {
    pub fn balance(delta: I256) -> Self {
        Self {
            balance: delta,
            ..Default::default()
        }
    }

    pub fn lp_amount(delta: I256) -> Self {
        Self {
            lp_amount: delta,
            ..Default::default()
        }
    }

    pub fn offer_bits(bits: U256) -> Self {
        Self {
            offer_canceled_or_finalized: Some(bits),
            ..Default::default()
        }
    }

    /// Parses signed decimal deltas.
    pub fn from_decimal(balance: &str, lp_amount: &str, offer: Option<&str>) -> CodecResult<Self> {
        Ok(Self {
            balance: parse_signed(balance)?,
            lp_amount: parse_signed(lp_amount)?,
            offer_canceled_or_finalized: offer.map(parse_decimal).transpose()?,
        })
    }
}

/// Change to a liquidity pool leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityDelta {
    /// Writes the metadata of a new pair with empty reserves.
    Create {
        asset_a_id: u16,
        asset_b_id: u16,
        fee_rate: u16,
        treasury_account_index: u32,
        treasury_rate: u16,
    },
    /// Replaces the fee settings, keeping reserves.
    Rates {
        fee_rate: u16,
        treasury_account_index: u32,
        treasury_rate: u16,
    },
    /// Adds signed amounts to the reserves and optionally sets `k_last`.
    Reserves {
        asset_a: I256,
        asset_b: I256,
        lp_amount: I256,
        k_last: Option<U256>,
    },
}

/// One leaf touched by a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxDetail {
    Asset {
        account_index: u64,
        asset_id: u64,
        delta: AssetDelta,
    },
    /// Touches an account without changing any of its assets.
    Account { account_index: u64 },
    Liquidity {
        pair_index: u64,
        delta: LiquidityDelta,
    },
    /// Replaces the NFT leaf. An empty leaf clears the slot.
    Nft { nft_index: u64, leaf: NftLeaf },
}

impl TxDetail {
    pub fn account_index(&self) -> Option<u64> {
        match self {
            Self::Asset { account_index, .. } | Self::Account { account_index } => {
                Some(*account_index)
            }
            Self::Liquidity { .. } | Self::Nft { .. } => None,
        }
    }
}

/// Fills a fresh account slot. Its before leaf is the empty account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub account_index: u64,
    pub l1_address_hash: Buf32,
    pub public_key: Buf32,
}

/// A transaction's pubdata together with its decided leaf effects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    pub pubdata: TxPubData,
    pub registration: Option<Registration>,
    pub details: Vec<TxDetail>,
}

impl TxRecord {
    pub fn new(pubdata: TxPubData) -> Self {
        Self {
            pubdata,
            registration: None,
            details: Vec::new(),
        }
    }

    /// The padding transaction.
    pub fn empty() -> Self {
        Self::new(TxPubData::Empty)
    }

    pub fn with_registration(mut self, registration: Registration) -> Self {
        self.registration = Some(registration);
        self
    }

    pub fn with_detail(mut self, detail: TxDetail) -> Self {
        self.details.push(detail);
        self
    }

    pub fn push(&mut self, detail: TxDetail) {
        self.details.push(detail);
    }

    pub fn tx_type(&self) -> TxType {
        self.pubdata.tx_type()
    }

    /// Account whose nonce the transaction consumes.
    pub fn signer(&self) -> Option<u64> {
        self.pubdata.signer_account_index().map(u64::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_deltas() {
        let delta = AssetDelta::from_decimal("-150", "0", Some("3")).unwrap();
        assert_eq!(delta.balance, I256::try_from(-150i64).unwrap());
        assert_eq!(delta.offer_canceled_or_finalized, Some(U256::from(3)));
        assert!(matches!(
            AssetDelta::from_decimal("1.5", "0", None),
            Err(CodecError::MalformedNumber(_))
        ));
    }

    #[test]
    fn test_detail_accounts() {
        let asset = TxDetail::Asset {
            account_index: 4,
            asset_id: 0,
            delta: AssetDelta::default(),
        };
        assert_eq!(asset.account_index(), Some(4));
        let nft = TxDetail::Nft {
            nft_index: 1,
            leaf: NftLeaf::default(),
        };
        assert_eq!(nft.account_index(), None);
    }

    #[test]
    fn test_empty_record_has_no_signer() {
        let record = TxRecord::empty();
        assert_eq!(record.tx_type(), TxType::Empty);
        assert_eq!(record.signer(), None);
    }
}
