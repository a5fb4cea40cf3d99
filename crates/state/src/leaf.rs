//! Typed leaves of the forest and their canonical digests.
//!
//! Every leaf hashes as a fixed sequence of 32-byte field blocks in the order
//! its fields are declared. Numeric fields are reduced modulo the BN254 scalar
//! field; byte fields are left-padded.

use std::io;

use alloy_primitives::{Address, U256};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use zkl2_primitives::{
    field::{pad_block, parse_decimal, reduce_to_block, u64_to_block},
    mimc::hash_blocks,
    Buf32, CodecResult,
};

/// Borsh helpers for types from `alloy-primitives`, which does not derive
/// borsh itself.
mod borsh_ext {
    use super::*;

    pub(super) fn serialize_u256<W: io::Write>(value: &U256, writer: &mut W) -> io::Result<()> {
        writer.write_all(&value.to_be_bytes::<32>())
    }

    pub(super) fn deserialize_u256<R: io::Read>(reader: &mut R) -> io::Result<U256> {
        let mut buf = [0u8; 32];
        reader.read_exact(&mut buf)?;
        Ok(U256::from_be_bytes(buf))
    }

    pub(super) fn serialize_address<W: io::Write>(
        value: &Address,
        writer: &mut W,
    ) -> io::Result<()> {
        writer.write_all(value.as_slice())
    }

    pub(super) fn deserialize_address<R: io::Read>(reader: &mut R) -> io::Result<Address> {
        let mut buf = [0u8; 20];
        reader.read_exact(&mut buf)?;
        Ok(Address::from(buf))
    }
}

const ADDRESS_LEN: usize = 20;

/// Canonical field block for an unsigned big integer.
fn u256_block(value: &U256) -> [u8; 32] {
    reduce_to_block(*value)
}

/// Account leaf. The account index is the leaf position, not part of the
/// pre-image.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct AccountLeaf {
    pub l1_address_hash: Buf32,
    pub public_key: Buf32,
    pub nonce: u64,
    pub collection_nonce: u64,
    pub asset_root: Buf32,
}

impl AccountLeaf {
    /// The canonical leaf of a never-registered account.
    pub fn empty(nil_asset_root: Buf32) -> Self {
        Self {
            asset_root: nil_asset_root,
            ..Default::default()
        }
    }

    pub fn new(l1_address_hash: Buf32, public_key: Buf32, asset_root: Buf32) -> Self {
        Self {
            l1_address_hash,
            public_key,
            nonce: 0,
            collection_nonce: 0,
            asset_root,
        }
    }

    /// Builds a leaf from raw hash and key bytes, each of which must be
    /// exactly 32 bytes long.
    pub fn from_raw(
        l1_address_hash: &[u8],
        public_key: &[u8],
        nonce: u64,
        collection_nonce: u64,
        asset_root: Buf32,
    ) -> CodecResult<Self> {
        Ok(Self {
            l1_address_hash: Buf32::try_from_slice("l1_address_hash", l1_address_hash)?,
            public_key: Buf32::try_from_slice("public_key", public_key)?,
            nonce,
            collection_nonce,
            asset_root,
        })
    }

    pub fn digest(&self) -> Buf32 {
        hash_blocks(&[
            self.l1_address_hash.into_inner(),
            self.public_key.into_inner(),
            u64_to_block(self.nonce),
            u64_to_block(self.collection_nonce),
            self.asset_root.into_inner(),
        ])
    }
}

/// Balance entry in an account's asset tree. The asset id is the leaf
/// position.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct AssetLeaf {
    #[borsh(
        serialize_with = "borsh_ext::serialize_u256",
        deserialize_with = "borsh_ext::deserialize_u256"
    )]
    pub balance: U256,
    #[borsh(
        serialize_with = "borsh_ext::serialize_u256",
        deserialize_with = "borsh_ext::deserialize_u256"
    )]
    pub lp_amount: U256,
    /// One bit per offer id in this asset's 128-offer window.
    #[borsh(
        serialize_with = "borsh_ext::serialize_u256",
        deserialize_with = "borsh_ext::deserialize_u256"
    )]
    pub offer_canceled_or_finalized: U256,
}

impl AssetLeaf {
    pub fn new(balance: U256, lp_amount: U256, offer_canceled_or_finalized: U256) -> Self {
        Self {
            balance,
            lp_amount,
            offer_canceled_or_finalized,
        }
    }

    /// Parses a leaf from decimal strings.
    pub fn from_decimal(
        balance: &str,
        lp_amount: &str,
        offer_canceled_or_finalized: &str,
    ) -> CodecResult<Self> {
        Ok(Self {
            balance: parse_decimal(balance)?,
            lp_amount: parse_decimal(lp_amount)?,
            offer_canceled_or_finalized: parse_decimal(offer_canceled_or_finalized)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn digest(&self) -> Buf32 {
        hash_blocks(&[
            u256_block(&self.balance),
            u256_block(&self.lp_amount),
            u256_block(&self.offer_canceled_or_finalized),
        ])
    }
}

/// Liquidity pool leaf. The pair index is the leaf position.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct LiquidityLeaf {
    pub asset_a_id: u16,
    #[borsh(
        serialize_with = "borsh_ext::serialize_u256",
        deserialize_with = "borsh_ext::deserialize_u256"
    )]
    pub asset_a: U256,
    pub asset_b_id: u16,
    #[borsh(
        serialize_with = "borsh_ext::serialize_u256",
        deserialize_with = "borsh_ext::deserialize_u256"
    )]
    pub asset_b: U256,
    #[borsh(
        serialize_with = "borsh_ext::serialize_u256",
        deserialize_with = "borsh_ext::deserialize_u256"
    )]
    pub lp_amount: U256,
    #[borsh(
        serialize_with = "borsh_ext::serialize_u256",
        deserialize_with = "borsh_ext::deserialize_u256"
    )]
    pub k_last: U256,
    pub fee_rate: u16,
    pub treasury_account_index: u32,
    pub treasury_rate: u16,
}

impl LiquidityLeaf {
    /// Pool metadata without reserves, as written when a pair is created.
    pub fn with_rates(
        asset_a_id: u16,
        asset_b_id: u16,
        fee_rate: u16,
        treasury_account_index: u32,
        treasury_rate: u16,
    ) -> Self {
        Self {
            asset_a_id,
            asset_b_id,
            fee_rate,
            treasury_account_index,
            treasury_rate,
            ..Default::default()
        }
    }

    /// Parses the pool amounts from decimal strings.
    #[expect(clippy::too_many_arguments, reason = "mirrors the leaf layout")]
    pub fn from_decimal(
        asset_a_id: u16,
        asset_a: &str,
        asset_b_id: u16,
        asset_b: &str,
        lp_amount: &str,
        k_last: &str,
        fee_rate: u16,
        treasury_account_index: u32,
        treasury_rate: u16,
    ) -> CodecResult<Self> {
        Ok(Self {
            asset_a_id,
            asset_a: parse_decimal(asset_a)?,
            asset_b_id,
            asset_b: parse_decimal(asset_b)?,
            lp_amount: parse_decimal(lp_amount)?,
            k_last: parse_decimal(k_last)?,
            fee_rate,
            treasury_account_index,
            treasury_rate,
        })
    }

    pub fn digest(&self) -> Buf32 {
        hash_blocks(&[
            u64_to_block(self.asset_a_id.into()),
            u256_block(&self.asset_a),
            u64_to_block(self.asset_b_id.into()),
            u256_block(&self.asset_b),
            u256_block(&self.lp_amount),
            u256_block(&self.k_last),
            u64_to_block(self.fee_rate.into()),
            u64_to_block(self.treasury_account_index.into()),
            u64_to_block(self.treasury_rate.into()),
        ])
    }
}

/// NFT leaf. The NFT index is the leaf position.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct NftLeaf {
    pub creator_account_index: u32,
    pub owner_account_index: u32,
    pub content_hash: Buf32,
    #[borsh(
        serialize_with = "borsh_ext::serialize_address",
        deserialize_with = "borsh_ext::deserialize_address"
    )]
    pub l1_address: Address,
    #[borsh(
        serialize_with = "borsh_ext::serialize_u256",
        deserialize_with = "borsh_ext::deserialize_u256"
    )]
    pub l1_token_id: U256,
    pub creator_treasury_rate: u16,
    pub collection_id: u16,
}

impl NftLeaf {
    /// Builds a leaf from raw byte fields and a decimal token id. The content
    /// hash must be 32 bytes and the L1 address 20 bytes.
    pub fn from_raw(
        creator_account_index: u32,
        owner_account_index: u32,
        content_hash: &[u8],
        l1_address: &[u8],
        l1_token_id: &str,
        creator_treasury_rate: u16,
        collection_id: u16,
    ) -> CodecResult<Self> {
        let addr_block = pad_block("l1_address", l1_address, ADDRESS_LEN)?;
        Ok(Self {
            creator_account_index,
            owner_account_index,
            content_hash: Buf32::try_from_slice("content_hash", content_hash)?,
            l1_address: Address::from_slice(&addr_block[32 - ADDRESS_LEN..]),
            l1_token_id: parse_decimal(l1_token_id)?,
            creator_treasury_rate,
            collection_id,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn digest(&self) -> Buf32 {
        let mut addr = [0u8; 32];
        addr[32 - ADDRESS_LEN..].copy_from_slice(self.l1_address.as_slice());
        hash_blocks(&[
            u64_to_block(self.creator_account_index.into()),
            u64_to_block(self.owner_account_index.into()),
            self.content_hash.into_inner(),
            addr,
            u256_block(&self.l1_token_id),
            u64_to_block(self.creator_treasury_rate.into()),
            u64_to_block(self.collection_id.into()),
        ])
    }
}

/// Digests of empty leaves for every tree in the forest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmptyDigests {
    pub asset: Buf32,
    pub liquidity: Buf32,
    pub nft: Buf32,
}

impl EmptyDigests {
    pub fn new() -> Self {
        Self {
            asset: AssetLeaf::default().digest(),
            liquidity: LiquidityLeaf::default().digest(),
            nft: NftLeaf::default().digest(),
        }
    }

    /// Empty account digest; depends on the nil asset-tree root.
    pub fn account(&self, nil_asset_root: Buf32) -> Buf32 {
        AccountLeaf::empty(nil_asset_root).digest()
    }
}

impl Default for EmptyDigests {
    fn default() -> Self {
        Self::new()
    }
}

/// Hashes the three top-level roots into the state root.
pub fn compute_state_root(account_root: &Buf32, liquidity_root: &Buf32, nft_root: &Buf32) -> Buf32 {
    hash_blocks(&[
        account_root.into_inner(),
        liquidity_root.into_inner(),
        nft_root.into_inner(),
    ])
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use zkl2_primitives::{field::FIELD_MODULUS, CodecError};

    use super::*;

    mod digests {
        use super::*;

        #[test]
        fn test_empty_leaves_hash_zero_blocks() {
            let empty = EmptyDigests::new();
            assert_eq!(empty.asset, hash_blocks(&[[0; 32]; 3]));
            assert_eq!(empty.liquidity, hash_blocks(&[[0; 32]; 9]));
            assert_eq!(empty.nft, hash_blocks(&[[0; 32]; 7]));
        }

        #[test]
        fn test_empty_account_carries_nil_asset_root() {
            let nil_root = Buf32::new([9; 32]);
            let expected = hash_blocks(&[[0; 32], [0; 32], [0; 32], [0; 32], [9; 32]]);
            assert_eq!(EmptyDigests::new().account(nil_root), expected);
        }

        #[test]
        fn test_balance_reduced_mod_r() {
            let wrapped = AssetLeaf::new(FIELD_MODULUS + U256::from(3), U256::ZERO, U256::ZERO);
            let plain = AssetLeaf::new(U256::from(3), U256::ZERO, U256::ZERO);
            assert_eq!(wrapped.digest(), plain.digest());
        }

        #[test]
        fn test_nft_address_is_left_padded() {
            let leaf = NftLeaf {
                l1_address: Address::repeat_byte(0x11),
                ..Default::default()
            };
            let mut addr = [0u8; 32];
            addr[12..].copy_from_slice(&[0x11; 20]);
            let expected = hash_blocks(&[[0; 32], [0; 32], [0; 32], addr, [0; 32], [0; 32], [0; 32]]);
            assert_eq!(leaf.digest(), expected);
        }
    }

    mod parsing {
        use super::*;

        #[test]
        fn test_asset_from_decimal() {
            let leaf = AssetLeaf::from_decimal("100", "0", "5").unwrap();
            assert_eq!(leaf.balance, U256::from(100));
            assert_eq!(leaf.offer_canceled_or_finalized, U256::from(5));
        }

        #[test]
        fn test_malformed_balance_rejected() {
            assert!(matches!(
                AssetLeaf::from_decimal("12x", "0", "0"),
                Err(CodecError::MalformedNumber(_))
            ));
            assert!(matches!(
                AssetLeaf::from_decimal("-1", "0", "0"),
                Err(CodecError::MalformedNumber(_))
            ));
        }

        #[test]
        fn test_nft_wrong_address_length_rejected() {
            let err = NftLeaf::from_raw(0, 1, &[0; 32], &[0; 19], "1", 0, 0).unwrap_err();
            assert_eq!(
                err,
                CodecError::InvalidLength {
                    field: "l1_address",
                    expected: 20,
                    got: 19
                }
            );
            assert!(NftLeaf::from_raw(0, 1, &[0; 31], &[0; 20], "1", 0, 0).is_err());
        }

        #[test]
        fn test_account_from_raw_checks_sizes() {
            assert!(AccountLeaf::from_raw(&[1; 32], &[2; 32], 0, 0, Buf32::zero()).is_ok());
            assert!(AccountLeaf::from_raw(&[1; 20], &[2; 32], 0, 0, Buf32::zero()).is_err());
        }
    }

    mod encoding {
        use super::*;

        #[test]
        fn test_borsh_preimage_roundtrip() {
            let leaf = NftLeaf {
                creator_account_index: 3,
                owner_account_index: 4,
                content_hash: Buf32::new([7; 32]),
                l1_address: Address::repeat_byte(0xaa),
                l1_token_id: U256::from(12345u64) << 200,
                creator_treasury_rate: 25,
                collection_id: 9,
            };
            let raw = borsh::to_vec(&leaf).unwrap();
            assert_eq!(borsh::from_slice::<NftLeaf>(&raw).unwrap(), leaf);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn proptest_asset_digest_sensitive(balance in any::<u64>(), lp in any::<u64>()) {
            let a = AssetLeaf::new(U256::from(balance), U256::from(lp), U256::ZERO);
            let b = AssetLeaf::new(U256::from(balance) + U256::from(1), U256::from(lp), U256::ZERO);
            prop_assert_eq!(a.digest(), a.clone().digest());
            prop_assert_ne!(a.digest(), b.digest());
        }
    }
}
