//! Per-type pubdata records and the block-level codec.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use zkl2_primitives::{constants::PUBDATA_BYTES_PER_TX, Buf32};

use crate::{
    codec::{RecordReader, RecordWriter},
    errors::{PubDataError, PubDataResult},
    packed::{PackedAmount, PackedFee},
    types::TxType,
};

/// Gas payment trailer shared by L2-signed transactions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasFee {
    pub account_index: u32,
    pub asset_id: u16,
    pub fee: PackedFee,
}

impl GasFee {
    fn write(&self, w: &mut RecordWriter) {
        w.put_u32(self.account_index);
        w.put_u16(self.asset_id);
        w.put_fee(self.fee);
    }

    fn read(r: &mut RecordReader<'_>) -> PubDataResult<Self> {
        Ok(Self {
            account_index: r.read_u32()?,
            asset_id: r.read_u16()?,
            fee: r.read_fee()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterZnsPubData {
    pub account_index: u32,
    pub account_name: Buf32,
    pub account_name_hash: Buf32,
    pub public_key: Buf32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePairPubData {
    pub pair_index: u16,
    pub asset_a_id: u16,
    pub asset_b_id: u16,
    pub fee_rate: u16,
    pub treasury_account_index: u32,
    pub treasury_rate: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePairRatePubData {
    pub pair_index: u16,
    pub fee_rate: u16,
    pub treasury_account_index: u32,
    pub treasury_rate: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPubData {
    pub account_index: u32,
    pub l1_address: Address,
    pub asset_id: u16,
    pub amount: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositNftPubData {
    pub account_index: u32,
    pub nft_index: u64,
    pub nft_l1_address: Address,
    pub creator_account_index: u32,
    pub creator_treasury_rate: u16,
    pub content_hash: Buf32,
    pub nft_l1_token_id: U256,
    pub collection_id: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPubData {
    pub from_account_index: u32,
    pub to_account_index: u32,
    pub asset_id: u16,
    pub amount: PackedAmount,
    pub gas: GasFee,
    pub call_data_hash: Buf32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapPubData {
    pub from_account_index: u32,
    pub to_account_index: u32,
    pub pair_index: u16,
    pub asset_a_id: u16,
    pub asset_b_id: u16,
    pub asset_a_amount: PackedAmount,
    pub asset_b_amount: PackedAmount,
    pub treasury_account_index: u32,
    pub treasury_fee: PackedFee,
    pub gas: GasFee,
}

/// Shared layout of `AddLiquidity` and `RemoveLiquidity`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPubData {
    pub from_account_index: u32,
    pub to_account_index: u32,
    pub pair_index: u16,
    pub asset_a_id: u16,
    pub asset_b_id: u16,
    pub asset_a_amount: PackedAmount,
    pub asset_b_amount: PackedAmount,
    pub lp_amount: PackedAmount,
    pub gas: GasFee,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPubData {
    pub from_account_index: u32,
    pub to_address: Address,
    pub asset_id: u16,
    pub amount: u128,
    pub gas: GasFee,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCollectionPubData {
    pub account_index: u32,
    pub collection_id: u16,
    pub gas: GasFee,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintNftPubData {
    pub creator_account_index: u32,
    pub to_account_index: u32,
    pub nft_index: u64,
    pub gas: GasFee,
    pub creator_treasury_rate: u16,
    pub collection_id: u16,
    pub content_hash: Buf32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferNftPubData {
    pub from_account_index: u32,
    pub to_account_index: u32,
    pub nft_index: u64,
    pub gas: GasFee,
    pub call_data_hash: Buf32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicMatchPubData {
    pub submitter_account_index: u32,
    pub buyer_account_index: u32,
    pub buyer_offer_id: u32,
    pub seller_account_index: u32,
    pub seller_offer_id: u32,
    pub nft_index: u64,
    pub asset_id: u16,
    pub amount: PackedAmount,
    pub royalty_amount: PackedAmount,
    pub gas: GasFee,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOfferPubData {
    pub account_index: u32,
    pub offer_id: u32,
    pub gas: GasFee,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawNftPubData {
    pub account_index: u32,
    pub creator_account_index: u32,
    pub creator_treasury_rate: u16,
    pub nft_index: u64,
    pub collection_id: u16,
    pub nft_l1_address: Address,
    pub to_address: Address,
    pub gas: GasFee,
    pub content_hash: Buf32,
    pub nft_l1_token_id: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullExitPubData {
    pub account_index: u32,
    pub asset_id: u16,
    pub amount: u128,
    pub l1_address: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullExitNftPubData {
    pub account_index: u32,
    pub creator_account_index: u32,
    pub creator_treasury_rate: u16,
    pub nft_index: u64,
    pub collection_id: u16,
    pub nft_l1_address: Address,
    pub l1_address: Address,
    pub content_hash: Buf32,
    pub nft_l1_token_id: U256,
}

/// Decoded pubdata of one transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TxPubData {
    Empty,
    RegisterZns(RegisterZnsPubData),
    CreatePair(CreatePairPubData),
    UpdatePairRate(UpdatePairRatePubData),
    Deposit(DepositPubData),
    DepositNft(DepositNftPubData),
    Transfer(TransferPubData),
    Swap(SwapPubData),
    AddLiquidity(LiquidityPubData),
    RemoveLiquidity(LiquidityPubData),
    Withdraw(WithdrawPubData),
    CreateCollection(CreateCollectionPubData),
    MintNft(MintNftPubData),
    TransferNft(TransferNftPubData),
    AtomicMatch(AtomicMatchPubData),
    CancelOffer(CancelOfferPubData),
    WithdrawNft(WithdrawNftPubData),
    FullExit(FullExitPubData),
    FullExitNft(FullExitNftPubData),
}

impl TxPubData {
    pub fn tx_type(&self) -> TxType {
        match self {
            Self::Empty => TxType::Empty,
            Self::RegisterZns(_) => TxType::RegisterZns,
            Self::CreatePair(_) => TxType::CreatePair,
            Self::UpdatePairRate(_) => TxType::UpdatePairRate,
            Self::Deposit(_) => TxType::Deposit,
            Self::DepositNft(_) => TxType::DepositNft,
            Self::Transfer(_) => TxType::Transfer,
            Self::Swap(_) => TxType::Swap,
            Self::AddLiquidity(_) => TxType::AddLiquidity,
            Self::RemoveLiquidity(_) => TxType::RemoveLiquidity,
            Self::Withdraw(_) => TxType::Withdraw,
            Self::CreateCollection(_) => TxType::CreateCollection,
            Self::MintNft(_) => TxType::MintNft,
            Self::TransferNft(_) => TxType::TransferNft,
            Self::AtomicMatch(_) => TxType::AtomicMatch,
            Self::CancelOffer(_) => TxType::CancelOffer,
            Self::WithdrawNft(_) => TxType::WithdrawNft,
            Self::FullExit(_) => TxType::FullExit,
            Self::FullExitNft(_) => TxType::FullExitNft,
        }
    }

    /// Encodes the unpadded record, tag first.
    pub fn encode_record(&self) -> PubDataResult<Vec<u8>> {
        let tx_type = self.tx_type();
        let mut w = RecordWriter::with_capacity(tx_type.record_size());
        w.put_u8(tx_type.into());
        match self {
            Self::Empty => {}
            Self::RegisterZns(tx) => {
                w.put_u32(tx.account_index);
                w.put_buf32(&tx.account_name);
                w.put_buf32(&tx.account_name_hash);
                w.put_buf32(&tx.public_key);
            }
            Self::CreatePair(tx) => {
                w.put_u16(tx.pair_index);
                w.put_u16(tx.asset_a_id);
                w.put_u16(tx.asset_b_id);
                w.put_u16(tx.fee_rate);
                w.put_u32(tx.treasury_account_index);
                w.put_u16(tx.treasury_rate);
            }
            Self::UpdatePairRate(tx) => {
                w.put_u16(tx.pair_index);
                w.put_u16(tx.fee_rate);
                w.put_u32(tx.treasury_account_index);
                w.put_u16(tx.treasury_rate);
            }
            Self::Deposit(tx) => {
                w.put_u32(tx.account_index);
                w.put_address(&tx.l1_address);
                w.put_u16(tx.asset_id);
                w.put_u128(tx.amount);
            }
            Self::DepositNft(tx) => {
                w.put_u32(tx.account_index);
                w.put_u40("nft_index", tx.nft_index)?;
                w.put_address(&tx.nft_l1_address);
                w.put_u32(tx.creator_account_index);
                w.put_u16(tx.creator_treasury_rate);
                w.put_buf32(&tx.content_hash);
                w.put_u256(&tx.nft_l1_token_id);
                w.put_u16(tx.collection_id);
            }
            Self::Transfer(tx) => {
                w.put_u32(tx.from_account_index);
                w.put_u32(tx.to_account_index);
                w.put_u16(tx.asset_id);
                w.put_amount(tx.amount);
                tx.gas.write(&mut w);
                w.put_buf32(&tx.call_data_hash);
            }
            Self::Swap(tx) => {
                w.put_u32(tx.from_account_index);
                w.put_u32(tx.to_account_index);
                w.put_u16(tx.pair_index);
                w.put_u16(tx.asset_a_id);
                w.put_u16(tx.asset_b_id);
                w.put_amount(tx.asset_a_amount);
                w.put_amount(tx.asset_b_amount);
                w.put_u32(tx.treasury_account_index);
                w.put_fee(tx.treasury_fee);
                tx.gas.write(&mut w);
            }
            Self::AddLiquidity(tx) | Self::RemoveLiquidity(tx) => {
                w.put_u32(tx.from_account_index);
                w.put_u32(tx.to_account_index);
                w.put_u16(tx.pair_index);
                w.put_u16(tx.asset_a_id);
                w.put_u16(tx.asset_b_id);
                w.put_amount(tx.asset_a_amount);
                w.put_amount(tx.asset_b_amount);
                w.put_amount(tx.lp_amount);
                tx.gas.write(&mut w);
            }
            Self::Withdraw(tx) => {
                w.put_u32(tx.from_account_index);
                w.put_address(&tx.to_address);
                w.put_u16(tx.asset_id);
                w.put_u128(tx.amount);
                tx.gas.write(&mut w);
            }
            Self::CreateCollection(tx) => {
                w.put_u32(tx.account_index);
                w.put_u16(tx.collection_id);
                tx.gas.write(&mut w);
            }
            Self::MintNft(tx) => {
                w.put_u32(tx.creator_account_index);
                w.put_u32(tx.to_account_index);
                w.put_u40("nft_index", tx.nft_index)?;
                tx.gas.write(&mut w);
                w.put_u16(tx.creator_treasury_rate);
                w.put_u16(tx.collection_id);
                w.put_buf32(&tx.content_hash);
            }
            Self::TransferNft(tx) => {
                w.put_u32(tx.from_account_index);
                w.put_u32(tx.to_account_index);
                w.put_u40("nft_index", tx.nft_index)?;
                tx.gas.write(&mut w);
                w.put_buf32(&tx.call_data_hash);
            }
            Self::AtomicMatch(tx) => {
                w.put_u32(tx.submitter_account_index);
                w.put_u32(tx.buyer_account_index);
                w.put_u24("buyer_offer_id", tx.buyer_offer_id)?;
                w.put_u32(tx.seller_account_index);
                w.put_u24("seller_offer_id", tx.seller_offer_id)?;
                w.put_u40("nft_index", tx.nft_index)?;
                w.put_u16(tx.asset_id);
                w.put_amount(tx.amount);
                w.put_amount(tx.royalty_amount);
                tx.gas.write(&mut w);
            }
            Self::CancelOffer(tx) => {
                w.put_u32(tx.account_index);
                w.put_u24("offer_id", tx.offer_id)?;
                tx.gas.write(&mut w);
            }
            Self::WithdrawNft(tx) => {
                w.put_u32(tx.account_index);
                w.put_u32(tx.creator_account_index);
                w.put_u16(tx.creator_treasury_rate);
                w.put_u40("nft_index", tx.nft_index)?;
                w.put_u16(tx.collection_id);
                w.put_address(&tx.nft_l1_address);
                w.put_address(&tx.to_address);
                tx.gas.write(&mut w);
                w.put_buf32(&tx.content_hash);
                w.put_u256(&tx.nft_l1_token_id);
            }
            Self::FullExit(tx) => {
                w.put_u32(tx.account_index);
                w.put_u16(tx.asset_id);
                w.put_u128(tx.amount);
                w.put_address(&tx.l1_address);
            }
            Self::FullExitNft(tx) => {
                w.put_u32(tx.account_index);
                w.put_u32(tx.creator_account_index);
                w.put_u16(tx.creator_treasury_rate);
                w.put_u40("nft_index", tx.nft_index)?;
                w.put_u16(tx.collection_id);
                w.put_address(&tx.nft_l1_address);
                w.put_address(&tx.l1_address);
                w.put_buf32(&tx.content_hash);
                w.put_u256(&tx.nft_l1_token_id);
            }
        }
        Ok(w.into_inner())
    }

    /// Encodes the record zero-padded to the fixed per-tx stride.
    pub fn encode(&self) -> PubDataResult<Vec<u8>> {
        let mut out = self.encode_record()?;
        out.resize(PUBDATA_BYTES_PER_TX, 0);
        Ok(out)
    }

    /// Decodes an unpadded record of exactly its type's size.
    pub fn decode_record(record: &[u8]) -> PubDataResult<Self> {
        let tag = *record.first().ok_or(PubDataError::Truncated {
            needed: 1,
            remaining: 0,
        })?;
        let tx_type = TxType::try_from(tag).map_err(|_| PubDataError::UnknownTxType(tag))?;
        if record.len() != tx_type.record_size() {
            return Err(PubDataError::InvalidLength {
                tx_type,
                expected: tx_type.record_size(),
                got: record.len(),
            });
        }

        let mut r = RecordReader::new(record);
        r.read_u8()?;
        let tx = match tx_type {
            TxType::Empty => Self::Empty,
            TxType::RegisterZns => Self::RegisterZns(RegisterZnsPubData {
                account_index: r.read_u32()?,
                account_name: r.read_buf32()?,
                account_name_hash: r.read_buf32()?,
                public_key: r.read_buf32()?,
            }),
            TxType::CreatePair => Self::CreatePair(CreatePairPubData {
                pair_index: r.read_u16()?,
                asset_a_id: r.read_u16()?,
                asset_b_id: r.read_u16()?,
                fee_rate: r.read_u16()?,
                treasury_account_index: r.read_u32()?,
                treasury_rate: r.read_u16()?,
            }),
            TxType::UpdatePairRate => Self::UpdatePairRate(UpdatePairRatePubData {
                pair_index: r.read_u16()?,
                fee_rate: r.read_u16()?,
                treasury_account_index: r.read_u32()?,
                treasury_rate: r.read_u16()?,
            }),
            TxType::Deposit => Self::Deposit(DepositPubData {
                account_index: r.read_u32()?,
                l1_address: r.read_address()?,
                asset_id: r.read_u16()?,
                amount: r.read_u128()?,
            }),
            TxType::DepositNft => Self::DepositNft(DepositNftPubData {
                account_index: r.read_u32()?,
                nft_index: r.read_u40()?,
                nft_l1_address: r.read_address()?,
                creator_account_index: r.read_u32()?,
                creator_treasury_rate: r.read_u16()?,
                content_hash: r.read_buf32()?,
                nft_l1_token_id: r.read_u256()?,
                collection_id: r.read_u16()?,
            }),
            TxType::Transfer => Self::Transfer(TransferPubData {
                from_account_index: r.read_u32()?,
                to_account_index: r.read_u32()?,
                asset_id: r.read_u16()?,
                amount: r.read_amount()?,
                gas: GasFee::read(&mut r)?,
                call_data_hash: r.read_buf32()?,
            }),
            TxType::Swap => Self::Swap(SwapPubData {
                from_account_index: r.read_u32()?,
                to_account_index: r.read_u32()?,
                pair_index: r.read_u16()?,
                asset_a_id: r.read_u16()?,
                asset_b_id: r.read_u16()?,
                asset_a_amount: r.read_amount()?,
                asset_b_amount: r.read_amount()?,
                treasury_account_index: r.read_u32()?,
                treasury_fee: r.read_fee()?,
                gas: GasFee::read(&mut r)?,
            }),
            TxType::AddLiquidity => Self::AddLiquidity(read_liquidity(&mut r)?),
            TxType::RemoveLiquidity => Self::RemoveLiquidity(read_liquidity(&mut r)?),
            TxType::Withdraw => Self::Withdraw(WithdrawPubData {
                from_account_index: r.read_u32()?,
                to_address: r.read_address()?,
                asset_id: r.read_u16()?,
                amount: r.read_u128()?,
                gas: GasFee::read(&mut r)?,
            }),
            TxType::CreateCollection => Self::CreateCollection(CreateCollectionPubData {
                account_index: r.read_u32()?,
                collection_id: r.read_u16()?,
                gas: GasFee::read(&mut r)?,
            }),
            TxType::MintNft => Self::MintNft(MintNftPubData {
                creator_account_index: r.read_u32()?,
                to_account_index: r.read_u32()?,
                nft_index: r.read_u40()?,
                gas: GasFee::read(&mut r)?,
                creator_treasury_rate: r.read_u16()?,
                collection_id: r.read_u16()?,
                content_hash: r.read_buf32()?,
            }),
            TxType::TransferNft => Self::TransferNft(TransferNftPubData {
                from_account_index: r.read_u32()?,
                to_account_index: r.read_u32()?,
                nft_index: r.read_u40()?,
                gas: GasFee::read(&mut r)?,
                call_data_hash: r.read_buf32()?,
            }),
            TxType::AtomicMatch => Self::AtomicMatch(AtomicMatchPubData {
                submitter_account_index: r.read_u32()?,
                buyer_account_index: r.read_u32()?,
                buyer_offer_id: r.read_u24()?,
                seller_account_index: r.read_u32()?,
                seller_offer_id: r.read_u24()?,
                nft_index: r.read_u40()?,
                asset_id: r.read_u16()?,
                amount: r.read_amount()?,
                royalty_amount: r.read_amount()?,
                gas: GasFee::read(&mut r)?,
            }),
            TxType::CancelOffer => Self::CancelOffer(CancelOfferPubData {
                account_index: r.read_u32()?,
                offer_id: r.read_u24()?,
                gas: GasFee::read(&mut r)?,
            }),
            TxType::WithdrawNft => Self::WithdrawNft(WithdrawNftPubData {
                account_index: r.read_u32()?,
                creator_account_index: r.read_u32()?,
                creator_treasury_rate: r.read_u16()?,
                nft_index: r.read_u40()?,
                collection_id: r.read_u16()?,
                nft_l1_address: r.read_address()?,
                to_address: r.read_address()?,
                gas: GasFee::read(&mut r)?,
                content_hash: r.read_buf32()?,
                nft_l1_token_id: r.read_u256()?,
            }),
            TxType::FullExit => Self::FullExit(FullExitPubData {
                account_index: r.read_u32()?,
                asset_id: r.read_u16()?,
                amount: r.read_u128()?,
                l1_address: r.read_address()?,
            }),
            TxType::FullExitNft => Self::FullExitNft(FullExitNftPubData {
                account_index: r.read_u32()?,
                creator_account_index: r.read_u32()?,
                creator_treasury_rate: r.read_u16()?,
                nft_index: r.read_u40()?,
                collection_id: r.read_u16()?,
                nft_l1_address: r.read_address()?,
                l1_address: r.read_address()?,
                content_hash: r.read_buf32()?,
                nft_l1_token_id: r.read_u256()?,
            }),
        };
        debug_assert_eq!(r.position(), record.len());
        Ok(tx)
    }

    /// Decodes one padded per-tx chunk. The padding after the record must be
    /// zero.
    pub fn decode(chunk: &[u8]) -> PubDataResult<Self> {
        let tag = *chunk.first().ok_or(PubDataError::Truncated {
            needed: PUBDATA_BYTES_PER_TX,
            remaining: 0,
        })?;
        let tx_type = TxType::try_from(tag).map_err(|_| PubDataError::UnknownTxType(tag))?;
        if chunk.len() != PUBDATA_BYTES_PER_TX {
            return Err(PubDataError::InvalidLength {
                tx_type,
                expected: PUBDATA_BYTES_PER_TX,
                got: chunk.len(),
            });
        }
        let size = tx_type.record_size();
        if let Some(pos) = chunk[size..].iter().position(|b| *b != 0) {
            return Err(PubDataError::NonZeroPadding {
                tx_type,
                offset: size + pos,
            });
        }
        Self::decode_record(&chunk[..size])
    }

    /// Whether the L1 contract processes this record on block verification.
    pub fn is_on_chain_op(&self) -> bool {
        self.tx_type().is_on_chain_op()
    }

    /// Account that signed the transaction on L2. Priority operations and
    /// empty records have none.
    pub fn signer_account_index(&self) -> Option<u32> {
        match self {
            Self::Empty
            | Self::RegisterZns(_)
            | Self::CreatePair(_)
            | Self::UpdatePairRate(_)
            | Self::Deposit(_)
            | Self::DepositNft(_)
            | Self::FullExit(_)
            | Self::FullExitNft(_) => None,
            Self::Transfer(tx) => Some(tx.from_account_index),
            Self::Swap(tx) => Some(tx.from_account_index),
            Self::AddLiquidity(tx) | Self::RemoveLiquidity(tx) => Some(tx.from_account_index),
            Self::Withdraw(tx) => Some(tx.from_account_index),
            Self::CreateCollection(tx) => Some(tx.account_index),
            Self::MintNft(tx) => Some(tx.creator_account_index),
            Self::TransferNft(tx) => Some(tx.from_account_index),
            Self::AtomicMatch(tx) => Some(tx.submitter_account_index),
            Self::CancelOffer(tx) => Some(tx.account_index),
            Self::WithdrawNft(tx) => Some(tx.account_index),
        }
    }
}

fn read_liquidity(r: &mut RecordReader<'_>) -> PubDataResult<LiquidityPubData> {
    Ok(LiquidityPubData {
        from_account_index: r.read_u32()?,
        to_account_index: r.read_u32()?,
        pair_index: r.read_u16()?,
        asset_a_id: r.read_u16()?,
        asset_b_id: r.read_u16()?,
        asset_a_amount: r.read_amount()?,
        asset_b_amount: r.read_amount()?,
        lp_amount: r.read_amount()?,
        gas: GasFee::read(r)?,
    })
}

/// Splits block pubdata into per-tx chunks and decodes each one.
pub fn decode_batch(pubdata: &[u8]) -> PubDataResult<Vec<TxPubData>> {
    if pubdata.len() % PUBDATA_BYTES_PER_TX != 0 {
        return Err(PubDataError::UnalignedBatch {
            got: pubdata.len(),
            stride: PUBDATA_BYTES_PER_TX,
        });
    }
    pubdata
        .chunks_exact(PUBDATA_BYTES_PER_TX)
        .map(TxPubData::decode)
        .collect()
}

/// Concatenates the padded encodings of `txs`.
pub fn encode_batch(txs: &[TxPubData]) -> PubDataResult<Vec<u8>> {
    let mut out = Vec::with_capacity(txs.len() * PUBDATA_BYTES_PER_TX);
    for tx in txs {
        out.extend(tx.encode()?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    fn gas() -> GasFee {
        GasFee {
            account_index: 1,
            asset_id: 0,
            fee: PackedFee::from_raw(0x0a05),
        }
    }

    fn amount(v: u64) -> PackedAmount {
        PackedAmount::pack(U256::from(v)).unwrap()
    }

    /// One instance of every transaction type.
    fn samples() -> Vec<TxPubData> {
        let addr = Address::repeat_byte(0x42);
        let hash = Buf32::new([0x5a; 32]);
        vec![
            TxPubData::Empty,
            TxPubData::RegisterZns(RegisterZnsPubData {
                account_index: 7,
                account_name: Buf32::new([0x61; 32]),
                account_name_hash: hash,
                public_key: Buf32::new([0x11; 32]),
            }),
            TxPubData::CreatePair(CreatePairPubData {
                pair_index: 3,
                asset_a_id: 0,
                asset_b_id: 1,
                fee_rate: 30,
                treasury_account_index: 0,
                treasury_rate: 5,
            }),
            TxPubData::UpdatePairRate(UpdatePairRatePubData {
                pair_index: 3,
                fee_rate: 25,
                treasury_account_index: 0,
                treasury_rate: 10,
            }),
            TxPubData::Deposit(DepositPubData {
                account_index: 2,
                l1_address: addr,
                asset_id: 1,
                amount: 1_000_000_000_000_000_000,
            }),
            TxPubData::DepositNft(DepositNftPubData {
                account_index: 2,
                nft_index: (1 << 40) - 2,
                nft_l1_address: addr,
                creator_account_index: 4,
                creator_treasury_rate: 100,
                content_hash: hash,
                nft_l1_token_id: U256::MAX,
                collection_id: 9,
            }),
            TxPubData::Transfer(TransferPubData {
                from_account_index: 2,
                to_account_index: 3,
                asset_id: 1,
                amount: amount(500),
                gas: gas(),
                call_data_hash: hash,
            }),
            TxPubData::Swap(SwapPubData {
                from_account_index: 2,
                to_account_index: 3,
                pair_index: 3,
                asset_a_id: 0,
                asset_b_id: 1,
                asset_a_amount: amount(100),
                asset_b_amount: amount(95),
                treasury_account_index: 0,
                treasury_fee: PackedFee::from_raw(7),
                gas: gas(),
            }),
            TxPubData::AddLiquidity(LiquidityPubData {
                from_account_index: 2,
                to_account_index: 3,
                pair_index: 3,
                asset_a_id: 0,
                asset_b_id: 1,
                asset_a_amount: amount(100),
                asset_b_amount: amount(200),
                lp_amount: amount(141),
                gas: gas(),
            }),
            TxPubData::RemoveLiquidity(LiquidityPubData {
                from_account_index: 2,
                to_account_index: 3,
                pair_index: 3,
                asset_a_id: 0,
                asset_b_id: 1,
                asset_a_amount: amount(10),
                asset_b_amount: amount(20),
                lp_amount: amount(14),
                gas: gas(),
            }),
            TxPubData::Withdraw(WithdrawPubData {
                from_account_index: 2,
                to_address: addr,
                asset_id: 1,
                amount: u128::MAX,
                gas: gas(),
            }),
            TxPubData::CreateCollection(CreateCollectionPubData {
                account_index: 2,
                collection_id: 1,
                gas: gas(),
            }),
            TxPubData::MintNft(MintNftPubData {
                creator_account_index: 2,
                to_account_index: 3,
                nft_index: 12,
                gas: gas(),
                creator_treasury_rate: 50,
                collection_id: 1,
                content_hash: hash,
            }),
            TxPubData::TransferNft(TransferNftPubData {
                from_account_index: 3,
                to_account_index: 2,
                nft_index: 12,
                gas: gas(),
                call_data_hash: hash,
            }),
            TxPubData::AtomicMatch(AtomicMatchPubData {
                submitter_account_index: 1,
                buyer_account_index: 2,
                buyer_offer_id: 129,
                seller_account_index: 3,
                seller_offer_id: (1 << 24) - 1,
                nft_index: 12,
                asset_id: 1,
                amount: amount(1000),
                royalty_amount: amount(50),
                gas: gas(),
            }),
            TxPubData::CancelOffer(CancelOfferPubData {
                account_index: 2,
                offer_id: 5,
                gas: gas(),
            }),
            TxPubData::WithdrawNft(WithdrawNftPubData {
                account_index: 2,
                creator_account_index: 4,
                creator_treasury_rate: 100,
                nft_index: 12,
                collection_id: 1,
                nft_l1_address: addr,
                to_address: Address::repeat_byte(0x24),
                gas: gas(),
                content_hash: hash,
                nft_l1_token_id: U256::from(77),
            }),
            TxPubData::FullExit(FullExitPubData {
                account_index: 2,
                asset_id: 1,
                amount: 5,
                l1_address: addr,
            }),
            TxPubData::FullExitNft(FullExitNftPubData {
                account_index: 2,
                creator_account_index: 4,
                creator_treasury_rate: 100,
                nft_index: 12,
                collection_id: 1,
                nft_l1_address: addr,
                l1_address: addr,
                content_hash: hash,
                nft_l1_token_id: U256::from(77),
            }),
        ]
    }

    mod records {
        use super::*;

        #[test]
        fn test_every_type_roundtrips_at_its_size() {
            let all = samples();
            assert_eq!(all.len(), TxType::all().len());
            for tx in all {
                let ty = tx.tx_type();
                let record = tx.encode_record().unwrap();
                assert_eq!(record.len(), ty.record_size(), "{ty:?}");
                assert_eq!(record[0], u8::from(ty));
                assert_eq!(TxPubData::decode_record(&record).unwrap(), tx);

                let chunk = tx.encode().unwrap();
                assert_eq!(chunk.len(), PUBDATA_BYTES_PER_TX);
                assert!(chunk[record.len()..].iter().all(|b| *b == 0));
                assert_eq!(TxPubData::decode(&chunk).unwrap(), tx);
            }
        }

        #[test]
        fn test_create_pair_layout() {
            let tx = TxPubData::CreatePair(CreatePairPubData {
                pair_index: 0x0102,
                asset_a_id: 0x0304,
                asset_b_id: 0x0506,
                fee_rate: 0x0708,
                treasury_account_index: 0x090a0b0c,
                treasury_rate: 0x0d0e,
            });
            assert_eq!(
                tx.encode_record().unwrap(),
                hex!("02 0102 0304 0506 0708 090a0b0c 0d0e").to_vec()
            );
        }

        #[test]
        fn test_wrong_record_length_rejected() {
            for tx in samples() {
                let ty = tx.tx_type();
                let mut record = tx.encode_record().unwrap();
                record.push(0);
                assert_eq!(
                    TxPubData::decode_record(&record).unwrap_err(),
                    PubDataError::InvalidLength {
                        tx_type: ty,
                        expected: ty.record_size(),
                        got: ty.record_size() + 1,
                    }
                );
                record.truncate(ty.record_size() - 1);
                if !record.is_empty() {
                    assert!(TxPubData::decode_record(&record).is_err());
                }
            }
        }

        #[test]
        fn test_signers_only_for_l2_txs() {
            for tx in samples() {
                let ty = tx.tx_type();
                let l2 = !ty.is_priority_op() && ty != TxType::Empty;
                assert_eq!(tx.signer_account_index().is_some(), l2, "{ty:?}");
            }
        }

        #[test]
        fn test_unknown_tag_rejected() {
            let mut chunk = vec![0u8; PUBDATA_BYTES_PER_TX];
            chunk[0] = 0xff;
            assert_eq!(
                TxPubData::decode(&chunk).unwrap_err(),
                PubDataError::UnknownTxType(0xff)
            );
        }

        #[test]
        fn test_dirty_padding_rejected() {
            let tx = samples().remove(2);
            let mut chunk = tx.encode().unwrap();
            chunk[100] = 1;
            assert_eq!(
                TxPubData::decode(&chunk).unwrap_err(),
                PubDataError::NonZeroPadding {
                    tx_type: TxType::CreatePair,
                    offset: 100
                }
            );
        }

        #[test]
        fn test_oversized_index_rejected_on_encode() {
            let tx = TxPubData::MintNft(MintNftPubData {
                creator_account_index: 0,
                to_account_index: 0,
                nft_index: 1 << 40,
                gas: gas(),
                creator_treasury_rate: 0,
                collection_id: 0,
                content_hash: Buf32::zero(),
            });
            assert!(matches!(
                tx.encode_record(),
                Err(PubDataError::Codec(_))
            ));
        }
    }

    mod batches {
        use super::*;

        #[test]
        fn test_batch_roundtrip() {
            let txs = samples();
            let raw = encode_batch(&txs).unwrap();
            assert_eq!(raw.len(), txs.len() * PUBDATA_BYTES_PER_TX);
            assert_eq!(decode_batch(&raw).unwrap(), txs);
        }

        #[test]
        fn test_unaligned_batch_rejected() {
            let raw = vec![0u8; PUBDATA_BYTES_PER_TX + 1];
            assert_eq!(
                decode_batch(&raw).unwrap_err(),
                PubDataError::UnalignedBatch {
                    got: PUBDATA_BYTES_PER_TX + 1,
                    stride: PUBDATA_BYTES_PER_TX
                }
            );
        }

        #[test]
        fn test_empty_batch() {
            assert!(decode_batch(&[]).unwrap().is_empty());
        }

        #[test]
        fn test_serde_json_shape() {
            let tx = samples().remove(4);
            let json = serde_json::to_value(&tx).unwrap();
            assert_eq!(json["type"], "Deposit");
            let back: TxPubData = serde_json::from_value(json).unwrap();
            assert_eq!(back, tx);
        }
    }
}
