//! Leaf effects of decoded pubdata records.
//!
//! Pubdata carries the final, already validated amounts of every
//! transaction, so the effects follow from a record and the current forest
//! alone. Fields the record does not carry (NFT creators, offer bitmasks)
//! are read from the forest before the transaction applies.

use alloy_primitives::{keccak256, I256, U256};
use tracing::*;
use zkl2_primitives::{constants::OFFER_BITS_PER_ASSET, Buf32};
use zkl2_pubdata::{
    AtomicMatchPubData, GasFee, LiquidityPubData, SwapPubData, TxPubData, TxType,
};
use zkl2_state::{NftLeaf, TreeForest};
use zkl2_witness::{AssetDelta, LiquidityDelta, Registration, TxDetail, TxRecord};

use crate::errors::{RecoveryError, RecoveryResult};

fn to_signed(amount: U256) -> RecoveryResult<I256> {
    I256::try_from(amount).map_err(|_| RecoveryError::AmountOverflow(amount))
}

fn balance(account_index: u32, asset_id: u16, delta: I256) -> TxDetail {
    TxDetail::Asset {
        account_index: account_index.into(),
        asset_id: asset_id.into(),
        delta: AssetDelta::balance(delta),
    }
}

fn credit(account_index: u32, asset_id: u16, amount: U256) -> RecoveryResult<TxDetail> {
    Ok(balance(account_index, asset_id, to_signed(amount)?))
}

fn debit(account_index: u32, asset_id: u16, amount: U256) -> RecoveryResult<TxDetail> {
    Ok(balance(account_index, asset_id, -to_signed(amount)?))
}

fn touch(account_index: u32) -> TxDetail {
    TxDetail::Account {
        account_index: account_index.into(),
    }
}

/// Moves the gas fee from `payer` to the gas account.
fn push_gas(details: &mut Vec<TxDetail>, payer: u32, gas: &GasFee) -> RecoveryResult<()> {
    let fee = gas.fee.amount();
    details.push(debit(payer, gas.asset_id, fee)?);
    details.push(credit(gas.account_index, gas.asset_id, fee)?);
    Ok(())
}

/// Marks `offer_id` of `account_index` as canceled or finalized.
///
/// Offer `id` lives at bit `id % 128` of asset `id / 128`. A mask already set
/// earlier in the same record is extended instead of the forest's value.
fn push_offer_bit(
    forest: &mut TreeForest,
    details: &mut Vec<TxDetail>,
    account_index: u32,
    offer_id: u32,
) -> RecoveryResult<()> {
    let account_index = u64::from(account_index);
    let asset_id = u64::from(offer_id) / OFFER_BITS_PER_ASSET;
    let bit = (u64::from(offer_id) % OFFER_BITS_PER_ASSET) as usize;

    let pending = details.iter().rev().find_map(|detail| match detail {
        TxDetail::Asset {
            account_index: a,
            asset_id: id,
            delta,
        } if *a == account_index && *id == asset_id => delta.offer_canceled_or_finalized,
        _ => None,
    });
    let mut bits = match pending {
        Some(bits) => bits,
        None => {
            forest
                .asset(account_index, asset_id)?
                .offer_canceled_or_finalized
        }
    };
    bits.set_bit(bit, true);

    details.push(TxDetail::Asset {
        account_index,
        asset_id,
        delta: AssetDelta::offer_bits(bits),
    });
    Ok(())
}

fn nft(nft_index: u64, leaf: NftLeaf) -> TxDetail {
    TxDetail::Nft { nft_index, leaf }
}

/// Orders amounts given per asset id as the pair's `(asset_a, asset_b)`
/// reserve deltas. Records may name the pair's assets in either order.
fn pool_deltas(
    forest: &TreeForest,
    tx_type: TxType,
    pair_index: u16,
    (first_id, first): (u16, I256),
    (second_id, second): (u16, I256),
) -> RecoveryResult<(I256, I256)> {
    let pool = forest.liquidity(pair_index.into())?;
    if (pool.asset_a_id, pool.asset_b_id) == (first_id, second_id) {
        Ok((first, second))
    } else if (pool.asset_a_id, pool.asset_b_id) == (second_id, first_id) {
        Ok((second, first))
    } else {
        Err(RecoveryError::MalformedRecord {
            tx_type,
            reason: "assets do not match the pair",
        })
    }
}

/// The record's `asset_a` is the asset sold into the pool, which may be
/// either side of the pair.
fn swap_details(forest: &TreeForest, data: &SwapPubData) -> RecoveryResult<Vec<TxDetail>> {
    let amount_a = data.asset_a_amount.amount();
    let amount_b = data.asset_b_amount.amount();
    let treasury_fee = data.treasury_fee.amount();
    let into_pool = amount_a
        .checked_sub(treasury_fee)
        .ok_or(RecoveryError::MalformedRecord {
            tx_type: TxType::Swap,
            reason: "treasury fee exceeds the swapped amount",
        })?;
    let (reserve_a, reserve_b) = pool_deltas(
        forest,
        TxType::Swap,
        data.pair_index,
        (data.asset_a_id, to_signed(into_pool)?),
        (data.asset_b_id, -to_signed(amount_b)?),
    )?;

    let mut details = vec![
        debit(data.from_account_index, data.asset_a_id, amount_a)?,
        credit(data.from_account_index, data.asset_b_id, amount_b)?,
        credit(data.treasury_account_index, data.asset_a_id, treasury_fee)?,
        TxDetail::Liquidity {
            pair_index: data.pair_index.into(),
            delta: LiquidityDelta::Reserves {
                asset_a: reserve_a,
                asset_b: reserve_b,
                lp_amount: I256::ZERO,
                k_last: None,
            },
        },
    ];
    push_gas(&mut details, data.from_account_index, &data.gas)?;
    Ok(details)
}

/// Add and remove differ only in the direction every amount flows.
fn liquidity_details(
    forest: &TreeForest,
    data: &LiquidityPubData,
    add: bool,
) -> RecoveryResult<Vec<TxDetail>> {
    let sign = |amount: U256| -> RecoveryResult<I256> {
        let amount = to_signed(amount)?;
        Ok(if add { amount } else { -amount })
    };
    let amount_a = sign(data.asset_a_amount.amount())?;
    let amount_b = sign(data.asset_b_amount.amount())?;
    let lp = sign(data.lp_amount.amount())?;
    let tx_type = if add {
        TxType::AddLiquidity
    } else {
        TxType::RemoveLiquidity
    };
    let (reserve_a, reserve_b) = pool_deltas(
        forest,
        tx_type,
        data.pair_index,
        (data.asset_a_id, amount_a),
        (data.asset_b_id, amount_b),
    )?;

    let mut details = vec![
        balance(data.from_account_index, data.asset_a_id, -amount_a),
        balance(data.from_account_index, data.asset_b_id, -amount_b),
        TxDetail::Asset {
            account_index: data.from_account_index.into(),
            asset_id: data.pair_index.into(),
            delta: AssetDelta::lp_amount(lp),
        },
        TxDetail::Liquidity {
            pair_index: data.pair_index.into(),
            delta: LiquidityDelta::Reserves {
                asset_a: reserve_a,
                asset_b: reserve_b,
                lp_amount: lp,
                k_last: None,
            },
        },
    ];
    push_gas(&mut details, data.from_account_index, &data.gas)?;
    Ok(details)
}

fn atomic_match_details(
    forest: &mut TreeForest,
    data: &AtomicMatchPubData,
) -> RecoveryResult<Vec<TxDetail>> {
    let amount = data.amount.amount();
    let royalty = data.royalty_amount.amount();
    let to_seller = amount
        .checked_sub(royalty)
        .ok_or(RecoveryError::MalformedRecord {
            tx_type: TxType::AtomicMatch,
            reason: "royalty exceeds the sale amount",
        })?;
    let mut leaf = forest.nft(data.nft_index)?;
    if leaf.is_empty() {
        return Err(RecoveryError::MalformedRecord {
            tx_type: TxType::AtomicMatch,
            reason: "matched nft does not exist",
        });
    }

    let mut details = Vec::new();
    push_gas(&mut details, data.submitter_account_index, &data.gas)?;
    details.push(debit(data.buyer_account_index, data.asset_id, amount)?);
    push_offer_bit(forest, &mut details, data.buyer_account_index, data.buyer_offer_id)?;
    details.push(credit(data.seller_account_index, data.asset_id, to_seller)?);
    push_offer_bit(forest, &mut details, data.seller_account_index, data.seller_offer_id)?;
    details.push(credit(leaf.creator_account_index, data.asset_id, royalty)?);

    leaf.owner_account_index = data.buyer_account_index;
    details.push(nft(data.nft_index, leaf));
    Ok(details)
}

/// Derives the leaf effects of one decoded record against the forest as it
/// stands before the record applies.
pub fn derive_record(forest: &mut TreeForest, pubdata: TxPubData) -> RecoveryResult<TxRecord> {
    let mut registration = None;
    let details = match &pubdata {
        TxPubData::Empty => Vec::new(),

        TxPubData::RegisterZns(data) => {
            registration = Some(Registration {
                account_index: data.account_index.into(),
                l1_address_hash: data.account_name_hash,
                public_key: data.public_key,
            });
            Vec::new()
        }

        TxPubData::CreatePair(data) => vec![TxDetail::Liquidity {
            pair_index: data.pair_index.into(),
            delta: LiquidityDelta::Create {
                asset_a_id: data.asset_a_id,
                asset_b_id: data.asset_b_id,
                fee_rate: data.fee_rate,
                treasury_account_index: data.treasury_account_index,
                treasury_rate: data.treasury_rate,
            },
        }],

        TxPubData::UpdatePairRate(data) => vec![TxDetail::Liquidity {
            pair_index: data.pair_index.into(),
            delta: LiquidityDelta::Rates {
                fee_rate: data.fee_rate,
                treasury_account_index: data.treasury_account_index,
                treasury_rate: data.treasury_rate,
            },
        }],

        TxPubData::Deposit(data) => {
            if forest.account(data.account_index.into())?.is_none() {
                registration = Some(Registration {
                    account_index: data.account_index.into(),
                    l1_address_hash: Buf32::new(keccak256(data.l1_address).0),
                    public_key: Buf32::zero(),
                });
            }
            vec![credit(
                data.account_index,
                data.asset_id,
                U256::from(data.amount),
            )?]
        }

        TxPubData::DepositNft(data) => vec![
            touch(data.account_index),
            nft(
                data.nft_index,
                NftLeaf {
                    creator_account_index: data.creator_account_index,
                    owner_account_index: data.account_index,
                    content_hash: data.content_hash,
                    l1_address: data.nft_l1_address,
                    l1_token_id: data.nft_l1_token_id,
                    creator_treasury_rate: data.creator_treasury_rate,
                    collection_id: data.collection_id,
                },
            ),
        ],

        TxPubData::Transfer(data) => {
            let amount = data.amount.amount();
            let mut details = vec![
                debit(data.from_account_index, data.asset_id, amount)?,
                credit(data.to_account_index, data.asset_id, amount)?,
            ];
            push_gas(&mut details, data.from_account_index, &data.gas)?;
            details
        }

        TxPubData::Swap(data) => swap_details(forest, data)?,
        TxPubData::AddLiquidity(data) => liquidity_details(forest, data, true)?,
        TxPubData::RemoveLiquidity(data) => liquidity_details(forest, data, false)?,

        TxPubData::Withdraw(data) => {
            let mut details = vec![debit(
                data.from_account_index,
                data.asset_id,
                U256::from(data.amount),
            )?];
            push_gas(&mut details, data.from_account_index, &data.gas)?;
            details
        }

        TxPubData::CreateCollection(data) => {
            let mut details = Vec::new();
            push_gas(&mut details, data.account_index, &data.gas)?;
            details
        }

        TxPubData::MintNft(data) => {
            let mut details = Vec::new();
            push_gas(&mut details, data.creator_account_index, &data.gas)?;
            details.push(touch(data.to_account_index));
            details.push(nft(
                data.nft_index,
                NftLeaf {
                    creator_account_index: data.creator_account_index,
                    owner_account_index: data.to_account_index,
                    content_hash: data.content_hash,
                    creator_treasury_rate: data.creator_treasury_rate,
                    collection_id: data.collection_id,
                    ..Default::default()
                },
            ));
            details
        }

        TxPubData::TransferNft(data) => {
            let mut leaf = forest.nft(data.nft_index)?;
            leaf.owner_account_index = data.to_account_index;
            let mut details = Vec::new();
            push_gas(&mut details, data.from_account_index, &data.gas)?;
            details.push(touch(data.to_account_index));
            details.push(nft(data.nft_index, leaf));
            details
        }

        TxPubData::AtomicMatch(data) => atomic_match_details(forest, data)?,

        TxPubData::CancelOffer(data) => {
            let mut details = Vec::new();
            push_gas(&mut details, data.account_index, &data.gas)?;
            push_offer_bit(forest, &mut details, data.account_index, data.offer_id)?;
            details
        }

        TxPubData::WithdrawNft(data) => {
            let mut details = Vec::new();
            push_gas(&mut details, data.account_index, &data.gas)?;
            details.push(nft(data.nft_index, NftLeaf::default()));
            details
        }

        // A failed exit is still posted, with nothing to move.
        TxPubData::FullExit(data) => {
            if data.amount == 0 || forest.account(data.account_index.into())?.is_none() {
                Vec::new()
            } else {
                vec![debit(
                    data.account_index,
                    data.asset_id,
                    U256::from(data.amount),
                )?]
            }
        }

        TxPubData::FullExitNft(data) => {
            if data.content_hash.is_zero() || forest.account(data.account_index.into())?.is_none()
            {
                Vec::new()
            } else {
                vec![
                    touch(data.account_index),
                    nft(data.nft_index, NftLeaf::default()),
                ]
            }
        }
    };

    trace!(tx_type = ?pubdata.tx_type(), details = details.len(), "derived record effects");
    Ok(TxRecord {
        pubdata,
        registration,
        details,
    })
}
