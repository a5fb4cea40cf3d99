//! Per-transaction witness construction over a [`TreeForest`].
//!
//! Every transaction is processed in three phases. All "before" leaves and
//! proofs are snapshotted first, including the padded sentinel slots, so
//! every proof in a witness verifies against the pre-transaction roots. The
//! deltas are then folded into in-memory copies of the touched leaves, in
//! record order, and only then written back to the forest.

use std::iter;

use alloy_primitives::{I256, U256};
use tracing::*;
use zkl2_primitives::{
    constants::{
        ACCOUNT_TREE_HEIGHT, ASSET_TREE_HEIGHT, LAST_ACCOUNT_ASSET_ID, LAST_ACCOUNT_INDEX,
        LAST_NFT_INDEX, LAST_PAIR_INDEX, LIQUIDITY_TREE_HEIGHT, NB_ACCOUNTS_PER_TX,
        NB_ACCOUNT_ASSETS_PER_ACCOUNT, NFT_TREE_HEIGHT, PUBDATA_BYTES_PER_TX,
    },
    Buf32,
};
use zkl2_pubdata::TxType;
use zkl2_smt::MerkleProof;
use zkl2_state::{
    block_commitment, compute_state_root, AccountLeaf, AssetLeaf, BlockCommitmentInput,
    LiquidityLeaf, NftLeaf, StateError, TreeForest,
};

use crate::{
    errors::{WitnessError, WitnessResult},
    record::{AssetDelta, LiquidityDelta, Registration, TxDetail, TxRecord},
    witness::{
        AccountWitness, AssetWitness, BlockWitness, ForestRoots, LiquidityWitness, NftWitness,
        TxWitness,
    },
};

/// Account touched by a transaction, with its assets in first-touch order.
#[derive(Debug)]
struct AccountSlot<'r> {
    index: u64,
    registration: Option<&'r Registration>,
    assets: Vec<u64>,
}

#[derive(Debug, Default)]
struct Touched<'r> {
    accounts: Vec<AccountSlot<'r>>,
    pair: Option<u64>,
    nft: Option<u64>,
}

fn check_sentinel(kind: &'static str, index: u64, sentinel: u64) -> WitnessResult<()> {
    if index == sentinel {
        return Err(WitnessError::SentinelCollision { kind, index });
    }
    Ok(())
}

fn touch_account<'a, 'r>(
    accounts: &'a mut Vec<AccountSlot<'r>>,
    index: u64,
) -> &'a mut AccountSlot<'r> {
    let pos = match accounts.iter().position(|slot| slot.index == index) {
        Some(pos) => pos,
        None => {
            accounts.push(AccountSlot {
                index,
                registration: None,
                assets: Vec::new(),
            });
            accounts.len() - 1
        }
    };
    &mut accounts[pos]
}

fn touch_once(
    slot: &mut Option<u64>,
    index: u64,
    kind: &'static str,
    tx_type: TxType,
) -> WitnessResult<()> {
    match *slot {
        Some(first) if first != index => Err(WitnessError::ConflictingLeaf {
            tx_type,
            kind,
            first,
            second: index,
        }),
        _ => {
            *slot = Some(index);
            Ok(())
        }
    }
}

/// Gathers the leaves a record touches and checks they fit the witness
/// shape.
fn collect(record: &TxRecord) -> WitnessResult<Touched<'_>> {
    let tx_type = record.tx_type();
    let mut touched = Touched::default();

    if let Some(reg) = &record.registration {
        check_sentinel("account index", reg.account_index, LAST_ACCOUNT_INDEX)?;
        touch_account(&mut touched.accounts, reg.account_index).registration = Some(reg);
    }

    for detail in &record.details {
        match detail {
            TxDetail::Asset {
                account_index,
                asset_id,
                ..
            } => {
                check_sentinel("account index", *account_index, LAST_ACCOUNT_INDEX)?;
                check_sentinel("asset id", *asset_id, LAST_ACCOUNT_ASSET_ID)?;
                let slot = touch_account(&mut touched.accounts, *account_index);
                if !slot.assets.contains(asset_id) {
                    slot.assets.push(*asset_id);
                }
            }
            TxDetail::Account { account_index } => {
                check_sentinel("account index", *account_index, LAST_ACCOUNT_INDEX)?;
                touch_account(&mut touched.accounts, *account_index);
            }
            TxDetail::Liquidity { pair_index, .. } => {
                check_sentinel("pair index", *pair_index, LAST_PAIR_INDEX)?;
                touch_once(&mut touched.pair, *pair_index, "liquidity", tx_type)?;
            }
            TxDetail::Nft { nft_index, .. } => {
                check_sentinel("nft index", *nft_index, LAST_NFT_INDEX)?;
                touch_once(&mut touched.nft, *nft_index, "nft", tx_type)?;
            }
        }
    }

    // The signer's nonce moves even if the record lists no leaf of it.
    if let Some(signer) = record.signer() {
        check_sentinel("account index", signer, LAST_ACCOUNT_INDEX)?;
        touch_account(&mut touched.accounts, signer);
    }

    if touched.accounts.len() > NB_ACCOUNTS_PER_TX {
        return Err(WitnessError::TooManyAccounts {
            tx_type,
            got: touched.accounts.len(),
            max: NB_ACCOUNTS_PER_TX,
        });
    }
    if let Some(slot) = touched
        .accounts
        .iter()
        .find(|slot| slot.assets.len() > NB_ACCOUNT_ASSETS_PER_ACCOUNT)
    {
        return Err(WitnessError::TooManyAssets {
            tx_type,
            account_index: slot.index,
            got: slot.assets.len(),
            max: NB_ACCOUNT_ASSETS_PER_ACCOUNT,
        });
    }
    Ok(touched)
}

/// `value + delta`, or `None` if the result leaves the unsigned range.
fn add_signed(value: U256, delta: I256) -> Option<U256> {
    if delta.is_negative() {
        value.checked_sub(delta.unsigned_abs())
    } else {
        value.checked_add(delta.into_raw())
    }
}

fn apply_asset_delta(
    leaf: &mut AssetLeaf,
    delta: &AssetDelta,
    account_index: u64,
    asset_id: u64,
) -> WitnessResult<()> {
    let out_of_range = |field| WitnessError::NegativeBalance {
        account_index,
        asset_id,
        field,
    };
    leaf.balance =
        add_signed(leaf.balance, delta.balance).ok_or_else(|| out_of_range("balance"))?;
    leaf.lp_amount =
        add_signed(leaf.lp_amount, delta.lp_amount).ok_or_else(|| out_of_range("lp_amount"))?;
    if let Some(bits) = delta.offer_canceled_or_finalized {
        leaf.offer_canceled_or_finalized = bits;
    }
    Ok(())
}

fn apply_liquidity_delta(
    leaf: &mut LiquidityLeaf,
    delta: &LiquidityDelta,
    pair_index: u64,
) -> WitnessResult<()> {
    match delta {
        LiquidityDelta::Create {
            asset_a_id,
            asset_b_id,
            fee_rate,
            treasury_account_index,
            treasury_rate,
        } => {
            *leaf = LiquidityLeaf::with_rates(
                *asset_a_id,
                *asset_b_id,
                *fee_rate,
                *treasury_account_index,
                *treasury_rate,
            );
        }
        LiquidityDelta::Rates {
            fee_rate,
            treasury_account_index,
            treasury_rate,
        } => {
            leaf.fee_rate = *fee_rate;
            leaf.treasury_account_index = *treasury_account_index;
            leaf.treasury_rate = *treasury_rate;
        }
        LiquidityDelta::Reserves {
            asset_a,
            asset_b,
            lp_amount,
            k_last,
        } => {
            let negative = |field| WitnessError::NegativeReserve { pair_index, field };
            leaf.asset_a = add_signed(leaf.asset_a, *asset_a).ok_or_else(|| negative("asset_a"))?;
            leaf.asset_b = add_signed(leaf.asset_b, *asset_b).ok_or_else(|| negative("asset_b"))?;
            leaf.lp_amount =
                add_signed(leaf.lp_amount, *lp_amount).ok_or_else(|| negative("lp_amount"))?;
            if let Some(k) = k_last {
                leaf.k_last = *k;
            }
        }
    }
    Ok(())
}

fn checked(proof: MerkleProof, height: u8) -> WitnessResult<MerkleProof> {
    proof.check_height(height)?;
    Ok(proof)
}

/// Builds transaction and block witnesses by mutating a forest in place.
///
/// A failed transaction may leave partial writes behind. The block builder
/// discards them; callers driving [`Self::build_tx`] directly must call
/// [`TreeForest::discard_pending`] themselves before retrying.
#[derive(Debug)]
pub struct WitnessBuilder<'f> {
    forest: &'f mut TreeForest,
}

impl<'f> WitnessBuilder<'f> {
    pub fn new(forest: &'f mut TreeForest) -> Self {
        Self { forest }
    }

    pub fn forest(&self) -> &TreeForest {
        self.forest
    }

    fn roots(&self) -> WitnessResult<ForestRoots> {
        let account = self.forest.account_root()?;
        let liquidity = self.forest.liquidity_root()?;
        let nft = self.forest.nft_root()?;
        Ok(ForestRoots {
            account,
            liquidity,
            nft,
            state: compute_state_root(&account, &liquidity, &nft),
        })
    }

    fn padded_asset(&mut self, account_index: Option<u64>) -> WitnessResult<AssetWitness> {
        let proof = match account_index {
            Some(index) => self.forest.asset_proof(index, LAST_ACCOUNT_ASSET_ID)?,
            None => self.forest.nil_asset_proof(LAST_ACCOUNT_ASSET_ID),
        };
        Ok(AssetWitness {
            asset_id: LAST_ACCOUNT_ASSET_ID,
            before: AssetLeaf::default(),
            after: AssetLeaf::default(),
            proof: checked(proof, ASSET_TREE_HEIGHT)?,
        })
    }

    fn padded_account(&mut self) -> WitnessResult<AccountWitness> {
        let leaf = self.forest.empty_account_leaf();
        let proof = checked(
            self.forest.account_proof(LAST_ACCOUNT_INDEX)?,
            ACCOUNT_TREE_HEIGHT,
        )?;
        let asset = self.padded_asset(None)?;
        Ok(AccountWitness {
            account_index: LAST_ACCOUNT_INDEX,
            before: leaf.clone(),
            after: leaf,
            proof,
            assets: vec![asset; NB_ACCOUNT_ASSETS_PER_ACCOUNT],
        })
    }

    fn snapshot_account(&mut self, slot: &AccountSlot<'_>) -> WitnessResult<AccountWitness> {
        let index = slot.index;
        let (before, after) = match slot.registration {
            Some(reg) => {
                let next = self.forest.account_count()?;
                if index != next {
                    return Err(WitnessError::RegistrationOutOfOrder { index, next });
                }
                let nil_root = self.forest.create_asset_tree(index)?;
                let before = self.forest.empty_account_leaf();
                let after = AccountLeaf::new(reg.l1_address_hash, reg.public_key, nil_root);
                (before, after)
            }
            None => {
                let leaf = self
                    .forest
                    .account(index)?
                    .ok_or(StateError::AccountNotRegistered(index))?;
                (leaf.clone(), leaf)
            }
        };
        let proof = checked(self.forest.account_proof(index)?, ACCOUNT_TREE_HEIGHT)?;

        let mut assets = Vec::with_capacity(NB_ACCOUNT_ASSETS_PER_ACCOUNT);
        for &asset_id in &slot.assets {
            let leaf = self.forest.asset(index, asset_id)?;
            let proof = checked(self.forest.asset_proof(index, asset_id)?, ASSET_TREE_HEIGHT)?;
            assets.push(AssetWitness {
                asset_id,
                before: leaf.clone(),
                after: leaf,
                proof,
            });
        }
        if assets.len() < NB_ACCOUNT_ASSETS_PER_ACCOUNT {
            let pad = self.padded_asset(Some(index))?;
            assets.resize(NB_ACCOUNT_ASSETS_PER_ACCOUNT, pad);
        }

        Ok(AccountWitness {
            account_index: index,
            before,
            after,
            proof,
            assets,
        })
    }

    fn snapshot_liquidity(&self, pair: Option<u64>) -> WitnessResult<LiquidityWitness> {
        let pair_index = pair.unwrap_or(LAST_PAIR_INDEX);
        let leaf = match pair {
            Some(index) => self.forest.liquidity(index)?,
            None => LiquidityLeaf::default(),
        };
        let proof = checked(
            self.forest.liquidity_proof(pair_index)?,
            LIQUIDITY_TREE_HEIGHT,
        )?;
        Ok(LiquidityWitness {
            pair_index,
            before: leaf.clone(),
            after: leaf,
            proof,
        })
    }

    fn snapshot_nft(&self, nft: Option<u64>) -> WitnessResult<NftWitness> {
        let nft_index = nft.unwrap_or(LAST_NFT_INDEX);
        let leaf = match nft {
            Some(index) => self.forest.nft(index)?,
            None => NftLeaf::default(),
        };
        let proof = checked(self.forest.nft_proof(nft_index)?, NFT_TREE_HEIGHT)?;
        Ok(NftWitness {
            nft_index,
            before: leaf.clone(),
            after: leaf,
            proof,
        })
    }

    /// Applies one transaction to the forest and returns its witness. The
    /// forest is left with the writes pending; nothing is committed.
    pub fn build_tx(&mut self, record: &TxRecord) -> WitnessResult<TxWitness> {
        let tx_type = record.tx_type();
        let touched = collect(record)?;
        let roots_before = self.roots()?;

        // Snapshot every before leaf and proof, padding included.
        let mut accounts = Vec::with_capacity(NB_ACCOUNTS_PER_TX);
        for slot in &touched.accounts {
            accounts.push(self.snapshot_account(slot)?);
        }
        let real_accounts = accounts.len();
        if real_accounts < NB_ACCOUNTS_PER_TX {
            let pad = self.padded_account()?;
            accounts.resize(NB_ACCOUNTS_PER_TX, pad);
        }
        let mut liquidity = self.snapshot_liquidity(touched.pair)?;
        let mut nft = self.snapshot_nft(touched.nft)?;

        // Fold the deltas into the after leaves in record order.
        for detail in &record.details {
            match detail {
                TxDetail::Asset {
                    account_index,
                    asset_id,
                    delta,
                } => {
                    let asset = accounts[..real_accounts]
                        .iter_mut()
                        .filter(|a| a.account_index == *account_index)
                        .flat_map(|a| a.assets.iter_mut())
                        .find(|a| a.asset_id == *asset_id);
                    // Every asset detail was given a slot by `collect`.
                    if let Some(asset) = asset {
                        apply_asset_delta(&mut asset.after, delta, *account_index, *asset_id)?;
                    }
                }
                TxDetail::Account { .. } => {}
                TxDetail::Liquidity { pair_index, delta } => {
                    apply_liquidity_delta(&mut liquidity.after, delta, *pair_index)?;
                }
                TxDetail::Nft { leaf, .. } => nft.after = leaf.clone(),
            }
        }

        // Write assets, then the account leaves that commit to them.
        let signer = record.signer();
        for account in accounts[..real_accounts].iter_mut() {
            let index = account.account_index;
            for asset in account
                .assets
                .iter()
                .filter(|a| a.asset_id != LAST_ACCOUNT_ASSET_ID)
            {
                self.forest.set_asset(index, asset.asset_id, &asset.after)?;
            }
            account.after.asset_root = self.forest.asset_root(index)?;
            if signer == Some(index) {
                account.after.nonce += 1;
                if tx_type == TxType::CreateCollection {
                    account.after.collection_nonce += 1;
                }
            }
            self.forest.set_account(index, &account.after)?;
        }
        if touched.pair.is_some() {
            self.forest
                .set_liquidity(liquidity.pair_index, &liquidity.after)?;
        }
        if touched.nft.is_some() {
            self.forest.set_nft(nft.nft_index, &nft.after)?;
        }

        let roots_after = self.roots()?;
        debug!(?tx_type, accounts = real_accounts, state_root = %roots_after.state, "built tx witness");
        Ok(TxWitness {
            pubdata: record.pubdata.clone(),
            roots_before,
            roots_after,
            accounts,
            liquidity,
            nft,
        })
    }

    fn apply_all(&mut self, height: u64, records: &[TxRecord]) -> WitnessResult<Buf32> {
        for record in records {
            self.build_tx(record)?;
        }
        Ok(self.forest.commit(height)?)
    }

    /// Builds the witnesses of a block, pads it with empty transactions up
    /// to `block_size` and commits the forest at `height`.
    ///
    /// Any failure discards the block's writes, leaving the forest at its
    /// last committed version.
    pub fn build_block(
        &mut self,
        height: u64,
        created_at: u64,
        records: &[TxRecord],
        block_size: usize,
    ) -> WitnessResult<BlockWitness> {
        if records.len() > block_size {
            return Err(WitnessError::BlockOverflow {
                got: records.len(),
                size: block_size,
            });
        }
        if self.forest.has_pending() {
            return Err(WitnessError::PendingWrites(height));
        }

        match self.build_block_inner(height, created_at, records, block_size) {
            Ok(block) => Ok(block),
            Err(err) => {
                self.forest.discard_pending();
                error!(height, ?err, "block witness aborted");
                Err(err)
            }
        }
    }

    fn build_block_inner(
        &mut self,
        height: u64,
        created_at: u64,
        records: &[TxRecord],
        block_size: usize,
    ) -> WitnessResult<BlockWitness> {
        let old_state_root = self.forest.state_root()?;
        let padding = TxRecord::empty();
        let padded = records
            .iter()
            .chain(iter::repeat(&padding).take(block_size - records.len()));

        let mut txs = Vec::with_capacity(block_size);
        let mut pubdata = Vec::with_capacity(block_size * PUBDATA_BYTES_PER_TX);
        let mut on_chain_ops_count = 0;
        for record in padded {
            txs.push(self.build_tx(record)?);
            pubdata.extend(record.pubdata.encode()?);
            if record.pubdata.is_on_chain_op() {
                on_chain_ops_count += 1;
            }
        }

        let new_state_root = self.forest.commit(height)?;
        let commitment = block_commitment(&BlockCommitmentInput {
            height,
            created_at,
            old_state_root,
            new_state_root,
            pubdata: &pubdata,
            on_chain_ops_count,
        });
        info!(height, txs = records.len(), %new_state_root, %commitment, "built block witness");

        Ok(BlockWitness {
            height,
            created_at,
            old_state_root,
            new_state_root,
            pubdata,
            on_chain_ops_count,
            commitment,
            txs,
        })
    }
}

/// Folds a block's records into the forest without keeping witnesses, then
/// commits at `height` and returns the new state root. Any failure discards
/// the block's writes.
pub fn apply_block(
    forest: &mut TreeForest,
    height: u64,
    records: &[TxRecord],
) -> WitnessResult<Buf32> {
    if forest.has_pending() {
        return Err(WitnessError::PendingWrites(height));
    }
    let mut builder = WitnessBuilder::new(forest);
    let res = builder.apply_all(height, records);
    if res.is_err() {
        builder.forest.discard_pending();
    }
    res
}
