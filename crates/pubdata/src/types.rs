use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// Transaction type tag, the first byte of every pubdata record.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum TxType {
    Empty = 0,
    RegisterZns = 1,
    CreatePair = 2,
    UpdatePairRate = 3,
    Deposit = 4,
    DepositNft = 5,
    Transfer = 6,
    Swap = 7,
    AddLiquidity = 8,
    RemoveLiquidity = 9,
    Withdraw = 10,
    CreateCollection = 11,
    MintNft = 12,
    TransferNft = 13,
    AtomicMatch = 14,
    CancelOffer = 15,
    WithdrawNft = 16,
    FullExit = 17,
    FullExitNft = 18,
}

impl TxType {
    /// Length of the unpadded record, tag included.
    pub const fn record_size(self) -> usize {
        match self {
            Self::Empty => 1,
            Self::RegisterZns => 101,
            Self::CreatePair => 15,
            Self::UpdatePairRate => 11,
            Self::Deposit => 43,
            Self::DepositNft => 102,
            Self::Transfer => 56,
            Self::Swap => 39,
            Self::AddLiquidity | Self::RemoveLiquidity => 38,
            Self::Withdraw => 51,
            Self::CreateCollection => 15,
            Self::MintNft => 58,
            Self::TransferNft => 54,
            Self::AtomicMatch => 44,
            Self::CancelOffer => 16,
            Self::WithdrawNft => 130,
            Self::FullExit => 43,
            Self::FullExitNft => 122,
        }
    }

    /// Whether the transaction is submitted on L1 and has no L2 signer.
    pub const fn is_priority_op(self) -> bool {
        matches!(
            self,
            Self::RegisterZns
                | Self::CreatePair
                | Self::UpdatePairRate
                | Self::Deposit
                | Self::DepositNft
                | Self::FullExit
                | Self::FullExitNft
        )
    }

    /// Whether the L1 contract must process the record when the block is
    /// verified.
    pub const fn is_on_chain_op(self) -> bool {
        self.is_priority_op() || matches!(self, Self::Withdraw | Self::WithdrawNft)
    }

    pub const fn all() -> [TxType; 19] {
        [
            Self::Empty,
            Self::RegisterZns,
            Self::CreatePair,
            Self::UpdatePairRate,
            Self::Deposit,
            Self::DepositNft,
            Self::Transfer,
            Self::Swap,
            Self::AddLiquidity,
            Self::RemoveLiquidity,
            Self::Withdraw,
            Self::CreateCollection,
            Self::MintNft,
            Self::TransferNft,
            Self::AtomicMatch,
            Self::CancelOffer,
            Self::WithdrawNft,
            Self::FullExit,
            Self::FullExitNft,
        ]
    }
}
