//! Fixed-stride block pubdata: packed amounts, per-type transaction records
//! and the batch decoder used by L1 replay.

mod codec;
mod errors;
mod packed;
mod tx;
mod types;

pub use errors::{PubDataError, PubDataResult};
pub use packed::{PackedAmount, PackedFee, PACKED_AMOUNT_MAX_MANTISSA, PACKED_FEE_MAX_MANTISSA};
pub use tx::{
    decode_batch, encode_batch, AtomicMatchPubData, CancelOfferPubData, CreateCollectionPubData,
    CreatePairPubData, DepositNftPubData, DepositPubData, FullExitNftPubData, FullExitPubData,
    GasFee, LiquidityPubData, MintNftPubData, RegisterZnsPubData, SwapPubData, TransferNftPubData,
    TransferPubData, TxPubData, UpdatePairRatePubData, WithdrawNftPubData, WithdrawPubData,
};
pub use types::TxType;
