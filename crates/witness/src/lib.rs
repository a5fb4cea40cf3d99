//! Witness construction: folds decided transaction effects into a
//! [`TreeForest`](zkl2_state::TreeForest) and records the fixed-shape
//! before/after bundles the circuit consumes.

mod builder;
mod errors;
mod record;
mod witness;

pub use builder::{apply_block, WitnessBuilder};
pub use errors::{WitnessError, WitnessResult};
pub use record::{AssetDelta, LiquidityDelta, Registration, TxDetail, TxRecord};
pub use witness::{
    AccountWitness, AssetWitness, BlockWitness, ForestRoots, LiquidityWitness, NftWitness,
    TxWitness,
};
