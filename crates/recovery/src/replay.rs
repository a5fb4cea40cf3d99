//! Desert replay: rebuilding the forest from the pubdata posted on L1.

use serde::{Deserialize, Serialize};
use tracing::*;
use zkl2_primitives::Buf32;
use zkl2_pubdata::decode_batch;
use zkl2_state::TreeForest;
use zkl2_witness::{WitnessBuilder, WitnessError};

use crate::{
    effects::derive_record,
    errors::{RecoveryError, RecoveryResult},
};

/// A block as posted on L1: its pubdata and the state root it commits to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayBlock {
    pub height: u64,
    #[serde(with = "hex::serde")]
    pub pubdata: Vec<u8>,
    pub state_root: Buf32,
}

/// Replays posted blocks onto a forest, one height at a time, checking every
/// recomputed state root against the posted one.
///
/// A mismatch halts the replay and leaves the forest at the last verified
/// height.
#[derive(Debug)]
pub struct DesertReplayer<'f> {
    forest: &'f mut TreeForest,
}

impl<'f> DesertReplayer<'f> {
    pub fn new(forest: &'f mut TreeForest) -> Self {
        Self { forest }
    }

    pub fn forest(&self) -> &TreeForest {
        self.forest
    }

    /// Height of the last verified block.
    pub fn height(&self) -> u64 {
        self.forest.height()
    }

    /// Replays one block and commits it if its state root matches.
    pub fn replay_block(&mut self, block: &ReplayBlock) -> RecoveryResult<Buf32> {
        let expected = self.forest.height() + 1;
        if block.height != expected {
            return Err(RecoveryError::NonSequentialBlock {
                expected,
                got: block.height,
            });
        }
        if self.forest.has_pending() {
            return Err(WitnessError::PendingWrites(block.height).into());
        }

        match self.apply(block) {
            Ok(()) => {
                let root = self.forest.commit(block.height)?;
                info!(height = block.height, %root, "replayed block");
                Ok(root)
            }
            Err(err) => {
                self.forest.discard_pending();
                error!(height = block.height, %err, "desert replay halted");
                Err(err)
            }
        }
    }

    fn apply(&mut self, block: &ReplayBlock) -> RecoveryResult<()> {
        let txs = decode_batch(&block.pubdata)?;
        debug!(height = block.height, txs = txs.len(), "decoded block pubdata");
        for pubdata in txs {
            let record = derive_record(self.forest, pubdata)?;
            WitnessBuilder::new(self.forest).build_tx(&record)?;
        }

        let got = self.forest.state_root()?;
        if got != block.state_root {
            return Err(RecoveryError::StateRootMismatch {
                height: block.height,
                expected: block.state_root,
                got,
            });
        }
        Ok(())
    }

    /// Replays blocks in order and returns the last verified state root.
    pub fn replay<'b>(
        &mut self,
        blocks: impl IntoIterator<Item = &'b ReplayBlock>,
    ) -> RecoveryResult<Buf32> {
        let mut root = self.forest.state_root()?;
        for block in blocks {
            root = self.replay_block(block)?;
        }
        Ok(root)
    }
}
