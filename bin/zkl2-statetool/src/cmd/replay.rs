use std::{fs, path::PathBuf};

use anyhow::Context;
use argh::FromArgs;
use tracing::*;
use zkl2_recovery::{DesertReplayer, ReplayBlock};
use zkl2_storage::TreeStorage;

use crate::{
    cli::OutputFormat,
    output::{output, ReplayInfo},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "replay")]
/// Replay posted block pubdata onto the state trees, verifying each root
pub(crate) struct ReplayArgs {
    /// JSON array of blocks with height, pubdata and state_root
    #[argh(positional)]
    pub(crate) blocks: PathBuf,

    /// height the trees are committed at before the first block
    #[argh(option, default = "0")]
    pub(crate) height: u64,

    /// output format: "json" or "porcelain"
    #[argh(option, short = 'o', default = "OutputFormat::Porcelain")]
    pub(crate) output_format: OutputFormat,
}

pub(crate) fn replay(storage: &TreeStorage, args: ReplayArgs) -> anyhow::Result<()> {
    let raw = fs::read_to_string(&args.blocks)
        .with_context(|| format!("reading {}", args.blocks.display()))?;
    let blocks: Vec<ReplayBlock> = serde_json::from_str(&raw).context("parsing replay blocks")?;
    let info = replay_blocks(storage, args.height, &blocks)?;
    output(&info, args.output_format)
}

/// Replays `blocks` onto the forest committed at `from_height`.
///
/// Blocks verified before a failure stay committed and are flushed.
fn replay_blocks(
    storage: &TreeStorage,
    from_height: u64,
    blocks: &[ReplayBlock],
) -> anyhow::Result<ReplayInfo> {
    let mut forest = storage.open_forest(from_height)?;
    let result = DesertReplayer::new(&mut forest).replay(blocks);
    forest.flush()?;

    let state_root = result.with_context(|| {
        format!("replay halted, trees left at height {}", forest.height())
    })?;
    info!(from_height, height = forest.height(), %state_root, "replay finished");
    Ok(ReplayInfo {
        from_height,
        height: forest.height(),
        blocks: blocks.len(),
        state_root,
    })
}
