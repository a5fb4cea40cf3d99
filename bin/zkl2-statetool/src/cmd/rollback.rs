use argh::FromArgs;
use tracing::*;
use zkl2_storage::TreeStorage;

use crate::{
    cli::OutputFormat,
    output::{output, RollbackInfo},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "rollback")]
/// Roll the state trees back to an earlier height
pub(crate) struct RollbackArgs {
    /// height the trees are currently committed at
    #[argh(option, short = 'f')]
    pub(crate) from: u64,

    /// height to roll back to
    #[argh(positional)]
    pub(crate) height: u64,

    /// output format: "json" or "porcelain"
    #[argh(option, short = 'o', default = "OutputFormat::Porcelain")]
    pub(crate) output_format: OutputFormat,
}

pub(crate) fn rollback(storage: &TreeStorage, args: RollbackArgs) -> anyhow::Result<()> {
    if args.height > args.from {
        anyhow::bail!(
            "cannot roll back from {} forward to {}",
            args.from,
            args.height
        );
    }

    let mut forest = storage.open_forest(args.from)?;
    forest.rollback(args.height)?;
    forest.flush()?;
    let state_root = forest.state_root()?;
    info!(from = args.from, height = args.height, %state_root, "rolled back state trees");

    let info = RollbackInfo {
        from_height: args.from,
        height: args.height,
        state_root,
    };
    output(&info, args.output_format)
}
