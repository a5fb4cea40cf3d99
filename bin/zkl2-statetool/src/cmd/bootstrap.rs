use std::{fs, path::PathBuf, sync::Arc};

use anyhow::Context;
use argh::FromArgs;
use zkl2_state::LeafSnapshot;
use zkl2_storage::TreeStorage;

use crate::{
    cli::OutputFormat,
    output::{output, BootstrapInfo},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "bootstrap")]
/// Rebuild empty state trees from a JSON leaf snapshot
pub(crate) struct BootstrapArgs {
    /// path to the leaf snapshot
    #[argh(positional)]
    pub(crate) snapshot: PathBuf,

    /// output format: "json" or "porcelain"
    #[argh(option, short = 'o', default = "OutputFormat::Porcelain")]
    pub(crate) output_format: OutputFormat,
}

pub(crate) fn bootstrap(storage: &TreeStorage, args: BootstrapArgs) -> anyhow::Result<()> {
    let raw = fs::read_to_string(&args.snapshot)
        .with_context(|| format!("reading {}", args.snapshot.display()))?;
    let snapshot: LeafSnapshot = serde_json::from_str(&raw).context("parsing leaf snapshot")?;
    let height = snapshot.height;

    let forest = storage.bootstrap_forest(Arc::new(snapshot), height)?;
    forest.flush()?;

    let info = BootstrapInfo {
        height,
        account_count: forest.account_count()?,
        state_root: forest.state_root()?,
    };
    output(&info, args.output_format)
}
