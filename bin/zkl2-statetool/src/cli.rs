use std::{path::PathBuf, str::FromStr};

use argh::FromArgs;

use crate::cmd::{
    bootstrap::BootstrapArgs, decode::DecodePubdataArgs, replay::ReplayArgs,
    rollback::RollbackArgs, root::GetRootArgs,
};

/// Offline tool for the rollup state trees.
#[derive(FromArgs, Debug)]
pub(crate) struct Cli {
    /// path to the TOML config; the in-memory driver is used when absent
    #[argh(option, short = 'c')]
    pub(crate) config: Option<PathBuf>,

    #[argh(subcommand)]
    pub(crate) cmd: Command,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
pub(crate) enum Command {
    GetRoot(GetRootArgs),
    Replay(ReplayArgs),
    Rollback(RollbackArgs),
    Bootstrap(BootstrapArgs),
    DecodePubdata(DecodePubdataArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Json,
    Porcelain,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "porcelain" => Ok(Self::Porcelain),
            other => Err(format!(
                "unknown output format {other:?}, expected \"json\" or \"porcelain\""
            )),
        }
    }
}
