//! Binary entry-point for the offline state tree tool.
//!
//! Reads the TOML config, opens the configured tree driver and runs one
//! subcommand against it.
mod cli;
mod cmd;
mod output;

use std::process;

use anyhow::Context;
use zkl2_common::logging::{self, LoggerConfig};
use zkl2_config::Config;
use zkl2_storage::create_tree_storage;

use crate::{
    cli::{Cli, Command},
    cmd::{
        bootstrap::bootstrap, decode::decode_pubdata, replay::replay, rollback::rollback,
        root::get_root,
    },
};

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config {
        Some(path) => {
            Config::from_file(path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

fn main() {
    let cli: Cli = argh::from_env();

    let config = load_config(&cli).unwrap_or_else(|e| {
        eprintln!("{e:#}");
        process::exit(1);
    });

    let logger = LoggerConfig::from_config("zkl2-statetool".to_string(), &config.logging);
    if let Err(e) = logging::init(logger) {
        eprintln!("{e}");
        process::exit(1);
    }

    // Only commands touching the trees open the driver.
    let storage = || create_tree_storage(&config.tree_db);
    let result = match cli.cmd {
        Command::GetRoot(args) => storage().and_then(|s| get_root(&s, args)),
        Command::Replay(args) => storage().and_then(|s| replay(&s, args)),
        Command::Rollback(args) => storage().and_then(|s| rollback(&s, args)),
        Command::Bootstrap(args) => storage().and_then(|s| bootstrap(&s, args)),
        Command::DecodePubdata(args) => decode_pubdata(args),
    };

    if let Err(e) = result {
        eprintln!("{e:#}");
        process::exit(1);
    }
}
