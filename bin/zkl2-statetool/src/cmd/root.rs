use argh::FromArgs;
use zkl2_storage::TreeStorage;

use crate::{
    cli::OutputFormat,
    output::{output, RootInfo},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "get-root")]
/// Get the committed state root at a height
pub(crate) struct GetRootArgs {
    /// block height
    #[argh(positional)]
    pub(crate) height: u64,

    /// output format: "json" or "porcelain"
    #[argh(option, short = 'o', default = "OutputFormat::Porcelain")]
    pub(crate) output_format: OutputFormat,
}

pub(crate) fn get_root(storage: &TreeStorage, args: GetRootArgs) -> anyhow::Result<()> {
    let info = root_info(storage, args.height)?;
    output(&info, args.output_format)
}

fn root_info(storage: &TreeStorage, height: u64) -> anyhow::Result<RootInfo> {
    let forest = storage.open_forest(height)?;
    Ok(RootInfo {
        height,
        state_root: forest.state_root_at(height)?,
        account_count: forest.account_count()?,
    })
}

#[cfg(test)]
mod tests {
    use zkl2_config::{DriverConfig, TreeDbConfig};
    use zkl2_primitives::Buf32;
    use zkl2_state::AccountLeaf;
    use zkl2_storage::create_tree_storage;

    use super::*;

    #[test]
    fn test_root_info_at_committed_height() {
        let dir = tempfile::tempdir().unwrap();
        let config = TreeDbConfig {
            driver: DriverConfig::Sled {
                path: dir.path().into(),
                cache_capacity: 8 * 1024 * 1024,
                flush_every_ms: None,
            },
            ..TreeDbConfig::memory("roots")
        };
        let storage = create_tree_storage(&config).unwrap();
        let expected = {
            let mut forest = storage.open_forest(0).unwrap();
            let asset_root = forest.create_asset_tree(0).unwrap();
            let leaf = AccountLeaf::new(Buf32::new([1; 32]), Buf32::zero(), asset_root);
            forest.set_account(0, &leaf).unwrap();
            let root = forest.commit(1).unwrap();
            forest.flush().unwrap();
            root
        };

        let info = root_info(&storage, 1).unwrap();
        assert_eq!(info.state_root, expected);
        assert_eq!(info.account_count, 1);
    }
}
