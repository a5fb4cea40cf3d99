//! Driver selection for the state trees.

use std::sync::Arc;

use anyhow::Context;
use tracing::*;
use zkl2_config::{DriverConfig, TreeDbConfig};
use zkl2_db_store_memory::MemoryTreeStore;
use zkl2_db_store_redis::{RedisDbConfig, RedisTreeStore};
use zkl2_db_store_sled::{open_sled_database, SledDbConfig};
use zkl2_db_types::{TreeStore, Version};
use zkl2_state::{BootstrapConfig, ForestConfig, LeafSource, TreeForest};

/// A tree store together with the configuration its forests are opened
/// with.
#[derive(Clone, Debug)]
pub struct TreeStorage {
    store: Arc<dyn TreeStore>,
    config: TreeDbConfig,
}

impl TreeStorage {
    pub fn new(store: Arc<dyn TreeStore>, config: TreeDbConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    pub fn config(&self) -> &TreeDbConfig {
        &self.config
    }

    pub fn forest_config(&self) -> ForestConfig {
        ForestConfig::new(self.config.name.clone())
            .with_retain_versions(self.config.retain_versions)
    }

    pub fn bootstrap_config(&self) -> BootstrapConfig {
        BootstrapConfig::new(self.config.batch_reload_size, self.config.bootstrap_workers)
    }

    /// Opens the forest at block `height`.
    pub fn open_forest(&self, height: Version) -> anyhow::Result<TreeForest> {
        TreeForest::open(self.store.clone(), self.forest_config(), height)
            .with_context(|| format!("opening forest {} at {height}", self.config.name))
    }

    /// Rebuilds the forest at `height` from `source` into an empty store.
    pub fn bootstrap_forest(
        &self,
        source: Arc<dyn LeafSource>,
        height: Version,
    ) -> anyhow::Result<TreeForest> {
        TreeForest::bootstrap(
            self.store.clone(),
            self.forest_config(),
            source,
            height,
            &self.bootstrap_config(),
        )
        .with_context(|| format!("bootstrapping forest {} at {height}", self.config.name))
    }
}

/// Opens the driver selected by `config`.
pub fn create_tree_store(config: &TreeDbConfig) -> anyhow::Result<Arc<dyn TreeStore>> {
    let store: Arc<dyn TreeStore> = match &config.driver {
        DriverConfig::Memory => Arc::new(MemoryTreeStore::new()),
        DriverConfig::Sled {
            path,
            cache_capacity,
            flush_every_ms,
        } => {
            let sled_config = SledDbConfig::new(*cache_capacity, *flush_every_ms);
            open_sled_database(path, &config.name, &sled_config)?
        }
        DriverConfig::Redis {
            url,
            username,
            password,
        } => {
            let redis_config = RedisDbConfig::new(url.clone())
                .with_credentials(username.clone(), password.clone());
            let store = RedisTreeStore::connect(&redis_config)
                .with_context(|| format!("connecting redis tree store at {url}"))?;
            Arc::new(store)
        }
    };
    info!(name = %config.name, driver = ?store, "created tree store");
    Ok(store)
}

/// Validates `config` and opens its driver.
pub fn create_tree_storage(config: &TreeDbConfig) -> anyhow::Result<TreeStorage> {
    config.validate().context("validating tree_db config")?;
    let store = create_tree_store(config)?;
    Ok(TreeStorage::new(store, config.clone()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use zkl2_primitives::Buf32;
    use zkl2_state::{AccountLeaf, AssetLeaf, NftLeaf};

    use super::*;

    fn sled_config(path: PathBuf) -> TreeDbConfig {
        TreeDbConfig {
            driver: DriverConfig::Sled {
                path,
                cache_capacity: 8 * 1024 * 1024,
                flush_every_ms: None,
            },
            ..TreeDbConfig::memory("drivers")
        }
    }

    /// Registers two accounts, funds one and mints an NFT, committing each
    /// step at its own height.
    fn populate(forest: &mut TreeForest) {
        for index in 0..2u64 {
            let asset_root = forest.create_asset_tree(index).unwrap();
            let hash = Buf32::new([index as u8 + 1; 32]);
            let leaf = AccountLeaf::new(hash, Buf32::zero(), asset_root);
            forest.set_account(index, &leaf).unwrap();
        }
        forest.commit(1).unwrap();

        let asset = AssetLeaf::from_decimal("1000", "0", "0").unwrap();
        forest.set_asset(1, 0, &asset).unwrap();
        let mut account = forest.account(1).unwrap().unwrap();
        account.asset_root = forest.asset_root(1).unwrap();
        forest.set_account(1, &account).unwrap();
        let nft = NftLeaf {
            creator_account_index: 1,
            owner_account_index: 0,
            content_hash: Buf32::new([7; 32]),
            ..Default::default()
        };
        forest.set_nft(3, &nft).unwrap();
        forest.commit(2).unwrap();
    }

    #[test]
    fn test_memory_and_sled_agree() {
        let dir = tempfile::tempdir().unwrap();
        let mut roots = Vec::new();
        for config in [TreeDbConfig::memory("drivers"), sled_config(dir.path().into())] {
            let storage = create_tree_storage(&config).unwrap();
            let mut forest = storage.open_forest(0).unwrap();
            populate(&mut forest);
            roots.push(forest.state_root().unwrap());
        }
        assert_eq!(roots[0], roots[1]);
    }

    #[test]
    fn test_sled_forest_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = sled_config(dir.path().into());
        let root = {
            let storage = create_tree_storage(&config).unwrap();
            let mut forest = storage.open_forest(0).unwrap();
            populate(&mut forest);
            forest.flush().unwrap();
            forest.state_root().unwrap()
        };

        let storage = create_tree_storage(&config).unwrap();
        let forest = storage.open_forest(2).unwrap();
        assert_eq!(forest.state_root().unwrap(), root);
        assert_eq!(forest.account_count().unwrap(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TreeDbConfig {
            batch_reload_size: 0,
            ..TreeDbConfig::memory("bad")
        };
        assert!(create_tree_storage(&config).is_err());
    }

    #[test]
    fn test_forest_config_carries_retention() {
        let config = TreeDbConfig {
            retain_versions: Some(16),
            ..TreeDbConfig::memory("retained")
        };
        let storage = create_tree_storage(&config).unwrap();
        let forest_config = storage.forest_config();
        assert_eq!(forest_config.name, "retained");
        assert_eq!(forest_config.retain_versions, Some(16));
        assert_eq!(storage.bootstrap_config().batch_size, config.batch_reload_size);
    }
}
