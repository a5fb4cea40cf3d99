use std::{fs, path::Path, sync::Arc};

use anyhow::Context;
use tracing::*;

use crate::{SledDbConfig, SledTreeStore, SLED_TREE_NAME};

// Opens the sled database holding the state trees under datadir
pub fn open_sled_database(
    datadir: &Path,
    dbname: &str,
    config: &SledDbConfig,
) -> anyhow::Result<Arc<SledTreeStore>> {
    let mut database_dir = datadir.to_path_buf();
    database_dir.push("sled");
    database_dir.push(dbname);

    if !database_dir.exists() {
        fs::create_dir_all(&database_dir)?;
    }

    let sled_db = config
        .to_sled_config()
        .path(&database_dir)
        .open()
        .context("opening sled database")?;
    let tree = sled_db
        .open_tree(SLED_TREE_NAME)
        .context("opening sled state tree")?;

    info!(path = %database_dir.display(), "opened sled tree store");
    Ok(Arc::new(SledTreeStore::new(tree)))
}
