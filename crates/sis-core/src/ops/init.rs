//! Installation root setup.

use std::path::PathBuf;

use thiserror::Error;

use crate::paths::InstallRoot;
use crate::store::{StateDb, StoreError};

#[derive(Error, Debug)]
pub enum InitError {
    #[error("cannot create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create the root, its log directory and an empty database.
///
/// Running it on an existing root leaves installed packages alone.
pub fn init_root(root: &InstallRoot) -> Result<StateDb, InitError> {
    for dir in [root.path().to_path_buf(), root.log_dir()] {
        std::fs::create_dir_all(&dir).map_err(|source| InitError::CreateDir { path: dir, source })?;
    }
    let db = StateDb::open(root)?;
    db.ensure_exists()?;
    tracing::debug!(root = %root.path().display(), "installation root ready");
    Ok(db)
}
