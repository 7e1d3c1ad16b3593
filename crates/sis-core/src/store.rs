//! XML state database
//!
//! Tracks installed packages and the actions that placed their files. The
//! whole database is rewritten on every change through a temporary file and
//! a rename, so a crash leaves either the old or the new contents.

use std::path::{Path, PathBuf};

use sis_schema::{LocalDb, LocalRecord, ManifestError, PackageId, XmlError};
use thiserror::Error;

use crate::paths::InstallRoot;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt local database {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },

    #[error("cannot serialize local database: {0}")]
    Serialize(#[from] XmlError),

    #[error("Package not installed: {0}")]
    PackageNotFound(String),
}

/// State database for tracking installations
#[derive(Debug)]
pub struct StateDb {
    path: PathBuf,
    records: Vec<LocalRecord>,
}

impl StateDb {
    /// Open the database of an installation root.
    pub fn open(root: &InstallRoot) -> Result<Self, StoreError> {
        Self::open_at(&root.db_path())
    }

    /// Open a database file; a missing file is an empty database.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let records = match std::fs::read_to_string(path) {
            Ok(text) => {
                LocalDb::parse(&text)
                    .map_err(|source| StoreError::Corrupt {
                        path: path.to_path_buf(),
                        source,
                    })?
                    .records
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_package(&self, id: &str) -> Option<&LocalRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn is_installed(&self, id: &str) -> bool {
        self.get_package(id).is_some()
    }

    pub fn list_packages(&self) -> &[LocalRecord] {
        &self.records
    }

    /// Insert or replace a record and persist the database.
    pub fn install_package(&mut self, record: LocalRecord) -> Result<(), StoreError> {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
        self.save()
    }

    /// Delete a record and persist the database, returning the record.
    pub fn remove_package(&mut self, id: &PackageId) -> Result<LocalRecord, StoreError> {
        let index = self
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| StoreError::PackageNotFound(id.to_string()))?;
        let record = self.records.remove(index);
        self.save()?;
        Ok(record)
    }

    /// Write the database file if it does not exist yet.
    pub fn ensure_exists(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }
        self.save()
    }

    /// Persist the current records atomically.
    pub fn save(&self) -> Result<(), StoreError> {
        let document = LocalDb {
            records: self.records.clone(),
        }
        .to_document()?;

        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, document).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        tracing::debug!(path = %self.path.display(), records = self.records.len(), "saved local database");
        Ok(())
    }
}
