//! Merged package registry.
//!
//! Three databases describe packages: the local database (what is
//! installed), the source catalog (descriptions and build recipes) and the
//! binary catalog of the current platform (prebuilt versions). [`Registry::merge`]
//! folds them into one view in that precedence order.

use std::collections::{BTreeMap, HashSet};

use reqwest::Client;
use sis_schema::{
    Catalog, CatalogEntry, CatalogError, INDEX_FILE, InstallMode, LocalRecord, PackageDescriptor,
    PackageId, Platform, VersionEntry, VersionTag,
};
use thiserror::Error;

use crate::io::download::{DownloadError, Location, fetch_text};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot fetch catalog {location}: {source}")]
    Fetch {
        location: String,
        #[source]
        source: DownloadError,
    },

    #[error("invalid catalog {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: CatalogError,
    },
}

/// Installed state of a registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledState {
    pub version: VersionTag,
    pub mode: InstallMode,
}

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub entry: CatalogEntry,
    pub installed: Option<InstalledState>,
    /// Whether any catalog describes the package. Packages known only from
    /// the local database can be removed but not installed.
    pub upstream: bool,
}

impl RegistryEntry {
    pub fn id(&self) -> &PackageId {
        self.entry.id()
    }

    pub fn descriptor(&self) -> &PackageDescriptor {
        &self.entry.descriptor
    }

    pub fn is_installed(&self) -> bool {
        self.installed.is_some()
    }

    pub fn installed_version(&self) -> Option<&VersionTag> {
        self.installed.as_ref().map(|s| &s.version)
    }

    /// Highest binary version; among equal tags the last listed wins.
    pub fn latest_binary(&self) -> Option<&VersionEntry> {
        self.entry.versions.iter().max_by(|a, b| a.number.cmp(&b.number))
    }

    /// Binary entry for an exact version, preferring the last listed.
    pub fn binary_version(&self, version: &VersionTag) -> Option<&VersionEntry> {
        self.entry.versions.iter().rev().find(|v| &v.number == version)
    }

    pub fn can_build(&self) -> bool {
        self.entry.recipe.is_some()
    }

    pub fn is_installable(&self) -> bool {
        self.upstream && (self.can_build() || !self.entry.versions.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<PackageId, RegistryEntry>,
    /// Announcements found in the catalogs.
    pub messages: Vec<String>,
    /// Problems that degraded the registry without making it unusable.
    pub warnings: Vec<String>,
}

impl Registry {
    /// Merge local records, the source catalog and the binary catalog.
    ///
    /// Later sources enrich earlier ones; no input is modified.
    pub fn merge(local: &[LocalRecord], source: &Catalog, binary: Option<&Catalog>) -> Self {
        let mut registry = Self::default();

        for record in local {
            registry.entries.insert(
                record.id.clone(),
                RegistryEntry {
                    entry: CatalogEntry::new(record.id.clone()),
                    installed: Some(InstalledState {
                        version: record.version.clone(),
                        mode: record.mode,
                    }),
                    upstream: false,
                },
            );
        }

        for catalog in std::iter::once(source).chain(binary) {
            if let Some(message) = &catalog.message {
                registry.messages.push(message.clone());
            }
            for entry in &catalog.entries {
                registry.enrich(entry.clone());
            }
        }

        registry
    }

    fn enrich(&mut self, entry: CatalogEntry) {
        match self.entries.get_mut(entry.id()) {
            Some(existing) => {
                existing.entry.enrich(entry);
                existing.upstream = true;
            }
            None => {
                self.entries.insert(
                    entry.id().clone(),
                    RegistryEntry {
                        entry,
                        installed: None,
                        upstream: true,
                    },
                );
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    /// Entries sorted by id.
    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Transitive requirements of a package, excluding itself. Unknown ids
    /// are listed but not expanded.
    pub fn requirement_closure(&self, id: &str) -> Vec<PackageId> {
        let mut seen: HashSet<PackageId> = HashSet::new();
        let mut order = Vec::new();
        let mut todo: Vec<PackageId> = self
            .get(id)
            .map(|e| e.descriptor().requirements.clone())
            .unwrap_or_default();
        todo.reverse();

        while let Some(next) = todo.pop() {
            if next == id || !seen.insert(next.clone()) {
                continue;
            }
            if let Some(entry) = self.get(&next) {
                todo.extend(entry.descriptor().requirements.iter().rev().cloned());
            }
            order.push(next);
        }
        order
    }

    /// Installed packages that require `id`, directly or transitively.
    pub fn installed_dependents(&self, id: &str) -> Vec<PackageId> {
        self.iter()
            .filter(|e| e.is_installed() && e.id() != id)
            .filter(|e| self.requirement_closure(e.id()).iter().any(|r| r == id))
            .map(|e| e.id().clone())
            .collect()
    }
}

/// Fetch and parse one catalog document.
pub async fn load_catalog(client: &Client, location: &Location) -> Result<Catalog, LoadError> {
    let text = fetch_text(client, location)
        .await
        .map_err(|source| LoadError::Fetch {
            location: location.to_string(),
            source,
        })?;
    Catalog::parse(&text).map_err(|source| LoadError::Parse {
        location: location.to_string(),
        source,
    })
}

/// Load the source catalog (required) and the platform's binary catalog
/// (optional) under `base`, then merge them with the local records.
///
/// Relative binary `file` entries are resolved against the platform
/// directory.
pub async fn load_registry(
    client: &Client,
    base: &Location,
    platform: Option<Platform>,
    local: &[LocalRecord],
) -> Result<Registry, LoadError> {
    let source = load_catalog(client, &base.join(INDEX_FILE)).await?;
    tracing::debug!(packages = source.entries.len(), "loaded source catalog");

    let mut warnings = Vec::new();
    let binary = match platform {
        Some(platform) => {
            let dir = base.join(platform.dir_name());
            match load_catalog(client, &dir.join(INDEX_FILE)).await {
                Ok(mut catalog) => {
                    for entry in &mut catalog.entries {
                        for version in &mut entry.versions {
                            version.file = dir.join(&version.file).to_string();
                        }
                    }
                    tracing::debug!(%platform, packages = catalog.entries.len(), "loaded binary catalog");
                    Some(catalog)
                }
                Err(e) => {
                    tracing::warn!(%platform, error = %e, "binary catalog unavailable");
                    warnings.push(format!("no binary packages for {platform}: {e}"));
                    None
                }
            }
        }
        None => {
            warnings.push("unknown host platform: only source installs are available".to_string());
            None
        }
    };

    let mut registry = Registry::merge(local, &source, binary.as_ref());
    registry.warnings = warnings;
    Ok(registry)
}
