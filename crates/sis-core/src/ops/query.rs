//! Read-only views of the registry: package listing and details.

use sis_schema::{PackageDescriptor, PackageId, VersionTag};
use thiserror::Error;

use crate::ops::context::Context;
use crate::registry::{InstalledState, LoadError, Registry};
use crate::store::{StateDb, StoreError};

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("unknown package '{0}'")]
    UnknownPackage(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One line of the package listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: PackageId,
    pub description: Option<String>,
    pub installed: Option<VersionTag>,
    /// Newest binary version.
    pub available: Option<VersionTag>,
    pub buildable: bool,
}

impl ListEntry {
    /// Installation status as shown to users.
    pub fn status(&self) -> String {
        match (&self.installed, &self.available) {
            (Some(installed), Some(available))
                if !installed.is_source() && available > installed =>
            {
                format!("{installed} (avail. {available})")
            }
            (Some(installed), _) => installed.to_string(),
            (None, Some(available)) => format!("not installed (avail. {available})"),
            (None, None) if self.buildable => "not installed (avail. source)".to_string(),
            (None, None) => "not installed".to_string(),
        }
    }
}

/// Everything known about one package.
#[derive(Debug, Clone)]
pub struct PackageInfo {
    pub descriptor: PackageDescriptor,
    pub installed: Option<InstalledState>,
    /// Binary versions, newest first, with their archive size.
    pub binaries: Vec<(VersionTag, Option<u64>)>,
    pub buildable: bool,
    /// Transitive requirements.
    pub requirements: Vec<PackageId>,
}

/// Open the local database and load the merged registry.
pub async fn load(ctx: &Context) -> Result<Registry, QueryError> {
    let db = StateDb::open(ctx.root())?;
    Ok(ctx.load_registry(db.list_packages()).await?)
}

/// Installable or installed packages, sorted by id. Build tools are left
/// out.
pub fn list(registry: &Registry) -> Vec<ListEntry> {
    registry
        .iter()
        .filter(|e| !e.descriptor().is_tool())
        .filter(|e| e.is_installable() || e.is_installed())
        .map(|e| ListEntry {
            id: e.id().clone(),
            description: e.descriptor().description.clone(),
            installed: e.installed_version().cloned(),
            available: e.latest_binary().map(|v| v.number.clone()),
            buildable: e.can_build(),
        })
        .collect()
}

pub fn info(registry: &Registry, id: &str) -> Result<PackageInfo, QueryError> {
    let entry = registry
        .get(id)
        .ok_or_else(|| QueryError::UnknownPackage(id.to_string()))?;

    let mut binaries: Vec<(VersionTag, Option<u64>)> = entry
        .entry
        .versions
        .iter()
        .map(|v| (v.number.clone(), v.size))
        .collect();
    binaries.sort_by(|a, b| b.0.cmp(&a.0));
    binaries.dedup_by(|a, b| a.0 == b.0);

    Ok(PackageInfo {
        descriptor: entry.descriptor().clone(),
        installed: entry.installed.clone(),
        binaries,
        buildable: entry.can_build(),
        requirements: registry.requirement_closure(id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sis_schema::{Catalog, InstallMode, LocalRecord};

    fn registry() -> Registry {
        let catalog = Catalog::parse(
            r#"<sis-extend>
                 <package id="gel"><desc>GEL library</desc>
                   <version number="1.0"><file>a</file><size>10</size></version>
                   <version number="1.1"><file>b</file><size>12</size></version>
                 </package>
                 <package id="elm"><req name="gel"/>
                   <build><download type="git" address="x"/><make type="make"/></build>
                 </package>
                 <package id="otawa"><req name="elm"/>
                   <version number="2.0"><file>c</file></version>
                 </package>
                 <package id="virtual"/>
                 <package id="gen" tool="yes">
                   <build><download type="git" address="y"/><make type="make"/></build>
                 </package>
               </sis-extend>"#,
        )
        .unwrap();
        let local = vec![LocalRecord {
            id: PackageId::new("gel"),
            version: VersionTag::new("1.0"),
            mode: InstallMode::Binary,
            actions: Vec::new(),
        }];
        Registry::merge(&local, &catalog, None)
    }

    #[test]
    fn test_list_statuses() {
        let entries = list(&registry());
        let statuses: Vec<(String, String)> = entries
            .iter()
            .map(|e| (e.id.to_string(), e.status()))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("elm".to_string(), "not installed (avail. source)".to_string()),
                ("gel".to_string(), "1.0 (avail. 1.1)".to_string()),
                ("otawa".to_string(), "not installed (avail. 2.0)".to_string()),
            ]
        );
    }

    #[test]
    fn test_tools_are_not_listed() {
        let registry = registry();
        assert!(list(&registry).iter().all(|e| e.id != "gen"));
        assert!(info(&registry, "gen").unwrap().buildable);
    }

    #[test]
    fn test_info() {
        let info = info(&registry(), "otawa").unwrap();
        assert_eq!(info.requirements, vec![PackageId::new("elm"), PackageId::new("gel")]);
        assert_eq!(info.binaries, vec![(VersionTag::new("2.0"), None)]);
        assert!(!info.buildable);
        assert!(info.installed.is_none());

        let gel = super::info(&registry(), "gel").unwrap();
        assert_eq!(gel.binaries[0], (VersionTag::new("1.1"), Some(12)));
        assert_eq!(gel.installed.unwrap().version, "1.0");
    }

    #[test]
    fn test_unknown_package() {
        assert!(matches!(
            info(&registry(), "nope"),
            Err(QueryError::UnknownPackage(_))
        ));
    }
}
