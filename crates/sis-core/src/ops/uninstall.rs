//! Package removal.
//!
//! Uninstalling replays the recorded actions of each package in reverse and
//! then deletes its record. The local database is the only source used to
//! find what to remove; catalogs only tell which installed packages depend
//! on the ones being removed.

use std::collections::HashSet;
use std::time::Instant;

use sis_schema::{Catalog, PackageId, VersionTag};
use thiserror::Error;

use crate::actions::undo;
use crate::ops::context::Context;
use crate::registry::Registry;
use crate::store::{StateDb, StoreError};

#[derive(Error, Debug)]
pub enum UninstallError {
    #[error("package {0} is not installed")]
    NotInstalled(PackageId),

    #[error("{id} is required by installed package(s): {}", dependents.iter().map(PackageId::as_str).collect::<Vec<_>>().join(", "))]
    DependentsInstalled {
        id: PackageId,
        dependents: Vec<PackageId>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("removal task failed: {0}")]
    Task(String),
}

/// What to do with installed packages that require a package being removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DependentsPolicy {
    /// Refuse to remove anything.
    #[default]
    Block,
    /// Remove only the requested packages and warn.
    Warn,
    /// Remove the dependents too, before the packages they require.
    Cascade,
}

impl std::str::FromStr for DependentsPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(Self::Block),
            "warn" => Ok(Self::Warn),
            "cascade" => Ok(Self::Cascade),
            _ => Err(format!("Unknown dependents policy: {s}")),
        }
    }
}

/// Order in which packages are removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalPlan {
    /// Dependents first.
    pub order: Vec<PackageId>,
    /// Installed dependents left in place under [`DependentsPolicy::Warn`].
    pub broken: Vec<PackageId>,
}

#[derive(Debug, Default)]
pub struct UninstallReport {
    pub removed: Vec<(PackageId, VersionTag)>,
    pub warnings: Vec<String>,
}

/// Decide which packages to remove and in which order.
///
/// # Errors
///
/// Returns [`UninstallError::NotInstalled`] for a package without a local
/// record and [`UninstallError::DependentsInstalled`] under
/// [`DependentsPolicy::Block`].
pub fn plan_removal(
    registry: &Registry,
    ids: &[PackageId],
    policy: DependentsPolicy,
) -> Result<RemovalPlan, UninstallError> {
    for id in ids {
        if !registry.get(id).is_some_and(|e| e.is_installed()) {
            return Err(UninstallError::NotInstalled(id.clone()));
        }
    }

    let requested: HashSet<&PackageId> = ids.iter().collect();
    let mut selected: Vec<PackageId> = Vec::new();
    let mut broken: Vec<PackageId> = Vec::new();
    for id in ids {
        if !selected.contains(id) {
            selected.push(id.clone());
        }
        let dependents: Vec<PackageId> = registry
            .installed_dependents(id)
            .into_iter()
            .filter(|d| !requested.contains(d))
            .collect();
        if dependents.is_empty() {
            continue;
        }
        match policy {
            DependentsPolicy::Block => {
                return Err(UninstallError::DependentsInstalled {
                    id: id.clone(),
                    dependents,
                });
            }
            DependentsPolicy::Warn => {
                for d in dependents {
                    if !broken.contains(&d) {
                        broken.push(d);
                    }
                }
            }
            DependentsPolicy::Cascade => {
                for d in dependents {
                    if !selected.contains(&d) {
                        selected.push(d);
                    }
                }
            }
        }
    }

    // Emit a package once nothing left in the selection requires it.
    let mut order = Vec::with_capacity(selected.len());
    while !selected.is_empty() {
        let next = selected
            .iter()
            .position(|candidate| {
                !selected.iter().any(|other| {
                    other != candidate
                        && registry
                            .requirement_closure(other)
                            .iter()
                            .any(|r| r == candidate)
                })
            })
            .unwrap_or(0);
        order.push(selected.remove(next));
    }

    Ok(RemovalPlan { order, broken })
}

/// Uninstall packages from the installation root.
///
/// # Errors
///
/// See [`plan_removal`]; store failures abort the remaining removals.
pub async fn uninstall_packages(
    ctx: &Context,
    ids: &[PackageId],
    policy: DependentsPolicy,
) -> Result<UninstallReport, UninstallError> {
    let start = Instant::now();
    let mut db = StateDb::open(ctx.root())?;

    for id in ids {
        if !db.is_installed(id) {
            return Err(UninstallError::NotInstalled(id.clone()));
        }
    }

    let registry = match ctx.load_registry(db.list_packages()).await {
        Ok(registry) => registry,
        Err(e) => {
            tracing::warn!(error = %e, "catalog unavailable, dependents not checked");
            ctx.reporter
                .warning(&format!("cannot check dependents: {e}"));
            Registry::merge(db.list_packages(), &Catalog::default(), None)
        }
    };

    let plan = plan_removal(&registry, ids, policy)?;
    let mut report = UninstallReport::default();
    for id in &plan.broken {
        let warning = format!("{id} stays installed but its requirements are removed");
        ctx.reporter.warning(&warning);
        report.warnings.push(warning);
    }

    ctx.reporter.section("Removing");
    for id in &plan.order {
        let Some(record) = db.get_package(id).cloned() else {
            continue;
        };
        ctx.reporter.removing(&record.id, &record.version);

        let root = ctx.root().clone();
        let actions = record.actions.clone();
        let undone = tokio::task::spawn_blocking(move || undo(&actions, &root))
            .await
            .map_err(|e| UninstallError::Task(e.to_string()))?;
        for warning in undone.warnings {
            ctx.reporter.warning(&warning);
            report.warnings.push(warning);
        }

        db.remove_package(id)?;
        tracing::info!(package = %id, removed = undone.removed, "uninstalled");
        ctx.reporter.done(&record.id, &record.version, "removed");
        report.removed.push((record.id, record.version));
    }

    ctx.reporter
        .summary(report.removed.len(), "removed", start.elapsed().as_secs_f64());
    Ok(report)
}
