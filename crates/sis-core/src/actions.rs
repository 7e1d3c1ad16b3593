//! Install-action executor.
//!
//! Applies the actions of an install manifest (or of a source build) to the
//! installation root, and reverses recorded actions on uninstall. Every
//! performed action is returned with its resolved target so that the local
//! record alone is enough to undo it.

use std::path::{Path, PathBuf};

use sis_schema::InstallAction;
use thiserror::Error;

use crate::paths::InstallRoot;
use crate::vars::Variables;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("missing {}", path.display())]
    Missing { path: PathBuf },

    #[error("cannot {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot copy {} to {}: {message}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        message: String,
    },
}

/// Failure of one action. Actions completed before it are left in place.
#[derive(Error, Debug)]
#[error("{error} ({} action(s) already applied)", completed.len())]
pub struct ActionFailure {
    pub completed: Vec<InstallAction>,
    #[source]
    pub error: ActionError,
}

/// Outcome of applying a package's actions.
#[derive(Debug, Default)]
pub struct Applied {
    /// Performed actions with resolved paths, one per placed file.
    pub performed: Vec<InstallAction>,
    pub warnings: Vec<String>,
}

/// Applies install actions of one package.
#[derive(Debug)]
pub struct ActionExecutor<'a> {
    root: &'a InstallRoot,
    package_dir: &'a Path,
    vars: &'a Variables,
    dynlib_suffix: &'a str,
}

impl<'a> ActionExecutor<'a> {
    /// `package_dir` holds the sources of install actions; targets are
    /// resolved under `root`.
    pub fn new(
        root: &'a InstallRoot,
        package_dir: &'a Path,
        vars: &'a Variables,
        dynlib_suffix: &'a str,
    ) -> Self {
        Self {
            root,
            package_dir,
            vars,
            dynlib_suffix,
        }
    }

    /// Apply actions in order, stopping at the first failure.
    ///
    /// A directory source is expanded into one performed action per file,
    /// so undoing it never touches files the package did not place.
    pub fn apply(&self, actions: &[InstallAction]) -> Result<Applied, ActionFailure> {
        let mut applied = Applied::default();
        for action in actions {
            if let Err(error) = self.apply_one(action, &mut applied) {
                return Err(ActionFailure {
                    completed: applied.performed,
                    error,
                });
            }
        }
        Ok(applied)
    }

    fn apply_one(&self, action: &InstallAction, applied: &mut Applied) -> Result<(), ActionError> {
        match action {
            InstallAction::InstallFile { path, to } => {
                let path = self.vars.expand(path);
                let to = to.as_deref().map_or_else(|| path.clone(), |t| self.vars.expand(t));
                for (path, to) in self.install(&path, &to, &mut applied.performed)? {
                    applied
                        .performed
                        .push(InstallAction::InstallFile { path, to: Some(to) });
                }
            }
            InstallAction::InstallDynLib { path, to } => {
                let path = self.vars.expand(path);
                let to = to.as_deref().map_or_else(|| path.clone(), |t| self.vars.expand(t));
                let path = format!("{path}{}", self.dynlib_suffix);
                let to = format!("{to}{}", self.dynlib_suffix);
                for (path, to) in self.install(&path, &to, &mut applied.performed)? {
                    applied
                        .performed
                        .push(InstallAction::InstallDynLib { path, to: Some(to) });
                }
            }
            InstallAction::Remove { path } => {
                let path = self.vars.expand(path);
                let target = self.root.resolve(&path);
                if !target.exists() && target.symlink_metadata().is_err() {
                    tracing::warn!(target = %target.display(), "nothing to remove");
                    applied
                        .warnings
                        .push(format!("cannot remove {}: no such file", target.display()));
                    return Ok(());
                }
                remove_path(&target)?;
                tracing::debug!(target = %target.display(), "removed");
                applied.performed.push(InstallAction::Remove { path });
            }
        }
        Ok(())
    }

    /// Copy `path` to `to`, returning the placed `(path, to)` file pairs.
    ///
    /// Files copied out of a directory before an error are pushed to
    /// `partial` so the failure still lists them.
    fn install(
        &self,
        path: &str,
        to: &str,
        partial: &mut Vec<InstallAction>,
    ) -> Result<Vec<(String, String)>, ActionError> {
        let source = self.package_dir.join(path);
        if !source.exists() {
            return Err(ActionError::Missing { path: source });
        }
        if !source.is_dir() {
            self.copy_file(&source, to)?;
            return Ok(vec![(path.to_string(), to.to_string())]);
        }

        let mut placed = Vec::new();
        let walker = walkdir::WalkDir::new(&source)
            .min_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| ActionError::Copy {
                from: source.clone(),
                to: self.root.resolve(to),
                message: e.to_string(),
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&source) else {
                continue;
            };
            let relative = relative.to_string_lossy();
            let file_to = format!("{}/{relative}", to.trim_end_matches('/'));
            if let Err(e) = self.copy_file(entry.path(), &file_to) {
                partial.extend(placed.into_iter().map(|(path, to)| InstallAction::InstallFile {
                    path,
                    to: Some(to),
                }));
                return Err(e);
            }
            placed.push((format!("{}/{relative}", path.trim_end_matches('/')), file_to));
        }
        Ok(placed)
    }

    fn copy_file(&self, source: &Path, to: &str) -> Result<(), ActionError> {
        let target = self.root.resolve(to);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ActionError::Io {
                op: "create",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::copy(source, &target).map_err(|e| ActionError::Copy {
            from: source.to_path_buf(),
            to: target.clone(),
            message: e.to_string(),
        })?;
        tracing::debug!(from = %source.display(), to = %target.display(), "installed");
        Ok(())
    }
}

/// Outcome of reversing a package's actions.
#[derive(Debug, Default)]
pub struct UndoReport {
    pub removed: usize,
    pub warnings: Vec<String>,
}

/// Reverse recorded actions, last first.
///
/// Installed files are deleted and directories they leave empty are pruned
/// up to the root. A recorded directory is only removed when empty.
/// Recorded removals cannot be restored and missing targets are only
/// reported.
pub fn undo(performed: &[InstallAction], root: &InstallRoot) -> UndoReport {
    let mut report = UndoReport::default();
    for action in performed.iter().rev() {
        match action {
            InstallAction::Remove { path } => {
                report
                    .warnings
                    .push(format!("cannot restore removed {path}"));
            }
            InstallAction::InstallFile { .. } | InstallAction::InstallDynLib { .. } => {
                let target = root.resolve(action.target());
                let Ok(meta) = target.symlink_metadata() else {
                    report
                        .warnings
                        .push(format!("{} already gone", target.display()));
                    continue;
                };
                let result = if meta.is_dir() {
                    std::fs::remove_dir(&target)
                } else {
                    std::fs::remove_file(&target)
                };
                match result {
                    Ok(()) => {
                        report.removed += 1;
                        prune_empty_parents(&target, root.path());
                    }
                    Err(e) => report
                        .warnings
                        .push(format!("cannot remove {}: {e}", target.display())),
                }
            }
        }
    }
    for warning in &report.warnings {
        tracing::warn!("{warning}");
    }
    report
}

/// Remove empty directories above `path`, stopping at `root`.
fn prune_empty_parents(path: &Path, root: &Path) {
    let mut dir = path.parent();
    while let Some(current) = dir {
        if current == root || !current.starts_with(root) {
            break;
        }
        if std::fs::remove_dir(current).is_err() {
            break;
        }
        tracing::debug!(dir = %current.display(), "pruned empty directory");
        dir = current.parent();
    }
}

fn remove_path(path: &Path) -> Result<(), ActionError> {
    let result = if path.is_dir() && !path.is_symlink() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|source| ActionError::Io {
        op: "remove",
        path: path.to_path_buf(),
        source,
    })
}
