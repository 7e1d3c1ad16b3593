//! Progress reporting seam.
//!
//! Install, uninstall and source operations describe what they do through
//! [`Reporter`]; the CLI renders it, tests pass [`NullReporter`].

use sis_schema::{PackageId, VersionTag};

use crate::ops::install::Stage;
use crate::resolver::PlanEntry;

pub trait Reporter: Send + Sync {
    /// Announce the ordered plan about to be processed.
    fn plan(&self, entries: &[PlanEntry]);

    /// Indicates a new section or phase has started (e.g. "Installing").
    fn section(&self, title: &str);

    /// A package entered a new stage of its install.
    fn stage(&self, id: &PackageId, stage: Stage);

    /// A package was left alone (already installed, not attempted, ...).
    fn skipped(&self, id: &PackageId, reason: &str);

    /// A package is about to be uninstalled.
    fn removing(&self, id: &PackageId, version: &VersionTag);

    /// A package operation finished; `detail` is e.g. the install mode.
    fn done(&self, id: &PackageId, version: &VersionTag, detail: &str);

    /// Marks a package operation as failed in the given stage.
    fn failed(&self, id: &PackageId, stage: Stage, reason: &str);

    /// Catalog message or other note for the user.
    fn info(&self, msg: &str);

    /// Something degraded but the run goes on.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Totals at the end of a run.
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn plan(&self, entries: &[PlanEntry]) {
        (**self).plan(entries)
    }
    fn section(&self, title: &str) {
        (**self).section(title)
    }
    fn stage(&self, id: &PackageId, stage: Stage) {
        (**self).stage(id, stage)
    }
    fn skipped(&self, id: &PackageId, reason: &str) {
        (**self).skipped(id, reason)
    }
    fn removing(&self, id: &PackageId, version: &VersionTag) {
        (**self).removing(id, version)
    }
    fn done(&self, id: &PackageId, version: &VersionTag, detail: &str) {
        (**self).done(id, version, detail)
    }
    fn failed(&self, id: &PackageId, stage: Stage, reason: &str) {
        (**self).failed(id, stage, reason)
    }
    fn info(&self, msg: &str) {
        (**self).info(msg)
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg)
    }
    fn error(&self, msg: &str) {
        (**self).error(msg)
    }
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        (**self).summary(count, action, elapsed_secs)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn plan(&self, _: &[PlanEntry]) {}
    fn section(&self, _: &str) {}
    fn stage(&self, _: &PackageId, _: Stage) {}
    fn skipped(&self, _: &PackageId, _: &str) {}
    fn removing(&self, _: &PackageId, _: &VersionTag) {}
    fn done(&self, _: &PackageId, _: &VersionTag, _: &str) {}
    fn failed(&self, _: &PackageId, _: Stage, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: usize, _: &str, _: f64) {}
}
