//! Init command

use anyhow::{Context, Result};
use sis_core::Reporter;
use sis_core::ops::init_root;

use crate::GlobalArgs;
use crate::ui::ConsoleReporter;

/// Create the installation root and its empty database.
pub fn init(args: &GlobalArgs) -> Result<()> {
    let root = args.install_root()?;
    let db = init_root(&root)
        .with_context(|| format!("Failed to initialize {}", root.path().display()))?;
    let reporter = ConsoleReporter;
    reporter.info(&format!(
        "installation root {} ready ({} package(s) installed)",
        root.path().display(),
        db.list_packages().len()
    ));
    Ok(())
}
