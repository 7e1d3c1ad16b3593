//! List command

use std::sync::Arc;

use anyhow::{Context, Result};
use sis_core::ops::query;

use crate::GlobalArgs;
use crate::ui::{ConsoleReporter, table};

/// List installable and installed packages with their status.
pub async fn list(args: &GlobalArgs) -> Result<()> {
    let ctx = args.context(Arc::new(ConsoleReporter))?;
    let registry = query::load(&ctx)
        .await
        .context("Failed to load package catalog")?;
    let entries = query::list(&registry);

    if entries.is_empty() {
        println!();
        println!("  No packages available.");
        return Ok(());
    }
    println!("{}", table::package_list(&entries));
    Ok(())
}
