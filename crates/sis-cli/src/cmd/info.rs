//! Info command

use std::sync::Arc;

use anyhow::{Context, Result};
use sis_core::ops::query;

use crate::GlobalArgs;
use crate::ui::{ConsoleReporter, table};

/// Show details about each package.
pub async fn info(args: &GlobalArgs, packages: &[String]) -> Result<()> {
    let ctx = args.context(Arc::new(ConsoleReporter))?;
    let registry = query::load(&ctx)
        .await
        .context("Failed to load package catalog")?;

    for package in packages {
        let info = query::info(&registry, package)?;
        println!();
        println!("{}", table::package_info(&info));
    }
    Ok(())
}
