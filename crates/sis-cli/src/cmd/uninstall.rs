//! Uninstall command

use std::sync::Arc;

use anyhow::Result;
use sis_core::ops::uninstall_packages;
use sis_schema::PackageId;

use crate::ui::ConsoleReporter;
use crate::{GlobalArgs, dependents_policy};

/// Remove installed packages.
pub async fn uninstall(args: &GlobalArgs, packages: &[String], dependents: &str) -> Result<()> {
    let policy = dependents_policy(dependents)?;
    let ids: Vec<PackageId> = packages.iter().map(|p| PackageId::new(p.as_str())).collect();
    let ctx = args.context(Arc::new(ConsoleReporter))?;

    uninstall_packages(&ctx, &ids, policy).await?;
    Ok(())
}
