//! Install command

use std::sync::Arc;

use anyhow::{Result, bail};
use sis_core::Reporter;
use sis_core::ops::{InstallOptions, install_packages};
use sis_core::resolver::Request;
use sis_schema::PackageId;

use crate::GlobalArgs;
use crate::ui::ConsoleReporter;

/// Parse `pack` and `pack:version` arguments.
pub fn parse_requests(packages: &[String]) -> Result<Vec<Request>> {
    packages
        .iter()
        .map(|p| p.parse::<Request>().map_err(anyhow::Error::from))
        .collect()
}

/// Install packages and their requirements.
pub async fn install(
    args: &GlobalArgs,
    packages: &[String],
    force: bool,
    dry_run: bool,
) -> Result<()> {
    let requests = parse_requests(packages)?;
    let reporter = Arc::new(ConsoleReporter);
    let ctx = args.context(reporter.clone())?;

    let report = install_packages(&ctx, &requests, InstallOptions { force, dry_run }).await?;

    if report.plan.is_empty() {
        reporter.info("Nothing to install.");
        return Ok(());
    }
    if dry_run {
        reporter.info("Dry run: nothing installed.");
        return Ok(());
    }
    if let Some(failure) = report.failure {
        reporter.error(&failure.to_string());
        if !report.not_attempted.is_empty() {
            let names: Vec<&str> = report.not_attempted.iter().map(PackageId::as_str).collect();
            reporter.warning(&format!("not attempted: {}", names.join(", ")));
        }
        bail!(
            "{} package(s) not installed",
            1 + report.not_attempted.len()
        );
    }
    Ok(())
}
