//! Sources command

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use sis_core::Reporter;
use sis_core::ops::fetch_sources;

use crate::GlobalArgs;
use crate::cmd::install::parse_requests;
use crate::ui::ConsoleReporter;

/// Download sources into the build directory, optionally with a Makefile.
pub async fn sources(args: &GlobalArgs, packages: &[String], makefile: bool) -> Result<()> {
    let build_dir = args
        .build_dir
        .clone()
        .context("The sources command needs a build directory: pass --build-dir or set SIS_BUILD_DIR")?;
    let requests = parse_requests(packages)?;
    let reporter = Arc::new(ConsoleReporter);
    let ctx = args.context(reporter.clone())?;

    let report = fetch_sources(&ctx, &requests, &build_dir, makefile).await?;
    if let Some(failure) = report.failure {
        reporter.error(&failure.to_string());
        bail!("fetching sources of {} failed", failure.id);
    }
    if let Some(path) = report.makefile {
        reporter.info(&format!("run `make -C {}` to build", build_dir.display()));
        tracing::debug!(path = %path.display(), "makefile written");
    }
    Ok(())
}
