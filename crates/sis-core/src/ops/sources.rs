//! Source-only installs: fetch the sources of a plan into a build directory
//! and optionally write a Makefile that builds them in dependency order.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use sis_schema::{BuildSpec, PackageId};
use thiserror::Error;

use crate::build::{build_commands, install_command};
use crate::error::{PackageError, PackageFailure};
use crate::fetch::{FetchContext, fetch};
use crate::log::BuildLog;
use crate::ops::context::Context;
use crate::ops::install::Stage;
use crate::paths::InstallRoot;
use crate::probe::DepChecker;
use crate::registry::{LoadError, Registry};
use crate::resolver::{Plan, Request, ResolveError, ResolveOptions, resolve};
use crate::store::{StateDb, StoreError};
use crate::vars::Variables;

#[derive(Error, Debug)]
pub enum SourcesError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A fetched source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSource {
    pub id: PackageId,
    pub dir: PathBuf,
    pub build: BuildSpec,
    /// Requirements fetched in the same run.
    pub requirements: Vec<PackageId>,
    /// Build tools are built but not installed.
    pub tool: bool,
}

#[derive(Debug, Default)]
pub struct SourcesReport {
    pub fetched: Vec<FetchedSource>,
    /// Packages without a build recipe.
    pub no_source: Vec<PackageId>,
    pub makefile: Option<PathBuf>,
    pub failure: Option<PackageFailure>,
}

/// Fetch the sources of the requested packages and their missing
/// requirements into `build_dir`.
///
/// # Errors
///
/// Returns [`SourcesError`] for catalog, resolution and Makefile problems.
/// A failed download stops the run and is part of the report.
pub async fn fetch_sources(
    ctx: &Context,
    requests: &[Request],
    build_dir: &Path,
    makefile: bool,
) -> Result<SourcesReport, SourcesError> {
    let db = StateDb::open(ctx.root())?;
    let registry = ctx.load_registry(db.list_packages()).await?;
    let plan = resolve(&registry, requests, ResolveOptions { force: true })?;
    ctx.reporter.plan(&plan.entries);

    std::fs::create_dir_all(build_dir).map_err(|source| SourcesError::Write {
        path: build_dir.to_path_buf(),
        source,
    })?;

    ctx.reporter.section("Fetching sources");
    let mut report = fetch_plan(ctx, &registry, &plan, build_dir).await;

    if makefile && report.failure.is_none() {
        let path = build_dir.join("Makefile");
        let text = render_makefile(&report.fetched, ctx.root(), build_dir);
        std::fs::write(&path, text).map_err(|source| SourcesError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "wrote Makefile");
        report.makefile = Some(path);
    }

    Ok(report)
}

async fn fetch_plan(
    ctx: &Context,
    registry: &Registry,
    plan: &Plan,
    build_dir: &Path,
) -> SourcesReport {
    let vars = ctx.settings.variables();
    let mut checker = DepChecker::new(ctx.shell.clone(), vars.clone());
    let mut report = SourcesReport::default();

    for entry in &plan.entries {
        let Some(recipe) = registry.get(&entry.id).and_then(|e| e.entry.recipe.as_ref()) else {
            ctx.reporter
                .warning(&format!("no source available for {}", entry.id));
            report.no_source.push(entry.id.clone());
            continue;
        };

        let log = BuildLog::new(build_dir.join("build.log"));
        let fetch_ctx = FetchContext {
            client: &ctx.client,
            shell: ctx.shell.as_ref(),
            vars: &vars,
            log: &log,
        };

        ctx.reporter.stage(&entry.id, Stage::Fetching);
        let result = match checker.check_all(&recipe.download.implied_checks()).await {
            Ok(()) => fetch(fetch_ctx, &recipe.download, build_dir, &entry.id).await,
            Err(e) => Err(PackageError::from(e)),
        };
        match result {
            Ok(dir) => {
                ctx.reporter
                    .done(&entry.id, &entry.display_version(), "sources fetched");
                let descriptor = registry.get(&entry.id).map(|e| e.descriptor());
                let requirements = descriptor
                    .map(|d| d.requirements.clone())
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|r| report.fetched.iter().any(|f| &f.id == r))
                    .collect();
                report.fetched.push(FetchedSource {
                    id: entry.id.clone(),
                    dir,
                    build: recipe.build.clone(),
                    requirements,
                    tool: descriptor.is_some_and(sis_schema::PackageDescriptor::is_tool),
                });
            }
            Err(error) => {
                ctx.reporter
                    .failed(&entry.id, Stage::Fetching, &error.to_string());
                report.failure = Some(PackageFailure {
                    id: entry.id.clone(),
                    stage: Stage::Fetching,
                    error,
                });
                break;
            }
        }
    }
    report
}

/// Makefile building every fetched package after its requirements.
///
/// Catalog variables are left for `make` to expand.
pub fn render_makefile(sources: &[FetchedSource], root: &InstallRoot, build_dir: &Path) -> String {
    let mut vars = Variables::default();
    vars.set("top_dir", "$(top_dir)");
    vars.set("platform", "$(platform)");

    let mut out = String::new();
    let _ = writeln!(out, "top_dir={}", root.path().display());
    let _ = writeln!(out, "log=$(CURDIR)/build.log");
    if let Some(platform) = sis_schema::Platform::current() {
        let _ = writeln!(out, "platform={}", platform.dir_name());
    }
    let targets: Vec<String> = sources.iter().map(|s| format!("{}-install", s.id)).collect();
    let _ = writeln!(out, "\nall: top_dir {}\n", targets.join(" "));
    out.push_str("top_dir:\n");
    out.push_str("\ttest -e \"$(top_dir)\" || mkdir -p \"$(top_dir)\"\n");
    out.push_str("\techo \"Errors recorded in $(log).\"\n");

    for source in sources {
        let deps: Vec<String> = source
            .requirements
            .iter()
            .map(|r| format!("{r}-install"))
            .collect();
        let _ = writeln!(out, "\n{}-install: top_dir {}", source.id, deps.join(" "));
        let dir = source
            .dir
            .strip_prefix(build_dir)
            .unwrap_or(&source.dir)
            .display()
            .to_string();
        let install = if source.tool {
            None
        } else {
            install_command(&source.build, &vars)
        };
        let commands = build_commands(&source.build, &vars).into_iter().chain(install);
        for command in commands {
            let _ = writeln!(out, "\tcd {dir} && {command} >> $(log) 2>&1");
        }
    }
    out
}
