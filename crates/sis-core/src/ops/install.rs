//! Package installation.
//!
//! [`install_packages`] loads the registry, resolves the requests and hands
//! the plan to [`execute_plan`], which processes it strictly in order. Each
//! package moves through [`Stage`]s; the first failure stops the run and the
//! remaining entries are reported as not attempted. Packages installed
//! before the failure stay committed. Tool packages are fetched and built
//! for the packages that need them but are never installed or recorded.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use sis_schema::{
    BuildRecipe, InstallAction, InstallManifest, InstallMode, LocalRecord, MANIFEST_FILE,
    PackageId, VERSION_FILE, VersionEntry, VersionTag,
};
use thiserror::Error;

use crate::actions::{self, ActionExecutor};
use crate::build::{self, BuildContext};
use crate::error::{PackageError, PackageFailure};
use crate::fetch::{self, FetchContext, download_archive, unpack};
use crate::io::checksum::verify_md5;
use crate::io::download::Location;
use crate::log::BuildLog;
use crate::ops::context::{Context, Settings};
use crate::probe::DepChecker;
use crate::registry::{LoadError, Registry};
use crate::resolver::{Plan, PlanEntry, Request, ResolveError, ResolveOptions, resolve};
use crate::store::{StateDb, StoreError};
use crate::vars::Variables;

/// Progress of one package through the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Fetching,
    Verifying,
    Building,
    Installing,
    Installed,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Verifying => "verifying",
            Self::Building => "building",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that stop a run before any package is processed.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cannot prepare build directory {}: {source}", path.display())]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Reinstall requested packages that are already installed.
    pub force: bool,
    /// Resolve and report the plan without installing anything.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub id: PackageId,
    pub version: VersionTag,
    pub mode: InstallMode,
}

/// Outcome of an install run.
#[derive(Debug, Default)]
pub struct InstallReport {
    pub plan: Plan,
    pub installed: Vec<Installed>,
    /// Tool packages built in the work directory.
    pub tools: Vec<PackageId>,
    pub skipped: Vec<PackageId>,
    pub failure: Option<PackageFailure>,
    pub not_attempted: Vec<PackageId>,
}

impl InstallReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Resolve `requests` against the catalogs and install the plan.
///
/// # Errors
///
/// Returns [`InstallError`] when the catalogs, the local database or the
/// resolution fail. Package failures are part of the report.
pub async fn install_packages(
    ctx: &Context,
    requests: &[Request],
    options: InstallOptions,
) -> Result<InstallReport, InstallError> {
    let start = Instant::now();
    let mut db = StateDb::open(ctx.root())?;
    let registry = ctx.load_registry(db.list_packages()).await?;
    let plan = resolve(
        &registry,
        requests,
        ResolveOptions {
            force: options.force,
        },
    )?;

    for id in &plan.already_installed {
        ctx.reporter.skipped(id, "already installed");
    }

    if plan.is_empty() || options.dry_run {
        if !plan.is_empty() {
            ctx.reporter.plan(&plan.entries);
        }
        return Ok(InstallReport {
            skipped: plan.already_installed.clone(),
            plan,
            ..InstallReport::default()
        });
    }

    ctx.reporter.plan(&plan.entries);
    ctx.reporter.section("Installing");
    let mut report = execute_plan(ctx, &registry, &mut db, &plan, options.force).await?;
    let mut skipped = plan.already_installed.clone();
    skipped.append(&mut report.skipped);
    report.skipped = skipped;
    report.plan = plan;

    ctx.reporter.summary(
        report.installed.len(),
        "installed",
        start.elapsed().as_secs_f64(),
    );
    Ok(report)
}

/// Install every plan entry in order, committing each to `db`.
///
/// # Errors
///
/// Returns [`InstallError::WorkDir`] when the build directory cannot be
/// created.
pub async fn execute_plan(
    ctx: &Context,
    registry: &Registry,
    db: &mut StateDb,
    plan: &Plan,
    force: bool,
) -> Result<InstallReport, InstallError> {
    let work = WorkDir::create(&ctx.settings)?;
    let vars = ctx.settings.variables();
    let mut installer = Installer {
        ctx,
        registry,
        checker: DepChecker::new(ctx.shell.clone(), vars.clone()),
        vars,
        work_dir: work.path().to_path_buf(),
    };

    let mut report = InstallReport::default();
    for (index, entry) in plan.entries.iter().enumerate() {
        let wanted = entry.display_version();
        let reinstall = force && entry.requested;
        if !reinstall && db.get_package(&entry.id).is_some_and(|r| r.version == wanted) {
            ctx.reporter.skipped(&entry.id, "already installed");
            report.skipped.push(entry.id.clone());
            continue;
        }

        let result = match installer.install(entry).await {
            Ok(Outcome::Record(record)) => commit(ctx, db, record).map(Some),
            Ok(Outcome::Tool) => Ok(None),
            Err(failure) => Err(failure),
        };
        match result {
            Ok(None) => {
                ctx.reporter.done(&entry.id, &wanted, "tool built");
                tracing::info!(package = %entry.id, "tool built");
                report.tools.push(entry.id.clone());
            }
            Ok(Some(installed)) => {
                ctx.reporter.stage(&installed.id, Stage::Installed);
                ctx.reporter
                    .done(&installed.id, &installed.version, installed.mode.as_str());
                tracing::info!(package = %installed.id, version = %installed.version, "installed");
                report.installed.push(installed);
            }
            Err(failure) => {
                tracing::error!(package = %failure.id, stage = %failure.stage, error = %failure.error, "install failed");
                ctx.reporter
                    .failed(&failure.id, failure.stage, &failure.error.to_string());
                ctx.reporter.stage(&failure.id, Stage::Failed);
                report.failure = Some(failure);
                report.not_attempted = plan.entries[index + 1..]
                    .iter()
                    .map(|e| e.id.clone())
                    .collect();
                break;
            }
        }
    }

    work.finish(ctx.settings.keep_build_dir);
    Ok(report)
}

/// Record `record`, replacing any previous record of the package.
///
/// Files of the previous record that the new one does not place again are
/// removed once the database is saved.
fn commit(
    ctx: &Context,
    db: &mut StateDb,
    record: LocalRecord,
) -> Result<Installed, PackageFailure> {
    let installed = Installed {
        id: record.id.clone(),
        version: record.version.clone(),
        mode: record.mode,
    };
    let stale = db
        .get_package(&record.id)
        .map(|previous| stale_actions(&previous.actions, &record.actions))
        .unwrap_or_default();

    db.install_package(record)
        .map_err(|e| PackageFailure {
            id: installed.id.clone(),
            stage: Stage::Installing,
            error: e.into(),
        })?;

    if !stale.is_empty() {
        tracing::debug!(
            package = %installed.id,
            count = stale.len(),
            "removing files of replaced version"
        );
        let undone = actions::undo(&stale, ctx.root());
        for warning in &undone.warnings {
            ctx.reporter.warning(&format!("{}: {warning}", installed.id));
        }
    }
    Ok(installed)
}

/// Placed files of `previous` that `current` does not place again.
fn stale_actions(previous: &[InstallAction], current: &[InstallAction]) -> Vec<InstallAction> {
    let placed: HashSet<&str> = current
        .iter()
        .filter(|a| !matches!(a, InstallAction::Remove { .. }))
        .map(InstallAction::target)
        .collect();
    previous
        .iter()
        .filter(|a| !matches!(a, InstallAction::Remove { .. }))
        .filter(|a| !placed.contains(a.target()))
        .cloned()
        .collect()
}

/// What a successful package run produced.
enum Outcome {
    Record(LocalRecord),
    /// A tool package was built; there is nothing to record.
    Tool,
}

struct Installer<'a> {
    ctx: &'a Context,
    registry: &'a Registry,
    vars: Variables,
    checker: DepChecker,
    work_dir: PathBuf,
}

impl Installer<'_> {
    async fn install(&mut self, entry: &PlanEntry) -> Result<Outcome, PackageFailure> {
        let id = &entry.id;
        let mut stage = Stage::Pending;
        self.ctx.reporter.stage(id, stage);

        let log = BuildLog::new(
            self.ctx
                .root()
                .build_log_path(id, entry.display_version().as_str()),
        );
        let result = self.install_steps(entry, &log, &mut stage).await;
        result.map_err(|error| PackageFailure {
            id: id.clone(),
            stage,
            error,
        })
    }

    async fn install_steps(
        &mut self,
        entry: &PlanEntry,
        log: &BuildLog,
        stage: &mut Stage,
    ) -> Result<Outcome, PackageError> {
        let registry = self.registry;
        let package = registry
            .get(&entry.id)
            .ok_or_else(|| PackageError::NoInstallMethod(entry.id.clone()))?;

        let binary = entry
            .version
            .as_ref()
            .and_then(|v| package.binary_version(v));
        match (binary, &package.entry.recipe) {
            (Some(version), _) => self
                .install_binary(&entry.id, version, log, stage)
                .await
                .map(Outcome::Record),
            (None, Some(recipe)) if package.descriptor().is_tool() => {
                self.fetch_and_build(&entry.id, recipe, log, stage).await?;
                Ok(Outcome::Tool)
            }
            (None, Some(recipe)) => self
                .install_source(&entry.id, recipe, log, stage)
                .await
                .map(Outcome::Record),
            (None, None) => Err(PackageError::NoInstallMethod(entry.id.clone())),
        }
    }

    fn enter(&self, id: &PackageId, current: &mut Stage, next: Stage) {
        *current = next;
        tracing::debug!(package = %id, stage = %next, "stage");
        self.ctx.reporter.stage(id, next);
    }

    fn fetch_ctx<'b>(&'b self, log: &'b BuildLog) -> FetchContext<'b> {
        FetchContext {
            client: &self.ctx.client,
            shell: self.ctx.shell.as_ref(),
            vars: &self.vars,
            log,
        }
    }

    fn build_ctx<'b>(&'b self, log: &'b BuildLog) -> BuildContext<'b> {
        BuildContext {
            shell: self.ctx.shell.as_ref(),
            vars: &self.vars,
            log,
            root: self.ctx.root(),
        }
    }

    async fn install_binary(
        &self,
        id: &PackageId,
        version: &VersionEntry,
        log: &BuildLog,
        stage: &mut Stage,
    ) -> Result<LocalRecord, PackageError> {
        self.enter(id, stage, Stage::Fetching);
        let dir = self.work_dir.join(format!("{id}-{}", version.number));
        reset_dir(&dir).await?;
        let location = Location::parse(&version.file);
        let archive = download_archive(&self.ctx.client, &location, &dir).await?;

        self.enter(id, stage, Stage::Verifying);
        if let Some(expected) = version.size {
            let actual = tokio::fs::metadata(&archive)
                .await
                .map_err(|e| PackageError::io(format!("cannot stat {}", archive.display()), e))?
                .len();
            if actual != expected {
                tracing::warn!(package = %id, expected, actual, "archive size differs from catalog");
                self.ctx.reporter.warning(&format!(
                    "{id}: archive is {actual} bytes, catalog says {expected}"
                ));
            }
        }
        match &version.checksum {
            Some(expected) => {
                let path = archive.clone();
                let expected = expected.clone();
                tokio::task::spawn_blocking(move || verify_md5(&path, &expected))
                    .await
                    .map_err(joined)??;
            }
            None => tracing::debug!(package = %id, "no checksum in catalog"),
        }

        self.enter(id, stage, Stage::Installing);
        let package_dir = unpack(self.fetch_ctx(log), &archive, &dir).await?;
        let manifest_path = package_dir.join(MANIFEST_FILE);
        let text = tokio::fs::read_to_string(&manifest_path)
            .await
            .map_err(|e| PackageError::io(format!("cannot read {}", manifest_path.display()), e))?;
        let manifest = InstallManifest::parse(&text).map_err(|source| PackageError::Manifest {
            path: manifest_path.clone(),
            source,
        })?;
        let actions = self.apply_actions(manifest.actions, package_dir).await?;

        Ok(LocalRecord {
            id: id.clone(),
            version: version.number.clone(),
            mode: InstallMode::Binary,
            actions,
        })
    }

    /// Check tools, fetch and build, returning the built source tree.
    async fn fetch_and_build(
        &mut self,
        id: &PackageId,
        recipe: &BuildRecipe,
        log: &BuildLog,
        stage: &mut Stage,
    ) -> Result<PathBuf, PackageError> {
        self.checker.check_all(&recipe.all_checks()).await?;

        self.enter(id, stage, Stage::Fetching);
        let source_dir = fetch::fetch(self.fetch_ctx(log), &recipe.download, &self.work_dir, id).await?;

        self.enter(id, stage, Stage::Building);
        build::build(self.build_ctx(log), &recipe.build, &source_dir).await?;
        Ok(source_dir)
    }

    async fn install_source(
        &mut self,
        id: &PackageId,
        recipe: &BuildRecipe,
        log: &BuildLog,
        stage: &mut Stage,
    ) -> Result<LocalRecord, PackageError> {
        let source_dir = self.fetch_and_build(id, recipe, log, stage).await?;

        self.enter(id, stage, Stage::Installing);
        let actions = build::install(self.build_ctx(log), &recipe.build, &source_dir).await?;

        Ok(LocalRecord {
            id: id.clone(),
            version: read_version_file(&source_dir).await,
            mode: InstallMode::Source,
            actions,
        })
    }

    async fn apply_actions(
        &self,
        actions: Vec<InstallAction>,
        package_dir: PathBuf,
    ) -> Result<Vec<InstallAction>, PackageError> {
        let root = self.ctx.root().clone();
        let vars = self.vars.clone();
        let suffix = self
            .ctx
            .settings
            .platform
            .map_or(std::env::consts::DLL_SUFFIX, |p| p.dynlib_suffix());

        let result = tokio::task::spawn_blocking(move || {
            ActionExecutor::new(&root, &package_dir, &vars, suffix).apply(&actions)
        })
        .await
        .map_err(joined)?;

        match result {
            Ok(applied) => {
                for warning in &applied.warnings {
                    self.ctx.reporter.warning(warning);
                }
                Ok(applied.performed)
            }
            Err(failure) => {
                for action in &failure.completed {
                    self.ctx
                        .reporter
                        .warning(&format!("left in place: {}", action.target()));
                }
                Err(PackageError::InstallAction(failure))
            }
        }
    }
}

fn joined(e: tokio::task::JoinError) -> PackageError {
    PackageError::io("background task failed", std::io::Error::other(e))
}

async fn reset_dir(dir: &Path) -> Result<(), PackageError> {
    if dir.exists() {
        tokio::fs::remove_dir_all(dir)
            .await
            .map_err(|e| PackageError::io(format!("cannot clean {}", dir.display()), e))?;
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| PackageError::io(format!("cannot create {}", dir.display()), e))
}

/// First line of the `VERSION` marker of a source tree, or `source`.
async fn read_version_file(source_dir: &Path) -> VersionTag {
    match tokio::fs::read_to_string(source_dir.join(VERSION_FILE)).await {
        Ok(text) => text
            .lines()
            .next()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or_else(VersionTag::source, VersionTag::new),
        Err(_) => VersionTag::source(),
    }
}

/// Directory sources are fetched and built in.
enum WorkDir {
    Configured(PathBuf),
    Temporary(tempfile::TempDir),
}

impl WorkDir {
    fn create(settings: &Settings) -> Result<Self, InstallError> {
        match &settings.build_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|source| InstallError::WorkDir {
                    path: dir.clone(),
                    source,
                })?;
                let dir = std::path::absolute(dir).unwrap_or_else(|_| dir.clone());
                Ok(Self::Configured(dir))
            }
            None => tempfile::Builder::new()
                .prefix("sis-build-")
                .tempdir()
                .map(Self::Temporary)
                .map_err(|source| InstallError::WorkDir {
                    path: std::env::temp_dir(),
                    source,
                }),
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Configured(dir) => dir,
            Self::Temporary(dir) => dir.path(),
        }
    }

    fn finish(self, keep: bool) {
        if let (Self::Temporary(dir), true) = (self, keep) {
            let path = dir.keep();
            tracing::info!(path = %path.display(), "kept build directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::paths::InstallRoot;
    use crate::reporter::NullReporter;
    use crate::shell::ShellOutput;
    use crate::shell::scripted::ScriptedShell;
    use sis_schema::Catalog;

    const CATALOG: &str = r#"<sis-extend>
        <package id="app">
          <req name="lib"/>
          <build>
            <download type="git" address="https://git.example.com/app.git"/>
            <make type="command" build="./build.sh"/>
          </build>
        </package>
        <package id="lib">
          <build>
            <dep type="command" name="gcc-toolchain" commands="gcc"/>
            <download type="git" address="https://git.example.com/lib.git"/>
            <make type="command" build="./build.sh"/>
          </build>
        </package>
      </sis-extend>"#;

    struct Harness {
        _dir: tempfile::TempDir,
        ctx: Context,
        shell: Arc<ScriptedShell>,
    }

    fn harness(shell: ScriptedShell) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(
            InstallRoot::new(dir.path().join("root")),
            Location::Local(dir.path().join("catalog")),
        )
        .with_build_dir(Some(dir.path().join("build")));
        let shell = Arc::new(shell);
        let ctx = Context::new(settings, reqwest::Client::new(), Arc::new(NullReporter))
            .with_shell(shell.clone());
        Harness {
            _dir: dir,
            ctx,
            shell,
        }
    }

    fn plan(ids: &[&str]) -> Plan {
        Plan {
            entries: ids
                .iter()
                .map(|id| PlanEntry {
                    id: PackageId::new(*id),
                    version: None,
                    requested: *id == "app",
                })
                .collect(),
            already_installed: Vec::new(),
        }
    }

    fn registry() -> Registry {
        Registry::merge(&[], &Catalog::parse(CATALOG).unwrap(), None)
    }

    #[tokio::test]
    async fn test_source_plan_installs_in_order() {
        let h = harness(ScriptedShell::new().with_programs(&["gcc", "git"]));
        let mut db = StateDb::open(h.ctx.root()).unwrap();

        let report = execute_plan(&h.ctx, &registry(), &mut db, &plan(&["lib", "app"]), false)
            .await
            .unwrap();

        assert!(report.is_success());
        let ids: Vec<&str> = report.installed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["lib", "app"]);
        assert!(db.is_installed("lib"));
        assert_eq!(db.get_package("app").unwrap().mode, InstallMode::Source);
        assert!(db.get_package("app").unwrap().version.is_source());
        let commands = h.shell.commands();
        assert!(commands[0].starts_with("git clone https://git.example.com/lib.git"));
        assert_eq!(commands[1], "./build.sh");
    }

    #[tokio::test]
    async fn test_failed_build_leaves_store_untouched() {
        let h = harness(
            ScriptedShell::new()
                .with_programs(&["gcc", "git"])
                .on("./build.sh", |_, _| ShellOutput::failed(2, "boom")),
        );
        let mut db = StateDb::open(h.ctx.root()).unwrap();

        let report = execute_plan(&h.ctx, &registry(), &mut db, &plan(&["lib", "app"]), false)
            .await
            .unwrap();

        let failure = report.failure.as_ref().unwrap();
        assert_eq!(failure.id, "lib");
        assert_eq!(failure.stage, Stage::Building);
        assert!(matches!(failure.error, PackageError::BuildFailed { code: 2, .. }));
        assert_eq!(report.not_attempted, vec![PackageId::new("app")]);
        assert!(db.list_packages().is_empty());
        assert!(!h.ctx.root().db_path().exists());
    }

    #[tokio::test]
    async fn test_missing_tool_fails_before_fetching() {
        let h = harness(ScriptedShell::new().with_programs(&["git"]));
        let mut db = StateDb::open(h.ctx.root()).unwrap();

        let report = execute_plan(&h.ctx, &registry(), &mut db, &plan(&["lib"]), false)
            .await
            .unwrap();

        let failure = report.failure.unwrap();
        assert_eq!(failure.stage, Stage::Pending);
        match failure.error {
            PackageError::DependencyUnsatisfied(dep) => assert_eq!(dep.name, "gcc-toolchain"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(h.shell.commands().is_empty());
    }

    #[tokio::test]
    async fn test_package_without_method() {
        let h = harness(ScriptedShell::new());
        let registry = Registry::merge(
            &[],
            &Catalog::parse(r#"<sis-extend><package id="doc"/></sis-extend>"#).unwrap(),
            None,
        );
        let mut db = StateDb::open(h.ctx.root()).unwrap();
        let report = execute_plan(&h.ctx, &registry, &mut db, &plan(&["doc"]), false)
            .await
            .unwrap();
        assert!(matches!(
            report.failure.unwrap().error,
            PackageError::NoInstallMethod(_)
        ));
    }

    #[tokio::test]
    async fn test_version_marker_is_recorded() {
        let h = harness(
            ScriptedShell::new()
                .with_programs(&["gcc", "git"])
                .on("git clone", |command, _| {
                    let target = command.rsplit(' ').next().unwrap();
                    std::fs::create_dir_all(target).unwrap();
                    std::fs::write(Path::new(target).join("VERSION"), "2.1.0\n").unwrap();
                    ShellOutput::ok("")
                }),
        );
        let mut db = StateDb::open(h.ctx.root()).unwrap();
        execute_plan(&h.ctx, &registry(), &mut db, &plan(&["lib"]), false)
            .await
            .unwrap();
        assert_eq!(db.get_package("lib").unwrap().version, "2.1.0");
    }

    #[tokio::test]
    async fn test_tool_package_is_built_but_not_installed() {
        let h = harness(ScriptedShell::new().with_programs(&["git", "make"]));
        let registry = Registry::merge(
            &[],
            &Catalog::parse(
                r#"<sis-extend>
                    <package id="gen" tool="yes">
                      <build>
                        <download type="git" address="https://git.example.com/gen.git"/>
                        <make type="make"/>
                      </build>
                    </package>
                    <package id="app">
                      <req name="gen"/>
                      <build>
                        <download type="git" address="https://git.example.com/app.git"/>
                        <make type="command" build="./build.sh"/>
                      </build>
                    </package>
                  </sis-extend>"#,
            )
            .unwrap(),
            None,
        );
        let mut db = StateDb::open(h.ctx.root()).unwrap();

        let report = execute_plan(&h.ctx, &registry, &mut db, &plan(&["gen", "app"]), false)
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.tools, vec![PackageId::new("gen")]);
        let ids: Vec<&str> = report.installed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["app"]);
        assert!(!db.is_installed("gen"));
        let commands = h.shell.commands();
        assert!(commands.iter().any(|c| c == "make all"));
        assert!(!commands.iter().any(|c| c.starts_with("make install")));
    }

    #[test]
    fn test_stale_actions_of_replaced_version() {
        let file = |target: &str| InstallAction::InstallFile {
            path: target.to_string(),
            to: Some(target.to_string()),
        };
        let previous = vec![
            file("bin/tool"),
            file("lib/libold.a"),
            InstallAction::Remove {
                path: "share/legacy".into(),
            },
        ];
        let current = vec![file("bin/tool"), file("lib/libnew.a")];

        assert_eq!(stale_actions(&previous, &current), vec![file("lib/libold.a")]);
        assert!(stale_actions(&current, &current).is_empty());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Verifying.to_string(), "verifying");
        assert_eq!(Stage::Installed.as_str(), "installed");
    }
}
