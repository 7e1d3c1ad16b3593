//! Build backends.
//!
//! A fetched source tree is built with [`build`] and installed with
//! [`install`]. Installs driven by a generator record the files they place
//! so the package can be uninstalled later.

use std::path::Path;

use sis_schema::{BuildSpec, InstallAction};

use crate::error::PackageError;
use crate::log::BuildLog;
use crate::paths::InstallRoot;
use crate::shell::Shell;
use crate::vars::Variables;

/// Install output prefixes listing placed files.
const INSTALLED_MARKERS: &[&str] = &["-- Installing: ", "-- Up-to-date: "];

#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    pub shell: &'a dyn Shell,
    pub vars: &'a Variables,
    pub log: &'a BuildLog,
    pub root: &'a InstallRoot,
}

/// Command lines of the build step, in order.
pub fn build_commands(spec: &BuildSpec, vars: &Variables) -> Vec<String> {
    match spec {
        BuildSpec::Generator { flags } => {
            vec![join("cmake .", &vars.expand(flags)), "make".to_string()]
        }
        BuildSpec::PlainMake { flags } => vec![join("make all", &vars.expand(flags))],
        BuildSpec::Command { command } => vec![vars.expand(command)],
    }
}

/// Command line of the install step, if the method has one.
pub fn install_command(spec: &BuildSpec, vars: &Variables) -> Option<String> {
    match spec {
        BuildSpec::Generator { .. } => Some("make install".to_string()),
        BuildSpec::PlainMake { flags } => Some(join("make install", &vars.expand(flags))),
        BuildSpec::Command { .. } => None,
    }
}

fn join(command: &str, flags: &str) -> String {
    let flags = flags.trim();
    if flags.is_empty() {
        command.to_string()
    } else {
        format!("{command} {flags}")
    }
}

/// Run the build step in `source_dir`.
pub async fn build(
    ctx: BuildContext<'_>,
    spec: &BuildSpec,
    source_dir: &Path,
) -> Result<(), PackageError> {
    for command in build_commands(spec, ctx.vars) {
        ctx.log.run(ctx.shell, &command, source_dir).await?;
    }
    Ok(())
}

/// Run the install step in `source_dir`, returning the actions to record.
pub async fn install(
    ctx: BuildContext<'_>,
    spec: &BuildSpec,
    source_dir: &Path,
) -> Result<Vec<InstallAction>, PackageError> {
    let Some(command) = install_command(spec, ctx.vars) else {
        return Ok(Vec::new());
    };
    let output = ctx.log.run(ctx.shell, &command, source_dir).await?;

    let actions = match spec {
        BuildSpec::Generator { .. } => installed_files(&output.stdout, ctx.root),
        _ => Vec::new(),
    };
    tracing::debug!(recorded = actions.len(), "install step done");
    Ok(actions)
}

/// Files listed by generator install output that lie under the root, as
/// root-relative [`InstallAction::InstallFile`] records.
fn installed_files(output: &str, root: &InstallRoot) -> Vec<InstallAction> {
    let mut actions: Vec<InstallAction> = Vec::new();
    for line in output.lines() {
        let Some(file) = INSTALLED_MARKERS
            .iter()
            .find_map(|marker| line.strip_prefix(marker))
        else {
            continue;
        };
        let Ok(relative) = Path::new(file.trim()).strip_prefix(root.path()) else {
            continue;
        };
        let relative = relative.to_string_lossy().into_owned();
        if relative.is_empty() || actions.iter().any(|a| a.target() == relative) {
            continue;
        }
        actions.push(InstallAction::InstallFile {
            path: relative.clone(),
            to: Some(relative),
        });
    }
    actions
}
