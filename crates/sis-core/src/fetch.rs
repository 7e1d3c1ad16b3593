//! Download backends.
//!
//! Fetch the sources of a package into a work directory: Git and Mercurial
//! clones land in `<work_dir>/<package id>`, archives must unpack to
//! `<work_dir>/<archive base name>`. A failed clone or `unrar` run is a
//! [`DownloadError`], not a build failure.

use std::path::{Path, PathBuf};

use reqwest::Client;
use sis_schema::{DownloadSpec, PackageId};

use crate::error::PackageError;
use crate::io::download::{DownloadError, Location, download_to};
use crate::io::extract::{ArchiveFormat, detect_format, extract_native};
use crate::log::BuildLog;
use crate::shell::{Shell, quote};
use crate::vars::Variables;

/// What a download backend needs from its caller.
#[derive(Clone, Copy)]
pub struct FetchContext<'a> {
    pub client: &'a Client,
    pub shell: &'a dyn Shell,
    pub vars: &'a Variables,
    pub log: &'a BuildLog,
}

/// Fetch the sources described by `spec`, returning the source tree.
pub async fn fetch(
    ctx: FetchContext<'_>,
    spec: &DownloadSpec,
    work_dir: &Path,
    id: &PackageId,
) -> Result<PathBuf, PackageError> {
    match spec {
        DownloadSpec::Git { address, tag } => {
            let target = clean_target(work_dir, id).await?;
            let branch = tag
                .as_deref()
                .map(|t| format!("--branch {} ", quote(&ctx.vars.expand(t))))
                .unwrap_or_default();
            let command = format!(
                "git clone {branch}{} {}",
                quote(&ctx.vars.expand(address)),
                quote(&target.to_string_lossy())
            );
            run_fetch_command(ctx, &command, work_dir).await?;
            Ok(target)
        }
        DownloadSpec::Mercurial { address } => {
            let target = clean_target(work_dir, id).await?;
            let command = format!(
                "hg clone {} {}",
                quote(&ctx.vars.expand(address)),
                quote(&target.to_string_lossy())
            );
            run_fetch_command(ctx, &command, work_dir).await?;
            Ok(target)
        }
        DownloadSpec::Archive { url } => {
            let location = Location::parse(&ctx.vars.expand(url));
            let archive = download_archive(ctx.client, &location, work_dir).await?;
            unpack(ctx, &archive, work_dir).await
        }
    }
}

/// Run a retrieval command, reporting a nonzero exit as a download error.
async fn run_fetch_command(
    ctx: FetchContext<'_>,
    command: &str,
    cwd: &Path,
) -> Result<(), PackageError> {
    match ctx.log.run(ctx.shell, command, cwd).await {
        Ok(_) => Ok(()),
        Err(PackageError::BuildFailed {
            command,
            code,
            output,
        }) => Err(DownloadError::Command {
            command,
            code,
            output,
        }
        .into()),
        Err(other) => Err(other),
    }
}

/// Remove a previous clone so VCS clients start from scratch.
async fn clean_target(work_dir: &Path, id: &PackageId) -> Result<PathBuf, PackageError> {
    let target = work_dir.join(id.as_str());
    if target.exists() {
        tracing::debug!(target = %target.display(), "removing previous checkout");
        tokio::fs::remove_dir_all(&target)
            .await
            .map_err(|e| PackageError::io(format!("cannot remove {}", target.display()), e))?;
    }
    Ok(target)
}

/// Copy an archive into `work_dir`, returning its local path.
pub async fn download_archive(
    client: &Client,
    location: &Location,
    work_dir: &Path,
) -> Result<PathBuf, PackageError> {
    let name = location.file_name();
    if name.is_empty() {
        return Err(DownloadError::UnsupportedArchive(location.to_string()).into());
    }
    let dest = work_dir.join(&name);
    let bytes = download_to(client, location, &dest).await?;
    tracing::debug!(%location, bytes, "archive retrieved");
    Ok(dest)
}

/// Unpack an archive into its directory, returning `<dir>/<base name>`.
pub async fn unpack(
    ctx: FetchContext<'_>,
    archive: &Path,
    dir: &Path,
) -> Result<PathBuf, PackageError> {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (format, base) =
        detect_format(&name).map_err(|_| DownloadError::UnsupportedArchive(name.clone()))?;

    match format {
        ArchiveFormat::Rar => {
            let command = format!("unrar x -o+ {}", quote(&name));
            run_fetch_command(ctx, &command, dir).await?;
        }
        _ => {
            let archive = archive.to_path_buf();
            let dest = dir.to_path_buf();
            let count = tokio::task::spawn_blocking(move || extract_native(format, &archive, &dest))
                .await
                .map_err(|e| PackageError::io("extraction task failed", std::io::Error::other(e)))??;
            tracing::debug!(archive = %name, entries = count, "unpacked");
        }
    }

    let expected = dir.join(&base);
    if expected.is_dir() {
        Ok(expected)
    } else {
        Err(PackageError::Layout { expected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::ShellOutput;
    use crate::shell::scripted::ScriptedShell;

    fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
        let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    struct Env {
        dir: tempfile::TempDir,
        client: Client,
        shell: ScriptedShell,
        vars: Variables,
        log: BuildLog,
    }

    impl Env {
        fn new(shell: ScriptedShell) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let log = BuildLog::new(dir.path().join("build.log"));
            let mut vars = Variables::default();
            vars.set("top_dir", dir.path().to_string_lossy());
            Self {
                dir,
                client: Client::new(),
                shell,
                vars,
                log,
            }
        }

        fn ctx(&self) -> FetchContext<'_> {
            FetchContext {
                client: &self.client,
                shell: &self.shell,
                vars: &self.vars,
                log: &self.log,
            }
        }

        fn work(&self) -> PathBuf {
            let work = self.dir.path().join("work");
            std::fs::create_dir_all(&work).unwrap();
            work
        }
    }

    #[tokio::test]
    async fn test_git_clone_with_tag_replaces_previous_checkout() {
        let env = Env::new(ScriptedShell::new());
        let work = env.work();
        std::fs::create_dir_all(work.join("gel/stale")).unwrap();

        let spec = DownloadSpec::Git {
            address: "https://git.example.com/gel.git".into(),
            tag: Some("v1".into()),
        };
        let target = fetch(env.ctx(), &spec, &work, &PackageId::new("gel"))
            .await
            .unwrap();

        assert_eq!(target, work.join("gel"));
        assert!(!work.join("gel/stale").exists());
        assert_eq!(
            env.shell.commands(),
            vec![format!(
                "git clone --branch v1 https://git.example.com/gel.git {}",
                work.join("gel").display()
            )]
        );
    }

    #[tokio::test]
    async fn test_mercurial_failure_is_download_error() {
        let env = Env::new(ScriptedShell::new().on("hg", |_, _| {
            ShellOutput::failed(255, "abort: repository not found")
        }));
        let work = env.work();
        let spec = DownloadSpec::Mercurial {
            address: "$(top_dir)/repo".into(),
        };
        let err = fetch(env.ctx(), &spec, &work, &PackageId::new("elm"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PackageError::Download(DownloadError::Command { code: 255, ref output, .. })
                if output.contains("repository not found")
        ));
        assert!(env.shell.commands()[0].contains(&env.dir.path().display().to_string()));
    }

    #[tokio::test]
    async fn test_local_archive_is_unpacked() {
        let env = Env::new(ScriptedShell::new());
        let work = env.work();
        let archive = env.dir.path().join("gel-src.tar.gz");
        std::fs::write(&archive, tar_gz(&[("gel-src/CMakeLists.txt", "project(gel)")])).unwrap();

        let spec = DownloadSpec::Archive {
            url: "$(top_dir)/gel-src.tar.gz".into(),
        };
        let source = fetch(env.ctx(), &spec, &work, &PackageId::new("gel"))
            .await
            .unwrap();
        assert_eq!(source, work.join("gel-src"));
        assert!(source.join("CMakeLists.txt").is_file());
    }

    #[tokio::test]
    async fn test_archive_with_wrong_layout() {
        let env = Env::new(ScriptedShell::new());
        let work = env.work();
        let archive = env.dir.path().join("gel-src.tar.gz");
        std::fs::write(&archive, tar_gz(&[("other/file", "x")])).unwrap();

        let spec = DownloadSpec::Archive {
            url: archive.to_string_lossy().into_owned(),
        };
        let err = fetch(env.ctx(), &spec, &work, &PackageId::new("gel"))
            .await
            .unwrap_err();
        assert!(matches!(err, PackageError::Layout { .. }));
    }

    #[tokio::test]
    async fn test_unsupported_archive() {
        let env = Env::new(ScriptedShell::new());
        let work = env.work();
        let archive = env.dir.path().join("gel.7z");
        std::fs::write(&archive, "x").unwrap();
        let spec = DownloadSpec::Archive {
            url: archive.to_string_lossy().into_owned(),
        };
        let err = fetch(env.ctx(), &spec, &work, &PackageId::new("gel"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PackageError::Download(DownloadError::UnsupportedArchive(ref name)) if name == "gel.7z"
        ));
    }

    #[tokio::test]
    async fn test_rar_goes_through_unrar() {
        let env = Env::new(ScriptedShell::new().on("unrar", |_, cwd| {
            std::fs::create_dir_all(cwd.join("tool")).unwrap();
            ShellOutput::ok("")
        }));
        let work = env.work();
        let archive = env.dir.path().join("tool.rar");
        std::fs::write(&archive, "rar").unwrap();
        let spec = DownloadSpec::Archive {
            url: archive.to_string_lossy().into_owned(),
        };
        let source = fetch(env.ctx(), &spec, &work, &PackageId::new("tool"))
            .await
            .unwrap();
        assert_eq!(source, work.join("tool"));
        assert_eq!(env.shell.commands(), vec!["unrar x -o+ tool.rar"]);
    }

    #[tokio::test]
    async fn test_failed_git_clone_is_download_error() {
        let env = Env::new(ScriptedShell::new().on("git clone", |_, _| {
            ShellOutput::failed(128, "fatal: Authentication failed")
        }));
        let work = env.work();
        let spec = DownloadSpec::Git {
            address: "https://git.example.com/private.git".into(),
            tag: None,
        };
        let err = fetch(env.ctx(), &spec, &work, &PackageId::new("gel"))
            .await
            .unwrap_err();
        match err {
            PackageError::Download(DownloadError::Command { command, code, output }) => {
                assert!(command.starts_with("git clone"));
                assert_eq!(code, 128);
                assert!(output.contains("Authentication failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(std::fs::read_to_string(env.log.path()).unwrap().contains("git clone"));
    }
}
