//! Per-package build log.
//!
//! Every subprocess run for a package appends its command line and output
//! here; failures carry only the tail of the output.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::PackageError;
use crate::shell::{Shell, ShellOutput};

/// Lines of output kept in a [`PackageError::BuildFailed`].
const TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct BuildLog {
    path: PathBuf,
}

impl BuildLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a section to the log. Write problems are only traced.
    pub async fn append(&self, text: &str) {
        if let Err(e) = self.try_append(text).await {
            tracing::warn!(path = %self.path.display(), error = %e, "cannot write build log");
        }
    }

    async fn try_append(&self, text: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await
    }

    /// Run a command through `shell`, logging it and its output.
    ///
    /// # Errors
    ///
    /// A nonzero exit is [`PackageError::BuildFailed`] with the tail of the
    /// output; a spawn failure is [`PackageError::Io`].
    pub async fn run(
        &self,
        shell: &dyn Shell,
        command: &str,
        cwd: &Path,
    ) -> Result<ShellOutput, PackageError> {
        tracing::info!(%command, "build step");
        self.append(&format!("\n$ cd {} && {command}\n", cwd.display()))
            .await;

        let output = shell
            .run(command, cwd)
            .await
            .map_err(|e| PackageError::io(format!("cannot run `{command}`"), e))?;
        self.append(&output.combined()).await;

        if output.success() {
            Ok(output)
        } else {
            Err(PackageError::BuildFailed {
                command: command.to_string(),
                code: output.code.unwrap_or(-1),
                output: last_lines(&output.combined(), TAIL_LINES),
            })
        }
    }
}

/// Last `n` lines of `text`.
fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
