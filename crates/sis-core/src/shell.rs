//! Subprocess and probe interface.
//!
//! Everything that touches the host system (VCS clients, build tools,
//! compilers, the search path) goes through [`Shell`], so install flows can be
//! exercised against a scripted implementation.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;

/// Captured result of a shell command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// A successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }
}

#[async_trait]
pub trait Shell: Send + Sync {
    /// Run a command line through the system shell with `cwd` as working
    /// directory, capturing its output.
    async fn run(&self, command: &str, cwd: &Path) -> std::io::Result<ShellOutput>;

    /// Locate an executable on the search path.
    fn find_program(&self, name: &str) -> Option<PathBuf>;
}

/// [`Shell`] backed by `/bin/sh -c` (`cmd /C` on Windows).
#[derive(Debug, Clone)]
pub struct SystemShell {
    jobs: usize,
}

impl SystemShell {
    pub fn new() -> Self {
        Self {
            jobs: num_cpus::get(),
        }
    }
}

impl Default for SystemShell {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Shell for SystemShell {
    async fn run(&self, command: &str, cwd: &Path) -> std::io::Result<ShellOutput> {
        tracing::debug!(%command, cwd = %cwd.display(), "running");

        let mut cmd = if cfg!(windows) {
            let mut c = tokio::process::Command::new("cmd");
            c.arg("/C");
            c
        } else {
            let mut c = tokio::process::Command::new("/bin/sh");
            c.arg("-c");
            c
        };
        cmd.arg(command)
            .current_dir(cwd)
            .env("JOBS", self.jobs.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = cmd.output().await?;
        Ok(ShellOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn find_program(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

/// Quote a single argument for `/bin/sh`.
pub fn quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
