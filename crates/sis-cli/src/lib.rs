//! sis - Simple Installer System
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Installs optional components of a framework, with their requirements,
//! into a local directory. Packages come as prebuilt archives for the host
//! platform or as build recipes.
//!
//! # Directory Layout
//!
//! ```text
//! <root>/
//! ├── install.xml   # Installed packages and the actions that placed them
//! ├── logs/         # Build logs
//! └── ...           # Files placed by packages
//! ```

pub mod cmd;
pub mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use sis_core::io::Location;
use sis_core::ops::{Context, DependentsPolicy, Settings};
use sis_core::{InstallRoot, Reporter, USER_AGENT, default_root};
use sis_schema::Platform;

#[derive(Debug, Parser)]
#[command(name = "sis")]
#[command(author, version, about = "sis - Simple Installer System")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Installation root (default: ~/.sis)
    #[arg(long, short = 'R', env = "SIS_ROOT", global = true)]
    pub root: Option<PathBuf>,

    /// Catalog location: URL or directory holding index.xml
    #[arg(long, short = 'b', env = "SIS_CATALOG", global = true)]
    pub catalog: Option<String>,

    /// Build directory, kept after the run
    #[arg(long, short = 'B', env = "SIS_BUILD_DIR", global = true)]
    pub build_dir: Option<PathBuf>,

    /// Platform of binary packages (e.g. linux-x86_64)
    #[arg(long, global = true)]
    pub platform: Option<Platform>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create an empty installation root
    Init,
    /// List available and installed packages
    List,
    /// Show package details
    Info {
        /// Package id(s)
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Install packages with their requirements
    Install {
        /// Package id(s), optionally with version: pack or pack:1.0 or pack:source
        #[arg(required = true)]
        packages: Vec<String>,
        /// Reinstall requested packages that are already installed
        #[arg(long, short = 'f')]
        force: bool,
        /// Show the plan without installing anything
        #[arg(long, short = 'D')]
        dry_run: bool,
    },
    /// Remove installed packages
    Uninstall {
        /// Package id(s)
        #[arg(required = true)]
        packages: Vec<String>,
        /// What to do with installed packages that require them
        #[arg(long, default_value = "block", value_parser = ["block", "warn", "cascade"])]
        dependents: String,
    },
    /// Download package sources into the build directory
    Sources {
        /// Package id(s)
        #[arg(required = true)]
        packages: Vec<String>,
        /// Also write a Makefile building them in order
        #[arg(long)]
        makefile: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

impl GlobalArgs {
    /// Installation root from the arguments, else ~/.sis.
    pub fn install_root(&self) -> Result<InstallRoot> {
        let path = match &self.root {
            Some(root) => root.clone(),
            None => default_root().context("Cannot locate home directory; pass --root")?,
        };
        Ok(InstallRoot::new(path))
    }

    pub fn settings(&self) -> Result<Settings> {
        let catalog = self
            .catalog
            .as_deref()
            .context("No catalog location: pass --catalog or set SIS_CATALOG")?;
        let mut settings = Settings::new(self.install_root()?, Location::parse(catalog))
            .with_build_dir(self.build_dir.clone());
        if self.platform.is_some() {
            settings = settings.with_platform(self.platform);
        }
        Ok(settings)
    }

    /// Operation context reporting through `reporter`.
    pub fn context(&self, reporter: Arc<dyn Reporter>) -> Result<Context> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Context::new(self.settings()?, client, reporter))
    }
}

/// Parse a `--dependents` value.
pub fn dependents_policy(value: &str) -> Result<DependentsPolicy> {
    value.parse().map_err(|e: String| anyhow::anyhow!(e))
}
