//! User-facing operations, each taking a shared [`Context`].

pub mod context;
pub mod init;
pub mod install;
pub mod query;
pub mod sources;
pub mod uninstall;

pub use context::{Context, Settings};
pub use init::{InitError, init_root};
pub use install::{InstallError, InstallOptions, InstallReport, Installed, Stage, install_packages};
pub use query::{ListEntry, PackageInfo, QueryError};
pub use sources::{SourcesError, SourcesReport, fetch_sources};
pub use uninstall::{DependentsPolicy, UninstallError, UninstallReport, uninstall_packages};
