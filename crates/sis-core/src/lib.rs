//! Core engine of `sis`: catalog loading and merging, dependency resolution,
//! download and build backends, install actions and the local store.
//!
//! Everything here works against an explicit [`InstallRoot`]; nothing reads
//! a process-wide installation directory.

pub mod actions;
pub mod build;
pub mod error;
pub mod fetch;
pub mod io;
pub mod log;
pub mod ops;
pub mod paths;
pub mod probe;
pub mod registry;
pub mod reporter;
pub mod resolver;
pub mod shell;
pub mod store;
pub mod vars;

pub use error::{PackageError, PackageFailure};
pub use paths::*;
pub use registry::{Registry, RegistryEntry};
pub use reporter::{NullReporter, Reporter};
pub use resolver::{Plan, PlanEntry, Request};
pub use shell::{Shell, ShellOutput, SystemShell};
pub use store::StateDb;

/// User Agent string for catalog and package downloads
pub const USER_AGENT: &str = concat!("sis/", env!("CARGO_PKG_VERSION"));
