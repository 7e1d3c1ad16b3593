//! Domain-specific errors for package operations

use std::path::PathBuf;

use sis_schema::{ManifestError, PackageId};
use thiserror::Error;

use crate::actions::ActionFailure;
use crate::io::{ChecksumError, DownloadError, ExtractError};
use crate::ops::install::Stage;
use crate::probe::DependencyUnsatisfied;
use crate::store::StoreError;

/// Why one package could not be installed.
#[derive(Error, Debug)]
pub enum PackageError {
    #[error(transparent)]
    DependencyUnsatisfied(#[from] DependencyUnsatisfied),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Unpacking failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("unpacked archive has no {} directory", expected.display())]
    Layout { expected: PathBuf },

    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    #[error("command `{command}` failed with exit code {code}{}", if output.is_empty() { String::new() } else { format!("\n{output}") })]
    BuildFailed {
        command: String,
        code: i32,
        /// Last lines of the command output.
        output: String,
    },

    #[error("Install action failed: {0}")]
    InstallAction(#[from] ActionFailure),

    #[error("no binary for this platform and no build recipe for {0}")]
    NoInstallMethod(PackageId),

    #[error("bad install manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PackageError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// A package error with the package and the stage it happened in.
#[derive(Error, Debug)]
#[error("{id} failed while {stage}: {error}")]
pub struct PackageFailure {
    pub id: PackageId,
    pub stage: Stage,
    #[source]
    pub error: PackageError,
}
