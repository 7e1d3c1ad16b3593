//! Shared types and XML wire formats for SIS.
//!
//! This crate holds everything that describes packages without touching the
//! network or the installation root: the catalog model, install actions, the
//! local database format, platform naming and version ordering.

pub mod catalog;
pub mod manifest;
pub mod package;
pub mod platform;
pub mod types;
pub mod xml;

// Re-exports
pub use catalog::{Catalog, CatalogEntry, CatalogError};
pub use manifest::{
    InstallAction, InstallManifest, InstallMode, LocalDb, LocalRecord, ManifestError,
};
pub use package::{
    BuildRecipe, BuildSpec, DepCheck, DownloadSpec, License, PackageDescriptor, ProbeLang,
    VersionEntry, tool_commands,
};
pub use platform::Platform;
pub use types::{PackageId, SOURCE_VERSION, VersionTag};
pub use xml::{Element, XmlError};

/// Root element of catalogs and of the local database.
pub const CATALOG_ROOT: &str = "sis-extend";

/// Root element of binary package manifests.
pub const MANIFEST_ROOT: &str = "sis-install";

/// File name of a catalog inside the catalog root or a platform directory.
pub const INDEX_FILE: &str = "index.xml";

/// File name of the manifest at the top of a binary package.
pub const MANIFEST_FILE: &str = "install.xml";

/// File name of the local database inside the installation root.
pub const LOCAL_DB_FILE: &str = "install.xml";

/// Marker file giving the version of a fetched source tree.
pub const VERSION_FILE: &str = "VERSION";
