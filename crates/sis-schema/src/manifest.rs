//! Install actions, binary package manifests and the local database format.
//!
//! A binary package archive carries an `install.xml` manifest (`<sis-install>`)
//! listing the actions that place its files. The local database
//! (`<sis-extend>`) stores, for every installed package, the actions that were
//! actually performed, in the same element format.

use crate::types::{PackageId, VersionTag};
use crate::xml::{Element, XmlError};
use crate::{CATALOG_ROOT, MANIFEST_ROOT};

/// Errors raised while reading a manifest or the local database.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The document itself is unreadable.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// An action element names no known action.
    #[error("unknown install action <{0}>")]
    UnknownAction(String),

    /// An action element is structurally invalid.
    #[error("invalid install action: {0}")]
    InvalidAction(String),

    /// A database record is invalid.
    #[error("invalid record for '{package}': {message}")]
    InvalidRecord {
        /// Package of the record.
        package: String,
        /// What is wrong.
        message: String,
    },
}

/// A declarative, reversible file operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallAction {
    /// Copy a file or directory from the package into the installation root.
    InstallFile {
        /// Source path relative to the package directory.
        path: String,
        /// Destination relative to the root (defaults to `path`).
        to: Option<String>,
    },
    /// Like [`InstallAction::InstallFile`], with the platform's shared library
    /// suffix appended to both paths.
    InstallDynLib {
        /// Source path without suffix.
        path: String,
        /// Destination without suffix (defaults to `path`).
        to: Option<String>,
    },
    /// Delete a file or directory under the root.
    Remove {
        /// Path relative to the root.
        path: String,
    },
}

impl InstallAction {
    /// Element kind name of this action.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InstallFile { .. } | Self::InstallDynLib { .. } => "install",
            Self::Remove { .. } => "remove",
        }
    }

    /// Destination of an install action or path of a removal.
    pub fn target(&self) -> &str {
        match self {
            Self::InstallFile { path, to } | Self::InstallDynLib { path, to } => {
                to.as_deref().unwrap_or(path)
            }
            Self::Remove { path } => path,
        }
    }

    /// Parse one action element.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::UnknownAction`] for unknown element names and
    /// [`ManifestError::InvalidAction`] for missing attributes.
    pub fn from_element(element: &Element) -> Result<Self, ManifestError> {
        let parser = ACTION_KINDS
            .iter()
            .find(|(kind, _)| *kind == element.name)
            .map(|(_, parser)| *parser)
            .ok_or_else(|| ManifestError::UnknownAction(element.name.clone()))?;
        parser(element)
    }

    /// Element form of this action.
    pub fn to_element(&self) -> Element {
        match self {
            Self::InstallFile { path, to } => Element::new("install")
                .with_attr("file", path)
                .with_opt_attr("to", to.as_deref()),
            Self::InstallDynLib { path, to } => Element::new("install")
                .with_attr("dynlib", path)
                .with_opt_attr("to", to.as_deref()),
            Self::Remove { path } => Element::new("remove").with_attr("path", path),
        }
    }
}

type ActionParser = fn(&Element) -> Result<InstallAction, ManifestError>;

const ACTION_KINDS: &[(&str, ActionParser)] = &[("install", parse_install), ("remove", parse_remove)];

fn parse_install(element: &Element) -> Result<InstallAction, ManifestError> {
    let to = element.attr("to").map(str::to_string);
    match (element.attr("file"), element.attr("dynlib")) {
        (Some(path), None) => Ok(InstallAction::InstallFile {
            path: path.to_string(),
            to,
        }),
        (None, Some(path)) => Ok(InstallAction::InstallDynLib {
            path: path.to_string(),
            to,
        }),
        (Some(_), Some(_)) => Err(ManifestError::InvalidAction(
            "<install> has both 'file' and 'dynlib'".to_string(),
        )),
        (None, None) => Err(ManifestError::InvalidAction(
            "<install> needs a 'file' or 'dynlib' attribute".to_string(),
        )),
    }
}

fn parse_remove(element: &Element) -> Result<InstallAction, ManifestError> {
    let path = element
        .attr("path")
        .ok_or_else(|| ManifestError::InvalidAction("<remove> needs a 'path'".to_string()))?;
    Ok(InstallAction::Remove {
        path: path.to_string(),
    })
}

fn parse_actions<'a>(
    elements: impl IntoIterator<Item = &'a Element>,
) -> Result<Vec<InstallAction>, ManifestError> {
    elements
        .into_iter()
        .map(InstallAction::from_element)
        .collect()
}

/// The `install.xml` manifest shipped inside a binary package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallManifest {
    /// Actions in execution order.
    pub actions: Vec<InstallAction>,
}

impl InstallManifest {
    /// Parse a manifest document.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the XML is malformed, the root is not
    /// `<sis-install>`, or an action is unknown or invalid.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let root = Element::parse_root(text, MANIFEST_ROOT)?;
        Ok(Self {
            actions: parse_actions(&root.children)?,
        })
    }
}

/// How an installed package was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// Prebuilt archive.
    Binary,
    /// Built from source.
    Source,
}

impl InstallMode {
    /// Attribute value of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Source => "source",
        }
    }
}

impl std::fmt::Display for InstallMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InstallMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(Self::Binary),
            "source" => Ok(Self::Source),
            _ => Err(format!("Unknown install mode: {s}")),
        }
    }
}

/// The reversible record of one installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRecord {
    /// Installed package.
    pub id: PackageId,
    /// Installed version (`source` when unknown).
    pub version: VersionTag,
    /// Binary or source install.
    pub mode: InstallMode,
    /// Actions performed, each carrying its resolved target.
    pub actions: Vec<InstallAction>,
}

impl LocalRecord {
    fn from_element(element: &Element) -> Result<Self, ManifestError> {
        let id = element.required_attr("id")?;
        let version = VersionTag::new(element.required_attr("version")?);
        let mode = match element.attr("mode") {
            Some(mode) => mode.parse().map_err(|message| ManifestError::InvalidRecord {
                package: id.to_string(),
                message,
            })?,
            None if version.is_source() => InstallMode::Source,
            None => InstallMode::Binary,
        };
        let actions = match element.child("actions") {
            Some(actions) => parse_actions(&actions.children)?,
            None => Vec::new(),
        };
        Ok(Self {
            id: PackageId::new(id),
            version,
            mode,
            actions,
        })
    }

    fn to_element(&self) -> Element {
        let actions = self
            .actions
            .iter()
            .fold(Element::new("actions"), |el, action| {
                el.with_child(action.to_element())
            });
        Element::new("package")
            .with_attr("id", self.id.as_str())
            .with_attr("version", self.version.as_str())
            .with_attr("mode", self.mode.as_str())
            .with_child(actions)
    }
}

/// Contents of the local database file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalDb {
    /// Installed packages in file order.
    pub records: Vec<LocalRecord>,
}

impl LocalDb {
    /// Parse a local database document.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the document or a record is invalid.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let root = Element::parse_root(text, CATALOG_ROOT)?;
        let records = root
            .children_named("package")
            .map(LocalRecord::from_element)
            .collect::<Result<_, _>>()?;
        Ok(Self { records })
    }

    /// Serialize the database as a document.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Write`] if serialization fails.
    pub fn to_document(&self) -> Result<String, XmlError> {
        self.records
            .iter()
            .fold(Element::new(CATALOG_ROOT), |root, record| {
                root.with_child(record.to_element())
            })
            .to_document()
    }
}
