//! Package descriptors and build recipes.

use crate::types::{PackageId, VersionTag};

/// Well-known tool checkers and the command names that satisfy them.
const TOOLS: &[(&str, &[&str])] = &[
    ("cc", &["cc", "gcc", "clang"]),
    ("c++", &["c++", "g++", "clang++"]),
    ("cmake", &["cmake"]),
    ("make", &["make", "gmake"]),
    ("git", &["git"]),
    ("mercurial", &["hg"]),
    ("hg", &["hg"]),
    ("tar", &["tar"]),
    ("gzip", &["gzip"]),
    ("bzip2", &["bzip2"]),
    ("unzip", &["unzip"]),
    ("unrar", &["unrar"]),
];

/// Candidate commands of a well-known tool, or `None` for unknown names.
pub fn tool_commands(name: &str) -> Option<&'static [&'static str]> {
    TOOLS
        .iter()
        .find(|(tool, _)| *tool == name)
        .map(|(_, commands)| *commands)
}

/// License information of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct License {
    /// License name (e.g. `LGPL`).
    pub name: String,
    /// Link to the license text.
    pub url: Option<String>,
}

/// Descriptive part of a catalog package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Unique package key.
    pub id: PackageId,
    /// One-paragraph description.
    pub description: Option<String>,
    /// Copyright holder line.
    pub copyright: Option<String>,
    /// License of the package.
    pub license: Option<License>,
    /// Free-form category used by listings.
    pub category: Option<String>,
    /// Home page.
    pub web: Option<String>,
    /// Maintainer contact.
    pub contact: Option<String>,
    /// Packages required to use this one, in first-seen order.
    pub requirements: Vec<PackageId>,
    /// Packages this one works with, informational only.
    pub uses: Vec<PackageId>,
    /// Build-only helper: built for other packages, never installed.
    /// `None` when no catalog said.
    pub tool: Option<bool>,
}

impl PackageDescriptor {
    /// An empty descriptor carrying only an id.
    pub fn new(id: impl Into<PackageId>) -> Self {
        Self {
            id: id.into(),
            description: None,
            copyright: None,
            license: None,
            category: None,
            web: None,
            contact: None,
            requirements: Vec::new(),
            uses: Vec::new(),
            tool: None,
        }
    }

    /// Whether the package is a build-only tool.
    pub fn is_tool(&self) -> bool {
        self.tool.unwrap_or(false)
    }

    /// Add a requirement unless it is already listed.
    pub fn add_requirement(&mut self, id: impl Into<PackageId>) {
        push_unique(&mut self.requirements, id.into());
    }

    /// Add a used package unless it is already listed.
    pub fn add_use(&mut self, id: impl Into<PackageId>) {
        push_unique(&mut self.uses, id.into());
    }

    /// Enrich this descriptor with a later one describing the same package.
    ///
    /// Fields set in `later` win; unset ones are inherited. Requirement and
    /// use lists are unioned.
    pub fn enrich(&mut self, later: PackageDescriptor) {
        override_if_some(&mut self.description, later.description);
        override_if_some(&mut self.copyright, later.copyright);
        override_if_some(&mut self.license, later.license);
        override_if_some(&mut self.category, later.category);
        override_if_some(&mut self.web, later.web);
        override_if_some(&mut self.contact, later.contact);
        override_if_some(&mut self.tool, later.tool);
        for req in later.requirements {
            self.add_requirement(req);
        }
        for used in later.uses {
            self.add_use(used);
        }
    }
}

fn override_if_some<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn push_unique(list: &mut Vec<PackageId>, id: PackageId) {
    if !list.contains(&id) {
        list.push(id);
    }
}

/// Language of a library probe program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeLang {
    /// Compile the probe as C.
    #[default]
    C,
    /// Compile the probe as C++.
    Cxx,
}

impl ProbeLang {
    /// Name of the tool checker providing the compiler.
    pub fn compiler_tool(&self) -> &'static str {
        match self {
            Self::C => "cc",
            Self::Cxx => "c++",
        }
    }

    /// Source file extension of the probe program.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cxx => "cpp",
        }
    }
}

/// A build-time dependency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepCheck {
    /// One of the well-known tools (see [`tool_commands`]).
    Tool {
        /// Tool name, e.g. `cmake`.
        name: String,
    },
    /// One of several executables must be on the search path.
    Command {
        /// Name shown to the user.
        name: String,
        /// Accepted executable names.
        candidates: Vec<String>,
    },
    /// A library must be usable by the C or C++ compiler.
    Library {
        /// Library name, e.g. `libxml2`.
        name: String,
        /// Header the probe program includes.
        header: Option<String>,
        /// Probe language.
        lang: ProbeLang,
        /// Shell command printing the compile flags.
        cflags: Option<String>,
        /// Shell command printing the link flags.
        ldflags: Option<String>,
    },
}

impl DepCheck {
    /// A well-known tool check.
    pub fn tool(name: &str) -> Self {
        Self::Tool {
            name: name.to_string(),
        }
    }

    /// Name of the checked dependency.
    pub fn name(&self) -> &str {
        match self {
            Self::Tool { name } | Self::Command { name, .. } | Self::Library { name, .. } => name,
        }
    }

    /// Checks that must pass before this one can run.
    pub fn implied(&self) -> Vec<DepCheck> {
        match self {
            Self::Library { lang, .. } => vec![Self::tool(lang.compiler_tool())],
            Self::Tool { .. } | Self::Command { .. } => Vec::new(),
        }
    }
}

/// How the sources of a package are obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSpec {
    /// Clone a Git repository, optionally at a tag or branch.
    Git {
        /// Repository address.
        address: String,
        /// Tag or branch to check out.
        tag: Option<String>,
    },
    /// Clone a Mercurial repository.
    Mercurial {
        /// Repository address.
        address: String,
    },
    /// Download and unpack an archive.
    Archive {
        /// Archive URL or path.
        url: String,
    },
}

impl DownloadSpec {
    /// Kind name as written in catalogs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Git { .. } => "git",
            Self::Mercurial { .. } => "hg",
            Self::Archive { .. } => "archive",
        }
    }

    /// Tool checks this download method needs.
    pub fn implied_checks(&self) -> Vec<DepCheck> {
        match self {
            Self::Git { .. } => vec![DepCheck::tool("git")],
            Self::Mercurial { .. } => vec![DepCheck::tool("mercurial")],
            Self::Archive { url } if url.to_lowercase().ends_with(".rar") => {
                vec![DepCheck::tool("unrar")]
            }
            Self::Archive { .. } => Vec::new(),
        }
    }
}

/// How a fetched source tree is built and installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildSpec {
    /// CMake-style generator: configure, build, install.
    Generator {
        /// Extra configure flags.
        flags: String,
    },
    /// Plain Makefile: `all` then `install`.
    PlainMake {
        /// Extra make flags.
        flags: String,
    },
    /// Arbitrary shell command run in the source tree.
    Command {
        /// Shell command line.
        command: String,
    },
}

impl BuildSpec {
    /// Kind name as written in catalogs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Generator { .. } => "cmake",
            Self::PlainMake { .. } => "make",
            Self::Command { .. } => "command",
        }
    }

    /// Tool checks this build method needs.
    pub fn implied_checks(&self) -> Vec<DepCheck> {
        match self {
            Self::Generator { .. } => vec![DepCheck::tool("cmake"), DepCheck::tool("make")],
            Self::PlainMake { .. } => vec![DepCheck::tool("make")],
            Self::Command { .. } => Vec::new(),
        }
    }
}

/// Everything needed to build a package from source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecipe {
    /// Explicit dependency checks in catalog order.
    pub tool_deps: Vec<DepCheck>,
    /// Source retrieval method.
    pub download: DownloadSpec,
    /// Build method.
    pub build: BuildSpec,
}

impl BuildRecipe {
    /// Every check to run before building, implied ones first, without
    /// duplicate names.
    pub fn all_checks(&self) -> Vec<DepCheck> {
        let mut checks: Vec<DepCheck> = Vec::new();
        let implied = self
            .tool_deps
            .iter()
            .flat_map(DepCheck::implied)
            .chain(self.download.implied_checks())
            .chain(self.build.implied_checks());
        for check in implied.chain(self.tool_deps.iter().cloned()) {
            if !checks.iter().any(|c| c.name() == check.name()) {
                checks.push(check);
            }
        }
        checks
    }
}

/// A binary release of a package for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    /// Version number.
    pub number: VersionTag,
    /// Archive location, absolute or relative to the platform catalog.
    pub file: String,
    /// Archive size in bytes.
    pub size: Option<u64>,
    /// MD5 checksum of the archive, hex encoded.
    pub checksum: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrich_overrides_and_inherits() {
        let mut base = PackageDescriptor::new("p");
        base.description = Some("A".into());
        base.web = Some("http://a".into());
        base.add_requirement("x");

        let mut later = PackageDescriptor::new("p");
        later.web = Some("http://b".into());
        later.add_requirement("x");
        later.add_requirement("y");

        base.enrich(later);
        assert_eq!(base.description.as_deref(), Some("A"));
        assert_eq!(base.web.as_deref(), Some("http://b"));
        assert_eq!(base.requirements, vec![PackageId::new("x"), PackageId::new("y")]);
    }

    #[test]
    fn test_all_checks_adds_implied_tools() {
        let recipe = BuildRecipe {
            tool_deps: vec![
                DepCheck::Library {
                    name: "libxml2".into(),
                    header: Some("libxml/parser.h".into()),
                    lang: ProbeLang::C,
                    cflags: None,
                    ldflags: None,
                },
                DepCheck::tool("make"),
            ],
            download: DownloadSpec::Git {
                address: "https://example.com/x.git".into(),
                tag: None,
            },
            build: BuildSpec::Generator {
                flags: String::new(),
            },
        };
        let names: Vec<String> = recipe
            .all_checks()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["cc", "git", "cmake", "make", "libxml2"]);
    }

    #[test]
    fn test_rar_archive_needs_unrar() {
        let spec = DownloadSpec::Archive {
            url: "http://example.com/src.RAR".into(),
        };
        assert_eq!(spec.implied_checks(), vec![DepCheck::tool("unrar")]);
        assert!(tool_commands("unrar").is_some());
        assert!(tool_commands("nope").is_none());
    }
}
