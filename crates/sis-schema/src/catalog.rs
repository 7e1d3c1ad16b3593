//! Catalog documents (`index.xml`).
//!
//! A catalog is a `<sis-extend>` document listing `<package>` elements. The
//! source catalog carries descriptions and build recipes; the binary catalog
//! of each platform carries `<version>` entries. Both share one format.
//!
//! Dependency checks, download methods and build methods are selected by a
//! `type` attribute and parsed through the `*_KINDS` lookup tables below.

use crate::package::{
    BuildRecipe, BuildSpec, DepCheck, DownloadSpec, License, PackageDescriptor, ProbeLang,
    VersionEntry, tool_commands,
};
use crate::types::{PackageId, VersionTag};
use crate::xml::{Element, XmlError};
use crate::CATALOG_ROOT;

/// Errors raised while reading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The document itself is unreadable.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// A `type` attribute names no known kind.
    #[error("package '{package}': unknown {family} type '{kind}'")]
    UnknownKind {
        /// Package being parsed.
        package: String,
        /// Family of the element (`dep`, `download`, `make`).
        family: &'static str,
        /// The unknown kind name.
        kind: String,
    },

    /// A package element is structurally invalid.
    #[error("package '{package}': {message}")]
    Invalid {
        /// Package being parsed.
        package: String,
        /// What is wrong.
        message: String,
    },
}

/// One package of a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Descriptive fields and requirements.
    pub descriptor: PackageDescriptor,
    /// Source build recipe, if the package can be built.
    pub recipe: Option<BuildRecipe>,
    /// Binary releases for the catalog's platform, in catalog order.
    pub versions: Vec<VersionEntry>,
}

impl CatalogEntry {
    /// An entry with an empty descriptor.
    pub fn new(id: impl Into<PackageId>) -> Self {
        Self {
            descriptor: PackageDescriptor::new(id),
            recipe: None,
            versions: Vec::new(),
        }
    }

    /// Package id.
    pub fn id(&self) -> &PackageId {
        &self.descriptor.id
    }

    /// Enrich this entry with a later entry for the same package.
    ///
    /// The later recipe replaces an earlier one; versions accumulate.
    pub fn enrich(&mut self, later: CatalogEntry) {
        self.descriptor.enrich(later.descriptor);
        if later.recipe.is_some() {
            self.recipe = later.recipe;
        }
        self.versions.extend(later.versions);
    }
}

/// A parsed catalog document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Optional announcement shown to users.
    pub message: Option<String>,
    /// Packages in document order, one per id.
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Parse a catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the XML is malformed, the root is not
    /// `<sis-extend>`, or a package is invalid.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let root = Element::parse_root(text, CATALOG_ROOT)?;
        Self::from_element(&root)
    }

    /// Build a catalog from an already parsed root element.
    ///
    /// Repeated `<package>` elements with the same id are merged.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] for invalid packages.
    pub fn from_element(root: &Element) -> Result<Self, CatalogError> {
        let mut catalog = Self {
            message: root.child_text("message").map(str::to_string),
            entries: Vec::new(),
        };
        for element in root.children_named("package") {
            let entry = parse_package(element)?;
            catalog.insert(entry);
        }
        Ok(catalog)
    }

    /// Insert an entry, enriching an existing one with the same id.
    pub fn insert(&mut self, entry: CatalogEntry) {
        match self.entries.iter_mut().find(|e| e.id() == entry.id()) {
            Some(existing) => existing.enrich(entry),
            None => self.entries.push(entry),
        }
    }

    /// Look up a package by id.
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }
}

fn parse_package(element: &Element) -> Result<CatalogEntry, CatalogError> {
    let id = element.required_attr("id")?;
    let invalid = |message: String| CatalogError::Invalid {
        package: id.to_string(),
        message,
    };

    let mut entry = CatalogEntry::new(id);
    let descriptor = &mut entry.descriptor;
    descriptor.tool = match element.attr("tool") {
        None => None,
        Some("yes" | "true" | "1") => Some(true),
        Some("no" | "false" | "0") => Some(false),
        Some(other) => return Err(invalid(format!("invalid tool flag '{other}'"))),
    };
    descriptor.description = element.child_text("desc").map(str::to_string);
    descriptor.copyright = element.child_text("copyright").map(str::to_string);
    descriptor.category = element.child_text("category").map(str::to_string);
    descriptor.web = element.child_text("web").map(str::to_string);
    descriptor.contact = element.child_text("contact").map(str::to_string);
    descriptor.license = element.child("license").map(|l| License {
        name: l.text.trim().to_string(),
        url: l.attr("ref").map(str::to_string),
    });

    for child in &element.children {
        match child.name.as_str() {
            "req" => descriptor.add_requirement(child.required_attr("name")?),
            "reqs" => {
                for req in child.children_named("req") {
                    descriptor.add_requirement(req.required_attr("name")?);
                }
            }
            _ => {}
        }
    }
    for used in element.children_named("use") {
        descriptor.add_use(used.required_attr("name")?);
    }

    for version in element.children_named("version") {
        let number = version.required_attr("number")?;
        let file = version
            .child_text("file")
            .ok_or_else(|| invalid(format!("version {number} has no <file>")))?;
        let size = match version.child_text("size") {
            Some(text) => Some(
                text.parse::<u64>()
                    .map_err(|_| invalid(format!("version {number} has invalid size '{text}'")))?,
            ),
            None => None,
        };
        entry.versions.push(VersionEntry {
            number: VersionTag::new(number),
            file: file.to_string(),
            size,
            checksum: version.child_text("checksum").map(str::to_lowercase),
        });
    }

    if let Some(build) = element.child("build") {
        entry.recipe = Some(parse_build(id, build)?);
    }

    Ok(entry)
}

fn parse_build(id: &str, build: &Element) -> Result<BuildRecipe, CatalogError> {
    let mut tool_deps = Vec::new();
    for dep in build.children_named("dep") {
        let kind = dep.attr("type").unwrap_or("tool");
        let parser = lookup(DEP_KINDS, kind, id, "dep")?;
        tool_deps.push(parser(dep).map_err(|message| CatalogError::Invalid {
            package: id.to_string(),
            message,
        })?);
    }

    let download = build.child("download").ok_or_else(|| CatalogError::Invalid {
        package: id.to_string(),
        message: "<build> has no <download>".to_string(),
    })?;
    let kind = download.required_attr("type")?;
    let download = lookup(DOWNLOAD_KINDS, kind, id, "download")?(download)?;

    let make = build.child("make").ok_or_else(|| CatalogError::Invalid {
        package: id.to_string(),
        message: "<build> has no <make>".to_string(),
    })?;
    let kind = make.required_attr("type")?;
    let build = lookup(BUILD_KINDS, kind, id, "make")?(make)?;

    Ok(BuildRecipe {
        tool_deps,
        download,
        build,
    })
}

fn lookup<T: Copy>(
    table: &[(&str, T)],
    kind: &str,
    package: &str,
    family: &'static str,
) -> Result<T, CatalogError> {
    table
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, parser)| *parser)
        .ok_or_else(|| CatalogError::UnknownKind {
            package: package.to_string(),
            family,
            kind: kind.to_string(),
        })
}

type DepParser = fn(&Element) -> Result<DepCheck, String>;
type DownloadParser = fn(&Element) -> Result<DownloadSpec, XmlError>;
type BuildParser = fn(&Element) -> Result<BuildSpec, XmlError>;

const DEP_KINDS: &[(&str, DepParser)] = &[
    ("tool", parse_tool_dep),
    ("command", parse_command_dep),
    ("library", parse_library_dep),
];

const DOWNLOAD_KINDS: &[(&str, DownloadParser)] = &[
    ("git", parse_git),
    ("hg", parse_mercurial),
    ("mercurial", parse_mercurial),
    ("archive", parse_archive),
];

const BUILD_KINDS: &[(&str, BuildParser)] = &[
    ("cmake", parse_generator),
    ("make", parse_plain_make),
    ("command", parse_command_build),
];

fn parse_tool_dep(dep: &Element) -> Result<DepCheck, String> {
    let name = dep.required_attr("name").map_err(|e| e.to_string())?;
    if tool_commands(name).is_none() {
        return Err(format!("unknown tool '{name}'"));
    }
    Ok(DepCheck::tool(name))
}

fn parse_command_dep(dep: &Element) -> Result<DepCheck, String> {
    let name = dep.required_attr("name").map_err(|e| e.to_string())?;
    let candidates: Vec<String> = dep
        .attr("commands")
        .unwrap_or(name)
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if candidates.is_empty() {
        return Err(format!("command dependency '{name}' lists no commands"));
    }
    Ok(DepCheck::Command {
        name: name.to_string(),
        candidates,
    })
}

fn parse_library_dep(dep: &Element) -> Result<DepCheck, String> {
    let name = dep.required_attr("name").map_err(|e| e.to_string())?;
    let lang = match dep.attr("lang").unwrap_or("c") {
        "c" => ProbeLang::C,
        "c++" | "cxx" | "cpp" => ProbeLang::Cxx,
        other => return Err(format!("library '{name}' has unknown language '{other}'")),
    };
    Ok(DepCheck::Library {
        name: name.to_string(),
        header: dep.attr("header").map(str::to_string),
        lang,
        cflags: dep.attr("cflags").map(str::to_string),
        ldflags: dep.attr("ldflags").map(str::to_string),
    })
}

fn parse_git(download: &Element) -> Result<DownloadSpec, XmlError> {
    Ok(DownloadSpec::Git {
        address: download.required_attr("address")?.to_string(),
        tag: download.attr("tag").map(str::to_string),
    })
}

fn parse_mercurial(download: &Element) -> Result<DownloadSpec, XmlError> {
    Ok(DownloadSpec::Mercurial {
        address: download.required_attr("address")?.to_string(),
    })
}

fn parse_archive(download: &Element) -> Result<DownloadSpec, XmlError> {
    let url = download
        .attr("url")
        .map_or_else(|| download.required_attr("address"), Ok)?;
    Ok(DownloadSpec::Archive {
        url: url.to_string(),
    })
}

fn parse_generator(make: &Element) -> Result<BuildSpec, XmlError> {
    Ok(BuildSpec::Generator {
        flags: make.attr("flags").unwrap_or_default().to_string(),
    })
}

fn parse_plain_make(make: &Element) -> Result<BuildSpec, XmlError> {
    Ok(BuildSpec::PlainMake {
        flags: make.attr("flags").unwrap_or_default().to_string(),
    })
}

fn parse_command_build(make: &Element) -> Result<BuildSpec, XmlError> {
    Ok(BuildSpec::Command {
        command: make.required_attr("build")?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sis-extend>
  <message>Welcome</message>
  <package id="otawa">
    <desc>WCET framework</desc>
    <license ref="https://www.gnu.org/licenses/lgpl.html">LGPL</license>
    <category>core</category>
    <reqs><req name="gel"/></reqs>
    <req name="elm"/>
    <use name="obviews"/>
    <build>
      <dep name="libxml2" type="library" header="libxml/parser.h" cflags="xml2-config --cflags"/>
      <dep name="parser" type="command" commands="bison,yacc"/>
      <dep name="cmake"/>
      <download type="git" address="https://git.example.com/otawa.git" tag="v2"/>
      <make type="cmake" flags="-DCMAKE_INSTALL_PREFIX=$(top_dir)"/>
    </build>
  </package>
  <package id="gel">
    <version number="1.0"><file>gel-1.0.tgz</file><size>2048</size><checksum>ABCDEF</checksum></version>
  </package>
</sis-extend>
"#;

    #[test]
    fn test_parse_source_catalog() {
        let catalog = Catalog::parse(SOURCE).unwrap();
        assert_eq!(catalog.message.as_deref(), Some("Welcome"));
        assert_eq!(catalog.entries.len(), 2);

        let otawa = catalog.get("otawa").unwrap();
        assert_eq!(
            otawa.descriptor.requirements,
            vec![PackageId::new("gel"), PackageId::new("elm")]
        );
        assert_eq!(otawa.descriptor.uses, vec![PackageId::new("obviews")]);
        assert_eq!(
            otawa.descriptor.license.as_ref().unwrap().url.as_deref(),
            Some("https://www.gnu.org/licenses/lgpl.html")
        );

        let recipe = otawa.recipe.as_ref().unwrap();
        assert_eq!(recipe.tool_deps.len(), 3);
        assert_eq!(
            recipe.tool_deps[1],
            DepCheck::Command {
                name: "parser".into(),
                candidates: vec!["bison".into(), "yacc".into()],
            }
        );
        assert_eq!(
            recipe.download,
            DownloadSpec::Git {
                address: "https://git.example.com/otawa.git".into(),
                tag: Some("v2".into()),
            }
        );
        assert_eq!(recipe.build.kind(), "cmake");
    }

    #[test]
    fn test_parse_version_entries() {
        let catalog = Catalog::parse(SOURCE).unwrap();
        let gel = catalog.get("gel").unwrap();
        assert_eq!(gel.versions.len(), 1);
        let v = &gel.versions[0];
        assert_eq!(v.number, "1.0");
        assert_eq!(v.size, Some(2048));
        assert_eq!(v.checksum.as_deref(), Some("abcdef"));
    }

    #[test]
    fn test_unknown_build_kind() {
        let doc = r#"<sis-extend><package id="x"><build>
            <download type="git" address="a"/><make type="scons"/>
        </build></package></sis-extend>"#;
        let err = Catalog::parse(doc).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::UnknownKind { family: "make", ref kind, .. } if kind == "scons"
        ));
    }

    #[test]
    fn test_unknown_tool_rejected() {
        let doc = r#"<sis-extend><package id="x"><build>
            <dep name="frobnicator"/>
            <download type="archive" url="x.tar.gz"/><make type="make"/>
        </build></package></sis-extend>"#;
        assert!(matches!(
            Catalog::parse(doc),
            Err(CatalogError::Invalid { .. })
        ));
    }

    #[test]
    fn test_wrong_root_rejected() {
        assert!(matches!(
            Catalog::parse("<catalog/>"),
            Err(CatalogError::Xml(XmlError::UnexpectedRoot { .. }))
        ));
    }

    #[test]
    fn test_tool_flag() {
        let doc = r#"<sis-extend>
            <package id="gen" tool="yes"/>
            <package id="lib" tool="no"/>
            <package id="app"/>
        </sis-extend>"#;
        let catalog = Catalog::parse(doc).unwrap();
        assert!(catalog.get("gen").unwrap().descriptor.is_tool());
        assert_eq!(catalog.get("lib").unwrap().descriptor.tool, Some(false));
        assert_eq!(catalog.get("app").unwrap().descriptor.tool, None);

        let bad = r#"<sis-extend><package id="gen" tool="maybe"/></sis-extend>"#;
        assert!(matches!(Catalog::parse(bad), Err(CatalogError::Invalid { .. })));
    }

    #[test]
    fn test_later_entry_sets_tool_flag() {
        let mut entry = Catalog::parse(r#"<sis-extend><package id="gen"><desc>G</desc></package></sis-extend>"#)
            .unwrap()
            .entries
            .remove(0);
        let later = Catalog::parse(r#"<sis-extend><package id="gen" tool="yes"/></sis-extend>"#)
            .unwrap()
            .entries
            .remove(0);
        entry.enrich(later);
        assert!(entry.descriptor.is_tool());
        assert_eq!(entry.descriptor.description.as_deref(), Some("G"));

        let unset = CatalogEntry::new("gen");
        entry.enrich(unset);
        assert!(entry.descriptor.is_tool());
    }

    #[test]
    fn test_duplicate_packages_are_merged() {
        let doc = r#"<sis-extend>
            <package id="p"><desc>A</desc></package>
            <package id="p"><version number="2"><file>p.tgz</file></version></package>
        </sis-extend>"#;
        let catalog = Catalog::parse(doc).unwrap();
        assert_eq!(catalog.entries.len(), 1);
        let p = catalog.get("p").unwrap();
        assert_eq!(p.descriptor.description.as_deref(), Some("A"));
        assert_eq!(p.versions.len(), 1);
    }
}
