use std::collections::HashSet;

use sis_schema::{PackageId, VersionTag};
use thiserror::Error;

use crate::registry::Registry;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown package '{id}'{}", required_by.as_ref().map(|r| format!(" required by '{r}'")).unwrap_or_default())]
    MissingPackage {
        id: PackageId,
        required_by: Option<PackageId>,
    },

    #[error("circular requirement: {}", path.iter().map(PackageId::as_str).collect::<Vec<_>>().join(" -> "))]
    Cycle { path: Vec<PackageId> },

    #[error("package '{id}' has no version '{version}'")]
    UnknownVersion { id: PackageId, version: VersionTag },

    #[error("invalid package request '{0}'")]
    InvalidRequest(String),
}

/// A `PACK[:VERSION]` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub id: PackageId,
    pub version: Option<VersionTag>,
}

impl Request {
    pub fn new(id: impl Into<PackageId>) -> Self {
        Self {
            id: id.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<VersionTag>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl std::str::FromStr for Request {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, version) = match s.split_once(':') {
            Some((id, version)) => (id, Some(version)),
            None => (s, None),
        };
        if id.is_empty() || version.is_some_and(str::is_empty) {
            return Err(ResolveError::InvalidRequest(s.to_string()));
        }
        Ok(Self {
            id: PackageId::new(id),
            version: version.map(VersionTag::new),
        })
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{version}", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// One package to install, with its chosen version (`None` builds from
/// source).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub id: PackageId,
    pub version: Option<VersionTag>,
    /// Named on the command line rather than pulled in as a requirement.
    pub requested: bool,
}

impl PlanEntry {
    /// Version shown to users and written to records.
    pub fn display_version(&self) -> VersionTag {
        self.version.clone().unwrap_or_else(VersionTag::source)
    }
}

/// Install order: every entry comes after its requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub entries: Vec<PlanEntry>,
    /// Requested packages skipped because they are already installed.
    pub already_installed: Vec<PackageId>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<&PackageId> {
        self.entries.iter().map(|e| &e.id).collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Reinstall requested packages even when already installed.
    pub force: bool,
}

/// Resolves requests into an install plan in dependency order.
///
/// Performs a depth-first traversal of requirements shared by all requests,
/// skipping installed requirements and detecting cycles.
///
/// # Errors
///
/// Returns [`ResolveError`] for unknown packages or versions and for
/// requirement cycles.
pub fn resolve(
    registry: &Registry,
    requests: &[Request],
    options: ResolveOptions,
) -> Result<Plan, ResolveError> {
    let mut walk = Walk {
        registry,
        plan: Plan::default(),
        visited: HashSet::new(),
        stack: Vec::new(),
    };

    for request in requests {
        let entry = registry
            .get(&request.id)
            .ok_or_else(|| ResolveError::MissingPackage {
                id: request.id.clone(),
                required_by: None,
            })?;

        if let Some(version) = request
            .version
            .as_ref()
            .filter(|v| !v.is_source() && entry.binary_version(v).is_none())
        {
            return Err(ResolveError::UnknownVersion {
                id: request.id.clone(),
                version: version.clone(),
            });
        }

        let satisfied = match (entry.installed_version(), &request.version) {
            (Some(_), None) => true,
            (Some(installed), Some(wanted)) => installed == wanted,
            (None, _) => false,
        };
        if satisfied && !options.force {
            tracing::debug!(package = %request.id, "already installed");
            walk.plan.already_installed.push(request.id.clone());
            continue;
        }

        walk.visit(&request.id, request.version.clone(), true, None)?;
    }

    Ok(walk.plan)
}

struct Walk<'a> {
    registry: &'a Registry,
    plan: Plan,
    visited: HashSet<PackageId>,
    /// Packages being visited, outermost first.
    stack: Vec<PackageId>,
}

impl Walk<'_> {
    fn visit(
        &mut self,
        id: &PackageId,
        version: Option<VersionTag>,
        requested: bool,
        required_by: Option<&PackageId>,
    ) -> Result<(), ResolveError> {
        if self.visited.contains(id) {
            return Ok(());
        }

        if let Some(start) = self.stack.iter().position(|p| p == id) {
            let mut path = self.stack[start..].to_vec();
            path.push(id.clone());
            return Err(ResolveError::Cycle { path });
        }

        let entry = self
            .registry
            .get(id)
            .filter(|e| e.upstream)
            .ok_or_else(|| ResolveError::MissingPackage {
                id: id.clone(),
                required_by: required_by.cloned(),
            })?;

        self.stack.push(id.clone());
        for req in &entry.descriptor().requirements {
            if self.registry.get(req).is_some_and(|r| r.is_installed()) {
                continue;
            }
            self.visit(req, None, false, Some(id))?;
        }
        self.stack.pop();

        let version = match version {
            Some(v) if v.is_source() => None,
            Some(v) => Some(v),
            None => entry.latest_binary().map(|v| v.number.clone()),
        };
        self.visited.insert(id.clone());
        self.plan.entries.push(PlanEntry {
            id: id.clone(),
            version,
            requested,
        });

        Ok(())
    }
}
