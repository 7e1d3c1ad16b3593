//! Identifier newtypes shared by every SIS crate.

use std::borrow::Borrow;
use std::cmp::Ordering;

/// Version tag reserved for packages built from source.
pub const SOURCE_VERSION: &str = "source";

/// Unique key of a package in the catalogs and in the local database.
///
/// # Example
///
/// ```
/// use sis_schema::PackageId;
///
/// let id = PackageId::new("otawa-sparc");
/// assert_eq!(id, "otawa-sparc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(String);

impl PackageId {
    /// Wrap a package identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for PackageId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PackageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PackageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for PackageId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PackageId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// An opaque version string with a deterministic total order.
///
/// Tags that are both valid semver compare as semver. Otherwise they are split
/// on `.`, `-` and `_` and compared component by component: numerically when
/// both components are numbers, lexically otherwise. A tag that extends
/// another (`1.2.1` vs `1.2`) is the greater one.
///
/// ```
/// use sis_schema::VersionTag;
///
/// assert!(VersionTag::new("1.10") > VersionTag::new("1.9"));
/// assert!(VersionTag::new("2024-02") > VersionTag::new("2024-01"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionTag(String);

impl VersionTag {
    /// Wrap a version string.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The reserved tag of a source install.
    pub fn source() -> Self {
        Self(SOURCE_VERSION.to_string())
    }

    /// Whether this is the reserved source tag.
    pub fn is_source(&self) -> bool {
        self.0 == SOURCE_VERSION
    }

    /// Borrow the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for VersionTag {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_tags(&self.0, &other.0).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for VersionTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for VersionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for VersionTag {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for VersionTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VersionTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for VersionTag {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for VersionTag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for VersionTag {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

fn compare_tags(a: &str, b: &str) -> Ordering {
    if let (Ok(x), Ok(y)) = (semver::Version::parse(a), semver::Version::parse(b)) {
        return x.cmp(&y);
    }

    let separators = ['.', '-', '_'];
    let mut left = a.split(separators);
    let mut right = b.split(separators);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_components() {
        assert!(VersionTag::new("1.10") > VersionTag::new("1.9"));
        assert!(VersionTag::new("1.2.1") > VersionTag::new("1.2"));
        assert!(VersionTag::new("0.9") < VersionTag::new("1.0"));
    }

    #[test]
    fn test_semver_prerelease() {
        assert!(VersionTag::new("1.0.0") > VersionTag::new("1.0.0-rc1"));
    }

    #[test]
    fn test_mixed_components_fall_back_to_text() {
        assert!(VersionTag::new("1.0b") > VersionTag::new("1.0a"));
        assert!(VersionTag::new("r12") < VersionTag::new("r9"));
    }

    #[test]
    fn test_order_is_consistent_with_eq() {
        let a = VersionTag::new("1.0");
        let b = VersionTag::new("1.00");
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_source_tag() {
        assert!(VersionTag::source().is_source());
        assert!(!VersionTag::new("1.0").is_source());
    }

    #[test]
    fn test_package_id_borrow() {
        let mut map = std::collections::HashMap::new();
        map.insert(PackageId::new("gel"), 1);
        assert_eq!(map.get("gel"), Some(&1));
    }
}
