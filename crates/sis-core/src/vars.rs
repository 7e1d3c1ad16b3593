//! `$(name)` substitution in catalog strings.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use sis_schema::Platform;

use crate::paths::InstallRoot;

static VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$|\$\(([A-Za-z0-9_]+)\)").unwrap());

/// Variables available to download, build and install strings.
///
/// `$(name)` expands to the value of `name` (nothing when undefined) and
/// `$$` to a literal `$`.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: BTreeMap<String, String>,
}

impl Variables {
    /// The standard set: `top_dir` and `platform`.
    pub fn for_root(root: &InstallRoot, platform: Option<Platform>) -> Self {
        let mut vars = Self::default();
        vars.set("top_dir", root.path().to_string_lossy());
        if let Some(platform) = platform {
            vars.set("platform", platform.dir_name());
        }
        vars
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn expand(&self, text: &str) -> String {
        VAR_RE
            .replace_all(text, |caps: &Captures<'_>| match caps.get(1) {
                Some(name) => self.get(name.as_str()).unwrap_or_default().to_string(),
                None => "$".to_string(),
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Variables {
        let mut v = Variables::default();
        v.set("top_dir", "/opt/sis");
        v
    }

    #[test]
    fn test_expands_known_variable() {
        assert_eq!(
            vars().expand("-DCMAKE_INSTALL_PREFIX=$(top_dir)"),
            "-DCMAKE_INSTALL_PREFIX=/opt/sis"
        );
    }

    #[test]
    fn test_double_dollar_escapes() {
        assert_eq!(vars().expand("echo $$HOME $$(top_dir)"), "echo $HOME $(top_dir)");
    }

    #[test]
    fn test_unknown_variable_is_empty() {
        assert_eq!(vars().expand("a$(nope)b"), "ab");
    }

    #[test]
    fn test_for_root_sets_platform() {
        let root = InstallRoot::new("/opt/sis");
        let v = Variables::for_root(&root, Some(Platform::LinuxX86_64));
        assert_eq!(v.expand("$(platform)"), "linux-x86_64");
        assert_eq!(v.expand("$(top_dir)"), "/opt/sis");
    }
}
