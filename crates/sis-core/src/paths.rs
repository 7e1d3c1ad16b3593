use std::path::{Path, PathBuf};

use dirs::home_dir;
use sis_schema::LOCAL_DB_FILE;

/// The installation root every operation works against.
///
/// Passed explicitly through the install and uninstall paths; nothing in
/// this crate reads a process-wide root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRoot {
    top: PathBuf,
}

impl InstallRoot {
    /// Wrap a root directory, made absolute against the current directory.
    pub fn new(top: impl Into<PathBuf>) -> Self {
        let top = top.into();
        let top = std::path::absolute(&top).unwrap_or(top);
        Self { top }
    }

    /// Root directory (`$(top_dir)` in catalogs).
    pub fn path(&self) -> &Path {
        &self.top
    }

    /// Local database: <root>/install.xml
    pub fn db_path(&self) -> PathBuf {
        self.top.join(LOCAL_DB_FILE)
    }

    /// Logs directory: <root>/logs
    pub fn log_dir(&self) -> PathBuf {
        self.top.join("logs")
    }

    /// Generate a build log path for a package
    pub fn build_log_path(&self, package: &str, version: &str) -> PathBuf {
        let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        self.log_dir()
            .join(format!("build-{package}-{version}-{timestamp}.log"))
    }

    /// Resolve a catalog or record path: absolute paths are kept, relative
    /// ones are taken under the root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.top.join(p)
        }
    }
}

/// Default installation root when none is configured: ~/.sis
pub fn default_root() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".sis"))
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}

/// Split an archive file name at its first dot into the directory name the
/// archive unpacks to and its extension (`otawa-core.tar.gz` gives
/// `("otawa-core", "tar.gz")`).
pub fn split_archive_name(file_name: &str) -> Option<(&str, &str)> {
    file_name
        .split_once('.')
        .filter(|(base, ext)| !base.is_empty() && !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let root = InstallRoot::new("/opt/sis");
        assert_eq!(root.resolve("lib/x.so"), PathBuf::from("/opt/sis/lib/x.so"));
        assert_eq!(root.resolve("/etc/x"), PathBuf::from("/etc/x"));
        assert_eq!(root.db_path(), PathBuf::from("/opt/sis/install.xml"));
    }

    #[test]
    fn test_relative_root_becomes_absolute() {
        assert!(InstallRoot::new("some/dir").path().is_absolute());
    }

    #[test]
    fn test_split_archive_name() {
        assert_eq!(
            split_archive_name("otawa-core.tar.gz"),
            Some(("otawa-core", "tar.gz"))
        );
        assert_eq!(split_archive_name("noext"), None);
        assert_eq!(split_archive_name(".hidden"), None);
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(filename_from_url("http://h/a/b/gel.tgz"), "gel.tgz");
        assert_eq!(filename_from_url(""), "");
    }

    #[test]
    fn test_build_log_path_is_under_logs() {
        let root = InstallRoot::new("/opt/sis");
        let log = root.build_log_path("gel", "1.0");
        assert!(log.starts_with("/opt/sis/logs"));
        assert!(log.file_name().unwrap().to_string_lossy().starts_with("build-gel-1.0-"));
    }
}
