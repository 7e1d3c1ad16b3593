//! Shared operation context.
//!
//! Groups the settings and collaborators every install, uninstall and query
//! needs, so operations take one argument instead of six.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use sis_schema::{LocalRecord, Platform};

use crate::io::download::Location;
use crate::paths::InstallRoot;
use crate::registry::{LoadError, Registry, load_registry};
use crate::reporter::Reporter;
use crate::shell::{Shell, SystemShell};
use crate::vars::Variables;

/// Where and how operations run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root: InstallRoot,
    /// Base location of `index.xml` and the platform directories.
    pub catalog: Location,
    /// Host platform; `None` disables binary installs.
    pub platform: Option<Platform>,
    /// Kept build directory; a temporary one is used when unset.
    pub build_dir: Option<PathBuf>,
    /// Keep the temporary build directory after the run.
    pub keep_build_dir: bool,
}

impl Settings {
    pub fn new(root: InstallRoot, catalog: Location) -> Self {
        Self {
            root,
            catalog,
            platform: Platform::current(),
            build_dir: None,
            keep_build_dir: false,
        }
    }

    pub fn with_platform(mut self, platform: Option<Platform>) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_build_dir(mut self, build_dir: Option<PathBuf>) -> Self {
        self.build_dir = build_dir;
        self
    }

    /// Variables available to catalog strings.
    pub fn variables(&self) -> Variables {
        Variables::for_root(&self.root, self.platform)
    }
}

/// Groups common state used during operations.
#[derive(Clone)]
pub struct Context {
    pub settings: Arc<Settings>,
    pub client: reqwest::Client,
    pub shell: Arc<dyn Shell>,
    pub reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(settings: Settings, client: reqwest::Client, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            settings: Arc::new(settings),
            client,
            shell: Arc::new(SystemShell::new()),
            reporter,
        }
    }

    /// Replace the subprocess interface.
    pub fn with_shell(mut self, shell: Arc<dyn Shell>) -> Self {
        self.shell = shell;
        self
    }

    pub fn root(&self) -> &InstallRoot {
        &self.settings.root
    }

    /// Load and merge the catalogs with the given local records, showing
    /// catalog messages and warnings to the user.
    pub async fn load_registry(&self, local: &[LocalRecord]) -> Result<Registry, LoadError> {
        let registry = load_registry(
            &self.client,
            &self.settings.catalog,
            self.settings.platform,
            local,
        )
        .await?;
        for message in &registry.messages {
            self.reporter.info(message);
        }
        for warning in &registry.warnings {
            self.reporter.warning(warning);
        }
        Ok(registry)
    }
}
