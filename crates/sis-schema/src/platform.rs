//! Host platform identification.
//!
//! Binary catalogs live in one directory per platform under the catalog
//! root, and shared libraries carry a platform-specific suffix.
//!
//! # Example
//!
//! ```
//! use sis_schema::Platform;
//!
//! let linux: Platform = "linux-x86_64".parse().unwrap();
//! assert_eq!(linux.dynlib_suffix(), ".so");
//! ```

/// A platform for which binary packages may be published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// 32-bit Linux.
    LinuxX86,
    /// 64-bit Linux.
    LinuxX86_64,
    /// 32-bit Windows.
    Windows,
    /// 64-bit Windows.
    Windows64,
    /// Intel macOS.
    DarwinX86_64,
    /// Apple Silicon macOS.
    DarwinArm64,
}

impl Platform {
    /// Every known platform.
    pub const ALL: [Self; 6] = [
        Self::LinuxX86,
        Self::LinuxX86_64,
        Self::Windows,
        Self::Windows64,
        Self::DarwinX86_64,
        Self::DarwinArm64,
    ];

    /// The platform this binary runs on, if it is a known one.
    pub fn current() -> Option<Self> {
        match (std::env::consts::OS, std::env::consts::ARCH) {
            ("linux", "x86") => Some(Self::LinuxX86),
            ("linux", "x86_64") => Some(Self::LinuxX86_64),
            ("windows", "x86") => Some(Self::Windows),
            ("windows", "x86_64") => Some(Self::Windows64),
            ("macos", "x86_64") => Some(Self::DarwinX86_64),
            ("macos", "aarch64") => Some(Self::DarwinArm64),
            _ => None,
        }
    }

    /// Directory name of this platform's binary catalog.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::LinuxX86 => "linux-x86",
            Self::LinuxX86_64 => "linux-x86_64",
            Self::Windows => "win",
            Self::Windows64 => "win64",
            Self::DarwinX86_64 => "darwin-x86_64",
            Self::DarwinArm64 => "darwin-arm64",
        }
    }

    /// Suffix appended to shared library names.
    pub fn dynlib_suffix(&self) -> &'static str {
        match self {
            Self::LinuxX86 | Self::LinuxX86_64 => ".so",
            Self::Windows | Self::Windows64 => ".dll",
            Self::DarwinX86_64 | Self::DarwinArm64 => ".dylib",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.dir_name() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown platform: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_names_parse_back() {
        for platform in Platform::ALL {
            assert_eq!(platform.dir_name().parse::<Platform>(), Ok(platform));
        }
        assert!("solaris".parse::<Platform>().is_err());
    }

    #[test]
    fn test_dynlib_suffixes() {
        assert_eq!(Platform::Windows64.dynlib_suffix(), ".dll");
        assert_eq!(Platform::DarwinArm64.dynlib_suffix(), ".dylib");
        assert_eq!(Platform::LinuxX86.dynlib_suffix(), ".so");
    }
}
