//! Catalog and archive retrieval.
//!
//! Catalogs and archives may live on an HTTP server or on the local file
//! system (plain paths or `file://` URLs); [`Location`] covers both.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::USER_AGENT;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with exit code {code}{}", if output.is_empty() { String::new() } else { format!("\n{output}") })]
    Command {
        command: String,
        code: i32,
        /// Last lines of the command output.
        output: String,
    },

    #[error("don't know how to unpack {0}")]
    UnsupportedArchive(String),
}

impl DownloadError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Where a catalog or an archive lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Remote(String),
    Local(PathBuf),
}

impl Location {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Remote(location.to_string())
        } else if let Some(path) = location.strip_prefix("file://") {
            Self::Local(PathBuf::from(path))
        } else {
            Self::Local(PathBuf::from(location))
        }
    }

    /// Resolve `relative` against this location taken as a directory.
    /// Absolute URLs and paths are returned as they are.
    pub fn join(&self, relative: &str) -> Self {
        let candidate = Self::parse(relative);
        let absolute = match &candidate {
            Self::Remote(_) => true,
            Self::Local(p) => p.is_absolute() || relative.starts_with("file://"),
        };
        if absolute {
            return candidate;
        }
        match self {
            Self::Remote(base) => {
                Self::Remote(format!("{}/{}", base.trim_end_matches('/'), relative))
            }
            Self::Local(base) => Self::Local(base.join(relative)),
        }
    }

    /// Last path component.
    pub fn file_name(&self) -> String {
        match self {
            Self::Remote(url) => crate::paths::filename_from_url(url).to_string(),
            Self::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(url) => f.write_str(url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Read a whole text document.
pub async fn fetch_text(client: &Client, location: &Location) -> Result<String, DownloadError> {
    match location {
        Location::Remote(url) => {
            let text = client
                .get(url)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            Ok(text)
        }
        Location::Local(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DownloadError::io(path, e)),
    }
}

/// Copy a remote or local file to `dest`, returning the number of bytes
/// written.
pub async fn download_to(
    client: &Client,
    location: &Location,
    dest: &Path,
) -> Result<u64, DownloadError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::io(parent, e))?;
    }

    match location {
        Location::Remote(url) => {
            let response = client
                .get(url)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .send()
                .await?
                .error_for_status()?;

            let mut file = File::create(dest)
                .await
                .map_err(|e| DownloadError::io(dest, e))?;
            let mut stream = response.bytes_stream();
            let mut downloaded: u64 = 0;

            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| DownloadError::io(dest, e))?;
                downloaded += chunk.len() as u64;
            }

            file.flush().await.map_err(|e| DownloadError::io(dest, e))?;
            tracing::debug!(%url, bytes = downloaded, "downloaded");
            Ok(downloaded)
        }
        Location::Local(path) => tokio::fs::copy(path, dest)
            .await
            .map_err(|e| DownloadError::io(path, e)),
    }
}
