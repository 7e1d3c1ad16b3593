//! File retrieval, verification and unpacking.

pub mod checksum;
pub mod download;
pub mod extract;

pub use checksum::{ChecksumError, verify_md5};
pub use download::{DownloadError, Location, download_to, fetch_text};
pub use extract::{ArchiveFormat, ExtractError, detect_format};
