//! MD5 validation of downloaded archives.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChecksumError {
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", file.display())]
    Mismatch {
        file: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("cannot hash {}: {source}", file.display())]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Hex-encoded MD5 digest of a file.
pub fn md5_file(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Md5::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compare a file against an expected digest (case-insensitive).
pub fn verify_md5(path: &Path, expected: &str) -> Result<(), ChecksumError> {
    let actual = md5_file(path).map_err(|source| ChecksumError::Io {
        file: path.to_path_buf(),
        source,
    })?;
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(ChecksumError::Mismatch {
            file: path.to_path_buf(),
            expected: expected.trim().to_lowercase(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc");
        std::fs::write(&path, "abc").unwrap();
        assert_eq!(md5_file(&path).unwrap(), "900150983cd24fb0d6963f7d28e17f72");
        verify_md5(&path, "900150983CD24FB0D6963F7D28E17F72").unwrap();
    }

    #[test]
    fn test_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc");
        std::fs::write(&path, "abd").unwrap();
        let err = verify_md5(&path, "900150983cd24fb0d6963f7d28e17f72").unwrap_err();
        assert!(matches!(err, ChecksumError::Mismatch { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = verify_md5(Path::new("/nonexistent/sis/file"), "00").unwrap_err();
        assert!(matches!(err, ChecksumError::Io { .. }));
    }
}
