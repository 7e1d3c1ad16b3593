//! Archive extraction module
//!
//! Handles tar.gz, tar.bz2 and zip natively. An archive named `base.ext`
//! must unpack to a directory named `base`; see [`split_archive_name`].

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;

use crate::paths::split_archive_name;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("Archive error: {0}")]
    Archive(String),
}

/// Archive formats recognised by the extension after the first dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarBz2,
    Zip,
    /// Unpacked by the external `unrar` program.
    Rar,
}

impl ArchiveFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "tar.gz" | "tgz" => Some(Self::TarGz),
            "tar.bz2" | "tbz2" => Some(Self::TarBz2),
            "zip" => Some(Self::Zip),
            "rar" => Some(Self::Rar),
            _ => None,
        }
    }
}

/// Format and expected top-level directory of an archive file name.
pub fn detect_format(file_name: &str) -> Result<(ArchiveFormat, String), ExtractError> {
    let (base, ext) = split_archive_name(file_name)
        .ok_or_else(|| ExtractError::UnsupportedFormat(file_name.to_string()))?;
    let format = ArchiveFormat::from_extension(ext)
        .ok_or_else(|| ExtractError::UnsupportedFormat(file_name.to_string()))?;
    Ok((format, base.to_string()))
}

/// Extract a tar.gz archive to a destination directory
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractError> {
    let file = File::open(archive_path)?;
    let reader = BufReader::new(file);
    extract_tar(flate2::read::GzDecoder::new(reader), dest_dir)
}

/// Extract a tar.bz2 archive to a destination directory
pub fn extract_tar_bz2(archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractError> {
    let file = File::open(archive_path)?;
    let reader = BufReader::new(file);
    extract_tar(bzip2::read::BzDecoder::new(reader), dest_dir)
}

/// Extract a tar archive from a reader, returning the number of entries
/// written.
fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<usize, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(reader);
    let mut count = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let relative_path = sanitize(&entry.path()?)?;
        let absolute_path = dest_dir.join(&relative_path);

        if entry.header().entry_type().is_dir() {
            fs::create_dir_all(&absolute_path)?;
            continue;
        }

        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&absolute_path)?;
        count += 1;
    }

    Ok(count)
}

/// Extract a zip archive
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))?;

    fs::create_dir_all(dest_dir)?;
    let mut count = 0;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;
        let Some(relative_path) = file.enclosed_name() else {
            return Err(ExtractError::Archive(format!(
                "Invalid path in archive: {}",
                file.name()
            )));
        };

        if file.is_dir() {
            fs::create_dir_all(dest_dir.join(&relative_path))?;
            continue;
        }

        let absolute_path = dest_dir.join(&relative_path);
        if let Some(p) = absolute_path.parent() {
            fs::create_dir_all(p)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
        }

        count += 1;
    }

    Ok(count)
}

/// Extract a natively supported archive.
pub fn extract_native(
    format: ArchiveFormat,
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<usize, ExtractError> {
    match format {
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir),
        ArchiveFormat::TarBz2 => extract_tar_bz2(archive_path, dest_dir),
        ArchiveFormat::Zip => extract_zip(archive_path, dest_dir),
        ArchiveFormat::Rar => Err(ExtractError::UnsupportedFormat(
            "rar archives need the unrar program".to_string(),
        )),
    }
}

/// Reject absolute paths and `..` so entries stay inside the destination
/// (Zip Slip).
fn sanitize(path: &Path) -> Result<PathBuf, ExtractError> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => {
                return Err(ExtractError::Archive(format!(
                    "Invalid path in archive: {}",
                    path.display()
                )));
            }
        }
    }
    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tar_gz_with(files: &[(&str, &str)]) -> Vec<u8> {
        let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format("gel-linux.tar.gz").unwrap(),
            (ArchiveFormat::TarGz, "gel-linux".to_string())
        );
        assert_eq!(detect_format("x.tar.bz2").unwrap().0, ArchiveFormat::TarBz2);
        assert_eq!(detect_format("x.ZIP").unwrap().0, ArchiveFormat::Zip);
        assert_eq!(detect_format("x.rar").unwrap().0, ArchiveFormat::Rar);
        assert!(detect_format("x.7z").is_err());
        assert!(detect_format("noext").is_err());
    }

    #[test]
    fn test_extract_tar_gz() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("gel.tar.gz");
        std::fs::write(
            &archive,
            tar_gz_with(&[("gel/install.xml", "<sis-install/>"), ("gel/lib/libgel.a", "x")]),
        )
        .unwrap();

        let out = dir.path().join("out");
        assert_eq!(extract_tar_gz(&archive, &out).unwrap(), 2);
        assert!(out.join("gel/lib/libgel.a").is_file());
    }

    #[test]
    fn test_extract_tar_bz2() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("src.tar.bz2");
        let encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar::Header::new_gnu();
        header.set_size(5);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "src/VERSION", &b"1.2.3"[..]).unwrap();
        std::fs::write(&archive, builder.into_inner().unwrap().finish().unwrap()).unwrap();

        let out = dir.path().join("out");
        extract_tar_bz2(&archive, &out).unwrap();
        assert_eq!(std::fs::read_to_string(out.join("src/VERSION")).unwrap(), "1.2.3");
    }

    #[test]
    fn test_extract_zip() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("pkg.zip");
        {
            let mut writer = zip::ZipWriter::new(File::create(&archive).unwrap());
            let options = zip::write::SimpleFileOptions::default();
            writer.add_directory("pkg/", options).unwrap();
            writer.start_file("pkg/readme.txt", options).unwrap();
            writer.write_all(b"hi").unwrap();
            writer.finish().unwrap();
        }

        let out = dir.path().join("out");
        assert_eq!(extract_zip(&archive, &out).unwrap(), 1);
        assert_eq!(std::fs::read_to_string(out.join("pkg/readme.txt")).unwrap(), "hi");
    }

    #[test]
    fn test_sanitize_rejects_parent_components() {
        assert!(sanitize(Path::new("../evil")).is_err());
        assert!(sanitize(Path::new("/etc/passwd")).is_err());
        assert_eq!(sanitize(Path::new("./a/b")).unwrap(), PathBuf::from("a/b"));
    }
}
