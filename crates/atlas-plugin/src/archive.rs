// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Archive extraction into plugin cache directories.
//!
//! Both backends refuse entries whose path would land outside the
//! destination. Symlinks and hard links are skipped.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use thiserror::Error;
use tracing::debug;

/// How leading path components are removed during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripPrefix {
    /// Always drop the first component (GitHub archives wrap everything in
    /// `<repo>-<ref>/`).
    TopLevel,
    /// Drop the first component only when every entry shares it.
    SharedTopLevel,
}

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// Picks the format from a URL's path suffix. Anything that is not
    /// `.tar.gz` or `.tgz` is treated as zip.
    pub fn for_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.ends_with(".tar.gz") || path.ends_with(".tgz") {
            ArchiveFormat::TarGz
        } else {
            ArchiveFormat::Zip
        }
    }

    /// File name used for the downloaded archive inside a cache entry.
    pub fn download_name(&self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => ".atlas-download.tar.gz",
            ArchiveFormat::Zip => ".atlas-download.zip",
        }
    }

    pub fn extractor(&self) -> &'static dyn ArchiveExtractor {
        match self {
            ArchiveFormat::TarGz => &TarGzExtractor,
            ArchiveFormat::Zip => &ZipExtractor,
        }
    }
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to read archive {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("archive entry '{}' escapes the extraction directory", entry.display())]
    UnsafePath { entry: PathBuf },

    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("extraction task failed: {0}")]
    Task(String),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Unpacks an archive file into a directory.
///
/// Implementations are synchronous; async callers go through
/// [`extract_blocking`].
pub trait ArchiveExtractor: Send + Sync {
    fn extract(&self, archive: &Path, dest: &Path, strip: StripPrefix) -> Result<(), ArchiveError>;
}

/// Runs an extractor on the blocking pool.
pub async fn extract_blocking(
    format: ArchiveFormat,
    archive: PathBuf,
    dest: PathBuf,
    strip: StripPrefix,
) -> Result<(), ArchiveError> {
    tokio::task::spawn_blocking(move || format.extractor().extract(&archive, &dest, strip))
        .await
        .map_err(|e| ArchiveError::Task(e.to_string()))?
}

/// gzip-compressed tarballs.
pub struct TarGzExtractor;

impl TarGzExtractor {
    fn open(archive: &Path) -> Result<tar::Archive<GzDecoder<File>>, ArchiveError> {
        let file = File::open(archive).map_err(io_err(archive))?;
        Ok(tar::Archive::new(GzDecoder::new(file)))
    }

    /// First pass over the stream, collecting entry paths for prefix detection.
    fn entry_paths(archive: &Path) -> Result<Vec<(PathBuf, bool)>, ArchiveError> {
        let mut tar = Self::open(archive)?;
        let mut paths = Vec::new();
        for entry in tar.entries().map_err(io_err(archive))? {
            let entry = entry.map_err(io_err(archive))?;
            let kind = entry.header().entry_type();
            if kind.is_pax_global_extensions() || kind.is_pax_local_extensions() {
                continue;
            }
            let path = entry.path().map_err(io_err(archive))?.into_owned();
            paths.push((path, kind.is_dir()));
        }
        Ok(paths)
    }
}

impl ArchiveExtractor for TarGzExtractor {
    fn extract(&self, archive: &Path, dest: &Path, strip: StripPrefix) -> Result<(), ArchiveError> {
        let strip_first = match strip {
            StripPrefix::TopLevel => true,
            StripPrefix::SharedTopLevel => shared_top_level(&Self::entry_paths(archive)?).is_some(),
        };

        let mut tar = Self::open(archive)?;
        for entry in tar.entries().map_err(io_err(archive))? {
            let mut entry = entry.map_err(io_err(archive))?;
            let kind = entry.header().entry_type();
            if kind.is_pax_global_extensions() || kind.is_pax_local_extensions() {
                continue;
            }

            let path = entry.path().map_err(io_err(archive))?.into_owned();
            let Some(relative) = relative_target(&path, strip_first)? else {
                continue;
            };

            if kind.is_symlink() || kind.is_hard_link() {
                debug!(entry = %path.display(), "skipping link entry");
                continue;
            }

            let target = dest.join(&relative);
            if kind.is_dir() {
                fs::create_dir_all(&target).map_err(io_err(&target))?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(io_err(parent))?;
            }
            entry.unpack(&target).map_err(io_err(&target))?;
        }
        Ok(())
    }
}

/// zip archives.
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive: &Path, dest: &Path, strip: StripPrefix) -> Result<(), ArchiveError> {
        let file = File::open(archive).map_err(io_err(archive))?;
        let mut zip = zip::ZipArchive::new(file)?;

        let mut paths = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let entry = zip.by_index(index)?;
            let path = entry.enclosed_name().ok_or_else(|| ArchiveError::UnsafePath {
                entry: PathBuf::from(entry.name()),
            })?;
            paths.push((path, entry.is_dir()));
        }

        let strip_first = match strip {
            StripPrefix::TopLevel => true,
            StripPrefix::SharedTopLevel => shared_top_level(&paths).is_some(),
        };

        for (index, (path, is_dir)) in paths.iter().enumerate() {
            let Some(relative) = relative_target(path, strip_first)? else {
                continue;
            };
            let target = dest.join(&relative);
            if *is_dir {
                fs::create_dir_all(&target).map_err(io_err(&target))?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(io_err(parent))?;
            }

            let mut entry = zip.by_index(index)?;
            let mut out = File::create(&target).map_err(io_err(&target))?;
            io::copy(&mut entry, &mut out).map_err(io_err(&target))?;

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&target, fs::Permissions::from_mode(mode))
                    .map_err(io_err(&target))?;
            }
        }
        Ok(())
    }
}

/// Returns the top-level directory shared by every entry, if there is one.
///
/// A file sitting directly at the archive root means there is no shared
/// directory.
fn shared_top_level(paths: &[(PathBuf, bool)]) -> Option<OsString> {
    let mut tops = BTreeSet::new();
    for (path, is_dir) in paths {
        let mut components = path.components().filter(|c| !matches!(c, Component::CurDir));
        let first = components.next()?;
        if components.next().is_none() && !is_dir {
            return None;
        }
        tops.insert(first.as_os_str().to_os_string());
    }
    if tops.len() == 1 {
        tops.into_iter().next()
    } else {
        None
    }
}

/// Maps an entry path to a path relative to the destination.
///
/// Returns `Ok(None)` for entries that vanish after stripping (the wrapper
/// directory itself).
fn relative_target(path: &Path, strip_first: bool) -> Result<Option<PathBuf>, ArchiveError> {
    let mut relative = PathBuf::new();
    let mut skipped = !strip_first;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) if skipped => relative.push(part),
            Component::Normal(_) => skipped = true,
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ArchiveError::UnsafePath {
                    entry: path.to_path_buf(),
                });
            }
        }
    }
    if relative.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(relative))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    /// Builds a `.tar.gz` from `(path, contents)` pairs.
    pub(crate) fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, contents.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    /// Builds a `.zip` from `(path, contents)` pairs using stored entries.
    pub(crate) fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (path, contents) in files {
            writer.start_file(*path, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn write_archive(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn format_from_url_suffix() {
        assert_eq!(ArchiveFormat::for_url("https://h/p.tgz"), ArchiveFormat::TarGz);
        assert_eq!(ArchiveFormat::for_url("https://h/p.tar.gz?x=1"), ArchiveFormat::TarGz);
        assert_eq!(ArchiveFormat::for_url("https://h/p.zip"), ArchiveFormat::Zip);
        assert_eq!(ArchiveFormat::for_url("https://h/download"), ArchiveFormat::Zip);
    }

    #[test]
    fn tar_top_level_is_always_stripped() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = write_archive(
            tmp.path(),
            "a.tar.gz",
            &tar_gz(&[
                ("widgets-main/atlas.plugin.json", "{}"),
                ("widgets-main/lib/index.js", "//"),
            ]),
        );
        let dest = tmp.path().join("out");
        fs::create_dir(&dest).unwrap();

        TarGzExtractor
            .extract(&archive, &dest, StripPrefix::TopLevel)
            .unwrap();

        assert!(dest.join("atlas.plugin.json").is_file());
        assert!(dest.join("lib/index.js").is_file());
        assert!(!dest.join("widgets-main").exists());
    }

    #[test]
    fn shared_prefix_is_kept_when_entries_differ() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = write_archive(
            tmp.path(),
            "a.tar.gz",
            &tar_gz(&[("atlas.plugin.json", "{}"), ("lib/index.js", "//")]),
        );
        let dest = tmp.path().join("out");
        fs::create_dir(&dest).unwrap();

        TarGzExtractor
            .extract(&archive, &dest, StripPrefix::SharedTopLevel)
            .unwrap();

        assert!(dest.join("atlas.plugin.json").is_file());
        assert!(dest.join("lib/index.js").is_file());
    }

    #[test]
    fn zip_shared_prefix_is_stripped() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = write_archive(
            tmp.path(),
            "a.zip",
            &zip_bytes(&[("pkg/atlas.plugin.json", "{}"), ("pkg/index.sh", "echo")]),
        );
        let dest = tmp.path().join("out");
        fs::create_dir(&dest).unwrap();

        ZipExtractor
            .extract(&archive, &dest, StripPrefix::SharedTopLevel)
            .unwrap();

        assert_eq!(
            fs::read_to_string(dest.join("atlas.plugin.json")).unwrap(),
            "{}"
        );
        assert!(dest.join("index.sh").is_file());
    }

    #[test]
    fn parent_components_are_rejected() {
        assert!(matches!(
            relative_target(Path::new("../evil"), false),
            Err(ArchiveError::UnsafePath { .. })
        ));
        assert!(matches!(
            relative_target(Path::new("/etc/passwd"), false),
            Err(ArchiveError::UnsafePath { .. })
        ));
        assert_eq!(
            relative_target(Path::new("top/a/b"), true).unwrap(),
            Some(PathBuf::from("a/b"))
        );
        assert_eq!(relative_target(Path::new("top/"), true).unwrap(), None);
    }

    #[test]
    fn root_file_prevents_shared_prefix() {
        let paths = vec![
            (PathBuf::from("pkg/a"), false),
            (PathBuf::from("README"), false),
        ];
        assert!(shared_top_level(&paths).is_none());

        let paths = vec![(PathBuf::from("pkg/"), true), (PathBuf::from("pkg/a"), false)];
        assert_eq!(shared_top_level(&paths), Some(OsString::from("pkg")));
    }
}
