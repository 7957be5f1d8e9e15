use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use ingest_logging::ingest_debug;
use walkdir::WalkDir;

use crate::{ExtractionSettings, IngestError};

/// Folder some archivers add next to the real content.
const ARCHIVE_METADATA_DIR: &str = "__MACOSX";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path below the root, `/`-separated on every platform.
    pub relative_path: String,
    pub byte_len: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    /// Leaf files in walk order: sorted by name at every directory level.
    pub files: Vec<SourceFile>,
    pub estimated_bytes: u64,
    /// Files seen but left out: symlinks, skipped extensions, oversized files.
    pub filtered: usize,
}

/// Walks `root` and collects the text-plausible leaf files beneath it.
pub fn enumerate_sources(
    root: &Path,
    settings: &ExtractionSettings,
) -> Result<Enumeration, IngestError> {
    let meta = fs::metadata(root).map_err(|err| IngestError::unreadable(root, err))?;
    if !meta.is_dir() {
        return Err(IngestError::unreadable(root, "not a directory"));
    }
    // WalkDir reports an unreadable root as just another entry error.
    fs::read_dir(root).map_err(|err| IngestError::unreadable(root, err))?;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_ignored_name(entry.file_name()));

    let mut enumeration = Enumeration::default();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                ingest_debug!("Skipping unreadable entry under {:?}: {}", root, err);
                continue;
            }
        };
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            // Links are not followed, so nothing outside the root is read.
            ingest_debug!("Skipping symlink {:?}", entry.path());
            enumeration.filtered += 1;
            continue;
        }
        if !file_type.is_file() {
            continue;
        }

        let path = entry.path();
        if settings.is_skipped_extension(path) {
            enumeration.filtered += 1;
            continue;
        }
        let byte_len = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(err) => {
                ingest_debug!("Skipping {:?}, no metadata: {}", path, err);
                enumeration.filtered += 1;
                continue;
            }
        };
        if byte_len > settings.max_file_bytes {
            ingest_debug!(
                "Skipping {:?}: {} bytes exceeds limit {}",
                path,
                byte_len,
                settings.max_file_bytes
            );
            enumeration.filtered += 1;
            continue;
        }

        enumeration.estimated_bytes += byte_len;
        enumeration.files.push(SourceFile {
            path: path.to_path_buf(),
            relative_path: relative_display(root, path),
            byte_len,
        });
    }

    Ok(enumeration)
}

pub(crate) fn is_ignored_name(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('.') || name == ARCHIVE_METADATA_DIR
}

fn relative_display(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
