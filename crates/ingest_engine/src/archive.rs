use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Component, Path};

use ingest_logging::{ingest_debug, ingest_trace};
use tempfile::TempDir;

use crate::enumerate::is_ignored_name;
use crate::{ExtractionSettings, IngestError};

pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip"];

pub fn is_archive_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ARCHIVE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Archive contents unpacked into a scratch directory.
///
/// The directory is removed when this value is dropped, whether the owning
/// extraction finished, failed or was cancelled.
#[derive(Debug)]
pub struct MaterializedArchive {
    dir: TempDir,
    filtered: usize,
}

impl MaterializedArchive {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Entries left in the archive by the name, extension or size filters.
    pub fn filtered(&self) -> usize {
        self.filtered
    }
}

/// Unpacks the text-plausible entries of a `.zip` archive into a scratch directory.
///
/// Entries are filtered from the archive index before anything is written: unsafe
/// names, hidden and `__MACOSX` paths, skipped extensions and entries whose declared
/// size exceeds `max_file_bytes`. Declared sizes are not trusted; every entry is
/// copied through a reader capped one byte past the limit and dropped if it hits it.
pub fn materialize_archive(
    path: &Path,
    settings: &ExtractionSettings,
) -> Result<MaterializedArchive, IngestError> {
    if !is_archive_path(path) {
        return Err(IngestError::unreadable(path, "unsupported archive format"));
    }
    let file = File::open(path).map_err(|err| IngestError::unreadable(path, err))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|err| IngestError::unreadable(path, err))?;

    let dir = tempfile::Builder::new()
        .prefix("ingest-archive-")
        .tempdir()
        .map_err(|err| IngestError::unreadable(path, format!("scratch directory: {err}")))?;

    let limit = settings.max_file_bytes;
    let mut written = 0usize;
    let mut filtered = 0usize;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| IngestError::unreadable(path, err))?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            ingest_debug!("Skipping unsafe entry name {:?} in {:?}", entry.name(), path);
            filtered += 1;
            continue;
        };
        if has_ignored_component(&relative)
            || settings.is_skipped_extension(&relative)
            || entry.size() > limit
        {
            ingest_trace!("Filtered {:?} ({} bytes) from {:?}", relative, entry.size(), path);
            filtered += 1;
            continue;
        }

        let target = dir.path().join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|err| IngestError::unreadable(path, err))?;
        }
        let copied = copy_capped(&mut entry, &target, limit)
            .map_err(|err| IngestError::unreadable(path, format!("{}: {err}", relative.display())))?;
        if copied > limit {
            ingest_debug!(
                "Dropping {:?} from {:?}: inflates past {} bytes",
                relative,
                path,
                limit
            );
            fs::remove_file(&target).map_err(|err| IngestError::unreadable(path, err))?;
            filtered += 1;
            continue;
        }
        written += 1;
    }

    ingest_debug!(
        "Materialized {} of {} entries from {:?} into {:?}",
        written,
        archive.len(),
        path,
        dir.path()
    );
    Ok(MaterializedArchive { dir, filtered })
}

fn has_ignored_component(relative: &Path) -> bool {
    relative.components().any(|component| match component {
        Component::Normal(name) => is_ignored_name(name),
        _ => true,
    })
}

/// Writes at most `limit + 1` bytes of `reader` to `target` and returns the count.
fn copy_capped(reader: &mut impl Read, target: &Path, limit: u64) -> io::Result<u64> {
    let mut out = BufWriter::new(File::create(target)?);
    let copied = io::copy(&mut reader.take(limit.saturating_add(1)), &mut out)?;
    io::Write::flush(&mut out)?;
    Ok(copied)
}
