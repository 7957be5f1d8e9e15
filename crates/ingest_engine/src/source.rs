use std::path::{Path, PathBuf};

use ingest_core::ImageHandle;

use crate::archive::is_archive_path;

/// A typed item handed over by a picker, capture facility or drop handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPayload {
    Image(ImageHandle),
    Screenshot(ImageHandle),
    File(PathBuf),
    Folder(PathBuf),
    Archive(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceResolution {
    Payloads(Vec<InputPayload>),
    /// The user dismissed the picker or capture.
    Cancelled,
}

/// An entry point that produces input asynchronously.
///
/// Every resolution is explicit: either payloads or a user cancellation.
#[async_trait::async_trait]
pub trait InputSource: Send + Sync {
    async fn resolve(&self) -> SourceResolution;
}

/// Classifies a dropped or picked path: directories are folders, known archive
/// extensions are archives, everything else is a plain file.
pub fn classify_path(path: impl Into<PathBuf>) -> InputPayload {
    let path = path.into();
    if path.is_dir() {
        InputPayload::Folder(path)
    } else if is_archive_path(&path) {
        InputPayload::Archive(path)
    } else {
        InputPayload::File(path)
    }
}

/// Display label for a container: its final path component.
pub fn container_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
