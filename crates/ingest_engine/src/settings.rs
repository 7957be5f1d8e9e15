use std::num::NonZeroUsize;
use std::path::Path;

/// Extensions never worth decoding as text.
pub const DEFAULT_SKIP_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp", "heic", "ico", "icns", "psd",
    // audio and video
    "mp3", "wav", "aac", "flac", "m4a", "ogg", "mp4", "mov", "m4v", "avi", "mkv", "webm",
    // archives
    "zip", "gz", "tgz", "bz2", "xz", "7z", "rar", "tar", "dmg", "iso",
    // compiled artifacts
    "exe", "dll", "so", "dylib", "o", "a", "class", "jar", "wasm", "pyc",
    // document containers
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "key", "pages", "numbers",
    // fonts and databases
    "ttf", "otf", "woff", "woff2", "sqlite", "db",
];

#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    /// Files larger than this are left out of enumeration.
    pub max_file_bytes: u64,
    /// Upper bound on concurrent readers; the machine's parallelism caps it further.
    pub max_workers: usize,
    pub skip_extensions: Vec<String>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            max_file_bytes: 8 * 1024 * 1024,
            max_workers: 8,
            skip_extensions: DEFAULT_SKIP_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl ExtractionSettings {
    pub fn is_skipped_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        self.skip_extensions
            .iter()
            .any(|skip| skip.eq_ignore_ascii_case(ext))
    }

    /// Reader pool size for `file_count` files. Always at least one.
    pub fn worker_count(&self, file_count: usize) -> usize {
        let parallelism = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        parallelism
            .min(self.max_workers.max(1))
            .min(file_count)
            .max(1)
    }
}

#[derive(Debug, Clone)]
pub struct ThumbnailSettings {
    /// Longest edge of a generated preview, in pixels.
    pub max_dimension: u32,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self { max_dimension: 256 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestSettings {
    pub extraction: ExtractionSettings,
    pub thumbnails: ThumbnailSettings,
}
