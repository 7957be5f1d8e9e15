use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

/// File extensions treated as video for thumbnail and display purposes.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "avi", "mkv", "webm"];

/// Identity of an attachment, unique within the factory that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentId(u64);

impl AttachmentId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "att-{}", self.0)
    }
}

/// Decoded RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RawImage {
    /// Wraps an RGBA8 buffer; `None` if the buffer length does not match the dimensions.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if width == 0 || height == 0 || pixels.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn byte_len(&self) -> u64 {
        self.pixels.len() as u64
    }
}

/// Shared, immutable image handed between the pipeline and the UI.
pub type ImageHandle = Arc<RawImage>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Image,
    Screenshot,
    File,
    TextBundle,
}

impl AttachmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Screenshot => "screenshot",
            AttachmentKind::File => "file",
            AttachmentKind::TextBundle => "text_bundle",
        }
    }
}

/// The unit produced by the ingestion pipeline.
///
/// Values are only created through [`crate::AttachmentFactory`], so ids and
/// variant invariants are assigned in one place. Once built an attachment is never
/// mutated; [`Attachment::with_thumbnail`] returns a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Image(ImageAttachment),
    Screenshot(ImageAttachment),
    File(FileAttachment),
    TextBundle(TextBundle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    id: AttachmentId,
    image: ImageHandle,
    thumbnail: Option<ImageHandle>,
}

impl ImageAttachment {
    pub(crate) fn new(id: AttachmentId, image: ImageHandle) -> Self {
        Self {
            id,
            image,
            thumbnail: None,
        }
    }

    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    pub fn thumbnail(&self) -> Option<&ImageHandle> {
        self.thumbnail.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    id: AttachmentId,
    path: PathBuf,
    byte_len: Option<u64>,
}

impl FileAttachment {
    pub(crate) fn new(id: AttachmentId, path: PathBuf, byte_len: Option<u64>) -> Self {
        Self { id, path, byte_len }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size on disk captured when the attachment was built.
    pub fn byte_len(&self) -> Option<u64> {
        self.byte_len
    }
}

/// Merged text of a folder or archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBundle {
    id: AttachmentId,
    content: String,
    label: String,
    item_count: usize,
}

impl TextBundle {
    pub(crate) fn new(id: AttachmentId, content: String, label: String, item_count: usize) -> Self {
        Self {
            id,
            content,
            label,
            item_count,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Name of the folder or archive the bundle was built from.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of files merged into the bundle; skipped files are not counted.
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Short content hash, stable across runs for identical content.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.content.as_bytes());
        let mut hex = String::with_capacity(16);
        for byte in digest.iter().take(8) {
            use std::fmt::Write;
            let _ = write!(&mut hex, "{byte:02x}");
        }
        hex
    }
}

impl Attachment {
    pub fn id(&self) -> AttachmentId {
        match self {
            Attachment::Image(image) | Attachment::Screenshot(image) => image.id,
            Attachment::File(file) => file.id,
            Attachment::TextBundle(bundle) => bundle.id,
        }
    }

    pub fn kind(&self) -> AttachmentKind {
        match self {
            Attachment::Image(_) => AttachmentKind::Image,
            Attachment::Screenshot(_) => AttachmentKind::Screenshot,
            Attachment::File(_) => AttachmentKind::File,
            Attachment::TextBundle(_) => AttachmentKind::TextBundle,
        }
    }

    /// Human-readable title for display.
    pub fn title(&self) -> String {
        match self {
            Attachment::Image(_) => "Image".to_string(),
            Attachment::Screenshot(_) => "Screenshot".to_string(),
            Attachment::File(file) => file
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.path.display().to_string()),
            Attachment::TextBundle(bundle) => {
                let noun = if bundle.item_count == 1 { "file" } else { "files" };
                format!("{} ({} {noun})", bundle.label, bundle.item_count)
            }
        }
    }

    /// Number of files merged into a text bundle; `None` for other kinds.
    pub fn item_count(&self) -> Option<usize> {
        match self {
            Attachment::TextBundle(bundle) => Some(bundle.item_count),
            Attachment::Image(_) | Attachment::Screenshot(_) | Attachment::File(_) => None,
        }
    }

    pub fn is_video(&self) -> bool {
        match self {
            Attachment::File(file) => is_video_path(&file.path),
            Attachment::Image(_) | Attachment::Screenshot(_) | Attachment::TextBundle(_) => false,
        }
    }

    /// Bytes-on-disk estimate, where one is known.
    pub fn byte_size(&self) -> Option<u64> {
        match self {
            Attachment::Image(image) | Attachment::Screenshot(image) => {
                Some(image.image.byte_len())
            }
            Attachment::File(file) => file.byte_len,
            Attachment::TextBundle(bundle) => Some(bundle.content.len() as u64),
        }
    }

    pub fn thumbnail(&self) -> Option<&ImageHandle> {
        match self {
            Attachment::Image(image) | Attachment::Screenshot(image) => image.thumbnail(),
            Attachment::File(_) | Attachment::TextBundle(_) => None,
        }
    }

    /// Returns a copy carrying `thumbnail`. Variants without a thumbnail slot are returned unchanged.
    pub fn with_thumbnail(self, thumbnail: ImageHandle) -> Self {
        match self {
            Attachment::Image(mut image) => {
                image.thumbnail = Some(thumbnail);
                Attachment::Image(image)
            }
            Attachment::Screenshot(mut image) => {
                image.thumbnail = Some(thumbnail);
                Attachment::Screenshot(image)
            }
            other @ (Attachment::File(_) | Attachment::TextBundle(_)) => other,
        }
    }
}

pub fn is_video_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|video| video.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}
