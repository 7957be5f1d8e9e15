use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::attachment::{FileAttachment, ImageAttachment, TextBundle};
use crate::{Attachment, AttachmentId, ImageHandle};

/// Sole constructor of [`Attachment`] values.
///
/// Ids are issued from a monotonically increasing counter starting at 1, so every
/// attachment produced by one factory has a distinct id. The factory is `Sync`;
/// concurrent entry points can share it without further locking.
#[derive(Debug)]
pub struct AttachmentFactory {
    next_id: AtomicU64,
}

impl Default for AttachmentFactory {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }
}

impl AttachmentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&self) -> AttachmentId {
        AttachmentId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn image(&self, image: ImageHandle) -> Attachment {
        Attachment::Image(ImageAttachment::new(self.allocate(), image))
    }

    pub fn screenshot(&self, image: ImageHandle) -> Attachment {
        Attachment::Screenshot(ImageAttachment::new(self.allocate(), image))
    }

    pub fn file(&self, path: impl Into<PathBuf>, byte_len: Option<u64>) -> Attachment {
        Attachment::File(FileAttachment::new(self.allocate(), path.into(), byte_len))
    }

    pub fn text_bundle(
        &self,
        content: String,
        label: impl Into<String>,
        item_count: usize,
    ) -> Attachment {
        Attachment::TextBundle(TextBundle::new(
            self.allocate(),
            content,
            label.into(),
            item_count,
        ))
    }
}
