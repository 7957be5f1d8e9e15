use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use ingest_core::{AttachmentId, ImageHandle, RawImage};
use ingest_logging::{ingest_debug, ingest_error, ingest_trace};

use crate::registry::AttachmentRegistry;
use crate::{IngestionSink, ThumbnailSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailSource {
    Image(ImageHandle),
    Video(PathBuf),
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ThumbnailError {
    #[error("no frame source for {0}")]
    Unsupported(String),
    #[error("frame extraction failed: {0}")]
    Frame(String),
    #[error("invalid preview bound {0}")]
    InvalidBound(u32),
}

/// Grabs still frames from media files. Media decoding lives outside this crate.
pub trait FrameSource: Send + Sync {
    /// A frame from the start of the media at `path`.
    fn first_frame(&self, path: &Path) -> Result<RawImage, ThumbnailError>;
}

/// Frame source for builds without media support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFrameSource;

impl FrameSource for NoFrameSource {
    fn first_frame(&self, path: &Path) -> Result<RawImage, ThumbnailError> {
        Err(ThumbnailError::Unsupported(path.display().to_string()))
    }
}

pub trait ThumbnailRenderer: Send + Sync {
    fn render(
        &self,
        source: &ThumbnailSource,
        max_dimension: u32,
    ) -> Result<ImageHandle, ThumbnailError>;
}

pub struct ScalingRenderer {
    frames: Arc<dyn FrameSource>,
}

impl ScalingRenderer {
    pub fn new(frames: Arc<dyn FrameSource>) -> Self {
        Self { frames }
    }
}

impl Default for ScalingRenderer {
    fn default() -> Self {
        Self::new(Arc::new(NoFrameSource))
    }
}

impl ThumbnailRenderer for ScalingRenderer {
    fn render(
        &self,
        source: &ThumbnailSource,
        max_dimension: u32,
    ) -> Result<ImageHandle, ThumbnailError> {
        match source {
            ThumbnailSource::Image(image) => scale_to_fit(image, max_dimension),
            ThumbnailSource::Video(path) => {
                let frame = Arc::new(self.frames.first_frame(path)?);
                scale_to_fit(&frame, max_dimension)
            }
        }
    }
}

/// Box-filters `image` down so its longest edge is at most `max_dimension`.
///
/// Aspect ratio is kept; images already inside the bound are returned as-is.
pub fn scale_to_fit(image: &ImageHandle, max_dimension: u32) -> Result<ImageHandle, ThumbnailError> {
    if max_dimension == 0 {
        return Err(ThumbnailError::InvalidBound(max_dimension));
    }
    let (width, height) = (image.width() as u64, image.height() as u64);
    let bound = max_dimension as u64;
    if width <= bound && height <= bound {
        return Ok(image.clone());
    }

    let (target_w, target_h) = if width >= height {
        (bound, (height * bound / width).max(1))
    } else {
        ((width * bound / height).max(1), bound)
    };

    let src = image.pixels();
    let mut out = Vec::with_capacity((target_w * target_h * 4) as usize);
    for ty in 0..target_h {
        let y0 = ty * height / target_h;
        let y1 = ((ty + 1) * height / target_h).max(y0 + 1);
        for tx in 0..target_w {
            let x0 = tx * width / target_w;
            let x1 = ((tx + 1) * width / target_w).max(x0 + 1);
            let mut sum = [0u64; 4];
            for y in y0..y1 {
                for x in x0..x1 {
                    let offset = ((y * width + x) * 4) as usize;
                    for (channel, total) in sum.iter_mut().enumerate() {
                        *total += src[offset + channel] as u64;
                    }
                }
            }
            let count = (y1 - y0) * (x1 - x0);
            out.extend(sum.iter().map(|total| (total / count) as u8));
        }
    }

    RawImage::from_rgba(target_w as u32, target_h as u32, out)
        .map(Arc::new)
        .ok_or(ThumbnailError::InvalidBound(max_dimension))
}

enum ThumbnailCommand {
    Render {
        id: AttachmentId,
        source: ThumbnailSource,
    },
}

/// Best-effort preview generation on a dedicated thread.
///
/// Requests are rendered one at a time in submission order. Failures are logged
/// and dropped; nothing is retried. The worker thread exits when the pipeline is
/// dropped.
pub struct ThumbnailPipeline {
    cmd_tx: mpsc::Sender<ThumbnailCommand>,
    registry: Arc<AttachmentRegistry>,
}

impl ThumbnailPipeline {
    pub fn new(
        renderer: Arc<dyn ThumbnailRenderer>,
        settings: ThumbnailSettings,
        registry: Arc<AttachmentRegistry>,
        sink: Arc<dyn IngestionSink>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let worker_registry = registry.clone();

        let spawned = thread::Builder::new()
            .name("ingest-thumbnails".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        ThumbnailCommand::Render { id, source } => render_one(
                            renderer.as_ref(),
                            settings.max_dimension,
                            &worker_registry,
                            sink.as_ref(),
                            id,
                            &source,
                        ),
                    }
                }
            });
        if let Err(err) = spawned {
            // Requests will be dropped; attachments simply keep no thumbnail.
            ingest_error!("Could not start thumbnail thread: {}", err);
        }

        Self { cmd_tx, registry }
    }

    /// Queues a preview for `id`. Ids that are not registered are ignored.
    pub fn request(&self, id: AttachmentId, source: ThumbnailSource) {
        if !self.registry.mark_pending(id) {
            return;
        }
        if self
            .cmd_tx
            .send(ThumbnailCommand::Render { id, source })
            .is_err()
        {
            self.registry.mark_failed(id);
        }
    }
}

fn render_one(
    renderer: &dyn ThumbnailRenderer,
    max_dimension: u32,
    registry: &AttachmentRegistry,
    sink: &dyn IngestionSink,
    id: AttachmentId,
    source: &ThumbnailSource,
) {
    if !registry.contains(id) {
        ingest_trace!("Skipping thumbnail for removed {}", id);
        return;
    }
    match renderer.render(source, max_dimension) {
        Ok(thumbnail) => {
            let delivered =
                registry.deliver_thumbnail(id, || sink.on_thumbnail_ready(id, thumbnail));
            if !delivered {
                ingest_trace!("Thumbnail for {} arrived after removal", id);
            }
        }
        Err(err) => {
            ingest_debug!("Thumbnail for {} failed: {}", id, err);
            registry.mark_failed(id);
        }
    }
}
