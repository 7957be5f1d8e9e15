//! Ingest engine: input routing, parallel text extraction and thumbnail delivery.
mod archive;
mod coordinator;
mod decode;
mod enumerate;
mod extract;
mod handle;
mod registry;
mod settings;
mod sink;
mod source;
mod thumbnail;
mod types;

pub use archive::{is_archive_path, materialize_archive, MaterializedArchive, ARCHIVE_EXTENSIONS};
pub use coordinator::{
    ContainerEpisode, ContainerOutcome, IngestionCoordinator, Routed, SimpleInput, SourceOutcome,
};
pub use decode::{decode_text, DecodeError, DecodedText};
pub use enumerate::{enumerate_sources, Enumeration, SourceFile};
pub use extract::{ExtractionEngine, ProgressSink};
pub use handle::{IngestHandle, Submitted};
pub use registry::{AttachmentRegistry, ThumbnailStatus};
pub use settings::{
    ExtractionSettings, IngestSettings, ThumbnailSettings, DEFAULT_SKIP_EXTENSIONS,
};
pub use sink::{ChannelSink, IngestEvent, IngestionSink};
pub use source::{classify_path, container_label, InputPayload, InputSource, SourceResolution};
pub use thumbnail::{
    scale_to_fit, FrameSource, NoFrameSource, ScalingRenderer, ThumbnailError, ThumbnailPipeline,
    ThumbnailRenderer, ThumbnailSource,
};
pub use types::{ExtractedText, ExtractionEvent, IngestError, SkippedFile};
