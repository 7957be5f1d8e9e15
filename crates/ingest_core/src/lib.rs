//! Ingest core: attachment values, their factory, and the pure processing state machine.
mod attachment;
mod effect;
mod factory;
mod msg;
mod state;
mod update;
mod view_model;

pub use attachment::{
    is_video_path, Attachment, AttachmentId, AttachmentKind, FileAttachment, ImageAttachment,
    ImageHandle, RawImage, TextBundle, VIDEO_EXTENSIONS,
};
pub use effect::Effect;
pub use factory::AttachmentFactory;
pub use msg::Msg;
pub use state::{EpisodeId, EpisodeOutcome, LastEpisode, PipelineState, ProcessingState};
pub use update::update;
pub use view_model::PipelineViewModel;
