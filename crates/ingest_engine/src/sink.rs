use std::sync::mpsc;

use ingest_core::{Attachment, AttachmentId, ImageHandle, ProcessingState};

use crate::{ContainerOutcome, IngestError};

/// Destination for everything the pipeline produces.
///
/// Callbacks are made without internal locks held, so an implementation may query
/// or call back into the coordinator. Slow callbacks delay the episode or thumbnail
/// thread that made them; [`ChannelSink`] forwards to a queue drained on the UI
/// thread instead.
pub trait IngestionSink: Send + Sync {
    fn on_attachment_ready(&self, attachment: Attachment);

    fn on_progress(&self, _state: &ProcessingState) {}

    fn on_thumbnail_ready(&self, _id: AttachmentId, _thumbnail: ImageHandle) {}

    fn on_container_finished(&self, _label: &str, _result: &Result<ContainerOutcome, IngestError>) {
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    AttachmentReady(Attachment),
    Progress(ProcessingState),
    ThumbnailReady {
        id: AttachmentId,
        thumbnail: ImageHandle,
    },
    ContainerFinished {
        label: String,
        result: Result<ContainerOutcome, IngestError>,
    },
}

/// Forwards every callback into a channel so one consumer sees them in delivery order.
pub struct ChannelSink {
    tx: mpsc::Sender<IngestEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<IngestEvent>) -> Self {
        Self { tx }
    }
}

impl IngestionSink for ChannelSink {
    fn on_attachment_ready(&self, attachment: Attachment) {
        let _ = self.tx.send(IngestEvent::AttachmentReady(attachment));
    }

    fn on_progress(&self, state: &ProcessingState) {
        let _ = self.tx.send(IngestEvent::Progress(state.clone()));
    }

    fn on_thumbnail_ready(&self, id: AttachmentId, thumbnail: ImageHandle) {
        let _ = self.tx.send(IngestEvent::ThumbnailReady { id, thumbnail });
    }

    fn on_container_finished(&self, label: &str, result: &Result<ContainerOutcome, IngestError>) {
        let _ = self.tx.send(IngestEvent::ContainerFinished {
            label: label.to_string(),
            result: result.clone(),
        });
    }
}
