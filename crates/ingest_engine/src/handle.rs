use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use ingest_core::{Attachment, AttachmentId, EpisodeId, PipelineViewModel, ProcessingState};
use ingest_logging::ingest_debug;
use tokio::sync::watch;

use crate::coordinator::{ContainerEpisode, IngestionCoordinator, SimpleInput};
use crate::source::{classify_path, container_label, InputPayload};
use crate::IngestError;

enum HandleCommand {
    Run(ContainerEpisode),
}

/// What a submitted path turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    Attachment(Attachment),
    /// Extraction continues in the background; the bundle arrives through the sink.
    Episode(EpisodeId),
}

/// Synchronous front end for callers without an async runtime.
///
/// Owns a tokio runtime on a dispatch thread. Container episodes are accepted or
/// rejected on the calling thread, then run in the background; their results reach
/// the coordinator's sink. Dropping the handle stops the runtime, and any episode
/// still running ends as cancelled.
pub struct IngestHandle {
    coordinator: Arc<IngestionCoordinator>,
    cmd_tx: mpsc::Sender<HandleCommand>,
}

impl IngestHandle {
    pub fn new(coordinator: Arc<IngestionCoordinator>) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("ingest-worker")
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();

        thread::Builder::new()
            .name("ingest-dispatch".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        HandleCommand::Run(episode) => {
                            runtime.spawn(async move {
                                let _ = episode.run().await;
                            });
                        }
                    }
                }
                ingest_debug!("Ingest dispatch thread stopping");
            })?;

        Ok(Self {
            coordinator,
            cmd_tx,
        })
    }

    pub fn coordinator(&self) -> &Arc<IngestionCoordinator> {
        &self.coordinator
    }

    pub fn ingest_simple(&self, input: SimpleInput) -> Result<Attachment, IngestError> {
        self.coordinator.ingest_simple(input)
    }

    /// Starts extracting `root` in the background, or fails fast with [`IngestError::Busy`].
    pub fn ingest_container(
        &self,
        root: impl Into<PathBuf>,
        label: impl Into<String>,
    ) -> Result<EpisodeId, IngestError> {
        let episode = self.coordinator.begin_container(root, label)?;
        let id = episode.episode();
        // A rejected send drops the episode, which ends it as cancelled.
        self.cmd_tx
            .send(HandleCommand::Run(episode))
            .map_err(|_| IngestError::Cancelled)?;
        Ok(id)
    }

    /// Classifies `path` as file, folder or archive and submits it accordingly.
    pub fn ingest_path(&self, path: impl Into<PathBuf>) -> Result<Submitted, IngestError> {
        match classify_path(path) {
            InputPayload::Folder(path) | InputPayload::Archive(path) => {
                let label = container_label(&path);
                self.ingest_container(path, label).map(Submitted::Episode)
            }
            InputPayload::File(path) => self
                .ingest_simple(SimpleInput::File(path))
                .map(Submitted::Attachment),
            InputPayload::Image(image) => self
                .ingest_simple(SimpleInput::Image(image))
                .map(Submitted::Attachment),
            InputPayload::Screenshot(image) => self
                .ingest_simple(SimpleInput::Screenshot(image))
                .map(Submitted::Attachment),
        }
    }

    pub fn cancel_container(&self) -> bool {
        self.coordinator.cancel_container()
    }

    pub fn remove(&self, id: AttachmentId) -> bool {
        self.coordinator.remove(id)
    }

    pub fn processing_state(&self) -> ProcessingState {
        self.coordinator.processing_state()
    }

    pub fn view(&self) -> PipelineViewModel {
        self.coordinator.view()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProcessingState> {
        self.coordinator.subscribe()
    }
}
