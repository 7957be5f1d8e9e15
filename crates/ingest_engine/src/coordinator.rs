use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ingest_core::{
    is_video_path, update, Attachment, AttachmentFactory, AttachmentId, Effect, EpisodeId,
    EpisodeOutcome, ImageHandle, Msg, PipelineState, PipelineViewModel, ProcessingState,
};
use ingest_logging::{ingest_debug, ingest_info, ingest_warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::extract::{ExtractionEngine, ProgressSink};
use crate::registry::AttachmentRegistry;
use crate::source::{container_label, InputPayload, InputSource, SourceResolution};
use crate::thumbnail::{ScalingRenderer, ThumbnailPipeline, ThumbnailRenderer, ThumbnailSource};
use crate::{
    ExtractedText, ExtractionEvent, IngestError, IngestSettings, IngestionSink, SkippedFile,
};

/// Inputs that become an attachment without extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleInput {
    Image(ImageHandle),
    Screenshot(ImageHandle),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerOutcome {
    pub attachment: Attachment,
    /// Files that were enumerated but could not be read.
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Attachment(Attachment),
    Container(ContainerOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    UserCancelled,
    /// One result per payload, in the order the source returned them.
    Routed(Vec<Result<Routed, IngestError>>),
}

/// Routes every input to its handler and owns the processing state.
///
/// Simple inputs are turned into attachments on the caller's thread and never
/// touch the processing state, so they run freely alongside an active container
/// episode. Container inputs go through [`IngestionCoordinator::begin_container`],
/// which either opens the single episode or rejects with [`IngestError::Busy`].
///
/// All state transitions go through [`ingest_core::update`] under one lock; the
/// watch channel is updated before that lock is released. Sink progress callbacks
/// run after it is released. They still arrive in order: only the opening
/// transition and the task running the active episode ever publish, and the
/// episode task starts after the opening transition has been delivered.
pub struct IngestionCoordinator {
    factory: AttachmentFactory,
    engine: ExtractionEngine,
    thumbnails: ThumbnailPipeline,
    registry: Arc<AttachmentRegistry>,
    sink: Arc<dyn IngestionSink>,
    state: Mutex<PipelineState>,
    state_tx: watch::Sender<ProcessingState>,
    active_cancel: Mutex<Option<(EpisodeId, CancellationToken)>>,
}

impl IngestionCoordinator {
    pub fn new(
        settings: IngestSettings,
        renderer: Arc<dyn ThumbnailRenderer>,
        sink: Arc<dyn IngestionSink>,
    ) -> Arc<Self> {
        let registry = Arc::new(AttachmentRegistry::new());
        let thumbnails =
            ThumbnailPipeline::new(renderer, settings.thumbnails, registry.clone(), sink.clone());
        let (state_tx, _) = watch::channel(ProcessingState::Idle);
        Arc::new(Self {
            factory: AttachmentFactory::new(),
            engine: ExtractionEngine::new(settings.extraction),
            thumbnails,
            registry,
            sink,
            state: Mutex::new(PipelineState::new()),
            state_tx,
            active_cancel: Mutex::new(None),
        })
    }

    pub fn with_defaults(sink: Arc<dyn IngestionSink>) -> Arc<Self> {
        Self::new(
            IngestSettings::default(),
            Arc::new(ScalingRenderer::default()),
            sink,
        )
    }

    pub fn registry(&self) -> &AttachmentRegistry {
        &self.registry
    }

    pub fn processing_state(&self) -> ProcessingState {
        self.lock_state().processing().clone()
    }

    pub fn view(&self) -> PipelineViewModel {
        self.lock_state().view()
    }

    /// Receives every published state; the current value is available immediately.
    pub fn subscribe(&self) -> watch::Receiver<ProcessingState> {
        self.state_tx.subscribe()
    }

    /// Builds an attachment for an image, screenshot or file, emits it, then queues its thumbnail.
    pub fn ingest_simple(&self, input: SimpleInput) -> Result<Attachment, IngestError> {
        let (attachment, thumbnail) = match input {
            SimpleInput::Image(image) => (
                self.factory.image(image.clone()),
                Some(ThumbnailSource::Image(image)),
            ),
            SimpleInput::Screenshot(image) => (
                self.factory.screenshot(image.clone()),
                Some(ThumbnailSource::Image(image)),
            ),
            SimpleInput::File(path) => {
                let meta = fs::metadata(&path).map_err(|err| IngestError::unreadable(&path, err))?;
                if meta.is_dir() {
                    return Err(IngestError::unreadable(&path, "is a folder"));
                }
                let thumbnail = is_video_path(&path).then(|| ThumbnailSource::Video(path.clone()));
                (self.factory.file(path, Some(meta.len())), thumbnail)
            }
        };

        let id = attachment.id();
        self.registry.register(id);
        ingest_debug!("Ingested {} {}", attachment.kind().as_str(), id);
        self.sink.on_attachment_ready(attachment.clone());
        if let Some(source) = thumbnail {
            self.thumbnails.request(id, source);
        }
        Ok(attachment)
    }

    /// Opens a container episode or rejects immediately with [`IngestError::Busy`].
    ///
    /// Nothing is read until the returned episode is run. Dropping the episode
    /// unrun ends it as cancelled.
    pub fn begin_container(
        self: &Arc<Self>,
        root: impl Into<PathBuf>,
        label: impl Into<String>,
    ) -> Result<ContainerEpisode, IngestError> {
        let root = root.into();
        let label = label.into();
        let effects = self.apply(Msg::ContainerRequested {
            label: label.clone(),
        });

        let mut opened = None;
        for effect in effects {
            match effect {
                Effect::RejectBusy { requested, active } => {
                    ingest_warn!("Rejected {}: already processing {}", requested, active);
                    return Err(IngestError::Busy { active });
                }
                Effect::StartEpisode { episode, .. } => opened = Some(episode),
                Effect::Publish(_) => {}
            }
        }
        let Some(episode) = opened else {
            return Err(IngestError::Busy { active: label });
        };

        let cancel = CancellationToken::new();
        *self.lock_cancel() = Some((episode, cancel.clone()));
        ingest_info!("Episode {} started for {} ({:?})", episode, label, root);
        Ok(ContainerEpisode {
            guard: EpisodeGuard {
                coordinator: self.clone(),
                episode,
                label,
                cancel,
                armed: true,
            },
            root,
        })
    }

    /// Extracts a folder or archive into one text bundle.
    pub async fn ingest_container(
        self: &Arc<Self>,
        root: impl Into<PathBuf>,
        label: impl Into<String>,
    ) -> Result<ContainerOutcome, IngestError> {
        self.begin_container(root, label)?.run().await
    }

    /// Asks the active episode to stop. Returns `false` when nothing is running.
    pub fn cancel_container(&self) -> bool {
        match self.lock_cancel().as_ref() {
            Some((episode, token)) => {
                ingest_info!("Cancelling episode {}", episode);
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drops bookkeeping for `id`; a thumbnail not yet claimed for delivery is discarded.
    pub fn remove(&self, id: AttachmentId) -> bool {
        let removed = self.registry.remove(id);
        ingest_debug!("Removed {} (known: {})", id, removed);
        removed
    }

    pub async fn ingest_payload(
        self: &Arc<Self>,
        payload: InputPayload,
    ) -> Result<Routed, IngestError> {
        match payload {
            InputPayload::Image(image) => self
                .ingest_simple(SimpleInput::Image(image))
                .map(Routed::Attachment),
            InputPayload::Screenshot(image) => self
                .ingest_simple(SimpleInput::Screenshot(image))
                .map(Routed::Attachment),
            InputPayload::File(path) => self
                .ingest_simple(SimpleInput::File(path))
                .map(Routed::Attachment),
            InputPayload::Folder(path) | InputPayload::Archive(path) => {
                let label = container_label(&path);
                self.ingest_container(path, label)
                    .await
                    .map(Routed::Container)
            }
        }
    }

    /// Resolves `source` and routes each payload in order. One failed payload does not stop the rest.
    pub async fn ingest_from_source(self: &Arc<Self>, source: &dyn InputSource) -> SourceOutcome {
        match source.resolve().await {
            SourceResolution::Cancelled => {
                ingest_debug!("Input source cancelled by user");
                SourceOutcome::UserCancelled
            }
            SourceResolution::Payloads(payloads) => {
                let mut results = Vec::with_capacity(payloads.len());
                for payload in payloads {
                    results.push(self.ingest_payload(payload).await);
                }
                SourceOutcome::Routed(results)
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cancel(&self) -> MutexGuard<'_, Option<(EpisodeId, CancellationToken)>> {
        self.active_cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, msg: Msg) -> Vec<Effect> {
        let effects = {
            let mut guard = self.lock_state();
            let state = std::mem::take(&mut *guard);
            let (state, effects) = update(state, msg);
            *guard = state;
            for effect in &effects {
                if let Effect::Publish(processing) = effect {
                    self.state_tx.send_replace(processing.clone());
                }
            }
            effects
        };
        // Sink callbacks run unlocked so they may call back into the coordinator.
        for effect in &effects {
            if let Effect::Publish(processing) = effect {
                self.sink.on_progress(processing);
            }
        }
        effects
    }

    fn clear_cancel(&self, episode: EpisodeId) {
        let mut slot = self.lock_cancel();
        if matches!(slot.as_ref(), Some((active, _)) if *active == episode) {
            *slot = None;
        }
    }

    fn emit_bundle(&self, text: ExtractedText, label: &str) -> ContainerOutcome {
        let attachment = self
            .factory
            .text_bundle(text.content, label, text.item_count);
        self.registry.register(attachment.id());
        self.sink.on_attachment_ready(attachment.clone());
        ContainerOutcome {
            attachment,
            skipped: text.skipped,
        }
    }
}

/// An accepted container ingestion, ready to run.
pub struct ContainerEpisode {
    guard: EpisodeGuard,
    root: PathBuf,
}

impl ContainerEpisode {
    pub fn episode(&self) -> EpisodeId {
        self.guard.episode
    }

    pub fn label(&self) -> &str {
        &self.guard.label
    }

    pub async fn run(self) -> Result<ContainerOutcome, IngestError> {
        let ContainerEpisode { mut guard, root } = self;
        let coordinator = guard.coordinator.clone();
        let progress = EpisodeProgress {
            coordinator: &coordinator,
            episode: guard.episode,
        };

        let result = coordinator
            .engine
            .extract(&root, &progress, &guard.cancel)
            .await
            .map(|text| coordinator.emit_bundle(text, &guard.label));

        let outcome = match &result {
            Ok(_) => EpisodeOutcome::Completed,
            Err(IngestError::Cancelled) => EpisodeOutcome::Cancelled,
            Err(_) => EpisodeOutcome::Failed,
        };
        match &result {
            Ok(done) => ingest_info!(
                "Episode {} finished: {} items, {} skipped",
                guard.episode,
                done.attachment.title(),
                done.skipped.len()
            ),
            Err(err) => ingest_warn!("Episode {} for {} ended: {}", guard.episode, guard.label, err),
        }
        guard.finish(outcome, &result);
        result
    }
}

/// Returns the pipeline to idle exactly once, even if the episode is dropped mid-run.
struct EpisodeGuard {
    coordinator: Arc<IngestionCoordinator>,
    episode: EpisodeId,
    label: String,
    cancel: CancellationToken,
    armed: bool,
}

impl EpisodeGuard {
    fn finish(&mut self, outcome: EpisodeOutcome, result: &Result<ContainerOutcome, IngestError>) {
        if !self.armed {
            return;
        }
        self.armed = false;
        self.coordinator.clear_cancel(self.episode);
        self.coordinator.apply(Msg::EpisodeEnded {
            episode: self.episode,
            outcome,
        });
        self.coordinator
            .sink
            .on_container_finished(&self.label, result);
    }
}

impl Drop for EpisodeGuard {
    fn drop(&mut self) {
        if self.armed {
            self.cancel.cancel();
            self.finish(EpisodeOutcome::Cancelled, &Err(IngestError::Cancelled));
        }
    }
}

struct EpisodeProgress<'a> {
    coordinator: &'a IngestionCoordinator,
    episode: EpisodeId,
}

impl ProgressSink for EpisodeProgress<'_> {
    fn emit(&self, event: ExtractionEvent) {
        let msg = match event {
            ExtractionEvent::Enumerated { total } => Msg::ContainerEnumerated {
                episode: self.episode,
                total,
            },
            ExtractionEvent::ItemFinished { .. } => Msg::ItemFinished {
                episode: self.episode,
            },
        };
        self.coordinator.apply(msg);
    }
}
