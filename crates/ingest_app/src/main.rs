mod config;
mod logging;
mod report;

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

use anyhow::Context;
use clap::Parser;
use ingest_core::Attachment;
use ingest_engine::{
    classify_path, container_label, ChannelSink, ContainerOutcome, IngestError, IngestEvent,
    IngestHandle, IngestionCoordinator, InputPayload, ScalingRenderer, SimpleInput,
};
use ingest_logging::{ingest_debug, ingest_error, ingest_info, ingest_trace};

use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};
use crate::logging::LogDestination;
use crate::report::AttachmentReport;

/// Turn files, folders and zip archives into chat attachments.
#[derive(Parser)]
#[command(name = "ingest", version)]
struct Cli {
    /// Files, folders or .zip archives, processed in order
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,

    /// RON settings file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Label for folder and archive bundles instead of their file name
    #[arg(short, long)]
    label: Option<String>,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    log: LogDestination,

    /// Print one JSON object per attachment
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;
    logging::initialize(cli.log, config.level_filter()?);

    let (event_tx, event_rx) = mpsc::channel();
    let coordinator = IngestionCoordinator::new(
        config.to_settings(),
        Arc::new(ScalingRenderer::default()),
        Arc::new(ChannelSink::new(event_tx)),
    );
    let handle = IngestHandle::new(coordinator).context("failed to start ingest runtime")?;
    let mut session = Session {
        handle,
        events: event_rx,
        json: cli.json,
        failures: 0,
    };

    for path in &cli.paths {
        if let Err(err) = session.submit(path, cli.label.as_deref()) {
            ingest_error!("{}", err);
            eprintln!("error: {err}");
            session.failures += 1;
        }
    }
    session.flush();

    let total = cli.paths.len();
    anyhow::ensure!(
        session.failures == 0,
        "{} of {} inputs could not be ingested",
        session.failures,
        total
    );
    Ok(())
}

/// Drives the handle and prints whatever the sink delivers, in delivery order.
struct Session {
    handle: IngestHandle,
    events: mpsc::Receiver<IngestEvent>,
    json: bool,
    failures: usize,
}

impl Session {
    fn submit(&mut self, path: &Path, label: Option<&str>) -> Result<(), IngestError> {
        match classify_path(path) {
            InputPayload::Folder(root) | InputPayload::Archive(root) => {
                let label = label
                    .map(str::to_string)
                    .unwrap_or_else(|| container_label(&root));
                let episode = self.handle.ingest_container(root, label)?;
                ingest_debug!("Waiting for episode {}", episode);
                self.wait_for_container()
            }
            InputPayload::File(file) => {
                self.handle.ingest_simple(SimpleInput::File(file))?;
                self.flush();
                Ok(())
            }
            InputPayload::Image(image) => {
                self.handle.ingest_simple(SimpleInput::Image(image))?;
                self.flush();
                Ok(())
            }
            InputPayload::Screenshot(image) => {
                self.handle.ingest_simple(SimpleInput::Screenshot(image))?;
                self.flush();
                Ok(())
            }
        }
    }

    fn wait_for_container(&mut self) -> Result<(), IngestError> {
        while let Ok(event) = self.events.recv() {
            if let IngestEvent::ContainerFinished { label, result } = event {
                ingest_info!("{}: {}", label, self.handle.view().status_line);
                return self.print_container(result);
            }
            self.handle_event(event);
        }
        Err(IngestError::Cancelled)
    }

    fn flush(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            if let IngestEvent::ContainerFinished { result, .. } = event {
                if self.print_container(result).is_err() {
                    self.failures += 1;
                }
                continue;
            }
            self.handle_event(event);
        }
    }

    fn handle_event(&self, event: IngestEvent) {
        match event {
            IngestEvent::AttachmentReady(attachment) => {
                // Bundles are printed with their skip list once the episode finishes.
                if !matches!(attachment, Attachment::TextBundle(_)) {
                    println!("{}", AttachmentReport::new(&attachment, &[]).render(self.json));
                }
            }
            IngestEvent::Progress(state) => {
                if let Some(percent) = state.percent() {
                    ingest_trace!("{} {}%", state.label().unwrap_or_default(), percent);
                }
            }
            IngestEvent::ThumbnailReady { id, thumbnail } => {
                ingest_debug!(
                    "Thumbnail for {}: {}x{}",
                    id,
                    thumbnail.width(),
                    thumbnail.height()
                );
            }
            IngestEvent::ContainerFinished { .. } => {}
        }
    }

    fn print_container(
        &self,
        result: Result<ContainerOutcome, IngestError>,
    ) -> Result<(), IngestError> {
        let outcome = result?;
        let report = AttachmentReport::new(&outcome.attachment, &outcome.skipped);
        println!("{}", report.render(self.json));
        Ok(())
    }
}
