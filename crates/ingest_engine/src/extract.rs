use std::fs;
use std::path::Path;
use std::sync::Arc;

use ingest_logging::{ingest_debug, ingest_info, ingest_trace};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::archive::{is_archive_path, materialize_archive, MaterializedArchive};
use crate::decode::decode_text;
use crate::enumerate::{enumerate_sources, Enumeration, SourceFile};
use crate::{ExtractedText, ExtractionEvent, ExtractionSettings, IngestError, SkippedFile};

/// Bytes added around each file's text by the section header and separators.
const SECTION_OVERHEAD: usize = "===== ".len() + " =====\n".len() + 2;

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ExtractionEvent);
}

type FileOutcome = Result<String, IngestError>;

/// Parallel reader and merger for folder and archive inputs.
///
/// Every file gets its own reader task; a semaphore sized by
/// [`ExtractionSettings::worker_count`] bounds how many read at once. Readers report
/// `(enumeration index, outcome)` pairs over a single completion channel. The
/// collector drops each outcome into its slot and only merges once every slot is
/// filled, so output order never depends on completion order.
#[derive(Debug, Clone, Default)]
pub struct ExtractionEngine {
    settings: ExtractionSettings,
}

impl ExtractionEngine {
    pub fn new(settings: ExtractionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Reads every text file under `root` (a directory or a `.zip` archive) into one merged text.
    ///
    /// Emits [`ExtractionEvent::Enumerated`] once, then one
    /// [`ExtractionEvent::ItemFinished`] per enumerated file. Once `cancel` fires no
    /// new file is started; files already being read are allowed to finish.
    pub async fn extract(
        &self,
        root: &Path,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExtractedText, IngestError> {
        let settings = self.settings.clone();
        let owned_root = root.to_path_buf();
        let (scratch, enumeration) =
            tokio::task::spawn_blocking(move || prepare_root(&owned_root, &settings))
                .await
                .map_err(|err| IngestError::unreadable(root, format!("enumeration task: {err}")))??;

        if enumeration.files.is_empty() {
            return Err(IngestError::unreadable(root, "no text files found"));
        }
        let total = enumeration.files.len();
        ingest_info!(
            "Extracting {} files ({} bytes, {} filtered) from {:?}",
            total,
            enumeration.estimated_bytes,
            enumeration.filtered,
            root
        );
        sink.emit(ExtractionEvent::Enumerated { total });

        let files: Arc<[SourceFile]> = enumeration.files.into();
        let slots = self.read_all(files.clone(), sink, cancel).await;
        // Workers are done with the scratch tree.
        drop(scratch);

        let completed = slots.iter().filter(|slot| slot.is_some()).count();
        if completed < total {
            if cancel.is_cancelled() {
                ingest_info!("Extraction of {:?} cancelled after {}/{}", root, completed, total);
                return Err(IngestError::Cancelled);
            }
            return Err(IngestError::unreadable(
                root,
                format!("readers stopped after {completed} of {total} files"),
            ));
        }

        let merged = merge_slots(&files, slots, enumeration.estimated_bytes);
        if merged.item_count == 0 {
            return Err(IngestError::unreadable(
                root,
                format!("none of the {total} files could be read as text"),
            ));
        }
        Ok(merged)
    }

    async fn read_all(
        &self,
        files: Arc<[SourceFile]>,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Vec<Option<FileOutcome>> {
        let total = files.len();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let permits = Arc::new(Semaphore::new(self.settings.worker_count(total)));
        let mut readers = JoinSet::new();
        for index in 0..total {
            readers.spawn(read_one(
                index,
                files.clone(),
                permits.clone(),
                done_tx.clone(),
                cancel.clone(),
                self.settings.max_file_bytes,
            ));
        }
        drop(done_tx);

        let mut slots: Vec<Option<FileOutcome>> = (0..total).map(|_| None).collect();
        let mut completed = 0;
        while let Some((index, outcome)) = done_rx.recv().await {
            let Some(slot) = slots.get_mut(index) else {
                continue;
            };
            if slot.replace(outcome).is_none() {
                completed += 1;
                sink.emit(ExtractionEvent::ItemFinished { completed, total });
            }
        }

        while let Some(joined) = readers.join_next().await {
            if let Err(err) = joined {
                ingest_debug!("Reader task ended abnormally: {}", err);
            }
        }
        slots
    }
}

fn prepare_root(
    root: &Path,
    settings: &ExtractionSettings,
) -> Result<(Option<MaterializedArchive>, Enumeration), IngestError> {
    let meta = fs::metadata(root).map_err(|err| IngestError::unreadable(root, err))?;
    if meta.is_dir() {
        return Ok((None, enumerate_sources(root, settings)?));
    }
    if meta.is_file() && is_archive_path(root) {
        let archive = materialize_archive(root, settings)?;
        let mut enumeration = enumerate_sources(archive.root(), settings)?;
        enumeration.filtered += archive.filtered();
        return Ok((Some(archive), enumeration));
    }
    Err(IngestError::unreadable(root, "not a folder or supported archive"))
}

/// Reads file `index` once a permit is free, unless cancellation arrived first.
async fn read_one(
    index: usize,
    files: Arc<[SourceFile]>,
    permits: Arc<Semaphore>,
    done_tx: mpsc::UnboundedSender<(usize, FileOutcome)>,
    cancel: CancellationToken,
    max_file_bytes: u64,
) {
    let Ok(_permit) = permits.acquire_owned().await else {
        return;
    };
    if cancel.is_cancelled() {
        ingest_trace!("Reader for file {} cancelled before start", index);
        return;
    }
    let Some(file) = files.get(index).cloned() else {
        return;
    };

    let path = file.path.clone();
    let outcome = tokio::task::spawn_blocking(move || read_source(&file, max_file_bytes))
        .await
        .unwrap_or_else(|err| Err(IngestError::decode_failed(&path, err)));
    let _ = done_tx.send((index, outcome));
}

fn read_source(file: &SourceFile, max_file_bytes: u64) -> FileOutcome {
    let bytes = fs::read(&file.path).map_err(|err| IngestError::decode_failed(&file.path, err))?;
    if bytes.len() as u64 > max_file_bytes {
        return Err(IngestError::decode_failed(
            &file.path,
            format!("grew to {} bytes, limit is {max_file_bytes}", bytes.len()),
        ));
    }
    decode_text(&bytes)
        .map(|decoded| decoded.text)
        .map_err(|err| IngestError::decode_failed(&file.path, err))
}

fn merge_slots(
    files: &[SourceFile],
    slots: Vec<Option<FileOutcome>>,
    estimated_bytes: u64,
) -> ExtractedText {
    let header_bytes: usize = files
        .iter()
        .map(|file| file.relative_path.len() + SECTION_OVERHEAD)
        .sum();
    let capacity = usize::try_from(estimated_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(header_bytes);
    let mut content = String::with_capacity(capacity);
    let mut item_count = 0;
    let mut skipped = Vec::new();

    for (file, slot) in files.iter().zip(slots) {
        match slot {
            Some(Ok(text)) => {
                if item_count > 0 {
                    content.push('\n');
                }
                push_section(&mut content, &file.relative_path, &text);
                item_count += 1;
            }
            Some(Err(error)) => {
                ingest_debug!("Skipped {}: {}", file.relative_path, error);
                skipped.push(SkippedFile {
                    relative_path: file.relative_path.clone(),
                    error,
                });
            }
            None => skipped.push(SkippedFile {
                relative_path: file.relative_path.clone(),
                error: IngestError::Cancelled,
            }),
        }
    }

    ExtractedText {
        content,
        item_count,
        skipped,
    }
}

fn push_section(buffer: &mut String, relative_path: &str, text: &str) {
    buffer.push_str("===== ");
    buffer.push_str(relative_path);
    buffer.push_str(" =====\n");
    buffer.push_str(text.trim_end_matches(&['\r', '\n'][..]));
    buffer.push('\n');
}

#[cfg(test)]
mod tests {
    use super::{merge_slots, push_section};
    use crate::enumerate::SourceFile;
    use crate::IngestError;
    use std::path::PathBuf;

    fn source(relative: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from("/root").join(relative),
            relative_path: relative.to_string(),
            byte_len: 4,
        }
    }

    #[test]
    fn section_trims_trailing_newlines_only() {
        let mut buffer = String::new();
        push_section(&mut buffer, "a/b.txt", "  body\n\n");
        assert_eq!(buffer, "===== a/b.txt =====\n  body\n");
    }

    #[test]
    fn merge_follows_enumeration_order_and_counts_successes() {
        let files = vec![source("a.txt"), source("b.dat"), source("c.txt")];
        let slots = vec![
            Some(Ok("first".to_string())),
            Some(Err(IngestError::FileDecodeFailed {
                path: PathBuf::from("/root/b.dat"),
                reason: "content looks binary".into(),
            })),
            Some(Ok("third".to_string())),
        ];

        let merged = merge_slots(&files, slots, 12);
        assert_eq!(
            merged.content,
            "===== a.txt =====\nfirst\n\n===== c.txt =====\nthird\n"
        );
        assert_eq!(merged.item_count, 2);
        assert_eq!(merged.skipped.len(), 1);
        assert_eq!(merged.skipped[0].relative_path, "b.dat");
    }
}
