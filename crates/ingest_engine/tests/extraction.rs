use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, Once};

use ingest_engine::{
    materialize_archive, ExtractionEngine, ExtractionEvent, ExtractionSettings, IngestError,
    ProgressSink,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ingest_logging::initialize_for_tests);
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<ExtractionEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<ExtractionEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ExtractionEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn write(root: &Path, relative: &str, bytes: &[u8]) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}

/// Three text files of 10, 20 and 30 bytes plus one binary file.
fn mixed_folder() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", b"0123456789");
    write(dir.path(), "b.txt", b"abcdefghijklmnopqrst");
    write(dir.path(), "c.txt", b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123");
    write(dir.path(), "d.dat", &[0x00, 0x01, 0x02, 0xFF, 0x00, 0x10]);
    dir
}

async fn extract(
    engine: &ExtractionEngine,
    root: &Path,
) -> (Result<ingest_engine::ExtractedText, IngestError>, Vec<ExtractionEvent>) {
    let sink = RecordingSink::default();
    let result = engine.extract(root, &sink, &CancellationToken::new()).await;
    (result, sink.events())
}

#[tokio::test]
async fn folder_is_merged_in_order_and_binary_files_are_skipped() {
    init_logging();
    let dir = mixed_folder();
    let (result, events) = extract(&ExtractionEngine::default(), dir.path()).await;
    let text = result.unwrap();

    assert_eq!(text.item_count, 3);
    assert_eq!(
        text.content,
        "===== a.txt =====\n0123456789\n\n\
         ===== b.txt =====\nabcdefghijklmnopqrst\n\n\
         ===== c.txt =====\nABCDEFGHIJKLMNOPQRSTUVWXYZ0123\n"
    );
    assert_eq!(text.skipped.len(), 1);
    assert_eq!(text.skipped[0].relative_path, "d.dat");
    assert!(matches!(
        text.skipped[0].error,
        IngestError::FileDecodeFailed { .. }
    ));

    let mut expected = vec![ExtractionEvent::Enumerated { total: 4 }];
    expected.extend((1..=4).map(|completed| ExtractionEvent::ItemFinished {
        completed,
        total: 4,
    }));
    assert_eq!(events, expected);
}

#[tokio::test]
async fn output_is_identical_across_runs_and_worker_counts() {
    init_logging();
    let dir = TempDir::new().unwrap();
    for index in 0..40 {
        let body = format!("file {index}\n").repeat(index + 1);
        write(dir.path(), &format!("nested/{:02}/notes.md", index % 7), body.as_bytes());
        write(dir.path(), &format!("top-{index:02}.txt"), body.as_bytes());
    }

    let single = ExtractionEngine::new(ExtractionSettings {
        max_workers: 1,
        ..ExtractionSettings::default()
    });
    let parallel = ExtractionEngine::new(ExtractionSettings {
        max_workers: 16,
        ..ExtractionSettings::default()
    });

    let (first, _) = extract(&parallel, dir.path()).await;
    let (second, _) = extract(&parallel, dir.path()).await;
    let (serial, _) = extract(&single, dir.path()).await;
    let first = first.unwrap();

    assert_eq!(first, second.unwrap());
    assert_eq!(first, serial.unwrap());
}

#[tokio::test]
async fn nested_paths_and_hidden_entries() {
    init_logging();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/main.rs", b"fn main() {}\n");
    write(dir.path(), "README.md", b"# Title\r\n\r\n");
    write(dir.path(), ".git/config", b"[core]\n");
    write(dir.path(), "logo.png", b"not really a png");

    let (result, _) = extract(&ExtractionEngine::default(), dir.path()).await;
    let text = result.unwrap();

    assert_eq!(text.item_count, 2);
    assert_eq!(
        text.content,
        "===== README.md =====\n# Title\n\n===== src/main.rs =====\nfn main() {}\n"
    );
    assert!(text.skipped.is_empty());
}

#[tokio::test]
async fn empty_folder_is_unreadable() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let (result, events) = extract(&ExtractionEngine::default(), dir.path()).await;

    assert!(matches!(result, Err(IngestError::InputUnreadable { .. })));
    assert!(events.is_empty());
}

#[tokio::test]
async fn folder_without_any_text_is_unreadable() {
    init_logging();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "one.dat", &[0, 1, 2]);
    write(dir.path(), "two.dat", &[3, 0, 4]);

    let (result, events) = extract(&ExtractionEngine::default(), dir.path()).await;

    assert!(matches!(result, Err(IngestError::InputUnreadable { .. })));
    assert_eq!(events.len(), 3);
}

#[tokio::test]
async fn missing_root_is_unreadable() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("gone");
    let (result, _) = extract(&ExtractionEngine::default(), &missing).await;

    match result {
        Err(IngestError::InputUnreadable { path, .. }) => assert_eq!(path, missing),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn oversized_files_are_filtered_before_reading() {
    init_logging();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "small.txt", b"tiny");
    write(dir.path(), "large.txt", &[b'x'; 64]);
    let engine = ExtractionEngine::new(ExtractionSettings {
        max_file_bytes: 16,
        ..ExtractionSettings::default()
    });

    let (result, events) = extract(&engine, dir.path()).await;
    let text = result.unwrap();

    assert_eq!(text.item_count, 1);
    assert_eq!(events[0], ExtractionEvent::Enumerated { total: 1 });
}

#[tokio::test]
async fn zip_archives_are_unpacked_and_merged() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let archive_path = dir.path().join("bundle.zip");
    {
        let file = File::create(&archive_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("docs/guide.md", options).unwrap();
        writer.write_all(b"Guide\n").unwrap();
        writer.start_file("__MACOSX/docs/._guide.md", options).unwrap();
        writer.write_all(&[0, 5, 22, 7]).unwrap();
        writer.start_file("notes.txt", options).unwrap();
        writer.write_all(b"Notes\n").unwrap();
        writer.finish().unwrap();
    }

    let (result, events) = extract(&ExtractionEngine::default(), &archive_path).await;
    let text = result.unwrap();

    assert_eq!(text.item_count, 2);
    assert_eq!(
        text.content,
        "===== docs/guide.md =====\nGuide\n\n===== notes.txt =====\nNotes\n"
    );
    assert_eq!(events.len(), 3);
}

/// A zip holding one readable note next to entries every filter should drop.
fn filtered_zip(dir: &Path) -> std::path::PathBuf {
    let archive_path = dir.join("upload.zip");
    let file = File::create(&archive_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("media/huge.mp4", options).unwrap();
    writer.write_all(&[7u8; 4096]).unwrap();
    writer.start_file("big.txt", options).unwrap();
    writer.write_all(&[b'b'; 512]).unwrap();
    writer.start_file("__MACOSX/._note.txt", options).unwrap();
    writer.write_all(&[0, 5, 22, 7]).unwrap();
    writer.start_file(".cache/state.txt", options).unwrap();
    writer.write_all(b"cached").unwrap();
    writer.start_file("note.txt", options).unwrap();
    writer.write_all(b"Keep me\n").unwrap();
    writer.finish().unwrap();
    archive_path
}

#[test]
fn archive_entries_are_filtered_before_they_are_written() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let archive_path = filtered_zip(dir.path());
    let settings = ExtractionSettings {
        max_file_bytes: 64,
        ..ExtractionSettings::default()
    };

    let archive = materialize_archive(&archive_path, &settings).unwrap();

    let written: Vec<_> = fs::read_dir(archive.root())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(written, vec!["note.txt".to_string()]);
    assert_eq!(archive.filtered(), 4);
    assert_eq!(fs::read(archive.root().join("note.txt")).unwrap(), b"Keep me\n");

    let scratch = archive.root().to_path_buf();
    drop(archive);
    assert!(!scratch.exists());
}

#[tokio::test]
async fn filtered_archive_extracts_only_the_kept_entries() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let archive_path = filtered_zip(dir.path());
    let engine = ExtractionEngine::new(ExtractionSettings {
        max_file_bytes: 64,
        ..ExtractionSettings::default()
    });

    let (result, events) = extract(&engine, &archive_path).await;
    let text = result.unwrap();

    assert_eq!(text.item_count, 1);
    assert_eq!(text.content, "===== note.txt =====\nKeep me\n");
    assert!(text.skipped.is_empty());
    assert_eq!(events[0], ExtractionEvent::Enumerated { total: 1 });
}

#[tokio::test]
async fn corrupt_archive_is_unreadable() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let archive_path = dir.path().join("broken.zip");
    fs::write(&archive_path, b"definitely not a zip").unwrap();

    let (result, events) = extract(&ExtractionEngine::default(), &archive_path).await;

    assert!(matches!(result, Err(IngestError::InputUnreadable { .. })));
    assert!(events.is_empty());
}

#[tokio::test]
async fn cancelled_extraction_reports_cancelled() {
    init_logging();
    let dir = mixed_folder();
    let sink = RecordingSink::default();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = ExtractionEngine::default()
        .extract(dir.path(), &sink, &cancel)
        .await;

    assert_eq!(result, Err(IngestError::Cancelled));
    assert_eq!(sink.events(), vec![ExtractionEvent::Enumerated { total: 4 }]);
}
