use std::fs;
use std::sync::{mpsc, Arc, Once};
use std::time::Duration;

use ingest_core::{AttachmentKind, ProcessingState};
use ingest_engine::{ChannelSink, IngestEvent, IngestHandle, IngestionCoordinator, Submitted};
use tempfile::TempDir;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ingest_logging::initialize_for_tests);
}

fn handle() -> (IngestHandle, mpsc::Receiver<IngestEvent>) {
    let (tx, rx) = mpsc::channel();
    let coordinator = IngestionCoordinator::with_defaults(Arc::new(ChannelSink::new(tx)));
    (IngestHandle::new(coordinator).unwrap(), rx)
}

#[test]
fn paths_are_classified_and_folders_run_in_the_background() {
    init_logging();
    let (handle, rx) = handle();
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("notes");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("one.md"), "one").unwrap();
    fs::write(folder.join("two.md"), "two").unwrap();
    let file = dir.path().join("clip.mov");
    fs::write(&file, [0u8; 16]).unwrap();

    let attachment = match handle.ingest_path(&file).unwrap() {
        Submitted::Attachment(attachment) => attachment,
        other => panic!("expected an attachment, got {other:?}"),
    };
    assert_eq!(attachment.kind(), AttachmentKind::File);
    assert!(attachment.is_video());

    assert!(matches!(
        handle.ingest_path(&folder).unwrap(),
        Submitted::Episode(_)
    ));

    let finished = loop {
        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            IngestEvent::ContainerFinished { label, result } => break (label, result),
            _ => continue,
        }
    };
    assert_eq!(finished.0, "notes");
    let outcome = finished.1.unwrap();
    assert_eq!(outcome.attachment.title(), "notes (2 files)");
    assert_eq!(handle.processing_state(), ProcessingState::Idle);
}

#[test]
fn cancel_without_active_episode_is_a_no_op() {
    init_logging();
    let (handle, _rx) = handle();
    assert!(!handle.cancel_container());
    assert!(!handle.view().busy);
}
