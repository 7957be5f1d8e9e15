use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use ingest_core::{Attachment, AttachmentFactory, AttachmentKind, RawImage};
use pretty_assertions::assert_eq;

fn pixel_image(width: u32, height: u32) -> Arc<RawImage> {
    let pixels = vec![255u8; (width * height * 4) as usize];
    Arc::new(RawImage::from_rgba(width, height, pixels).unwrap())
}

#[test]
fn factory_issues_unique_ids_in_call_order() {
    let factory = AttachmentFactory::new();
    let a = factory.image(pixel_image(1, 1));
    let b = factory.file("/tmp/report.pdf", Some(42));
    let c = factory.screenshot(pixel_image(2, 2));

    let ids: Vec<u64> = [&a, &b, &c].iter().map(|att| att.id().get()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn ids_stay_unique_across_threads() {
    let factory = Arc::new(AttachmentFactory::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let factory = factory.clone();
            std::thread::spawn(move || {
                (0..250)
                    .map(|i| factory.file(format!("/tmp/{i}.txt"), None).id())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "duplicate id {id}");
        }
    }
    assert_eq!(seen.len(), 1000);
}

#[test]
fn file_accessors_describe_the_path() {
    let factory = AttachmentFactory::new();
    let clip = factory.file("/home/me/Movies/clip.mov", Some(2048));
    assert_eq!(clip.kind(), AttachmentKind::File);
    assert_eq!(clip.title(), "clip.mov");
    assert!(clip.is_video());
    assert_eq!(clip.byte_size(), Some(2048));

    let notes = factory.file("/home/me/notes.md", None);
    assert!(!notes.is_video());
    assert_eq!(notes.byte_size(), None);
    match notes {
        Attachment::File(file) => assert_eq!(file.path(), Path::new("/home/me/notes.md")),
        other => panic!("unexpected variant {other:?}"),
    }
}

#[test]
fn text_bundle_title_and_fingerprint() {
    let factory = AttachmentFactory::new();
    let one = factory.text_bundle("===== a.txt =====\nhello\n".into(), "docs", 1);
    let same = factory.text_bundle("===== a.txt =====\nhello\n".into(), "docs", 1);
    let three = factory.text_bundle("other".into(), "notes.zip", 3);

    assert_eq!(one.title(), "docs (1 file)");
    assert_eq!(three.title(), "notes.zip (3 files)");
    assert_eq!(three.item_count(), Some(3));
    assert_eq!(factory.file("/tmp/a.txt", None).item_count(), None);
    assert_eq!(factory.image(pixel_image(1, 1)).item_count(), None);
    assert_ne!(one.id(), same.id());

    let (Attachment::TextBundle(a), Attachment::TextBundle(b)) = (&one, &same) else {
        panic!("expected text bundles");
    };
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.fingerprint().len(), 16);
    assert_eq!(one.byte_size(), Some(a.content().len() as u64));
}

#[test]
fn with_thumbnail_returns_new_value_and_keeps_id() {
    let factory = AttachmentFactory::new();
    let image = factory.image(pixel_image(4, 4));
    assert!(image.thumbnail().is_none());
    assert_eq!(image.byte_size(), Some(64));

    let thumb = pixel_image(1, 1);
    let enriched = image.clone().with_thumbnail(thumb.clone());
    assert_eq!(enriched.id(), image.id());
    assert_eq!(enriched.thumbnail(), Some(&thumb));
    assert!(image.thumbnail().is_none());

    let file = factory.file("/tmp/a.txt", None);
    let unchanged = file.clone().with_thumbnail(thumb);
    assert_eq!(unchanged, file);
}
