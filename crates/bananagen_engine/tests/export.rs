use std::fs;

use bananagen_core::Entry;
use bananagen_engine::{ensure_output_dir, export_image_entry, AtomicFileWriter, ExportError};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::TempDir;

fn image_entry(image_ref: &str) -> Entry {
    let source = Entry::text_prompt(3, "Ford at dusk", "  Riders at the ford.  ");
    Entry::image_from(12, &source, image_ref, None)
}

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("a.png", b"one").unwrap();
    assert_eq!(first.file_name().unwrap(), "a.png");
    let second = writer.write("a.png", b"two").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"two");
}

#[test]
fn inline_image_is_written_with_post_record() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().join("posts"));

    let summary =
        export_image_entry(&image_entry("data:image/png;base64,AQID"), &writer, 1_700_000_000_000)
            .unwrap();

    let image_path = summary.image_path.unwrap();
    assert_eq!(image_path.file_name().unwrap(), "12-Ford_at_dusk.png");
    assert_eq!(fs::read(&image_path).unwrap(), vec![1u8, 2, 3]);

    assert_eq!(summary.record_path.file_name().unwrap(), "12-Ford_at_dusk.json");
    let record: Value = serde_json::from_slice(&fs::read(&summary.record_path).unwrap()).unwrap();
    assert_eq!(record["name"], "Narrator");
    assert_eq!(record["mes"], "Riders at the ford.");
    assert_eq!(record["send_date"], 1_700_000_000_000i64);
    assert_eq!(record["extra"]["image"], "12-Ford_at_dusk.png");
    assert_eq!(record["extra"]["inline_image"], true);
}

#[test]
fn remote_image_is_referenced_not_downloaded() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let summary = export_image_entry(&image_entry("https://cdn/x.png"), &writer, 5).unwrap();
    assert!(summary.image_path.is_none());
    let record: Value = serde_json::from_slice(&fs::read(&summary.record_path).unwrap()).unwrap();
    assert_eq!(record["extra"]["image"], "https://cdn/x.png");
}

#[test]
fn text_entries_and_bad_data_are_rejected() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let text = Entry::text_prompt(1, "t", "b");
    assert!(matches!(
        export_image_entry(&text, &writer, 0),
        Err(ExportError::NotAnImage)
    ));
    assert!(matches!(
        export_image_entry(&image_entry("data:image/png,raw"), &writer, 0),
        Err(ExportError::MalformedDataUrl(_))
    ));
    assert!(matches!(
        export_image_entry(&image_entry("data:image/png;base64,@@@"), &writer, 0),
        Err(ExportError::Decode(_))
    ));
}
