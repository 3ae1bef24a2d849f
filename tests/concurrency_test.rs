//! Concurrent Append Tests
//!
//! Several writers hammer the same store; the exclusive lock must
//! serialize them into a single valid chain.

use std::collections::HashSet;
use std::thread;

use gallery_log::audit::{codec, verify_lines};
use gallery_log::validation::validate_entry;
use gallery_log::{GalleryLog, IntegrityKey};
use tempfile::tempdir;

const WRITERS: usize = 8;
const APPENDS_PER_WRITER: usize = 12;

#[test]
fn test_concurrent_appends_form_one_chain() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("gallery.log");
    let key = IntegrityKey::new("K").unwrap();

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let log = GalleryLog::new(&path);
            let key = key.clone();
            thread::spawn(move || {
                for i in 0..APPENDS_PER_WRITER {
                    let action = if i % 2 == 0 { "enter" } else { "exit" };
                    let fields = validate_entry(
                        &format!("guard{}", writer),
                        action,
                        "GalleryA",
                        &format!("2025-10-30T12:{:02}:00Z", i),
                    )
                    .unwrap();
                    log.append(&fields, &key).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let lines = GalleryLog::new(&path).read_lines().unwrap();
    assert_eq!(lines.len(), WRITERS * APPENDS_PER_WRITER);

    let report = verify_lines(&lines, &key);
    assert!(report.is_valid(), "{}", report.summary());

    // No two entries may link to the same predecessor.
    let prevs: HashSet<&str> = lines
        .iter()
        .map(|l| codec::extract_field(l, codec::FIELD_PREV).unwrap())
        .collect();
    assert_eq!(prevs.len(), lines.len());
}

#[test]
fn test_readers_see_whole_lines_during_writes() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("gallery.log");
    let key = IntegrityKey::new("K").unwrap();

    let writer = {
        let log = GalleryLog::new(&path);
        let key = key.clone();
        thread::spawn(move || {
            for i in 0..40 {
                let fields = validate_entry(
                    "guard1",
                    if i % 2 == 0 { "enter" } else { "exit" },
                    "GalleryB",
                    "2025-10-30T12:00:00Z",
                )
                .unwrap();
                log.append(&fields, &key).unwrap();
            }
        })
    };

    let reader = GalleryLog::new(&path);
    for _ in 0..40 {
        let lines = reader.read_lines().unwrap();
        assert!(verify_lines(&lines, &key).is_valid());
    }

    writer.join().unwrap();
    assert_eq!(reader.read_lines().unwrap().len(), 40);
}
