use std::fs;

use bookgrab_engine::{ensure_output_dir, write_atomic};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("books").join("2024");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("book.pdf");

    let first = write_atomic(&target, b"%PDF-1 first").unwrap();
    assert_eq!(first, target);
    assert_eq!(fs::read(&target).unwrap(), b"%PDF-1 first");

    write_atomic(&target, b"%PDF-1 second").unwrap();
    assert_eq!(fs::read(&target).unwrap(), b"%PDF-1 second");
    // Only the target remains; the temp file was renamed.
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn no_partial_file_when_directory_is_a_file() {
    let temp = TempDir::new().unwrap();
    let not_a_dir = temp.path().join("not_a_dir");
    fs::write(&not_a_dir, "x").unwrap();

    let result = write_atomic(&not_a_dir.join("book.pdf"), b"data");
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&not_a_dir).unwrap(), "x");
}
