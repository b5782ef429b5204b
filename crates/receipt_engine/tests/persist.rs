use std::fs;
use std::path::Path;

use receipt_engine::{ensure_output_dir, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("qr");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_svg() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("receipt.svg", "<svg/>").unwrap();
    assert_eq!(first.file_name().unwrap(), "receipt.svg");
    assert_eq!(fs::read_to_string(&first).unwrap(), "<svg/>");

    let second = writer.write("receipt.svg", b"<svg></svg>").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "<svg></svg>");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("receipt.svg", "data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("receipt.svg").exists());
}

#[test]
fn writer_for_bare_filename_uses_current_dir() {
    let (_, filename) = AtomicFileWriter::for_path(Path::new("receipt.svg")).unwrap();
    assert_eq!(filename, "receipt.svg");

    let temp = TempDir::new().unwrap();
    let target = temp.path().join("nested").join("config.ron");
    let (writer, filename) = AtomicFileWriter::for_path(&target).unwrap();
    assert_eq!(writer.write(&filename, "()").unwrap(), target);
}
