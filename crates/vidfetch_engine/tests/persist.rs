use std::fs;

use tempfile::TempDir;
use vidfetch_engine::{ensure_output_dir, AtomicFileWriter};

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("downloads");
    ensure_output_dir(&out).unwrap();
    assert!(out.is_dir());
}

#[test]
fn commit_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let existing = temp.path().join("clip.mp4");
    fs::write(&existing, b"old video").unwrap();

    let writer = AtomicFileWriter::new(temp.path().to_path_buf());
    let mut staged = writer.begin("clip.mp4").unwrap();
    staged.write_chunk(b"new ").unwrap();
    staged.write_chunk(b"video").unwrap();
    // The earlier result stays readable until the rename.
    assert_eq!(fs::read(&existing).unwrap(), b"old video");

    let path = staged.commit().unwrap();
    assert_eq!(path, existing);
    assert_eq!(fs::read(&path).unwrap(), b"new video");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn dropped_stage_leaves_existing_file_alone() {
    let temp = TempDir::new().unwrap();
    let existing = temp.path().join("clip.mp4");
    fs::write(&existing, b"old video").unwrap();

    let writer = AtomicFileWriter::new(temp.path().to_path_buf());
    let mut staged = writer.begin("clip.mp4").unwrap();
    staged.write_chunk(b"partial").unwrap();
    drop(staged);

    assert_eq!(fs::read(&existing).unwrap(), b"old video");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn output_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let not_a_dir = temp.path().join("not_a_dir");
    fs::write(&not_a_dir, "x").unwrap();

    let writer = AtomicFileWriter::new(not_a_dir.clone());
    assert!(writer.begin("clip.mp4").is_err());
}
