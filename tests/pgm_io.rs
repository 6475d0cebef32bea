//! Plain graymap files on disk.

mod common;

use common::textured_image;
use kuwahara_stream::codec::{read_pgm, write_pgm};
use kuwahara_stream::filter::{KuwaharaFilter, VarianceMode, Window};
use kuwahara_stream::KuwaharaError;
use tempfile::tempdir;

#[test]
fn test_write_then_read_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("texture.pgm");
    let image = textured_image(17);

    write_pgm(&path, &image).unwrap();
    assert_eq!(read_pgm(&path).unwrap(), image);
}

#[test]
fn test_file_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("small.pgm");
    std::fs::write(&path, "P2\n# hand made\n2 2\n255\n1 2\n3 4\n").unwrap();

    let image = read_pgm(&path).unwrap();
    let filtered = KuwaharaFilter::new(Window::new(3).unwrap(), VarianceMode::Sample).filter(&image);
    let out = dir.path().join("small_filtered.pgm");
    write_pgm(&out, &filtered).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("P2"));
    assert_eq!(lines.next(), Some("2 2"));
    assert_eq!(lines.next(), Some("255"));
    for line in lines {
        assert!(!line.ends_with(' '));
        assert_eq!(line.split(' ').count(), 2);
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let result = read_pgm(dir.path().join("absent.pgm"));
    assert!(matches!(result, Err(KuwaharaError::Io(_))));
}

#[test]
fn test_binary_graymap_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("binary.pgm");
    std::fs::write(&path, b"P5\n2 2\n255\n\x01\x02\x03\x04").unwrap();
    assert!(matches!(read_pgm(&path), Err(KuwaharaError::Format(_))));
}
