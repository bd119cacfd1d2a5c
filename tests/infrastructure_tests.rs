//! Infrastructure layer tests
//!
//! Filesystem-backed byte sources, the directory walker, the zip reader and
//! the artifact writer.

use remnant::domain::repositories::{
    ArchiveReader, ArtifactWriter, ArtifactWriterError, ByteSource, DirectoryWalker,
};
use remnant::infrastructure::archive::ZipArchiveReader;
use remnant::infrastructure::persistence::LocalArtifactWriter;
use remnant::infrastructure::source::{FileSource, MmapSource, open_source};
use remnant::infrastructure::walk::WalkdirWalker;
use rstest::*;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

// ============================================================================
// Fixtures
// ============================================================================

#[fixture]
fn sample_file() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.bin");
    let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
    fs::write(&path, data).unwrap();
    (dir, path)
}

#[fixture]
fn backup_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("Archive/nested")).unwrap();
    fs::write(dir.path().join("Manifest.xml"), b"<manifest/>").unwrap();
    fs::write(dir.path().join("Archive/appdata.tar"), b"tar").unwrap();
    fs::write(dir.path().join("Archive/nested/deep.rem"), b"REMF").unwrap();
    dir
}

fn write_zip(path: &std::path::Path, members: &[(&str, &[u8])]) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, data) in members {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

// ============================================================================
// Byte sources
// ============================================================================

#[rstest]
fn test_file_source_reads_are_clamped(sample_file: (TempDir, PathBuf)) {
    let (_dir, path) = sample_file;
    let source = FileSource::open(&path).unwrap();
    assert_eq!(source.size(), 1000);
    assert_eq!(source.read_at(256, 4).unwrap(), vec![0, 1, 2, 3]);
    assert_eq!(source.read_at(998, 10).unwrap().len(), 2);
    assert!(source.read_at(5000, 10).unwrap().is_empty());
}

#[rstest]
fn test_mmap_and_file_sources_agree(sample_file: (TempDir, PathBuf)) {
    let (_dir, path) = sample_file;
    let mapped = MmapSource::open(&path).unwrap();
    let plain = FileSource::open(&path).unwrap();
    assert_eq!(mapped.as_slice().map(<[u8]>::len), Some(1000));
    assert_eq!(mapped.read_at(100, 50).unwrap(), plain.read_at(100, 50).unwrap());
}

#[rstest]
fn test_open_source_picks_by_threshold(sample_file: (TempDir, PathBuf)) {
    let (_dir, path) = sample_file;
    assert!(open_source(&path, 1000, 4096).unwrap().as_slice().is_some());
    assert!(open_source(&path, 1000, 10).unwrap().as_slice().is_none());
}

#[rstest]
fn test_missing_file_is_not_found() {
    assert!(FileSource::open("/definitely/not/here.bin").is_err());
}

// ============================================================================
// Walker
// ============================================================================

#[rstest]
fn test_walker_lists_files_with_relative_paths(backup_tree: TempDir) {
    let entries = WalkdirWalker::new().walk(backup_tree.path(), 10).unwrap();
    let paths: Vec<&str> = entries.iter().map(|e| e.relative_path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["Archive/appdata.tar", "Archive/nested/deep.rem", "Manifest.xml"]
    );
    assert_eq!(entries[1].extension, "rem");
}

#[rstest]
fn test_walker_respects_depth(backup_tree: TempDir) {
    let entries = WalkdirWalker::new().walk(backup_tree.path(), 2).unwrap();
    assert!(entries.iter().all(|e| e.relative_path != "Archive/nested/deep.rem"));
}

#[rstest]
fn test_walker_accepts_single_file(sample_file: (TempDir, PathBuf)) {
    let (_dir, path) = sample_file;
    let entries = WalkdirWalker::new().walk(&path, 10).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].relative_path, "sample.bin");
}

#[rstest]
fn test_walker_missing_root() {
    assert!(WalkdirWalker::new().walk(std::path::Path::new("/no/such/root"), 10).is_err());
}

// ============================================================================
// Zip archives
// ============================================================================

#[rstest]
fn test_zip_members_are_listed_and_visited() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("backup.bbb");
    write_zip(
        &path,
        &[
            ("PkgInfo", b"pkg".as_slice()),
            ("Archive/settings.tar", b"needle inside".as_slice()),
        ],
    );

    let reader = ZipArchiveReader::new();
    assert!(reader.is_archive(&path));
    assert_eq!(
        reader.member_names(&path, 10).unwrap(),
        vec!["PkgInfo".to_string(), "Archive/settings.tar".to_string()]
    );

    let mut seen = Vec::new();
    reader
        .for_each_member(&path, &mut |name, data| {
            seen.push((name.to_string(), data.len()));
            true
        })
        .unwrap();
    assert_eq!(seen, vec![("PkgInfo".to_string(), 3), ("Archive/settings.tar".to_string(), 13)]);
}

#[rstest]
fn test_oversized_members_are_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("big.zip");
    write_zip(&path, &[("small", b"ok".as_slice()), ("large", &[7u8; 4096][..])]);

    let reader = ZipArchiveReader::new().with_max_member_size(1024);
    let mut names = Vec::new();
    reader
        .for_each_member(&path, &mut |name, _| {
            names.push(name.to_string());
            true
        })
        .unwrap();
    assert_eq!(names, vec!["small".to_string()]);
}

#[rstest]
fn test_non_zip_is_rejected(sample_file: (TempDir, PathBuf)) {
    let (_dir, path) = sample_file;
    let reader = ZipArchiveReader::new();
    assert!(!reader.is_archive(&path));
    assert!(reader.member_names(&path, 10).is_err());
}

// ============================================================================
// Artifact writer
// ============================================================================

#[rstest]
fn test_writer_creates_directory_and_counts() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("session-1");
    let writer = LocalArtifactWriter::new(&out).unwrap();

    let path = writer.write("a_0000000000.jpg", &[1, 2, 3]).unwrap();
    assert!(path.starts_with(&out));
    assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);
    assert_eq!(writer.files_written(), 1);
    assert_eq!(writer.bytes_written(), 3);
    assert_eq!(writer.output_dir(), out.as_path());
}

#[rstest]
#[case("../escape.jpg")]
#[case("sub/dir.jpg")]
#[case("..")]
fn test_writer_rejects_unsafe_names(#[case] name: &str) {
    let dir = TempDir::new().unwrap();
    let writer = LocalArtifactWriter::new(dir.path()).unwrap();
    assert!(matches!(
        writer.write(name, b"x"),
        Err(ArtifactWriterError::InvalidName(_))
    ));
}

#[rstest]
fn test_writer_never_overwrites() {
    let dir = TempDir::new().unwrap();
    let writer = LocalArtifactWriter::new(dir.path()).unwrap();
    writer.write("x.bin", b"first").unwrap();
    assert!(matches!(
        writer.write("x.bin", b"second"),
        Err(ArtifactWriterError::FileExists(_))
    ));
    assert_eq!(fs::read(dir.path().join("x.bin")).unwrap(), b"first");
}
