//! Unit tests for manifest loading.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use rstest::rstest;
use tempfile::TempDir;

use super::*;

fn write_manifest(contents: &str) -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("daily.fofn")).expect("utf8 path");
    fs::write(&path, contents).expect("write manifest");
    (dir, path)
}

#[test]
fn load_preserves_order() {
    let (_dir, path) = write_manifest("/tmp/123.txt\n/home/user/smth.dat\n");

    let manifest = PathManifest::load(&path).expect("manifest should load");

    assert_eq!(manifest.paths(), ["/tmp/123.txt", "/home/user/smth.dat"]);
    assert_eq!(manifest.len(), 2);
    assert!(!manifest.is_empty());
    assert_eq!(manifest.source(), path.as_path());
}

#[rstest]
#[case::no_trailing_newline("/a\n/b\n/c", 3)]
#[case::trailing_blank_lines("/a\n/b\n\n\n", 2)]
#[case::crlf("/a\r\n/b\r\n", 2)]
#[case::trailing_spaces("/a   \n/b\t\n", 2)]
#[case::blank_line_between("/a\n\n/b\n", 2)]
fn parse_counts_non_empty_lines(#[case] contents: &str, #[case] expected: usize) {
    let manifest = PathManifest::parse(Utf8Path::new("inline"), contents).expect("parse");

    assert_eq!(manifest.len(), expected);
    assert!(manifest.paths().iter().all(|p| p == p.trim_end()));
}

#[test]
fn parse_keeps_inner_spaces() {
    let manifest =
        PathManifest::parse(Utf8Path::new("inline"), "/srv/My Documents \n").expect("parse");

    assert_eq!(manifest.paths(), ["/srv/My Documents"]);
}

#[rstest]
#[case("")]
#[case("\n\n")]
#[case("   \n\t\n")]
fn parse_rejects_empty_manifest(#[case] contents: &str) {
    let err = PathManifest::parse(Utf8Path::new("inline"), contents)
        .expect_err("empty manifest should fail");

    assert!(matches!(err, ManifestError::Empty { .. }));
}

#[test]
fn load_reports_missing_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("absent.fofn")).expect("utf8 path");

    let err = PathManifest::load(&path).expect_err("missing manifest should fail");

    assert!(matches!(err, ManifestError::Io { path: ref p, .. } if p == &path));
    assert!(err.to_string().contains("absent.fofn"));
}
