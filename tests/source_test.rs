//! Image source encoding and caching tests.

use std::fs::{self, File};
use std::path::Path;
use std::thread;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use imgcomment::source::{DEFAULT_INLINE_THRESHOLD, SourceCache, build_src};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

// ============================================================================
// Encoding Tests
// ============================================================================

#[test]
fn test_small_png_is_base64_data_uri() {
    let dir = TempDir::new().unwrap();
    let bytes = b"\x89PNG\r\n\x1a\n\0\0";
    let path = write(dir.path(), "tiny.png", bytes);

    let cache = SourceCache::new();
    let uri = cache.build_src(&path, DEFAULT_INLINE_THRESHOLD).unwrap();
    assert_eq!(uri, format!("data:image/png;base64,{}", STANDARD.encode(bytes)));
}

#[test]
fn test_large_file_is_file_uri() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "big.png", &vec![0u8; 1024 * 1024]);

    let cache = SourceCache::new();
    let uri = cache.build_src(&path, 150 * 1024).unwrap();
    assert!(uri.starts_with("file:///"), "{uri}");
    assert!(uri.ends_with("/big.png"), "{uri}");
    assert!(!uri.starts_with("data:"));
}

#[test]
fn test_threshold_is_inclusive() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "edge.gif", &[7u8; 100]);

    let cache = SourceCache::new();
    assert!(cache.build_src(&path, 100).unwrap().starts_with("data:image/gif;base64,"));
    assert!(cache.build_src(&path, 99).unwrap().starts_with("file:"));
}

#[test]
fn test_svg_is_percent_escaped_text() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "icon.SVG",
        b"\xEF\xBB\xBF<svg width=\"1\" height=\"1\"/>",
    );

    let cache = SourceCache::new();
    let uri = cache.build_src(&path, DEFAULT_INLINE_THRESHOLD).unwrap();
    assert_eq!(
        uri,
        "data:image/svg+xml;utf8,%3Csvg%20width%3D%221%22%20height%3D%221%22%2F%3E"
    );
}

#[test]
fn test_mime_types_by_extension() {
    let dir = TempDir::new().unwrap();
    let cache = SourceCache::new();
    let cases = [
        ("a.jpg", "image/jpeg"),
        ("a.JPEG", "image/jpeg"),
        ("a.bmp", "image/bmp"),
        ("a.dat", "application/octet-stream"),
    ];

    for (name, mime) in cases {
        let path = write(dir.path(), name, b"xy");
        let uri = cache.build_src(&path, DEFAULT_INLINE_THRESHOLD).unwrap();
        assert_eq!(uri, format!("data:{mime};base64,eHk="), "{name}");
    }
}

#[test]
fn test_missing_file_propagates_error() {
    let dir = TempDir::new().unwrap();
    let cache = SourceCache::new();
    let result = cache.build_src(&dir.path().join("gone.png"), DEFAULT_INLINE_THRESHOLD);
    assert!(result.is_err());
}

#[test]
fn test_global_build_src() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "global.png", b"abc");
    assert_eq!(build_src(&path).unwrap(), "data:image/png;base64,YWJj");
    assert!(!SourceCache::global().is_empty());
}

// ============================================================================
// Cache Tests
// ============================================================================

#[test]
fn test_cache_hit_does_not_reread_file() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "cached.png", b"first!");
    let modified = fs::metadata(&path).unwrap().modified().unwrap();

    let cache = SourceCache::new();
    let first = cache.build_src(&path, DEFAULT_INLINE_THRESHOLD).unwrap();

    // Same length, same timestamp, different bytes
    fs::write(&path, b"second").unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(modified)
        .unwrap();

    let second = cache.build_src(&path, DEFAULT_INLINE_THRESHOLD).unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_changed_file_is_reencoded() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "changing.png", b"one");

    let cache = SourceCache::new();
    let first = cache.build_src(&path, DEFAULT_INLINE_THRESHOLD).unwrap();

    fs::write(&path, b"three").unwrap();
    let second = cache.build_src(&path, DEFAULT_INLINE_THRESHOLD).unwrap();

    assert_ne!(first, second);
    assert_eq!(second, "data:image/png;base64,dGhyZWU=");
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_threshold_is_part_of_key() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "k.png", &[1u8; 10]);

    let cache = SourceCache::new();
    let inline = cache.build_src(&path, 10).unwrap();
    let linked = cache.build_src(&path, 5).unwrap();
    assert!(inline.starts_with("data:"));
    assert!(linked.starts_with("file:"));
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_equivalent_paths_share_entry() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let path = write(dir.path(), "same.png", b"zz");
    let indirect = dir.path().join("sub").join("..").join("same.png");

    let cache = SourceCache::new();
    let a = cache.build_src(&path, DEFAULT_INLINE_THRESHOLD).unwrap();
    let b = cache.build_src(&indirect, DEFAULT_INLINE_THRESHOLD).unwrap();
    assert_eq!(a, b);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_concurrent_callers_agree() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "shared.png", &[42u8; 4096]);
    let cache = SourceCache::new();
    let (cache_ref, path_ref) = (&cache, path.as_path());

    let results: Vec<String> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(move || {
                    cache_ref
                        .build_src(path_ref, DEFAULT_INLINE_THRESHOLD)
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(cache.len(), 1);
}
