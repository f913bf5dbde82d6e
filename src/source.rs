//! Renderable `src` values for image files.
//!
//! Small files are inlined as `data:` URIs so the rendered comment needs
//! no further file access; anything above the inline threshold is
//! referenced through a `file:` URI instead. Results are memoized per
//! file identity (canonical path, length, modification time) and
//! threshold.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, PoisonError, RwLock};
use std::time::SystemTime;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::error::{Error, Result};
use crate::media::MediaFormat;
use crate::util::decode_utf8;

/// Files up to this many bytes are inlined.
pub const DEFAULT_INLINE_THRESHOLD: u64 = 150 * 1024;

/// Everything except RFC 3986 unreserved characters is escaped.
const DATA_TEXT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

static GLOBAL_CACHE: LazyLock<SourceCache> = LazyLock::new(SourceCache::new);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    len: u64,
    modified: Option<SystemTime>,
    threshold: u64,
}

/// Memoized image URIs.
///
/// Entries are never evicted. Concurrent callers may compute the same
/// entry twice; the first value inserted is the one every caller gets.
#[derive(Debug, Default)]
pub struct SourceCache {
    entries: RwLock<HashMap<CacheKey, String>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by [`build_src`].
    pub fn global() -> &'static SourceCache {
        &GLOBAL_CACHE
    }

    /// Number of cached URIs.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the `src` URI for the image at `path`.
    ///
    /// Files of at most `inline_threshold` bytes become `data:` URIs
    /// (percent-escaped text for SVG, base64 otherwise); larger files
    /// become `file:` URIs. A cache hit performs no read of the file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be resolved, inspected or read.
    pub fn build_src(&self, path: &Path, inline_threshold: u64) -> Result<String> {
        let path = fs::canonicalize(path)?;
        let meta = fs::metadata(&path)?;
        let key = CacheKey {
            path,
            len: meta.len(),
            modified: meta.modified().ok(),
            threshold: inline_threshold,
        };

        if let Some(uri) = self.get(&key) {
            log::trace!("image source cache hit for {}", key.path.display());
            return Ok(uri);
        }

        let uri = encode(&key.path, key.len, inline_threshold)?;
        Ok(self.insert(key, uri))
    }

    fn get(&self, key: &CacheKey) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Insert `uri` unless another caller got there first; return the
    /// value that ends up cached.
    fn insert(&self, key: CacheKey, uri: String) -> String {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(uri)
            .clone()
    }
}

/// Build the `src` URI for `path` with the default threshold and the
/// process-wide cache.
pub fn build_src(path: &Path) -> Result<String> {
    SourceCache::global().build_src(path, DEFAULT_INLINE_THRESHOLD)
}

fn encode(path: &Path, len: u64, inline_threshold: u64) -> Result<String> {
    if len > inline_threshold {
        return Url::from_file_path(path)
            .map(String::from)
            .map_err(|()| Error::InvalidFileUri(path.to_path_buf()));
    }

    let format = MediaFormat::from_path(path);
    let mime = format.mime_type();
    let bytes = fs::read(path)?;

    if format.is_inline_text() {
        let text = decode_utf8(&bytes);
        Ok(format!(
            "data:{mime};utf8,{}",
            utf8_percent_encode(&text, DATA_TEXT)
        ))
    } else {
        Ok(format!("data:{mime};base64,{}", STANDARD.encode(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_text_escaping() {
        let escaped = utf8_percent_encode("<svg a=\"1\"/> ~-._", DATA_TEXT).to_string();
        assert_eq!(escaped, "%3Csvg%20a%3D%221%22%2F%3E%20~-._");
    }

    #[test]
    fn test_missing_file_is_error() {
        let cache = SourceCache::new();
        let result = cache.build_src(Path::new("/no/such/image.png"), DEFAULT_INLINE_THRESHOLD);
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(cache.is_empty());
    }
}
