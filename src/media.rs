//! Image format detection by file extension.

use std::path::Path;

/// Image formats that can be embedded in a rendered comment.
///
/// Detection is done via file extension only; the sniffer in
/// [`crate::probe`] looks at magic bytes independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    /// PNG image
    Png,
    /// JPEG image
    Jpeg,
    /// GIF image
    Gif,
    /// SVG image (vector)
    Svg,
    /// Windows bitmap
    Bmp,
    /// Unknown/binary format
    Binary,
}

impl MediaFormat {
    /// Detect the format from a path's extension, ignoring case.
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return MediaFormat::Binary;
        };

        match ext.to_ascii_lowercase().as_str() {
            "png" => MediaFormat::Png,
            "jpg" | "jpeg" => MediaFormat::Jpeg,
            "gif" => MediaFormat::Gif,
            "svg" => MediaFormat::Svg,
            "bmp" => MediaFormat::Bmp,
            _ => MediaFormat::Binary,
        }
    }

    /// Get the MIME type string for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaFormat::Png => "image/png",
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Gif => "image/gif",
            MediaFormat::Svg => "image/svg+xml",
            MediaFormat::Bmp => "image/bmp",
            MediaFormat::Binary => "application/octet-stream",
        }
    }

    /// Whether the format is inlined as escaped text rather than base64.
    pub fn is_inline_text(self) -> bool {
        matches!(self, MediaFormat::Svg)
    }
}
