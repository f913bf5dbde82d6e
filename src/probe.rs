//! Image dimension sniffing.
//!
//! Reads only the header bytes needed to learn an image's pixel size.
//! Supports PNG, GIF, BMP and JPEG by signature, with a light textual
//! scan for SVG as the last resort. No pixel data is decoded.
//!
//! Every entry point is total: I/O errors, truncated headers and
//! unrecognized formats all come back as `None`.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use memchr::memmem;

use crate::util::{decode_utf8, trim_units};

/// An image's intrinsic pixel dimensions. Both edges are non-zero when
/// produced by the sniffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The larger of width and height.
    pub fn long_edge(self) -> u32 {
        self.width.max(self.height)
    }

    /// Whether both edges are non-zero.
    pub fn is_positive(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Build a size from signed header fields, rejecting non-positive edges.
    fn from_signed(width: i64, height: i64) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Self::new(u32::try_from(width).ok()?, u32::try_from(height).ok()?))
    }
}

/// Size reported for SVG documents without explicit `width`/`height`.
pub const SVG_FALLBACK_SIZE: ImageSize = ImageSize::new(64, 64);

/// Upper bound on bytes examined by the SVG scan.
const SVG_HEAD_LIMIT: u64 = 64 * 1024;

/// Number of text lines the SVG scan looks at.
const SVG_HEAD_LINES: usize = 3;

const PNG_MAGIC: [u8; 4] = [0x89, b'P', b'N', b'G'];

/// Outcome of testing a single format against the stream.
enum Header {
    /// Signature did not match; try the next format.
    Other,
    /// Signature matched. `None` means the header was unusable.
    Matched(Option<ImageSize>),
}

type HeaderTest<R> = fn(&mut R) -> io::Result<Header>;

/// Sniff the dimensions of the image in `reader`.
///
/// Formats are tried in a fixed order (PNG, GIF, BMP, JPEG, SVG), each
/// starting again from offset 0.
pub fn probe<R: Read + Seek>(reader: &mut R) -> Option<ImageSize> {
    match sniff(reader) {
        Ok(size) => size,
        Err(e) => {
            log::trace!("image probe failed: {e}");
            None
        }
    }
}

/// Sniff the dimensions of an in-memory image.
///
/// # Examples
///
/// ```
/// use imgcomment::probe::{probe_bytes, ImageSize};
///
/// let gif = b"GIF89a\x40\x01\xF0\x00";
/// assert_eq!(probe_bytes(gif), Some(ImageSize::new(320, 240)));
/// assert_eq!(probe_bytes(b"not an image"), None);
/// ```
pub fn probe_bytes(data: &[u8]) -> Option<ImageSize> {
    probe(&mut Cursor::new(data))
}

/// Sniff the dimensions of the image file at `path`.
///
/// A file that cannot be opened is reported as `None`, like any other
/// probe failure.
pub fn probe_path(path: &Path) -> Option<ImageSize> {
    match File::open(path) {
        Ok(file) => probe(&mut BufReader::new(file)),
        Err(e) => {
            log::debug!("cannot open {} for probing: {e}", path.display());
            None
        }
    }
}

fn sniff<R: Read + Seek>(reader: &mut R) -> io::Result<Option<ImageSize>> {
    let tests: [HeaderTest<R>; 5] = [
        png_header::<R>,
        gif_header::<R>,
        bmp_header::<R>,
        jpeg_header::<R>,
        svg_header::<R>,
    ];

    for test in tests {
        if let Header::Matched(size) = test(reader)? {
            return Ok(size);
        }
    }
    Ok(None)
}

/// Read exactly `N` bytes at the current position, or `None` at end of stream.
fn read_next<const N: usize, R: Read>(reader: &mut R) -> io::Result<Option<[u8; N]>> {
    let mut buf = [0u8; N];
    match reader.read_exact(&mut buf) {
        Ok(()) => Ok(Some(buf)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e),
    }
}

/// Read exactly `N` bytes starting at `offset`.
fn read_at<const N: usize, R: Read + Seek>(
    reader: &mut R,
    offset: u64,
) -> io::Result<Option<[u8; N]>> {
    reader.seek(SeekFrom::Start(offset))?;
    read_next(reader)
}

// PNG: width/height are the big-endian words at offsets 16 and 20 (IHDR).
fn png_header<R: Read + Seek>(reader: &mut R) -> io::Result<Header> {
    match read_at::<8, _>(reader, 0)? {
        Some(magic) if magic[..4] == PNG_MAGIC => {}
        _ => return Ok(Header::Other),
    }

    let Some(ihdr) = read_at::<8, _>(reader, 16)? else {
        return Ok(Header::Matched(None));
    };
    let width = i32::from_be_bytes([ihdr[0], ihdr[1], ihdr[2], ihdr[3]]);
    let height = i32::from_be_bytes([ihdr[4], ihdr[5], ihdr[6], ihdr[7]]);
    Ok(Header::Matched(ImageSize::from_signed(
        width.into(),
        height.into(),
    )))
}

// GIF: little-endian u16 width/height at offsets 6 and 8.
fn gif_header<R: Read + Seek>(reader: &mut R) -> io::Result<Header> {
    match read_at::<3, _>(reader, 0)? {
        Some(magic) if &magic == b"GIF" => {}
        _ => return Ok(Header::Other),
    }

    let Some(screen) = read_at::<4, _>(reader, 6)? else {
        return Ok(Header::Matched(None));
    };
    let width = u16::from_le_bytes([screen[0], screen[1]]);
    let height = u16::from_le_bytes([screen[2], screen[3]]);
    Ok(Header::Matched(ImageSize::from_signed(
        width.into(),
        height.into(),
    )))
}

// BMP: signed little-endian i32 width/height at offsets 18 and 22. A
// negative height marks top-down row order; only the magnitude matters.
fn bmp_header<R: Read + Seek>(reader: &mut R) -> io::Result<Header> {
    match read_at::<2, _>(reader, 0)? {
        Some(magic) if &magic == b"BM" => {}
        _ => return Ok(Header::Other),
    }

    let Some(info) = read_at::<8, _>(reader, 18)? else {
        return Ok(Header::Matched(None));
    };
    let width = i32::from_le_bytes([info[0], info[1], info[2], info[3]]);
    let height = i32::from_le_bytes([info[4], info[5], info[6], info[7]]).unsigned_abs();
    Ok(Header::Matched(ImageSize::from_signed(
        width.into(),
        height.into(),
    )))
}

/// Whether `marker` is a Start-Of-Frame marker carrying image dimensions.
fn is_sof_marker(marker: u8) -> bool {
    matches!(
        marker,
        0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF
    )
}

// JPEG: walk the segment list after SOI until a SOF segment turns up.
fn jpeg_header<R: Read + Seek>(reader: &mut R) -> io::Result<Header> {
    match read_at::<2, _>(reader, 0)? {
        Some([0xFF, 0xD8]) => {}
        _ => return Ok(Header::Other),
    }

    loop {
        let Some([prefix, marker]) = read_next::<2, _>(reader)? else {
            break;
        };
        // EOI or SOS before any frame header
        if prefix != 0xFF || marker == 0xD9 || marker == 0xDA {
            break;
        }

        let Some(length) = read_next::<2, _>(reader)? else {
            break;
        };
        let length = u16::from_be_bytes(length);
        if length < 2 {
            break;
        }

        if is_sof_marker(marker) {
            let Some([_precision, h0, h1, w0, w1]) = read_next::<5, _>(reader)? else {
                break;
            };
            let height = u16::from_be_bytes([h0, h1]);
            let width = u16::from_be_bytes([w0, w1]);
            return Ok(Header::Matched(ImageSize::from_signed(
                width.into(),
                height.into(),
            )));
        }

        reader.seek(SeekFrom::Current(i64::from(length) - 2))?;
    }

    Ok(Header::Matched(None))
}

// SVG: look for `<svg` in the first few text lines and pull width/height
// attributes out of that same window.
fn svg_header<R: Read + Seek>(reader: &mut R) -> io::Result<Header> {
    reader.seek(SeekFrom::Start(0))?;
    let mut lines = BufReader::new(reader.by_ref().take(SVG_HEAD_LIMIT));

    let mut head = Vec::new();
    let mut line = Vec::new();
    for _ in 0..SVG_HEAD_LINES {
        line.clear();
        if lines.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        // Line terminators are not part of the window
        while matches!(line.last(), Some(b'\n' | b'\r')) {
            line.pop();
        }
        head.extend_from_slice(&line);
    }

    let head = decode_utf8(&head);
    let lower = head.to_ascii_lowercase();
    if memmem::find(lower.as_bytes(), b"<svg").is_none() {
        return Ok(Header::Other);
    }

    let width = svg_int_attr(&head, &lower, "width");
    let height = svg_int_attr(&head, &lower, "height");
    let size = match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => ImageSize::new(w.unsigned_abs(), h.unsigned_abs()),
        _ => SVG_FALLBACK_SIZE,
    };
    Ok(Header::Matched(Some(size)))
}

/// Find `name` (case-insensitively) and parse the integer between the
/// first pair of double quotes after it. `px` and `%` suffixes are dropped.
///
/// `lower` must be the ASCII-lowercased form of `head`, so byte offsets agree.
fn svg_int_attr(head: &str, lower: &str, name: &str) -> Option<i32> {
    let start = memmem::find(lower.as_bytes(), name.as_bytes())?;
    let bytes = head.as_bytes();
    let open = start + memchr::memchr(b'"', &bytes[start..])?;
    let close = open + 1 + memchr::memchr(b'"', &bytes[open + 1..])?;

    let value = head.get(open + 1..close)?;
    trim_units(value, &['p', 'x', '%']).trim_end().parse().ok()
}
