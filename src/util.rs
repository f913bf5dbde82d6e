//! Small text helpers shared by the sniffer and the tag extractor.

use std::borrow::Cow;

/// Decode bytes as UTF-8, stripping a leading byte-order mark.
///
/// Malformed sequences are replaced rather than rejected; callers only
/// scan the result for markup.
pub fn decode_utf8(bytes: &[u8]) -> Cow<'_, str> {
    // encoding_rs sniffs and removes the BOM for us
    let (result, _encoding, _malformed) = encoding_rs::UTF_8.decode(bytes);
    result
}

/// Strip trailing unit characters from a numeric attribute value.
///
/// `"96px"` becomes `"96"`. Only the listed characters are removed, so
/// `"12em"` is returned unchanged and later fails to parse.
pub fn trim_units<'a>(value: &'a str, units: &[char]) -> &'a str {
    value.trim().trim_end_matches(units)
}

/// Parse a pixel count, tolerating a `px` suffix in any case.
///
/// Returns `None` for empty, non-numeric, zero or negative values.
pub fn parse_px(value: &str) -> Option<u32> {
    let digits = trim_units(value, &['p', 'x', 'P', 'X']);
    match digits.trim_end().parse::<i32>() {
        Ok(n) if n > 0 => Some(n.unsigned_abs()),
        _ => None,
    }
}

/// Return the part of a qualified XML name after the namespace prefix.
pub fn local_name(name: &[u8]) -> &[u8] {
    match memchr::memrchr(b':', name) {
        Some(colon) => &name[colon + 1..],
        None => name,
    }
}
