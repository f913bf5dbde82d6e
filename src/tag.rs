//! `<img>` extraction from documentation comment XML.
//!
//! A comment such as
//!
//! ```xml
//! <member name="F:EditorIcons.Help">
//!   <summary>Help icon <img src="icons/help.png" max="64px"/></summary>
//! </member>
//! ```
//!
//! yields the first image inside `<summary>` together with its sizing
//! attributes, plus a copy of the comment with every `<img>` under that
//! `<summary>` cut out. The copy is spliced from the input text, so
//! whitespace, entities and attribute quoting are kept byte for byte.

use std::borrow::Cow;
use std::ops::Range;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::error::Result;
use crate::sizing::SizeConstraints;
use crate::util::{local_name, parse_px};

/// The first image referenced from a comment's `<summary>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTagInfo {
    /// Trimmed, non-empty `src` attribute.
    pub src: String,
    pub constraints: SizeConstraints,
}

/// Result of [`extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction<'a> {
    /// The image found, if any.
    pub tag: Option<ImageTagInfo>,
    /// The comment with image markup removed. Equal to the input when
    /// no image was found.
    pub sanitized: Cow<'a, str>,
}

impl<'a> Extraction<'a> {
    fn unchanged(fragment: &'a str) -> Self {
        Self {
            tag: None,
            sanitized: Cow::Borrowed(fragment),
        }
    }
}

/// Extract the first `<summary>` image from a comment fragment.
///
/// Element names are matched on their local part, so `<doc:summary>` and
/// `<x:img>` are recognized too. A missing `<summary>`, a `<summary>`
/// without images, an empty `src` on the first image, or markup that does
/// not parse all leave the fragment untouched and report no image.
///
/// # Examples
///
/// ```
/// use imgcomment::tag::extract;
///
/// let doc = r#"<summary>Save <img src="save.png" max="32"/>the file</summary>"#;
/// let result = extract(doc);
///
/// let tag = result.tag.unwrap();
/// assert_eq!(tag.src, "save.png");
/// assert_eq!(tag.constraints.max_edge, Some(32));
/// assert_eq!(result.sanitized, "<summary>Save the file</summary>");
/// ```
pub fn extract(fragment: &str) -> Extraction<'_> {
    let scan = match scan_summary(fragment) {
        Ok(scan) => scan,
        Err(e) => {
            log::trace!("comment is not well-formed XML: {e}");
            return Extraction::unchanged(fragment);
        }
    };

    let Some(tag) = scan.first else {
        log::trace!("no usable <img> in comment summary");
        return Extraction::unchanged(fragment);
    };

    Extraction {
        tag: Some(tag),
        sanitized: Cow::Owned(splice_out(fragment, &scan.images)),
    }
}

/// Whether `fragment` carries an image that [`extract`] would report.
pub fn has_image(fragment: &str) -> bool {
    extract(fragment).tag.is_some()
}

/// Images found under the first `<summary>`.
#[derive(Default)]
struct SummaryScan {
    /// Parsed first image; `None` if absent or its `src` is empty.
    first: Option<ImageTagInfo>,
    /// Byte spans of every `<img>` element, in document order.
    images: Vec<Range<usize>>,
}

fn scan_summary(fragment: &str) -> Result<SummaryScan> {
    let mut reader = Reader::from_str(fragment);
    let mut scan = SummaryScan::default();

    let mut depth = 0usize;
    let mut summary_depth: Option<usize> = None;

    loop {
        let event_start = tag_start(fragment, reader.buffer_position() as usize);
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                match summary_depth {
                    Some(_) if local == b"img" => {
                        // Anything nested in the image goes with it
                        reader.read_to_end(name)?;
                        let end = reader.buffer_position() as usize;
                        scan.push(&e, event_start..end);
                    }
                    None if local == b"summary" => {
                        depth += 1;
                        summary_depth = Some(depth);
                    }
                    _ => depth += 1,
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                match summary_depth {
                    Some(_) if local == b"img" => {
                        let end = reader.buffer_position() as usize;
                        scan.push(&e, event_start..end);
                    }
                    // An empty <summary/> is still the first summary
                    None if local == b"summary" => break,
                    _ => {}
                }
            }
            Event::End(_) => {
                if summary_depth == Some(depth) {
                    break;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(scan)
}

impl SummaryScan {
    fn push(&mut self, img: &BytesStart<'_>, span: Range<usize>) {
        if self.images.is_empty() {
            self.first = parse_img(img);
        }
        self.images.push(span);
    }
}

/// Read `src` and sizing attributes from an `<img>` start tag.
fn parse_img(img: &BytesStart<'_>) -> Option<ImageTagInfo> {
    let attrs: Vec<(String, String)> = img
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            let value = match unescape(&raw) {
                Ok(value) => value.into_owned(),
                Err(_) => raw.into_owned(),
            };
            (key, value)
        })
        .collect();

    let attr = |name: &str| {
        attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };

    // First listed name with a parsable value wins
    let px = |names: &[&str]| {
        names
            .iter()
            .filter_map(|&name| attr(name))
            .filter(|value| !value.trim().is_empty())
            .find_map(parse_px)
    };

    let src = attr("src").map(str::trim).unwrap_or_default();
    if src.is_empty() {
        return None;
    }

    let constraints = SizeConstraints {
        min_edge: px(&["min", "min-size"]),
        max_edge: px(&["max", "max-size"]),
        min_width: px(&["min-width"]),
        min_height: px(&["min-height"]),
        max_width: px(&["max-width"]),
        max_height: px(&["max-height"]),
        allow_upscale: attr("upscale").is_some_and(|v| v.eq_ignore_ascii_case("true")),
    };

    Some(ImageTagInfo {
        src: src.to_string(),
        constraints,
    })
}

/// Offset of the `<` opening the markup event that the reader is about
/// to return from `pos`.
///
/// Attribute values may hold a literal `<`, so the start is taken from
/// the reader position before the event rather than searched back from
/// the tag end.
fn tag_start(text: &str, pos: usize) -> usize {
    let bytes = text.as_bytes();
    let pos = pos.min(bytes.len());
    if bytes.get(pos) == Some(&b'<') {
        pos
    } else if pos > 0 && bytes[pos - 1] == b'<' {
        pos - 1
    } else {
        memchr::memchr(b'<', &bytes[pos..]).map_or(pos, |i| pos + i)
    }
}

/// Copy `text` without the given ascending, non-overlapping spans.
fn splice_out(text: &str, spans: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        out.push_str(&text[cursor..span.start]);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_basic() {
        let doc = r#"<summary>Icon <img src=" icons/a.png "/>.</summary>"#;
        let result = extract(doc);
        assert_eq!(result.tag.unwrap().src, "icons/a.png");
        assert_eq!(result.sanitized, "<summary>Icon .</summary>");
    }

    #[test]
    fn test_no_summary_returns_input() {
        let doc = r#"<remarks><img src="a.png"/></remarks>"#;
        let result = extract(doc);
        assert!(result.tag.is_none());
        assert_eq!(result.sanitized, doc);
    }

    #[test]
    fn test_summary_without_img() {
        let doc = "<member><summary>Plain text</summary></member>";
        let result = extract(doc);
        assert!(result.tag.is_none());
        assert!(matches!(result.sanitized, Cow::Borrowed(_)));
    }

    #[test]
    fn test_empty_src_leaves_fragment_untouched() {
        let doc = r#"<summary><img src="  "/><img src="b.png"/></summary>"#;
        let result = extract(doc);
        assert!(result.tag.is_none());
        assert_eq!(result.sanitized, doc);
    }

    #[test]
    fn test_missing_src() {
        let doc = r#"<summary><img max="10"/></summary>"#;
        assert!(extract(doc).tag.is_none());
    }

    #[test]
    fn test_img_outside_summary_is_kept() {
        let doc = r#"<member><summary>S <img src="a.png"/></summary><remarks><img src="b.png"/></remarks></member>"#;
        let result = extract(doc);
        assert_eq!(result.tag.unwrap().src, "a.png");
        assert_eq!(
            result.sanitized,
            r#"<member><summary>S </summary><remarks><img src="b.png"/></remarks></member>"#
        );
    }

    #[test]
    fn test_img_before_summary_is_ignored() {
        let doc = r#"<member><remarks><img src="b.png"/></remarks><summary><img src="a.png"/></summary></member>"#;
        assert_eq!(extract(doc).tag.unwrap().src, "a.png");
    }

    #[test]
    fn test_only_first_summary_is_scanned() {
        let doc = r#"<m><summary>one</summary><summary><img src="a.png"/></summary></m>"#;
        let result = extract(doc);
        assert!(result.tag.is_none());
        assert_eq!(result.sanitized, doc);
    }

    #[test]
    fn test_empty_summary_stops_scan() {
        let doc = r#"<m><summary/><summary><img src="a.png"/></summary></m>"#;
        assert!(extract(doc).tag.is_none());
    }

    #[test]
    fn test_nested_img_and_non_empty_element() {
        let doc = "<summary><para>x <img src=\"a.png\">alt</img> y</para></summary>";
        let result = extract(doc);
        assert_eq!(result.tag.unwrap().src, "a.png");
        assert_eq!(result.sanitized, "<summary><para>x  y</para></summary>");
    }

    #[test]
    fn test_namespace_prefixes() {
        let doc = r#"<d:summary xmlns:d="urn:doc"><d:img src="a.png"/></d:summary>"#;
        let result = extract(doc);
        assert_eq!(result.tag.unwrap().src, "a.png");
        assert_eq!(result.sanitized, r#"<d:summary xmlns:d="urn:doc"></d:summary>"#);
    }

    #[test]
    fn test_whitespace_and_entities_preserved() {
        let doc = "<summary>\n    a &amp; b\n    <img src=\"a.png\" />\n    <c>  </c>\n</summary>";
        let result = extract(doc);
        assert_eq!(
            result.sanitized,
            "<summary>\n    a &amp; b\n    \n    <c>  </c>\n</summary>"
        );
    }

    #[test]
    fn test_src_entities_unescaped() {
        let doc = r#"<summary><img src="a&amp;b.png"/></summary>"#;
        assert_eq!(extract(doc).tag.unwrap().src, "a&b.png");
    }

    #[test]
    fn test_malformed_xml() {
        let doc = "<summary><img src=\"a.png\"/></oops>";
        let result = extract(doc);
        assert!(result.tag.is_none());
        assert_eq!(result.sanitized, doc);
    }

    #[test]
    fn test_secondary_attribute_name() {
        let doc = r#"<summary><img src="a.png" min-size="40" max-size="80px"/></summary>"#;
        let c = extract(doc).tag.unwrap().constraints;
        assert_eq!(c.min_edge, Some(40));
        assert_eq!(c.max_edge, Some(80));
    }

    #[test]
    fn test_invalid_primary_falls_back_to_secondary() {
        let doc = r#"<summary><img src="a.png" min="abc" min-size="40"/></summary>"#;
        assert_eq!(extract(doc).tag.unwrap().constraints.min_edge, Some(40));
    }

    #[test]
    fn test_upscale_flag() {
        let doc = r#"<summary><img src="a.png" upscale="TRUE"/></summary>"#;
        assert!(extract(doc).tag.unwrap().constraints.allow_upscale);

        let doc = r#"<summary><img src="a.png" upscale="yes"/></summary>"#;
        assert!(!extract(doc).tag.unwrap().constraints.allow_upscale);
    }

    #[test]
    fn test_has_image() {
        assert!(has_image(r#"<summary><img src="a.png"/></summary>"#));
        assert!(!has_image("<summary>none</summary>"));
    }

    #[test]
    fn test_splice_out() {
        assert_eq!(splice_out("abcdef", &[1..2, 4..5]), "acdf");
        assert_eq!(splice_out("abc", &[]), "abc");
    }

    #[test]
    fn test_tag_start() {
        let text = r#"ab<img src="x"/>"#;
        assert_eq!(tag_start(text, 2), 2);
        assert_eq!(tag_start(text, 3), 2);
        assert_eq!(tag_start(text, 0), 2);
    }

    #[test]
    fn test_lt_inside_attribute_value() {
        let doc = r#"<summary>A <img src="a.png" alt="x<y"/> B</summary>"#;
        let result = extract(doc);
        assert_eq!(result.tag.unwrap().src, "a.png");
        assert_eq!(result.sanitized, "<summary>A  B</summary>");
    }

    #[test]
    fn test_lt_inside_attribute_of_non_empty_img() {
        let doc = r#"<summary><img src="b.png" title="1<2">caption</img>tail</summary>"#;
        let result = extract(doc);
        assert_eq!(result.tag.unwrap().src, "b.png");
        assert_eq!(result.sanitized, "<summary>tail</summary>");
    }
}
