//! Incremental title extraction from partial HTML.
//!
//! The body is read in growing pieces: first the per-host estimate, then
//! doubling the total each round until the title is found or the byte cap
//! is reached. After each piece the whole buffer is decoded and parsed, and
//! the title selector is evaluated against it.
//!
//! A candidate title that the decoded buffer ends with may be cut off, so
//! it is not accepted until more bytes arrive.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use regex::bytes::Regex;
use scraper::Html;

use crate::body::{BodyReader, ContentEncoding};
use crate::humanize::{KIB, humanize_bytes};
use crate::siteconfig::TitleSelector;

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#).expect("static regex")
});

/// A title found in a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundTitle {
    /// Trimmed title text.
    pub text: String,
    /// The title as it appears in the buffer's encoding.
    pub encoded: Vec<u8>,
}

/// Result of scanning a response body for a title.
#[derive(Debug, Default)]
pub struct HtmlScan {
    pub title: Option<FoundTitle>,
    /// Decoded buffer read so far.
    pub content: Vec<u8>,
    /// Bytes received from the network.
    pub wire_len: usize,
}

/// Picks the character encoding of a page.
///
/// The Content-Type `charset` wins, then a `<meta>` charset within the first
/// kibibyte, then UTF-8.
pub fn detect_encoding(content_type: Option<&str>, content: &[u8]) -> &'static Encoding {
    if let Some(encoding) = content_type.and_then(charset_param).and_then(|l| Encoding::for_label(l.as_bytes())) {
        return encoding;
    }

    let head = &content[..content.len().min(KIB)];
    META_CHARSET
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .map(|encoding| encoding.output_encoding())
        .unwrap_or(UTF_8)
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']))
    })
}

/// Decodes a buffer that may end in the middle of a character.
///
/// An incomplete trailing sequence is held back rather than replaced.
fn decode_prefix(encoding: &'static Encoding, content: &[u8]) -> String {
    let mut decoder = encoding.new_decoder();
    let capacity = decoder.max_utf8_buffer_length(content.len()).unwrap_or(content.len() * 3);
    let mut text = String::with_capacity(capacity);
    let _ = decoder.decode_to_string(content, &mut text, false);
    text
}

/// Finds a complete-looking title in a partial HTML buffer.
///
/// Returns `None` when the selector finds nothing or when the decoded buffer
/// ends with the candidate, which then may still be growing.
pub fn title_from_partial_html(
    content: &[u8],
    encoding: &'static Encoding,
    selector: &TitleSelector,
) -> Option<FoundTitle> {
    let text = decode_prefix(encoding, content);
    let document = Html::parse_document(&text);
    let raw = selector.select(&document)?;

    if text.ends_with(&raw) {
        tracing::trace!("Candidate title {:?} may be incomplete", raw);
        return None;
    }

    let trimmed = raw.trim();
    Some(FoundTitle { text: trimmed.to_string(), encoded: encode_as(encoding, trimmed) })
}

/// Encodes `text` the way it appears in a buffer of `encoding`.
///
/// `Encoding::encode` substitutes UTF-8 for the UTF-16 variants, which would
/// never match a UTF-16 buffer.
fn encode_as(encoding: &'static Encoding, text: &str) -> Vec<u8> {
    if encoding == UTF_16LE {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    } else if encoding == UTF_16BE {
        text.encode_utf16().flat_map(u16::to_be_bytes).collect()
    } else {
        encoding.encode(text).0.into_owned()
    }
}

/// Reads `body` until a title is found or `max_amount` wire bytes are read.
///
/// A custom selector that never matches falls back to the `<title>` tag of
/// the final buffer.
pub async fn scan_html(
    body: &mut BodyReader,
    content_type: Option<&str>,
    content_encoding: ContentEncoding,
    initial_amount: usize,
    max_amount: usize,
    selector: &TitleSelector,
) -> HtmlScan {
    let mut wire: Vec<u8> = Vec::new();
    let mut scan = HtmlScan::default();
    let mut amt = initial_amount.max(1);

    loop {
        tracing::debug!(
            "Reading {} in this iteration with a total of {} read so far.",
            humanize_bytes(amt as u64),
            humanize_bytes(wire.len() as u64)
        );
        let piece = body.read(amt).await;
        if piece.is_empty() {
            break;
        }
        wire.extend_from_slice(&piece);
        let over_cap = wire.len() > max_amount;

        scan.content = content_encoding.decode_partial(&wire);
        scan.wire_len = wire.len();
        let encoding = detect_encoding(content_type, &scan.content);

        if let Some(title) = title_from_partial_html(&scan.content, encoding, selector) {
            body.close();
            scan.title = Some(title);
            return scan;
        }

        let target = max_amount.min(wire.len() * 2);
        amt = target.saturating_sub(wire.len());
        if amt == 0 || over_cap {
            break;
        }
    }
    body.close();

    if !selector.is_title_tag() && !scan.content.is_empty() {
        let encoding = detect_encoding(content_type, &scan.content);
        scan.title = title_from_partial_html(&scan.content, encoding, &TitleSelector::TitleTag);
        if let Some(title) = &scan.title {
            tracing::debug!("Custom selector {} found nothing; using the title tag {:?}", selector, title.text);
        }
    }
    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    fn title(content: &[u8]) -> Option<String> {
        title_from_partial_html(content, UTF_8, &TitleSelector::TitleTag).map(|t| t.text)
    }

    #[test]
    fn test_complete_title() {
        assert_eq!(
            title(b"<html><head><title>  Example Domain \n</title></head>"),
            Some("Example Domain".to_string())
        );
    }

    #[test]
    fn test_truncated_title_rejected() {
        assert_eq!(title(b"<html><head><title>Example Dom"), None);
        assert_eq!(title(b"<html><head><title>Example Domain\n  "), None);
    }

    #[test]
    fn test_truncated_mid_character_rejected() {
        let content = "<title>Caf\u{e9}".as_bytes();
        // Drop the last byte of the two-byte "é".
        assert_eq!(title(&content[..content.len() - 1]), None);
    }

    #[test]
    fn test_missing_title() {
        assert_eq!(title(b"<html><head><meta charset=utf-8>"), None);
        assert_eq!(title(b""), None);
    }

    #[test]
    fn test_first_title_wins() {
        assert_eq!(title(b"<title>First</title><svg><title>Second</title></svg>"), Some("First".to_string()));
    }

    #[test]
    fn test_custom_selector() {
        let selector: TitleSelector = "meta_property(og:title)".parse().unwrap();
        let found = title_from_partial_html(
            br#"<head><title>Plain</title><meta property="og:title" content="Open Graph"></head>"#,
            UTF_8,
            &selector,
        );
        assert_eq!(found.map(|t| t.text), Some("Open Graph".to_string()));
    }

    #[test]
    fn test_encoded_title_bytes() {
        let content = b"<title>Caf\xe9</title><body>";
        let found = title_from_partial_html(content, WINDOWS_1252, &TitleSelector::TitleTag).unwrap();
        assert_eq!(found.text, "Caf\u{e9}");
        assert_eq!(found.encoded, b"Caf\xe9".to_vec());
    }

    #[test]
    fn test_utf16_title_bytes_match_buffer() {
        let html = "<html><head><title>Caf\u{e9} Menu</title></head><body></body></html>";
        let content: Vec<u8> = html.encode_utf16().flat_map(u16::to_le_bytes).collect();

        let encoding = detect_encoding(Some("text/html; charset=utf-16"), &content);
        assert_eq!(encoding, UTF_16LE);

        let found = title_from_partial_html(&content, encoding, &TitleSelector::TitleTag).unwrap();
        assert_eq!(found.text, "Caf\u{e9} Menu");
        assert!(content.windows(found.encoded.len()).any(|w| w == found.encoded.as_slice()));
    }

    #[test]
    fn test_encode_as() {
        assert_eq!(encode_as(UTF_16BE, "Hi"), vec![0, b'H', 0, b'i']);
        assert_eq!(encode_as(UTF_16LE, "Hi"), vec![b'H', 0, b'i', 0]);
        assert_eq!(encode_as(WINDOWS_1252, "Caf\u{e9}"), b"Caf\xe9".to_vec());
    }

    #[test]
    fn test_detect_encoding() {
        assert_eq!(detect_encoding(Some("text/html; charset=ISO-8859-1"), b""), WINDOWS_1252);
        assert_eq!(detect_encoding(Some("text/html; charset=\"utf-8\""), b""), UTF_8);
        assert_eq!(detect_encoding(Some("text/html"), b"<meta charset=\"windows-1252\">"), WINDOWS_1252);
        assert_eq!(
            detect_encoding(
                None,
                br#"<meta http-equiv="Content-Type" content="text/html; charset=iso-8859-1">"#
            ),
            WINDOWS_1252
        );
        assert_eq!(detect_encoding(Some("text/html"), b"<html>"), UTF_8);
        assert_eq!(detect_encoding(None, b"<meta charset=utf-16>"), UTF_8);
    }

    #[test]
    fn test_charset_param() {
        assert_eq!(charset_param("text/html; Charset=UTF-8"), Some("UTF-8"));
        assert_eq!(charset_param("text/html"), None);
    }
}
