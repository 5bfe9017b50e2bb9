//! PDF title extraction.
//!
//! The document information dictionary's `/Title` is preferred; an XMP
//! `dc:title` in the catalog's metadata stream is the fallback. Parse
//! failures of any kind mean "no title".

#[cfg(feature = "pdf")]
use crate::humanize::collapse_whitespace;

/// Extracts the title on a blocking worker thread.
///
/// A panic inside the parser is contained to the worker and reported as no
/// title.
pub async fn pdf_title(bytes: Vec<u8>) -> Option<String> {
    match tokio::task::spawn_blocking(move || pdf_title_blocking(&bytes)).await {
        Ok(title) => title,
        Err(e) => {
            tracing::warn!("PDF title extraction worker failed: {}", e);
            None
        }
    }
}

/// Extracts the title of a complete PDF held in memory.
#[cfg(feature = "pdf")]
pub fn pdf_title_blocking(bytes: &[u8]) -> Option<String> {
    let document = match lopdf::Document::load_mem(bytes) {
        Ok(document) => document,
        Err(e) => {
            tracing::debug!("Unable to parse PDF of {} bytes: {}", bytes.len(), e);
            return None;
        }
    };

    [info_title(&document), xmp_title(&document)]
        .into_iter()
        .flatten()
        .map(|title| collapse_whitespace(&title))
        .find(|title| !title.is_empty())
}

#[cfg(not(feature = "pdf"))]
pub fn pdf_title_blocking(bytes: &[u8]) -> Option<String> {
    tracing::debug!("PDF support is disabled; ignoring {} bytes", bytes.len());
    None
}

#[cfg(feature = "pdf")]
fn resolve<'a>(document: &'a lopdf::Document, object: &'a lopdf::Object) -> Option<&'a lopdf::Object> {
    match object {
        lopdf::Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

#[cfg(feature = "pdf")]
fn info_title(document: &lopdf::Document) -> Option<String> {
    let info = resolve(document, document.trailer.get(b"Info").ok()?)?.as_dict().ok()?;
    let title = resolve(document, info.get(b"Title").ok()?)?;
    Some(decode_text_string(title.as_str().ok()?))
}

#[cfg(feature = "pdf")]
fn xmp_title(document: &lopdf::Document) -> Option<String> {
    let catalog = resolve(document, document.trailer.get(b"Root").ok()?)?.as_dict().ok()?;
    let stream = resolve(document, catalog.get(b"Metadata").ok()?)?.as_stream().ok()?;
    let xml = stream.decompressed_content().unwrap_or_else(|_| stream.content.clone());
    xmp::dc_title(&String::from_utf8_lossy(&xml))
}

/// Decodes a PDF text string: UTF-16BE or UTF-8 with a byte order mark,
/// otherwise PDFDocEncoding, which agrees with Windows-1252 on printable text.
#[cfg(feature = "pdf")]
fn decode_text_string(bytes: &[u8]) -> String {
    use encoding_rs::{UTF_16BE, WINDOWS_1252};

    if let Some(rest) = bytes.strip_prefix(&[0xfe, 0xff]) {
        UTF_16BE.decode_without_bom_handling(rest).0.into_owned()
    } else if let Some(rest) = bytes.strip_prefix(&[0xef, 0xbb, 0xbf]) {
        String::from_utf8_lossy(rest).into_owned()
    } else {
        WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned()
    }
}

#[cfg(feature = "pdf")]
mod xmp {
    use regex::Regex;
    use std::sync::LazyLock;

    static DC_TITLE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<dc:title\b[^>]*>.*?<rdf:li\b[^>]*>(.*?)</rdf:li>").expect("static regex")
    });

    /// First `rdf:li` of the `dc:title` alternative.
    pub(super) fn dc_title(xml: &str) -> Option<String> {
        let title = DC_TITLE.captures(xml)?.get(1)?.as_str();
        Some(unescape(title))
    }

    fn unescape(text: &str) -> String {
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_dc_title() {
            let xml = r#"<x:xmpmeta><rdf:RDF><rdf:Description>
                <dc:title><rdf:Alt><rdf:li xml:lang="x-default">Deep &amp; Wide</rdf:li></rdf:Alt></dc:title>
                </rdf:Description></rdf:RDF></x:xmpmeta>"#;
            assert_eq!(dc_title(xml).as_deref(), Some("Deep & Wide"));
        }

        #[test]
        fn test_dc_title_missing() {
            assert_eq!(dc_title("<dc:creator><rdf:Seq><rdf:li>A</rdf:li></rdf:Seq></dc:creator>"), None);
        }
    }
}
