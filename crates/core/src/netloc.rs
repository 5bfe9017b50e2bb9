//! Host normalization.
//!
//! A normalized host ("netloc") is the lowercase `host[:port]` of a URL with
//! a leading `www.` removed. It keys both the site override registry and the
//! per-host content-amount estimates. URLs pointing at the webcache mirror
//! get a `webcache:` prefix in front of the mirrored URL's netloc so that a
//! mirror fetch never picks up the overrides of the site it mirrors.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::config::DEFAULT_WEBCACHE_PREFIX;

/// Logical prefix of the netloc of a webcache mirror URL.
pub const WEBCACHE_NETLOC_PREFIX: &str = "webcache:";

static SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("static regex"));

/// Returns whether `url` starts with an explicit `scheme://`.
pub fn has_scheme(url: &str) -> bool {
    SCHEME.is_match(url)
}

/// Normalizes `url` to its host using the default webcache prefix.
///
/// ```rust
/// use urltitle_core::netloc;
///
/// assert_eq!(netloc("https://www.Example.com/x"), "example.com");
/// assert_eq!(netloc("example.com/x"), "example.com");
/// assert_eq!(netloc("HTTP://EXAMPLE.COM"), "example.com");
/// ```
pub fn netloc(url: &str) -> String {
    netloc_with_webcache(url, DEFAULT_WEBCACHE_PREFIX)
}

/// Normalizes `url` to its host, treating `webcache_prefix` as the mirror.
pub fn netloc_with_webcache(url: &str, webcache_prefix: &str) -> String {
    let url = url.trim();
    if !webcache_prefix.is_empty()
        && let Some(mirrored) = url.strip_prefix(webcache_prefix)
    {
        return format!("{}{}", WEBCACHE_NETLOC_PREFIX, host_of(mirrored));
    }
    host_of(url)
}

fn host_of(url: &str) -> String {
    if !has_scheme(url) {
        // Without a scheme the first path segment would be read as the host.
        return host_of(&format!("https://{}", url));
    }

    let host = match Url::parse(url) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => authority_of(url),
        },
        Err(_) => authority_of(url),
    };

    let host = host.to_lowercase();
    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

/// Raw authority between `://` and the first path, query or fragment delimiter.
fn authority_of(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    authority.rsplit_once('@').map_or(authority, |(_, host)| host).to_string()
}
