//! Reader configuration.
//!
//! [`UrlTitleConfig`] carries every tunable used while resolving a title:
//! request sizes per content kind, retry and timeout limits, the webcache
//! mirror prefix and cache bounds.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use urltitle_core::UrlTitleConfig;
//!
//! let config = UrlTitleConfig::builder()
//!     .max_attempts(5)
//!     .request_timeout(Duration::from_secs(30))
//!     .build();
//! assert_eq!(config.max_attempts, 5);
//! ```

use std::collections::HashSet;
use std::time::Duration;

use crate::error::{Result, UrlTitleError};
use crate::humanize::{KIB, MIB};

/// Prefix of the Google web cache mirror.
pub const DEFAULT_WEBCACHE_PREFIX: &str = "https://webcache.googleusercontent.com/search?q=cache:";

/// Desktop browser user agent sent unless a site override replaces it.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:76.0) Gecko/20100101 Firefox/76.0";

/// Kind of content a response is read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Html,
    Notebook,
    Pdf,
}

/// Eviction strategy for the reader's bounded caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Admission by frequency, eviction by recency (TinyLFU).
    #[default]
    TinyLfu,
    /// Plain least-recently-used.
    Lru,
}

/// Per-content-kind upper bounds on bytes read from a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxRequestSizes {
    pub html: usize,
    pub notebook: usize,
    pub pdf: usize,
}

impl MaxRequestSizes {
    /// Returns the bound for `kind`.
    pub fn get(&self, kind: ContentKind) -> usize {
        match kind {
            ContentKind::Html => self.html,
            ContentKind::Notebook => self.notebook,
            ContentKind::Pdf => self.pdf,
        }
    }
}

impl Default for MaxRequestSizes {
    fn default() -> Self {
        // Some retail pages only carry their title between 512K and 1M.
        Self { html: MIB, notebook: 8 * MIB, pdf: 8 * MIB }
    }
}

/// Configuration for [`crate::UrlTitleReader`].
#[derive(Debug, Clone)]
pub struct UrlTitleConfig {
    /// User agent sent with every request (default: desktop Firefox).
    pub user_agent: String,

    /// First read size for a host with no learned estimate (default: 8 KiB).
    pub default_request_size: usize,

    /// Lower bound on a learned estimate (default: 1 KiB).
    pub min_request_size: usize,

    /// Upper bounds on bytes read per content kind.
    pub max_request_sizes: MaxRequestSizes,

    /// Attempts per fetch, including the first (default: 3).
    pub max_attempts: u32,

    /// Socket-level timeout for each request (default: 15s).
    pub request_timeout: Duration,

    /// Statuses that fail a fetch immediately (default: 400, 401, 404).
    pub unrecoverable_statuses: HashSet<u16>,

    /// Prefix turning a URL into its webcache mirror URL.
    pub webcache_prefix: String,

    /// Schemes tried, in order, for a URL without one (default: https, http).
    pub scheme_guesses: Vec<String>,

    /// Content-type prefixes read as HTML. `*/*` is included because some
    /// publishers label HTML that way.
    pub html_content_types: Vec<String>,

    /// Content-type prefix under which notebooks are served.
    pub notebook_content_type: String,

    /// Content-type prefix of PDF documents.
    pub pdf_content_type: String,

    /// Byte markers identifying a captcha interstitial.
    pub captcha_markers: Vec<String>,

    /// Redirects followed within one request (default: 20).
    pub max_redirects: usize,

    /// Rewrite/redirect hops allowed for one resolution (default: 10).
    pub max_hops: usize,

    /// Maximum number of cached titles (default: 4096).
    pub title_cache_max_size: u64,

    /// Lifetime of a cached title (default: one week).
    pub title_cache_ttl: Duration,

    /// Maximum number of per-host content-amount estimates (default: 65536).
    pub estimate_cache_max_size: u64,

    /// Eviction strategy for both caches.
    pub cache_policy: CachePolicy,

    /// Whether TLS certificates are verified (default: true).
    pub verify_tls: bool,
}

impl Default for UrlTitleConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_request_size: 8 * KIB,
            min_request_size: KIB,
            max_request_sizes: MaxRequestSizes::default(),
            max_attempts: 3,
            request_timeout: Duration::from_secs(15),
            unrecoverable_statuses: HashSet::from([400, 401, 404]),
            webcache_prefix: DEFAULT_WEBCACHE_PREFIX.to_string(),
            scheme_guesses: vec!["https".to_string(), "http".to_string()],
            html_content_types: vec!["text/html".to_string(), "*/*".to_string()],
            notebook_content_type: "text/plain".to_string(),
            pdf_content_type: "application/pdf".to_string(),
            captcha_markers: vec!["distil_r_captcha.html".to_string()],
            max_redirects: 20,
            max_hops: 10,
            title_cache_max_size: 4 * KIB as u64,
            title_cache_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            estimate_cache_max_size: 64 * KIB as u64,
            cache_policy: CachePolicy::default(),
            verify_tls: true,
        }
    }
}

impl UrlTitleConfig {
    /// Creates a new builder for UrlTitleConfig.
    pub fn builder() -> UrlTitleConfigBuilder {
        UrlTitleConfigBuilder::new()
    }

    /// Rejects settings under which no title could ever be resolved.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(UrlTitleError::config("max_attempts must be at least 1"));
        }
        if self.default_request_size == 0 {
            return Err(UrlTitleError::config("default_request_size must be at least 1 byte"));
        }
        for kind in [ContentKind::Html, ContentKind::Notebook, ContentKind::Pdf] {
            if self.max_request_sizes.get(kind) == 0 {
                return Err(UrlTitleError::config(format!("max request size for {:?} must be at least 1 byte", kind)));
            }
        }
        if self.min_request_size > self.max_request_sizes.html {
            return Err(UrlTitleError::config("min_request_size exceeds the HTML max request size"));
        }
        Ok(())
    }

    /// Classifies a declared content type, which must already be lowercase.
    ///
    /// Notebooks additionally need a `.ipynb` path, which the caller checks.
    pub fn content_kind(&self, content_type: &str) -> Option<ContentKind> {
        if self.html_content_types.iter().any(|p| content_type.starts_with(p.as_str())) {
            Some(ContentKind::Html)
        } else if content_type.starts_with(&self.pdf_content_type) {
            Some(ContentKind::Pdf)
        } else if content_type.starts_with(&self.notebook_content_type) {
            Some(ContentKind::Notebook)
        } else {
            None
        }
    }
}

/// Builder for UrlTitleConfig.
pub struct UrlTitleConfigBuilder {
    config: UrlTitleConfig,
}

impl UrlTitleConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: UrlTitleConfig::default() }
    }

    /// Sets the default user agent.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.user_agent = value.into();
        self
    }

    /// Sets the first read size used for unknown hosts.
    pub fn default_request_size(mut self, value: usize) -> Self {
        self.config.default_request_size = value;
        self
    }

    /// Sets the lower bound on learned estimates.
    pub fn min_request_size(mut self, value: usize) -> Self {
        self.config.min_request_size = value;
        self
    }

    /// Sets the per-content-kind read bounds.
    pub fn max_request_sizes(mut self, value: MaxRequestSizes) -> Self {
        self.config.max_request_sizes = value;
        self
    }

    /// Sets the number of attempts per fetch.
    pub fn max_attempts(mut self, value: u32) -> Self {
        self.config.max_attempts = value;
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, value: Duration) -> Self {
        self.config.request_timeout = value;
        self
    }

    /// Sets the statuses that fail without retry.
    pub fn unrecoverable_statuses(mut self, value: impl IntoIterator<Item = u16>) -> Self {
        self.config.unrecoverable_statuses = value.into_iter().collect();
        self
    }

    /// Sets the webcache mirror prefix.
    pub fn webcache_prefix(mut self, value: impl Into<String>) -> Self {
        self.config.webcache_prefix = value.into();
        self
    }

    /// Sets the schemes tried for scheme-less URLs.
    pub fn scheme_guesses(mut self, value: Vec<String>) -> Self {
        self.config.scheme_guesses = value;
        self
    }

    /// Sets the captcha markers.
    pub fn captcha_markers(mut self, value: Vec<String>) -> Self {
        self.config.captcha_markers = value;
        self
    }

    /// Sets the redirect limit per request.
    pub fn max_redirects(mut self, value: usize) -> Self {
        self.config.max_redirects = value;
        self
    }

    /// Sets the rewrite hop limit per resolution.
    pub fn max_hops(mut self, value: usize) -> Self {
        self.config.max_hops = value;
        self
    }

    /// Sets the title cache capacity.
    pub fn title_cache_max_size(mut self, value: u64) -> Self {
        self.config.title_cache_max_size = value;
        self
    }

    /// Sets the title cache lifetime.
    pub fn title_cache_ttl(mut self, value: Duration) -> Self {
        self.config.title_cache_ttl = value;
        self
    }

    /// Sets the estimate cache capacity.
    pub fn estimate_cache_max_size(mut self, value: u64) -> Self {
        self.config.estimate_cache_max_size = value;
        self
    }

    /// Sets the cache eviction strategy.
    pub fn cache_policy(mut self, value: CachePolicy) -> Self {
        self.config.cache_policy = value;
        self
    }

    /// Sets whether TLS certificates are verified.
    pub fn verify_tls(mut self, value: bool) -> Self {
        self.config.verify_tls = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> UrlTitleConfig {
        self.config
    }

    /// Builds and validates the config.
    pub fn try_build(self) -> Result<UrlTitleConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for UrlTitleConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
