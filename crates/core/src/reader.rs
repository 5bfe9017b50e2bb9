//! Title resolution.
//!
//! [`UrlTitleReader`] drives a URL through these stages:
//!
//! 1. scheme guessing for URLs without a scheme
//! 2. site-specific URL rewriting
//! 3. normalization of non-ASCII URLs
//! 4. redirection to the webcache mirror for sites configured to use it
//! 5. fetching, then dispatch on the declared content type
//!
//! Stages 2 to 5 may hand back a different URL to resolve in place of the
//! current one. Those hops are counted per resolution and bounded by
//! [`UrlTitleConfig::max_hops`]. Once a title is found, whitespace is
//! collapsed and the title rewrite rules of every host along the way are
//! applied, the last host first.
//!
//! # Example
//!
//! ```rust,no_run
//! use urltitle_core::{UrlTitleConfig, UrlTitleReader};
//!
//! # async fn run() -> urltitle_core::Result<()> {
//! let reader = UrlTitleReader::new(UrlTitleConfig::default())?;
//! let title = reader.title("https://www.python.org/").await?;
//! println!("{}", title);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use moka::sync::Cache;
use url::Url;

use crate::cache::{TitleCache, bounded_cache};
use crate::config::{ContentKind, UrlTitleConfig};
use crate::error::{Result, UrlTitleError};
use crate::estimator::ContentAmountEstimator;
use crate::fetch::{FetchOutcome, FetchedResponse, Fetcher};
use crate::formats::{notebook_title, pdf_title};
use crate::html::scan_html;
use crate::humanize::{collapse_whitespace, humanize_bytes};
use crate::netloc::{has_scheme, netloc_with_webcache};
use crate::siteconfig::{OverrideRegistry, SiteOverride, TitleSelector};

type TitleFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Title shown when a response declares neither a type nor a length.
pub const UNKNOWN_CONTENT_TYPE_TITLE: &str = "(unknown content type)";

/// Outcome of one resolution stage.
#[derive(Debug)]
enum Step {
    /// Title extracted from the document.
    Extracted(String),
    /// Title derived from response headers.
    Fallback(String),
    /// Final title from a nested resolution.
    Resolved(String),
    /// Resolve another URL in place of the current one.
    Follow { url: String, reason: &'static str },
}

/// Resolves URLs to human-readable titles.
///
/// A reader owns its caches; resolving through a fresh reader is the only
/// way to bypass them. It can be shared across tasks.
pub struct UrlTitleReader {
    config: UrlTitleConfig,
    overrides: Arc<OverrideRegistry>,
    fetcher: Fetcher,
    estimator: ContentAmountEstimator,
    titles: TitleCache,
    netlocs: Cache<String, String>,
}

impl UrlTitleReader {
    /// Creates a reader using the built-in site overrides.
    ///
    /// Fails on an invalid config or a broken built-in override entry.
    pub fn new(config: UrlTitleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_overrides(config, OverrideRegistry::builtin()?))
    }

    /// Creates a reader using the given site overrides.
    ///
    /// The config is used as given; see [`UrlTitleConfig::validate`].
    pub fn with_overrides(config: UrlTitleConfig, overrides: OverrideRegistry) -> Self {
        Self {
            fetcher: Fetcher::new(&config),
            estimator: ContentAmountEstimator::new(&config),
            titles: TitleCache::new(&config),
            netlocs: bounded_cache(config.estimate_cache_max_size, None, config.cache_policy),
            overrides: Arc::new(overrides),
            config,
        }
    }

    pub fn config(&self) -> &UrlTitleConfig {
        &self.config
    }

    pub fn overrides(&self) -> &OverrideRegistry {
        &self.overrides
    }

    /// Per-host read size estimates learned so far.
    pub fn estimator(&self) -> &ContentAmountEstimator {
        &self.estimator
    }

    /// Normalized host of `url`; memoized per URL.
    pub fn netloc(&self, url: &str) -> String {
        self.netlocs
            .get_with(url.to_string(), || netloc_with_webcache(url, &self.config.webcache_prefix))
    }

    /// Returns the title of `url`.
    ///
    /// Successful results are cached for the configured TTL. A response
    /// without a findable title still yields a title built from its
    /// headers; only failed fetches are errors.
    pub async fn title(&self, url: &str) -> Result<String> {
        self.cached(url.trim().to_string(), 0).await
    }

    fn cached(&self, url: String, depth: usize) -> TitleFuture<'_> {
        Box::pin(async move {
            if let Some(title) = self.titles.get(&url) {
                tracing::debug!("Returning cached title {:?} for URL {}", title, url);
                return Ok(title);
            }

            let title = self.resolve(&url, depth).await?;
            self.titles.insert(&url, &title);
            Ok(title)
        })
    }

    async fn resolve(&self, original: &str, depth: usize) -> Result<String> {
        tracing::debug!(
            "Received request for title of URL {} with up to {} attempts.",
            original,
            self.config.max_attempts
        );

        let mut url = original.to_string();
        let mut hosts: Vec<String> = Vec::new();
        let mut hops = 0;
        // Host whose title rules a nested resolution already applied.
        let mut covered: Option<String> = None;

        let title = loop {
            let host = self.netloc(&url);
            let site = self.overrides.lookup(&host);
            if !hosts.contains(&host) {
                hosts.push(host.clone());
            }

            match self.step(&url, &host, &site, depth + hops).await? {
                Step::Resolved(title) => {
                    covered = Some(host);
                    break title;
                }
                Step::Extracted(title) | Step::Fallback(title) => break title,
                Step::Follow { url: next, reason } => {
                    hops += 1;
                    if depth + hops > self.config.max_hops {
                        return Err(UrlTitleError::too_many_hops(original, self.config.max_hops));
                    }
                    tracing::info!("{} URL {} with {}", reason, url, next);
                    url = next;
                }
            }
        };

        let mut title = collapse_whitespace(&title);
        for host in hosts.iter().rev().filter(|host| covered.as_ref() != Some(*host)) {
            title = self.overrides.lookup(host).rewrite_title(&title);
        }
        Ok(title)
    }

    async fn step(&self, url: &str, host: &str, site: &SiteOverride, depth: usize) -> Result<Step> {
        if !has_scheme(url) {
            return self.guess_scheme(url, depth).await.map(Step::Resolved);
        }

        if let Some(rewritten) = site.rewrite_url(url) {
            return Ok(Step::Follow { url: rewritten, reason: "Substituted" });
        }

        if !url.is_ascii()
            && let Ok(parsed) = Url::parse(url)
            && parsed.as_str() != url
        {
            return Ok(Step::Follow { url: parsed.into(), reason: "ASCII encoded" });
        }

        let is_webcache = self.is_webcache(url);
        if site.uses_webcache() && !is_webcache && !self.config.webcache_prefix.is_empty() {
            tracing::info!("{} is configured to use the webcache mirror.", host);
            return Ok(Step::Follow { url: self.webcache_url(url), reason: "Mirrored" });
        }

        let user_agent = site.user_agent.as_deref().unwrap_or(&self.config.user_agent);
        if user_agent != self.config.user_agent {
            tracing::info!("Using custom user agent for {}: {}", host, user_agent);
        }

        let mut fetches = 1;
        loop {
            let response = match self.fetcher.fetch(url, user_agent, &site.http_headers).await? {
                FetchOutcome::PermanentRedirect(target) => {
                    return Ok(Step::Follow { url: target, reason: "Permanently redirected" });
                }
                FetchOutcome::Response(response) => response,
            };

            match self.dispatch(url, host, site, response, is_webcache, depth).await {
                Step::Extracted(title) if site.is_placeholder_title(&title) && fetches < self.config.max_attempts => {
                    tracing::warn!(
                        "Received placeholder title {:?} for URL {} in fetch {}. The URL will be fetched again.",
                        title,
                        url,
                        fetches
                    );
                    fetches += 1;
                }
                Step::Extracted(title) if site.substitutes_url_with_title() => {
                    return Ok(Step::Follow { url: title.trim().to_string(), reason: "Substituted title for" });
                }
                step => return Ok(step),
            }
        }
    }

    async fn guess_scheme(&self, url: &str, depth: usize) -> Result<String> {
        for scheme in &self.config.scheme_guesses {
            tracing::info!("The scheme {} will be attempted for URL {}", scheme, url);
            match self.cached(format!("{}://{}", scheme, url), depth + 1).await {
                Ok(title) => return Ok(title),
                Err(e) => tracing::warn!("The scheme {} failed for URL {}. {}", scheme, url, e),
            }
        }
        Err(UrlTitleError::scheme_guesses_exhausted(url, &self.config.scheme_guesses))
    }

    async fn dispatch(
        &self,
        url: &str,
        host: &str,
        site: &SiteOverride,
        mut response: FetchedResponse,
        is_webcache: bool,
        depth: usize,
    ) -> Step {
        let content_type = response.content_type.clone();
        let content_type_lower = content_type.as_deref().map(str::to_lowercase).unwrap_or_default();
        tracing::debug!(
            "Received response in attempt {} with declared content type {:?} and content length {} in {:.1}s.",
            response.attempt,
            content_type,
            response.content_length.map_or_else(|| "unknown".to_string(), humanize_bytes),
            response.elapsed.as_secs_f64()
        );

        match self.config.content_kind(&content_type_lower) {
            Some(ContentKind::Html) => {
                let selector = site.title_selector.as_ref().unwrap_or(&TitleSelector::TitleTag);
                let max_amount = self.config.max_request_sizes.get(ContentKind::Html);
                let scan = scan_html(
                    &mut response.body,
                    content_type.as_deref(),
                    response.content_encoding,
                    self.estimator.estimate(host),
                    max_amount,
                    selector,
                )
                .await;

                if let Some(found) = scan.title {
                    self.estimator.observe(host, &scan.content, &found.encoded, scan.wire_len);
                    tracing::info!(
                        "Returning HTML title {:?} for URL {} after reading {}.",
                        found.text,
                        url,
                        humanize_bytes(scan.wire_len as u64)
                    );
                    return Step::Extracted(found.text);
                }

                if !is_webcache && !self.config.webcache_prefix.is_empty() && self.has_captcha(&scan.content) {
                    tracing::info!(
                        "Content of URL {} has a captcha. A webcache version will be attempted.",
                        url
                    );
                    return Step::Follow { url: self.webcache_url(url), reason: "Mirrored captcha page" };
                }
                tracing::warn!(
                    "Unable to find title in HTML content of length {} for URL {}",
                    humanize_bytes(scan.wire_len as u64),
                    url
                );
            }
            Some(ContentKind::Pdf) => {
                if let Some(title) = self.read_pdf(url, &mut response).await {
                    tracing::info!("Returning PDF title {:?} for URL {}.", title, url);
                    return Step::Extracted(title);
                }

                if !is_webcache && !self.config.webcache_prefix.is_empty() {
                    tracing::debug!("A webcache version of the PDF URL {} will be attempted.", url);
                    match self.cached(self.webcache_url(url), depth + 1).await {
                        Ok(title) => return Step::Extracted(title),
                        Err(e) => tracing::debug!("The webcache version failed for the PDF URL {}. {}", url, e),
                    }
                }
            }
            Some(ContentKind::Notebook) if is_notebook_url(url) => {
                let max_amount = self.config.max_request_sizes.get(ContentKind::Notebook);
                let wire = response.body.read(max_amount).await;
                if wire.len() < max_amount {
                    let json = response.content_encoding.decode_partial(&wire);
                    if let Some(title) = notebook_title(&json) {
                        tracing::info!("Returning notebook title {:?} for URL {}.", title, url);
                        return Step::Extracted(title);
                    }
                    tracing::debug!("Unable to find title in notebook content for URL {}", url);
                } else {
                    tracing::debug!(
                        "Notebook for URL {} exceeds the configured max of {}.",
                        url,
                        humanize_bytes(max_amount as u64)
                    );
                }
            }
            Some(ContentKind::Notebook) | None => {}
        }

        let title = header_title(content_type.as_deref(), response.content_length);
        tracing::info!("Returning headers-derived title {:?} for URL {}", title, url);
        Step::Fallback(title)
    }

    /// Reads a PDF fully when it fits within the cap and extracts its title.
    async fn read_pdf(&self, url: &str, response: &mut FetchedResponse) -> Option<String> {
        let max_amount = self.config.max_request_sizes.get(ContentKind::Pdf);
        if let Some(length) = response.content_length
            && length > max_amount as u64
        {
            tracing::debug!(
                "Declared content length {} of PDF for URL {} exceeds the configured max of {} for reading it.",
                humanize_bytes(length),
                url,
                humanize_bytes(max_amount as u64)
            );
            return None;
        }

        let wire = response.body.read(max_amount).await;
        if wire.len() >= max_amount {
            tracing::debug!(
                "Unknown content length of PDF for URL {} likely exceeds the configured max of {} for reading it fully.",
                url,
                humanize_bytes(max_amount as u64)
            );
            return None;
        }

        let title = pdf_title(response.content_encoding.decode_partial(&wire)).await;
        if title.is_none() {
            tracing::debug!("Unable to find title in PDF content for URL {}", url);
        }
        title
    }

    fn is_webcache(&self, url: &str) -> bool {
        !self.config.webcache_prefix.is_empty() && url.starts_with(&self.config.webcache_prefix)
    }

    fn webcache_url(&self, url: &str) -> String {
        format!("{}{}", self.config.webcache_prefix, url)
    }

    fn has_captcha(&self, content: &[u8]) -> bool {
        self.config
            .captcha_markers
            .iter()
            .any(|marker| !marker.is_empty() && contains(content, marker.as_bytes()))
    }
}

impl std::fmt::Debug for UrlTitleReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlTitleReader")
            .field("config", &self.config)
            .field("overrides", &self.overrides.len())
            .field("titles", &self.titles)
            .field("estimator", &self.estimator)
            .finish()
    }
}

/// `"(<content-type>) (<length>)"` from whichever headers are present.
///
/// ```rust
/// use urltitle_core::header_title;
///
/// assert_eq!(header_title(Some("image/svg+xml"), Some(10 * 1024)), "(image/svg+xml) (10K)");
/// assert_eq!(header_title(Some("image/jpeg"), None), "(image/jpeg)");
/// ```
pub fn header_title(content_type: Option<&str>, content_length: Option<u64>) -> String {
    let parts: Vec<String> = content_type
        .map(str::to_string)
        .into_iter()
        .chain(content_length.map(humanize_bytes))
        .map(|part| format!("({})", part))
        .collect();

    if parts.is_empty() { UNKNOWN_CONTENT_TYPE_TITLE.to_string() } else { parts.join(" ") }
}

fn is_notebook_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|parsed| parsed.path().to_ascii_lowercase().ends_with(".ipynb"))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|window| window == needle)
}
