//! Resolve a URL to a human-readable title.
//!
//! HTML pages yield their `<title>` (or a site-specific selector), PDFs their
//! document title, Jupyter notebooks their Colab name and kernel. Anything
//! else is described by its declared content type and length.
//!
//! HTML bodies are read incrementally, starting from a per-host estimate of
//! how many bytes the title needs, so that large pages are rarely read in
//! full.
//!
//! # Example
//!
//! ```rust,no_run
//! use urltitle_core::{UrlTitleConfig, UrlTitleReader};
//!
//! # async fn run() -> urltitle_core::Result<()> {
//! let reader = UrlTitleReader::new(UrlTitleConfig::default())?;
//! assert_eq!(reader.title("https://www.python.org/").await?, "Welcome to Python.org");
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod cache;
pub mod config;
pub mod error;
pub mod estimator;
pub mod fetch;
pub mod formats;
pub mod html;
pub mod humanize;
pub mod netloc;
pub mod reader;
pub mod retry;
pub mod siteconfig;

pub use cache::TitleCache;
pub use config::{
    CachePolicy, ContentKind, DEFAULT_USER_AGENT, DEFAULT_WEBCACHE_PREFIX, MaxRequestSizes, UrlTitleConfig,
    UrlTitleConfigBuilder,
};
pub use error::{ErrorKind, Result, UrlTitleError};
pub use estimator::ContentAmountEstimator;
#[doc(hidden)]
pub use html::{FoundTitle, detect_encoding, title_from_partial_html};
pub use humanize::humanize_bytes;
pub use netloc::{netloc, netloc_with_webcache};
pub use reader::{UNKNOWN_CONTENT_TYPE_TITLE, UrlTitleReader, header_title};
pub use siteconfig::{
    ConfigLoader, ConfigLoaderBuilder, ConfigParser, Directive, OverrideRegistry, SiteOverride, TitleSelector,
};
