//! Error types for URL title resolution.
//!
//! This module defines the main error type [`UrlTitleError`]. Errors raised
//! while resolving a title are tagged with an [`ErrorKind`] so callers can
//! tell a permanent failure from one where every attempt was used up.
//!
//! Resolution errors are logged once, at error severity, when they are
//! constructed through [`UrlTitleError::unrecoverable`],
//! [`UrlTitleError::attempts_exhausted`] and friends. Propagating them with
//! `?` does not log again.
//!
//! # Example
//!
//! ```rust
//! use urltitle_core::{ErrorKind, UrlTitleError};
//!
//! let err = UrlTitleError::unrecoverable("https://example.com/x", "HTTP status 404 Not Found");
//! assert_eq!(err.kind(), ErrorKind::Unrecoverable);
//! ```

use std::fmt;

use thiserror::Error;

/// Coarse classification of a raised error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request can never succeed as issued and was not retried.
    Unrecoverable,
    /// A transient failure persisted across every allowed attempt.
    RetryExhausted,
}

/// Main error type for title resolution.
#[derive(Error, Debug)]
pub enum UrlTitleError {
    /// A URL that cannot be parsed into a request. Never retried.
    #[error("Unrecoverable error processing request for title of URL {url}. The error is: invalid URL: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A request failed in a way that will not be reattempted.
    ///
    /// Malformed URLs, TLS certificate verification failures and HTTP
    /// statuses in the configured unrecoverable set end up here.
    #[error("Unrecoverable error processing request for title of URL {url}. {reason}")]
    Unrecoverable { url: String, reason: String },

    /// Every attempt failed with a retryable error.
    #[error("Exhausted all {attempts} attempts for request for title of URL {url}. {reason}")]
    AttemptsExhausted { url: String, attempts: u32, reason: String },

    /// A URL without a scheme failed under every guessed scheme.
    #[error("Exhausted all scheme guesses ({schemes}) for URL {url} with a missing scheme.")]
    SchemeGuessesExhausted { url: String, schemes: String },

    /// The rewrite/redirect chain for one resolution grew past the hop limit.
    #[error("Resolution of URL {url} exceeded the limit of {hops} rewrite hops.")]
    TooManyHops { url: String, hops: usize },

    /// HTTP client construction errors from reqwest.
    #[error("HTTP client error: {0}")]
    HttpClient(reqwest::Error),

    /// Site override errors.
    ///
    /// Returned when an override file or built-in override entry is invalid.
    #[error("Site override error: {0}")]
    SiteConfigError(String),

    /// Reader configuration errors.
    ///
    /// Returned by [`crate::UrlTitleConfig::validate`] for settings that
    /// would make every resolution fail.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl UrlTitleError {
    /// Creates an [`UrlTitleError::Unrecoverable`] and logs it.
    pub fn unrecoverable(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unrecoverable { url: url.into(), reason: reason.into() }.logged()
    }

    /// Creates an [`UrlTitleError::InvalidUrl`] and logs it.
    pub fn invalid_url(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidUrl { url: url.into(), reason: reason.to_string() }.logged()
    }

    /// Creates an [`UrlTitleError::HttpClient`] and logs it.
    pub fn http_client(error: reqwest::Error) -> Self {
        Self::HttpClient(error).logged()
    }

    /// Creates an [`UrlTitleError::ConfigError`] and logs it.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::ConfigError(reason.into()).logged()
    }

    /// Creates an [`UrlTitleError::AttemptsExhausted`] and logs it.
    pub fn attempts_exhausted(url: impl Into<String>, attempts: u32, reason: impl Into<String>) -> Self {
        Self::AttemptsExhausted { url: url.into(), attempts, reason: reason.into() }.logged()
    }

    /// Creates an [`UrlTitleError::SchemeGuessesExhausted`] and logs it.
    pub fn scheme_guesses_exhausted(url: impl Into<String>, schemes: &[String]) -> Self {
        Self::SchemeGuessesExhausted { url: url.into(), schemes: schemes.join(", ") }.logged()
    }

    /// Creates an [`UrlTitleError::TooManyHops`] and logs it.
    pub fn too_many_hops(url: impl Into<String>, hops: usize) -> Self {
        Self::TooManyHops { url: url.into(), hops }.logged()
    }

    fn logged(self) -> Self {
        tracing::error!("{}", self);
        self
    }

    /// Returns the kind of this error.
    ///
    /// Only [`UrlTitleError::AttemptsExhausted`] is `RetryExhausted`;
    /// everything else is permanent for the URL as given.
    pub fn kind(&self) -> ErrorKind {
        match self {
            UrlTitleError::AttemptsExhausted { .. } => ErrorKind::RetryExhausted,
            _ => ErrorKind::Unrecoverable,
        }
    }
}

/// Result type alias for UrlTitleError.
pub type Result<T> = std::result::Result<T, UrlTitleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url() {
        let err = UrlTitleError::invalid_url("not a url", "relative URL without a base");
        assert_eq!(err.kind(), ErrorKind::Unrecoverable);
        assert!(err.to_string().contains("invalid URL: relative URL without a base"));
    }

    #[test]
    fn test_http_client_error() {
        let source = reqwest::Client::new().get("not a url").build().unwrap_err();
        let err = UrlTitleError::http_client(source);
        assert!(matches!(err, UrlTitleError::HttpClient(_)));
        assert_eq!(err.kind(), ErrorKind::Unrecoverable);
        assert!(err.to_string().starts_with("HTTP client error"));
    }

    #[test]
    fn test_config_error() {
        let err = UrlTitleError::config("max_attempts must be at least 1");
        assert_eq!(err.kind(), ErrorKind::Unrecoverable);
        assert_eq!(err.to_string(), "Configuration error: max_attempts must be at least 1");
    }

    #[test]
    fn test_attempts_exhausted_kind() {
        let err = UrlTitleError::attempts_exhausted("https://example.com", 3, "timed out");
        assert_eq!(err.kind(), ErrorKind::RetryExhausted);
        assert!(err.to_string().contains("all 3 attempts"));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_unrecoverable_kind() {
        let err = UrlTitleError::unrecoverable("https://example.com", "HTTP status 404 Not Found");
        assert_eq!(err.kind(), ErrorKind::Unrecoverable);
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_scheme_guesses_message() {
        let schemes = vec!["https".to_string(), "http".to_string()];
        let err = UrlTitleError::scheme_guesses_exhausted("example.com", &schemes);
        assert!(err.to_string().contains("(https, http)"));
        assert_eq!(err.kind(), ErrorKind::Unrecoverable);
    }
}
