//! HTTP fetching with retries.
//!
//! Every fetch gets its own client so that cookies set along a redirect
//! chain are carried through it and never leak into unrelated fetches.
//! Failed attempts are classified by [`crate::retry`]; permanent failures
//! end the fetch at once, transient ones are retried up to the configured
//! attempt count.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::header::{
    CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, LOCATION, USER_AGENT,
};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::body::{BodyReader, ContentEncoding};
use crate::config::UrlTitleConfig;
use crate::error::{Result, UrlTitleError};
use crate::retry::{FetchFailure, RetryDecision, RetryPolicy};

/// What a fetch produced.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A successful response whose body has not been read yet.
    Response(FetchedResponse),
    /// A 308 Permanent Redirect to the given absolute URL.
    PermanentRedirect(String),
}

/// Headers of a successful response plus its unread body.
#[derive(Debug)]
pub struct FetchedResponse {
    /// Raw Content-Type header.
    pub content_type: Option<String>,
    /// Declared Content-Length.
    pub content_length: Option<u64>,
    pub content_encoding: ContentEncoding,
    pub body: BodyReader,
    /// Attempt number that succeeded (1-based).
    pub attempt: u32,
    /// Time until the headers arrived.
    pub elapsed: Duration,
}

/// Issues GET requests with retry classification.
#[derive(Debug, Clone)]
pub struct Fetcher {
    config: UrlTitleConfig,
}

impl Fetcher {
    pub fn new(config: &UrlTitleConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Fetches `url` with the given user agent and extra headers.
    pub async fn fetch(
        &self,
        url: &str,
        user_agent: &str,
        extra_headers: &BTreeMap<String, String>,
    ) -> Result<FetchOutcome> {
        let parsed = Url::parse(url).map_err(|e| UrlTitleError::invalid_url(url, e))?;

        let client = self.client()?;
        let headers = request_headers(user_agent, extra_headers);
        let policy = RetryPolicy::new(self.config.max_attempts);
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!("Starting attempt {} processing request for title of URL {}", attempt, url);
            let start = Instant::now();

            let failure = match client.get(parsed.clone()).headers(headers.clone()).send().await {
                Ok(response) if response.status() == StatusCode::PERMANENT_REDIRECT => {
                    match redirect_target(&response) {
                        Some(target) => {
                            tracing::info!("URL {} is permanently redirected to {}", url, target);
                            return Ok(FetchOutcome::PermanentRedirect(target));
                        }
                        None => FetchFailure::Status(response.status()),
                    }
                }
                Ok(response) if !response.status().is_success() => FetchFailure::Status(response.status()),
                Ok(response) => {
                    return Ok(FetchOutcome::Response(FetchedResponse::new(response, attempt, start.elapsed())));
                }
                Err(e) => FetchFailure::Request(e),
            };

            tracing::warn!("Error in attempt {} processing request for title of URL {}. {}", attempt, url, failure);
            match policy.decide(attempt, failure.kind(&self.config.unrecoverable_statuses)) {
                RetryDecision::Retry => continue,
                RetryDecision::Fail => {
                    return Err(UrlTitleError::unrecoverable(
                        url,
                        format!("The request will not be reattempted. {}", failure),
                    ));
                }
                RetryDecision::Exhausted => {
                    return Err(UrlTitleError::attempts_exhausted(url, attempt, failure.to_string()));
                }
            }
        }
    }

    fn client(&self) -> Result<Client> {
        let max_redirects = self.config.max_redirects;
        let redirect_policy = Policy::custom(move |attempt| {
            if attempt.status() == StatusCode::PERMANENT_REDIRECT {
                attempt.stop()
            } else if attempt.previous().len() > max_redirects {
                attempt.error(format!("more than {} redirects", max_redirects))
            } else {
                attempt.follow()
            }
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect_policy)
            .connect_timeout(self.config.request_timeout)
            .read_timeout(self.config.request_timeout)
            .danger_accept_invalid_certs(!self.config.verify_tls)
            .build()
            .map_err(UrlTitleError::http_client)?;
        Ok(client)
    }
}

impl FetchedResponse {
    fn new(response: reqwest::Response, attempt: u32, elapsed: Duration) -> Self {
        let headers = response.headers();
        let content_type = header_str(headers, CONTENT_TYPE.as_str()).map(str::to_string);
        let content_length = header_str(headers, CONTENT_LENGTH.as_str()).and_then(|v| v.trim().parse().ok());
        let content_encoding = ContentEncoding::from_header(header_str(headers, CONTENT_ENCODING.as_str()));

        Self { content_type, content_length, content_encoding, body: BodyReader::new(response), attempt, elapsed }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn redirect_target(response: &reqwest::Response) -> Option<String> {
    let location = header_str(response.headers(), LOCATION.as_str())?;
    response.url().join(location.trim()).ok().map(|u| u.to_string())
}

/// User agent plus per-site headers. Invalid pairs are skipped.
fn request_headers(user_agent: &str, extra_headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(user_agent) {
        Ok(value) => {
            headers.insert(USER_AGENT, value);
        }
        Err(_) => tracing::warn!("Skipping invalid user agent {:?}", user_agent),
    }

    for (name, value) in extra_headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!("Skipping invalid header {}: {:?}", name, value),
        }
    }
    headers
}
