//! Classification of failed requests and the retry decision.
//!
//! Failures are either permanent ([`FailureKind::Unrecoverable`]) or
//! transient ([`FailureKind::Transient`]). Transient failures are retried
//! immediately until the attempt budget runs out.

use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt;
use std::io;

use reqwest::StatusCode;

/// Why a single request attempt failed.
#[derive(Debug)]
pub enum FetchFailure {
    /// The client could not complete the request.
    Request(reqwest::Error),
    /// The server answered with an error status.
    Status(StatusCode),
}

/// Retry classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Malformed URL, TLS certificate failure or an unrecoverable status.
    Unrecoverable,
    /// Connection errors, timeouts and any other status.
    Transient,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry; the failure is permanent.
    Fail,
    /// Try again.
    Retry,
    /// Transient failure on the last allowed attempt.
    Exhausted,
}

/// Fixed-budget retry policy without backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1) }
    }

    /// Decide what follows a failed attempt.
    ///
    /// `attempt` is 1-based (1 = first attempt).
    pub fn decide(&self, attempt: u32, kind: FailureKind) -> RetryDecision {
        match kind {
            FailureKind::Unrecoverable => RetryDecision::Fail,
            FailureKind::Transient if attempt >= self.max_attempts => RetryDecision::Exhausted,
            FailureKind::Transient => RetryDecision::Retry,
        }
    }
}

impl FetchFailure {
    /// Classify against the configured set of unrecoverable statuses.
    pub fn kind(&self, unrecoverable_statuses: &HashSet<u16>) -> FailureKind {
        match self {
            FetchFailure::Status(status) if unrecoverable_statuses.contains(&status.as_u16()) => {
                FailureKind::Unrecoverable
            }
            FetchFailure::Status(_) => FailureKind::Transient,
            FetchFailure::Request(err) if err.is_builder() || is_certificate_error(err) => FailureKind::Unrecoverable,
            FetchFailure::Request(_) => FailureKind::Transient,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Status(status) => write!(f, "The error is: HTTP status {}", status),
            FetchFailure::Request(err) => {
                let kind = if err.is_timeout() {
                    "timeout"
                } else if err.is_connect() {
                    "connection error"
                } else if err.is_builder() {
                    "invalid request"
                } else if err.is_redirect() {
                    "redirect error"
                } else {
                    "request error"
                };
                write!(f, "The error is: {}: {}", kind, error_chain(err))
            }
        }
    }
}

/// Whether any error in the source chain is a certificate verification failure.
///
/// rustls errors are matched by type. They usually sit inside an
/// `io::Error`, whose `source()` skips the wrapped error, so those are
/// unwrapped explicitly. Other TLS backends are recognized by message.
fn is_certificate_error(err: &(dyn StdError + 'static)) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if is_rustls_certificate_error(cause) {
            return true;
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>()
            && let Some(inner) = io_err.get_ref()
            && is_rustls_certificate_error(inner)
        {
            return true;
        }
        if cause.to_string().to_lowercase().contains("certificate verify failed") {
            return true;
        }
        source = cause.source();
    }
    false
}

fn is_rustls_certificate_error(err: &(dyn StdError + 'static)) -> bool {
    matches!(
        err.downcast_ref::<rustls::Error>(),
        Some(rustls::Error::InvalidCertificate(_) | rustls::Error::InvalidCertRevocationList(_))
    )
}

/// The error and its causes joined with `: `.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        if !message.contains(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses() -> HashSet<u16> {
        HashSet::from([400, 401, 404])
    }

    #[test]
    fn test_unrecoverable_statuses() {
        assert_eq!(FetchFailure::Status(StatusCode::NOT_FOUND).kind(&statuses()), FailureKind::Unrecoverable);
        assert_eq!(FetchFailure::Status(StatusCode::UNAUTHORIZED).kind(&statuses()), FailureKind::Unrecoverable);
        assert_eq!(
            FetchFailure::Status(StatusCode::INTERNAL_SERVER_ERROR).kind(&statuses()),
            FailureKind::Transient
        );
        assert_eq!(FetchFailure::Status(StatusCode::FORBIDDEN).kind(&statuses()), FailureKind::Transient);
    }

    #[test]
    fn test_builder_error_is_unrecoverable() {
        let err = reqwest::Client::new().get("not a url").build().unwrap_err();
        assert_eq!(FetchFailure::Request(err).kind(&statuses()), FailureKind::Unrecoverable);
    }

    #[test]
    fn test_policy_decisions() {
        let policy = RetryPolicy::new(3);
        assert_eq!(policy.decide(1, FailureKind::Transient), RetryDecision::Retry);
        assert_eq!(policy.decide(2, FailureKind::Transient), RetryDecision::Retry);
        assert_eq!(policy.decide(3, FailureKind::Transient), RetryDecision::Exhausted);
        assert_eq!(policy.decide(1, FailureKind::Unrecoverable), RetryDecision::Fail);
    }

    #[test]
    fn test_policy_at_least_one_attempt() {
        let policy = RetryPolicy::new(0);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.decide(1, FailureKind::Transient), RetryDecision::Exhausted);
    }

    #[derive(Debug)]
    struct Wrapped(Box<dyn StdError + Send + Sync>);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(self.0.as_ref())
        }
    }

    #[test]
    fn test_rustls_certificate_error_in_io_error() {
        let tls = rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer);
        let err = Wrapped(Box::new(io::Error::new(io::ErrorKind::InvalidData, tls)));
        assert!(is_certificate_error(&err));
    }

    #[test]
    fn test_rustls_certificate_error_direct() {
        let tls = rustls::Error::InvalidCertificate(rustls::CertificateError::Expired);
        assert!(is_certificate_error(&Wrapped(Box::new(tls))));
    }

    #[test]
    fn test_certificate_error_by_message() {
        let openssl = io::Error::other("error:0A000086:SSL routines::certificate verify failed");
        assert!(is_certificate_error(&Wrapped(Box::new(openssl))));
    }

    #[test]
    fn test_other_errors_are_not_certificate_errors() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        assert!(!is_certificate_error(&Wrapped(Box::new(refused))));

        let tls = rustls::Error::InvalidMessage(rustls::InvalidMessage::MissingData("ServerHello"));
        let err = Wrapped(Box::new(io::Error::new(io::ErrorKind::InvalidData, tls)));
        assert!(!is_certificate_error(&err));
    }

    #[test]
    fn test_status_display() {
        let failure = FetchFailure::Status(StatusCode::NOT_FOUND);
        assert_eq!(failure.to_string(), "The error is: HTTP status 404 Not Found");
    }
}
