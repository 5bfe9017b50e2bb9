//! Per-host estimate of how many bytes to read before a title shows up.
//!
//! Pages on one site share their layout, so the extent at which the title
//! was found last time is a good first read size next time. Estimates live
//! in a bounded cache; concurrent observations for one host may overwrite
//! each other, which only affects the next read size.

use moka::sync::Cache;

use crate::cache::bounded_cache;
use crate::config::UrlTitleConfig;
use crate::humanize::{KIB, ceil_to_kib, humanize_bytes};

/// Slack added past the end of the title for the closing tag and jitter.
const PADDING: usize = KIB;

/// Adaptive per-host content-amount estimator.
#[derive(Clone)]
pub struct ContentAmountEstimator {
    guesses: Cache<String, usize>,
    default_amount: usize,
    min_amount: usize,
    max_amount: usize,
}

impl ContentAmountEstimator {
    pub fn new(config: &UrlTitleConfig) -> Self {
        Self {
            guesses: bounded_cache(config.estimate_cache_max_size, None, config.cache_policy),
            default_amount: config.default_request_size,
            min_amount: config.min_request_size,
            max_amount: config.max_request_sizes.html,
        }
    }

    /// Bytes to request first for `host`.
    pub fn estimate(&self, host: &str) -> usize {
        let guess = match self.guesses.get(host) {
            Some(guess) => guess.max(self.min_amount),
            None => self.default_amount,
        };
        tracing::debug!("Returning HTML content amount guess for {} of {}.", host, humanize_bytes(guess as u64));
        guess
    }

    /// The learned guess for `host`, if any.
    pub fn guess(&self, host: &str) -> Option<usize> {
        self.guesses.get(host)
    }

    /// Folds a successful extraction into the estimate for `host`.
    ///
    /// `content` is the decoded buffer and `title` the title as encoded in
    /// it. `wire_len` is the number of bytes received from the network; when
    /// it differs from the buffer length the body was compressed and the
    /// extent of the title cannot be mapped back, so the whole wire amount
    /// is the observation.
    pub fn observe(&self, host: &str, content: &[u8], title: &[u8], wire_len: usize) {
        let observation = if wire_len == content.len() {
            observed_extent(content, title)
        } else {
            ceil_to_kib(wire_len)
        };

        match self.guesses.get(host) {
            None => {
                let new_guess = observation.min(self.max_amount);
                self.guesses.insert(host.to_string(), new_guess);
                tracing::info!("Set HTML content amount guess for {} to {}.", host, humanize_bytes(new_guess as u64));
            }
            Some(old_guess) if old_guess != observation => {
                let new_guess = ceil_to_kib(old_guess.midpoint(observation)).min(self.max_amount);
                if new_guess != old_guess {
                    self.guesses.insert(host.to_string(), new_guess);
                    tracing::info!(
                        "Updated HTML content amount guess for {} with observation {} from {} to {}.",
                        host,
                        humanize_bytes(observation as u64),
                        humanize_bytes(old_guess as u64),
                        humanize_bytes(new_guess as u64)
                    );
                } else {
                    tracing::debug!(
                        "HTML content amount guess for {} of {} is unchanged.",
                        host,
                        humanize_bytes(old_guess as u64)
                    );
                }
            }
            Some(old_guess) => {
                tracing::debug!(
                    "HTML content amount guess for {} of {} remains unchanged.",
                    host,
                    humanize_bytes(old_guess as u64)
                );
            }
        }
    }
}

impl std::fmt::Debug for ContentAmountEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentAmountEstimator")
            .field("hosts", &self.guesses.entry_count())
            .field("default_amount", &self.default_amount)
            .field("max_amount", &self.max_amount)
            .finish()
    }
}

/// End of the last occurrence of `title` plus padding, capped at the
/// buffer length plus padding and rounded up to a kibibyte.
fn observed_extent(content: &[u8], title: &[u8]) -> usize {
    let extent = match rfind(content, title) {
        Some(index) => index + title.len() + PADDING,
        None => content.len(),
    };
    ceil_to_kib(extent.min(content.len() + PADDING))
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaxRequestSizes;

    fn estimator() -> ContentAmountEstimator {
        ContentAmountEstimator::new(&UrlTitleConfig::default())
    }

    #[test]
    fn test_estimate_default() {
        assert_eq!(estimator().estimate("example.com"), 8 * KIB);
    }

    #[test]
    fn test_observed_extent() {
        let mut content = vec![b' '; 3000];
        content.extend_from_slice(b"<title>Hello</title>");
        content.extend(vec![b' '; 5000]);

        // 3007 + 5 + 1024 = 4036 -> 4 KiB
        assert_eq!(observed_extent(&content, b"Hello"), 4 * KIB);
        assert_eq!(observed_extent(&content, b"absent"), ceil_to_kib(content.len()));
    }

    #[test]
    fn test_observed_extent_capped_by_content() {
        let content = b"<title>Short</title>";
        assert_eq!(observed_extent(content, b"Short"), KIB + KIB);
    }

    #[test]
    fn test_first_observation_seeds_guess() {
        let estimator = estimator();
        let mut content = vec![b' '; 10 * KIB];
        content.extend_from_slice(b"<title>T</title>");

        estimator.observe("example.com", &content, b"T", content.len());
        assert_eq!(estimator.guess("example.com"), Some(12 * KIB));
        assert_eq!(estimator.estimate("example.com"), 12 * KIB);
    }

    #[test]
    fn test_subsequent_observation_averages() {
        let estimator = estimator();
        let early = b"<title>T</title>".to_vec();
        let mut late = vec![b' '; 20 * KIB];
        late.extend_from_slice(b"<title>T</title>");

        estimator.observe("example.com", &early, b"T", early.len());
        assert_eq!(estimator.guess("example.com"), Some(2 * KIB));

        estimator.observe("example.com", &late, b"T", late.len());
        // mean(2K, 22K) = 12K
        assert_eq!(estimator.guess("example.com"), Some(12 * KIB));
    }

    #[test]
    fn test_guess_never_exceeds_max() {
        let config = UrlTitleConfig::builder()
            .max_request_sizes(MaxRequestSizes { html: 4 * KIB, ..Default::default() })
            .build();
        let estimator = ContentAmountEstimator::new(&config);

        for size in [100 * KIB, 50 * KIB, 3 * KIB, 200 * KIB] {
            let mut content = vec![b'x'; size];
            content.extend_from_slice(b"<title>T</title>");
            estimator.observe("example.com", &content, b"T", content.len());
            let guess = estimator.guess("example.com").unwrap();
            assert!(guess <= 4 * KIB, "guess {} exceeds max", guess);
        }
    }

    #[test]
    fn test_compressed_observation_uses_wire_length() {
        let estimator = estimator();
        let mut decoded = vec![b' '; 30 * KIB];
        decoded.extend_from_slice(b"<title>T</title>");

        estimator.observe("example.com", &decoded, b"T", 3000);
        assert_eq!(estimator.guess("example.com"), Some(3 * KIB));
    }

    #[test]
    fn test_min_applies_to_learned_guess() {
        let config = UrlTitleConfig::builder().default_request_size(64).min_request_size(KIB).build();
        let estimator = ContentAmountEstimator::new(&config);
        assert_eq!(estimator.estimate("example.com"), 64);

        estimator.observe("example.com", b"<title>T</title>", b"T", 16);
        assert!(estimator.estimate("example.com") >= KIB);
    }

    #[test]
    fn test_hosts_are_independent() {
        let estimator = estimator();
        estimator.observe("a.example", b"<title>T</title>", b"T", 16);
        assert!(estimator.guess("a.example").is_some());
        assert!(estimator.guess("b.example").is_none());
    }
}
