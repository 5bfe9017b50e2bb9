//! Byte-size formatting and small numeric/text helpers.

use regex::Regex;
use std::sync::LazyLock;

/// One kibibyte.
pub const KIB: usize = 1024;
/// One mebibyte.
pub const MIB: usize = KIB * KIB;

const SUFFIXES: [&str; 8] = ["K", "M", "G", "T", "P", "E", "Z", "Y"];

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Formats a byte count GNU-style: `512B`, `10K`, `3M`.
///
/// Values of a kibibyte and above are rounded to whole units.
pub fn humanize_bytes(bytes: u64) -> String {
    let base = KIB as f64;
    let value = bytes as f64;
    if value < base {
        return format!("{}B", bytes);
    }

    let mut unit = base * base;
    for suffix in SUFFIXES {
        if value < unit {
            return format!("{:.0}{}", base * value / unit, suffix);
        }
        unit *= base;
    }

    format!("{:.0}{}", base * value / (unit / base), SUFFIXES[SUFFIXES.len() - 1])
}

/// Rounds up to the next multiple of a kibibyte.
pub fn ceil_to_kib(value: usize) -> usize {
    value.div_ceil(KIB) * KIB
}

/// Collapses every whitespace run to a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_small() {
        assert_eq!(humanize_bytes(0), "0B");
        assert_eq!(humanize_bytes(512), "512B");
        assert_eq!(humanize_bytes(1023), "1023B");
    }

    #[test]
    fn test_humanize_units() {
        assert_eq!(humanize_bytes(1024), "1K");
        assert_eq!(humanize_bytes(10 * 1024), "10K");
        assert_eq!(humanize_bytes(3 * MIB as u64), "3M");
        assert_eq!(humanize_bytes(5 * 1024 * MIB as u64), "5G");
    }

    #[test]
    fn test_ceil_to_kib() {
        assert_eq!(ceil_to_kib(0), 0);
        assert_eq!(ceil_to_kib(1), 1024);
        assert_eq!(ceil_to_kib(1024), 1024);
        assert_eq!(ceil_to_kib(1025), 2048);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Hello \n\t world  "), "Hello world");
        assert_eq!(collapse_whitespace("plain"), "plain");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
