//! Compact duration strings
//!
//! Parses strings such as `1d2h30m` into seconds. Tokens are
//! `<integer><unit>` with unit one of `s`, `m`, `h`, `d`; anything between
//! tokens is skipped. The parser never fails: a result of 0 is how callers
//! detect a malformed duration.

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)([dhms])").expect("duration token pattern is valid"));

fn unit_seconds(unit: &str) -> u64 {
    match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        _ => 0,
    }
}

/// Convert a duration string to seconds
///
/// ```
/// use steward::duration::parse_duration;
///
/// assert_eq!(parse_duration("1d2h30m"), 95_400);
/// assert_eq!(parse_duration("tomorrow"), 0);
/// ```
pub fn parse_duration(text: &str) -> u64 {
    TOKEN
        .captures_iter(text)
        .filter_map(|caps| {
            // Values too large for u64 contribute nothing
            let value: u64 = caps[1].parse().ok()?;
            Some(value.saturating_mul(unit_seconds(&caps[2])))
        })
        .fold(0u64, u64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_unit() {
        assert_eq!(parse_duration("1d2h30m"), 95_400);
        assert_eq!(parse_duration("90s"), 90);
        assert_eq!(parse_duration("2h"), 7_200);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(parse_duration(""), 0);
    }

    #[test]
    fn test_unit_order_irrelevant() {
        assert_eq!(parse_duration("30m1h"), parse_duration("1h30m"));
        assert_eq!(parse_duration("30m1h"), 5_400);
    }

    #[test]
    fn test_separators_and_noise_ignored() {
        assert_eq!(parse_duration("1h 30m"), 5_400);
        assert_eq!(parse_duration("1h, 2x, 5s"), 3_605);
        assert_eq!(parse_duration("abc"), 0);
        assert_eq!(parse_duration("10"), 0);
        assert_eq!(parse_duration("5w"), 0);
    }

    #[test]
    fn test_repeated_units_accumulate() {
        assert_eq!(parse_duration("1m1m"), 120);
    }

    #[test]
    fn test_huge_values_saturate() {
        assert_eq!(parse_duration("99999999999999999999999s"), 0);
        assert_eq!(parse_duration("18446744073709551615d"), u64::MAX);
    }
}
