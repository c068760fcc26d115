//! Coercion of free-form field text into numbers and dates.
//!
//! Malformed input never produces an error: numbers fall back to `0`, matching
//! what a form field shows when the user types something unparseable.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static INTEGER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("integer pattern"));

static DECIMAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").expect("decimal pattern")
});

/// Leading whole number of `text`: `"3.7"` is `3`, `"abc"` is `0`.
pub fn parse_quantity(text: &str) -> f64 {
    INTEGER_PREFIX
        .captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Leading decimal number of `text`: `"12.5x"` is `12.5`, `""` is `0`.
pub fn parse_price(text: &str) -> f64 {
    DECIMAL_PREFIX
        .captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Shortest decimal form of a quantity: `3`, `2.5`.
pub fn display_quantity(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("3"), 3.0);
        assert_eq!(parse_quantity(" 3.7"), 3.0);
        assert_eq!(parse_quantity("12 boxes"), 12.0);
        assert_eq!(parse_quantity("-2"), -2.0);
        assert_eq!(parse_quantity("abc"), 0.0);
        assert_eq!(parse_quantity(""), 0.0);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("9.99"), 9.99);
        assert_eq!(parse_price("12.5x"), 12.5);
        assert_eq!(parse_price(".5"), 0.5);
        assert_eq!(parse_price("1e2"), 100.0);
        assert_eq!(parse_price("$10"), 0.0);
        assert_eq!(parse_price("1e999"), 0.0);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date("29/02/2024"), None);
    }

    #[test]
    fn test_display_quantity() {
        assert_eq!(display_quantity(3.0), "3");
        assert_eq!(display_quantity(2.5), "2.5");
    }
}
