//! Lenient parsing of numeric form input.
//!
//! Form fields arrive as free text. Each parser here documents the value it
//! falls back to when the text is not a usable number, so callers never have
//! to guess how a malformed entry was interpreted.

use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([+-]?)(\d+)").expect("valid integer regex"));

static LEADING_DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").expect("valid decimal regex")
});

/// Slot capacity from text.
///
/// Reads the leading integer (`"12 cars"` is 12). Negative values clamp to 0,
/// values beyond `u32::MAX` saturate, and text without a leading integer is 0.
pub fn parse_capacity(value: &str) -> u32 {
    let Some(caps) = LEADING_INTEGER.captures(value) else {
        return 0;
    };
    if &caps[1] == "-" {
        return 0;
    }
    caps[2].parse::<u64>().map_or(u32::MAX, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Wash price from text.
///
/// Reads the leading decimal (`"45.5 EGP"` is 45.5). Zero, negative,
/// non-finite or unparsable input yields `None`, meaning "price not set".
pub fn parse_price(value: &str) -> Option<f64> {
    let caps = LEADING_DECIMAL.captures(value)?;
    let price = caps[1].parse::<f64>().ok()?;
    (price.is_finite() && price > 0.0).then_some(price)
}

/// Keep only ASCII digits.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}
