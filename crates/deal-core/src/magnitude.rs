//! Lenient numeric parsing for extracted company figures
//!
//! Extracted fields arrive as free-form text ("₹14L", "$2.5M", "25%",
//! "8 months"). Every parser here returns `0.0` for absent or unparseable
//! input instead of failing.

use regex::Regex;
use std::sync::LazyLock;

/// Leading decimal (optionally in exponent form) followed by an optional alphabetic unit
static LEADING_NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"((?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)\s*([A-Za-z]*)").ok()
});

/// Unit suffixes, matched case-insensitively in order.
///
/// Region-specific large-number words come first, then the generic
/// thousand/million/billion suffixes.
const UNIT_MULTIPLIERS: &[(&[&str], f64)] = &[
    (&["crore", "crores", "cr"], 10_000_000.0),
    (&["lakh", "lakhs", "lac", "lacs", "l"], 100_000.0),
    (&["thousand", "k"], 1_000.0),
    (&["million", "millions", "mn", "mm", "m"], 1_000_000.0),
    (&["billion", "billions", "bn", "b"], 1_000_000_000.0),
];

/// Split input into its leading number and the unit word right after it
fn leading_number(input: &str) -> Option<(f64, String)> {
    let regex = LEADING_NUMBER.as_ref()?;
    let cleaned = input.replace(',', "");
    let captures = regex.captures(&cleaned)?;
    let value = captures.get(1)?.as_str().parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    let unit = captures
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();
    Some((value, unit))
}

/// Multiplier for a unit word, `1.0` when the unit is not a magnitude suffix
pub fn unit_multiplier(unit: &str) -> f64 {
    let unit = unit.to_ascii_lowercase();
    UNIT_MULTIPLIERS
        .iter()
        .find(|(suffixes, _)| suffixes.contains(&unit.as_str()))
        .map_or(1.0, |(_, multiplier)| *multiplier)
}

/// Parse a currency-like magnitude such as `"₹14L"` or `"$2M"`
///
/// Non-numeric prefixes (currency symbols, words) are skipped, thousands
/// separators are ignored and a unit suffix scales the value.
///
/// ```
/// use deal_core::parse_magnitude;
///
/// assert_eq!(parse_magnitude("₹14L"), 1_400_000.0);
/// assert_eq!(parse_magnitude("$2M"), 2_000_000.0);
/// assert_eq!(parse_magnitude(""), 0.0);
/// ```
pub fn parse_magnitude(input: &str) -> f64 {
    leading_number(input).map_or(0.0, |(value, unit)| value * unit_multiplier(&unit))
}

/// Parse a percentage such as `"25%"` or `"25 percent"` into `25.0`
pub fn parse_percent(input: &str) -> f64 {
    leading_number(input).map_or(0.0, |(value, _)| value)
}

/// Parse a duration in months; years are converted (`"2 years"` -> `24.0`)
pub fn parse_months(input: &str) -> f64 {
    leading_number(input).map_or(0.0, |(value, unit)| {
        if unit.starts_with('y') {
            value * 12.0
        } else if unit.starts_with('w') {
            value * 12.0 / 52.0
        } else {
            value
        }
    })
}
