//! Shared string and value helpers.
//!
//! Slugs identify metric groups and sub-series; titles label filters and
//! charts. Both are derived from free-form names found in the records.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Label rendered for values that are absent from a record.
pub const ABSENT_LABEL: &str = "NA";

// Compiled once at startup
static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\p{Alphabetic}\p{Nd}]+").expect("Invalid regex: non-alphanumeric run")
});

static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("Invalid regex: camel boundary"));

static WORD_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_\-]+").expect("Invalid regex: word separator"));

/// Normalize a name into a URL-safe slug.
///
/// Lowercases the input and replaces every run of characters that are
/// neither letters nor decimal digits with a single `-`. Letters and digits
/// from any script are kept. Leading and trailing dashes are dropped.
///
/// # Example
///
/// ```rust,ignore
/// use schema_deduce::utils::slugify;
///
/// assert_eq!(slugify("CPU Load (%)"), "cpu-load");
/// assert_eq!(slugify("east-Temp"), "east-temp");
/// assert_eq!(slugify("Température"), "température");
/// ```
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Turn a key or metric name into a human-readable title.
///
/// Splits on underscores, dashes, whitespace and camelCase boundaries and
/// capitalizes each word. The rest of each word is kept as written, so
/// acronyms survive.
pub fn titleize(name: &str) -> String {
    let spaced = CAMEL_BOUNDARY.replace_all(name, "$1 $2");
    WORD_SEPARATOR
        .split(&spaced)
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Render a scalar JSON value as a dimension label.
///
/// Returns `None` for null, arrays and objects.
pub fn scalar_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
