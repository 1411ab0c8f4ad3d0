//! Shared utility functions
//!
//! Number-token and quoting helpers used by the condition parser, the
//! evaluator and the flow orchestrator.

use regex::Regex;
use std::sync::LazyLock;

static INT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+").expect("integer token pattern"));

static NUMBER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("number token pattern"));

/// Trim and remove one pair of surrounding double quotes
///
/// # Examples
/// ```
/// use fireclass::util::unquote;
/// assert_eq!(unquote("  \"office\" "), "office");
/// assert_eq!(unquote("\"\"x\"\""), "\"x\"");
/// assert_eq!(unquote("plain"), "plain");
/// assert_eq!(unquote("\""), "\"");
/// ```
pub fn unquote(s: &str) -> &str {
    let s = s.trim();
    if is_quoted(s) {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// True when `s` (already trimmed) is wrapped in a pair of double quotes
pub fn is_quoted(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

/// Parse a float, tolerating surrounding whitespace
pub fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// First integer in a piece of text: `"2, 3"` → 2, `"class 4"` → 4
///
/// # Examples
/// ```
/// use fireclass::util::first_int;
/// assert_eq!(first_int("2, 3"), Some(2));
/// assert_eq!(first_int(" BK 4 "), Some(4));
/// assert_eq!(first_int("none"), None);
/// ```
pub fn first_int(s: &str) -> Option<i64> {
    let s = first_list_item(s);
    INT_TOKEN
        .find(s)
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// First integer of a JSON cell; numbers are truncated
pub fn json_first_int(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        serde_json::Value::String(s) => first_int(s),
        _ => None,
    }
}

/// First number token of a piece of text, keeping decimals (`"1.1"` stays
/// `"1.1"`) but collapsing integral decimals (`"1.0"` → `"1"`)
///
/// # Examples
/// ```
/// use fireclass::util::first_number_token;
/// assert_eq!(first_number_token("bilag 1.1").as_deref(), Some("1.1"));
/// assert_eq!(first_number_token("1.0, 2").as_deref(), Some("1"));
/// assert_eq!(first_number_token("n/a"), None);
/// ```
pub fn first_number_token(s: &str) -> Option<String> {
    let s = first_list_item(s);
    let token = NUMBER_TOKEN.find(s)?.as_str();
    match token.parse::<f64>() {
        Ok(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", n as i64)),
        _ => Some(token.to_string()),
    }
}

/// JSON cell rendered as condition/output text; `null` is the empty cell
pub fn json_cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn first_list_item(s: &str) -> &str {
    let s = s.trim();
    match s.split_once(',') {
        Some((head, _)) => head.trim(),
        None => s,
    }
}
