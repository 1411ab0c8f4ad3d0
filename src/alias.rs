//! Alias normalization for legacy annex tokens
//!
//! Older payloads identify annexes numerically (`1`, `1.1`) while current
//! tables use `1a` / `1b`. The alias table maps every known spelling to its
//! canonical token. The matcher applies it to both the context value and the
//! condition option, so a context from either payload shape classifies the
//! same way.

use crate::util::{first_number_token, unquote};
use crate::value::Value;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One canonical token and the spellings that resolve to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AliasEntry {
    pub canonical: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Canonicalizes equivalent tokens before equality comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
}

impl Default for AliasTable {
    /// BR18 annex aliases: `1`, `1.0` → `1a`; `1.1`, `11` → `1b`
    fn default() -> Self {
        Self::new(vec![
            AliasEntry {
                canonical: "1a".into(),
                aliases: vec!["1".into(), "1.0".into()],
            },
            AliasEntry {
                canonical: "1b".into(),
                aliases: vec!["1.1".into(), "11".into()],
            },
        ])
    }
}

impl AliasTable {
    pub fn new(entries: Vec<AliasEntry>) -> Self {
        Self { entries }
    }

    /// A table that knows no aliases
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    /// Canonical form of an exact token, or `None` when the token is not a
    /// known spelling.
    ///
    /// Case, surrounding whitespace, one pair of quotes and inner spaces are
    /// ignored. Longer descriptive strings are never rewritten. Canonical
    /// tokens map to themselves, so the mapping is idempotent.
    pub fn canonicalize(&self, token: &str) -> Option<&str> {
        let compact: String = unquote(token)
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if compact.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| {
                e.canonical.eq_ignore_ascii_case(&compact)
                    || e.aliases.iter().any(|a| a.eq_ignore_ascii_case(&compact))
            })
            .map(|e| e.canonical.as_str())
    }

    /// True when both tokens are known spellings of the same canonical token
    pub fn same(&self, a: &str, b: &str) -> Option<bool> {
        match (self.canonicalize(a), self.canonicalize(b)) {
            (Some(x), Some(y)) => Some(x == y),
            _ => None,
        }
    }

    /// Normalize a resolved stage output (or user input) into a token.
    ///
    /// Unlike [`canonicalize`](Self::canonicalize) this digs the token out of
    /// free text: `"Bilag 1 a"` → `1a`, `"bilag 1.1"` → `1b`, and falls back
    /// to the first number in the text.
    pub fn parse_token(&self, value: &Value) -> Option<String> {
        match value {
            Value::Absent => None,
            Value::Boolean(b) => Some(b.to_string()),
            Value::Number(n) => {
                let token = first_number_token(&n.to_string())?;
                Some(self.resolve(&token))
            }
            Value::Text(s) => self.parse_text_token(s),
        }
    }

    fn parse_text_token(&self, s: &str) -> Option<String> {
        let s = unquote(s).trim();
        if s.is_empty() {
            return None;
        }
        let low = s.to_lowercase();

        if let Some(canonical) = self.canonicalize(&low) {
            return Some(canonical.to_string());
        }

        // canonical tokens spelled inside text, tolerating a space: "bilag 1 a"
        for entry in &self.entries {
            if word_pattern(&entry.canonical, true).is_some_and(|re| re.is_match(&low)) {
                return Some(entry.canonical.clone());
            }
        }
        // decimal legacy spellings inside text: "bilag 1.1"
        for entry in &self.entries {
            let hit = entry
                .aliases
                .iter()
                .filter(|a| a.contains('.') && !a.ends_with(".0"))
                .any(|a| word_pattern(a, false).is_some_and(|re| re.is_match(&low)));
            if hit {
                return Some(entry.canonical.clone());
            }
        }

        first_number_token(s).map(|token| self.resolve(&token))
    }

    fn resolve(&self, token: &str) -> String {
        self.canonicalize(token)
            .map(str::to_string)
            .unwrap_or_else(|| token.to_string())
    }
}

/// `\b1\s*a\b` for `1a` when `spaced`, `\b1\.1\b` for `1.1` otherwise
fn word_pattern(token: &str, spaced: bool) -> Option<Regex> {
    let sep = if spaced { r"\s*" } else { "" };
    let body = token
        .to_lowercase()
        .chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect::<Vec<_>>()
        .join(sep);
    Regex::new(&format!(r"\b{}\b", body)).ok()
}
