//! Condition cells: the mini-language of decision-table input columns
//!
//! Each rule cell holds free text. It is parsed once, when the table is
//! compiled, into a [`ConditionExpr`]:
//!
//! | Cell text            | Expression                                   |
//! |----------------------|----------------------------------------------|
//! | *(empty)*            | `Empty`: field unconstrained                 |
//! | `<= 100`, `>2`       | `Compare { op, threshold }`                  |
//! | `3`                  | `Compare { op: Eq, threshold: 3 }`           |
//! | `2, 3, 4`            | `NumberList`: numeric equality set           |
//! | `"office"`, `office` | `Equals`: case-insensitive text equality     |
//! | `"a", "b"; c`        | `OneOf`: comma/semicolon/newline option set  |
//! | `<= lots`            | `Malformed`: never satisfied by a number     |
//!
//! Option lists are split by a quote-aware tokenizer: separators inside a
//! quoted token are kept.

use crate::util::{is_quoted, parse_f64, unquote};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum CompareOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
}

impl CompareOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Eq => lhs == rhs,
        }
    }

    /// Strip a leading operator, longest first
    fn split_prefix(text: &str) -> Option<(CompareOp, &str)> {
        [
            ("<=", CompareOp::Le),
            (">=", CompareOp::Ge),
            ("<", CompareOp::Lt),
            (">", CompareOp::Gt),
        ]
        .into_iter()
        .find_map(|(prefix, op)| text.strip_prefix(prefix).map(|rest| (op, rest)))
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Le => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Ge => write!(f, ">="),
            CompareOp::Eq => write!(f, "=="),
        }
    }
}

/// Parsed condition expression
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionExpr {
    /// No constraint on the field
    Empty,
    /// `<`, `<=`, `>`, `>=` against a threshold, or a bare number (`==`)
    Compare { op: CompareOp, threshold: f64 },
    /// List whose every element is a number; `options` keeps the text form
    NumberList { numbers: Vec<f64>, options: Vec<String> },
    /// Single literal, lower-cased, quotes removed
    Equals { literal: String, quoted: bool },
    /// Option list, lower-cased, quotes removed
    OneOf(Vec<String>),
    /// Operator prefix followed by something that is not a number
    Malformed,
}

/// A condition cell: the raw text and its parsed form
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    raw: String,
    expr: ConditionExpr,
}

impl Condition {
    /// Parse a cell. Never fails: text that cannot be interpreted becomes
    /// [`ConditionExpr::Malformed`].
    pub fn parse(text: &str) -> Self {
        let raw = text.trim().to_string();
        let expr = parse_expr(&raw);
        Self { raw, expr }
    }

    pub fn empty() -> Self {
        Self {
            raw: String::new(),
            expr: ConditionExpr::Empty,
        }
    }

    /// Trimmed cell text as authored
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn expr(&self) -> &ConditionExpr {
        &self.expr
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.expr, ConditionExpr::Empty)
    }

    /// Operator and threshold when the condition is a single numeric comparison
    pub fn numeric(&self) -> Option<(CompareOp, f64)> {
        match self.expr {
            ConditionExpr::Compare { op, threshold } => Some((op, threshold)),
            _ => None,
        }
    }
}

impl Default for Condition {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<&str> for Condition {
    fn from(s: &str) -> Self {
        Condition::parse(s)
    }
}

fn parse_expr(text: &str) -> ConditionExpr {
    if text.is_empty() {
        return ConditionExpr::Empty;
    }

    if let Some((op, rest)) = CompareOp::split_prefix(text) {
        return match parse_f64(rest) {
            Some(threshold) => ConditionExpr::Compare { op, threshold },
            None => ConditionExpr::Malformed,
        };
    }

    if is_list(text) {
        let options = split_options(&text.to_lowercase());
        let numbers: Option<Vec<f64>> = options.iter().map(|o| parse_f64(o)).collect();
        return match numbers {
            Some(numbers) if !numbers.is_empty() => ConditionExpr::NumberList { numbers, options },
            _ => ConditionExpr::OneOf(options),
        };
    }

    if is_quoted(text) {
        return ConditionExpr::Equals {
            literal: unquote(text).to_lowercase(),
            quoted: true,
        };
    }

    match parse_f64(text) {
        Some(threshold) => ConditionExpr::Compare {
            op: CompareOp::Eq,
            threshold,
        },
        None => ConditionExpr::Equals {
            literal: text.to_lowercase(),
            quoted: false,
        },
    }
}

fn is_list(text: &str) -> bool {
    text.contains([',', ';', '\n', '\r'])
}

/// Split an option list on `,`, `;` and line breaks.
///
/// A token that opens with `"` runs to the matching close quote, so
/// separators inside it are kept; `""` inside a quoted token is a literal
/// quote. Tokens are trimmed, unquoted once more, and empty tokens dropped.
pub fn split_options(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' | ';' | '\n' | '\r' if !in_quotes => {
                push_token(&mut tokens, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_token(&mut tokens, &current);
    tokens
}

fn push_token(tokens: &mut Vec<String>, raw: &str) {
    let token = unquote(raw).trim();
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        assert!(Condition::parse("").is_empty());
        assert!(Condition::parse("   ").is_empty());
    }

    #[test]
    fn test_parse_comparisons() {
        assert_eq!(
            Condition::parse("<=100").expr(),
            &ConditionExpr::Compare { op: CompareOp::Le, threshold: 100.0 }
        );
        assert_eq!(
            Condition::parse(">= 2.5").expr(),
            &ConditionExpr::Compare { op: CompareOp::Ge, threshold: 2.5 }
        );
        assert_eq!(
            Condition::parse("< 3").expr(),
            &ConditionExpr::Compare { op: CompareOp::Lt, threshold: 3.0 }
        );
        assert_eq!(
            Condition::parse(">0").expr(),
            &ConditionExpr::Compare { op: CompareOp::Gt, threshold: 0.0 }
        );
        assert_eq!(
            Condition::parse("12").expr(),
            &ConditionExpr::Compare { op: CompareOp::Eq, threshold: 12.0 }
        );
    }

    #[test]
    fn test_parse_malformed_comparison() {
        assert_eq!(Condition::parse("<= lots").expr(), &ConditionExpr::Malformed);
        assert_eq!(Condition::parse(">").expr(), &ConditionExpr::Malformed);
    }

    #[test]
    fn test_parse_number_list() {
        let cond = Condition::parse("2, 3,4");
        assert_eq!(
            cond.expr(),
            &ConditionExpr::NumberList {
                numbers: vec![2.0, 3.0, 4.0],
                options: vec!["2".into(), "3".into(), "4".into()],
            }
        );
    }

    #[test]
    fn test_parse_option_list() {
        let cond = Condition::parse("\"Office\", \"1a\";school\nHotel");
        assert_eq!(
            cond.expr(),
            &ConditionExpr::OneOf(vec![
                "office".into(),
                "1a".into(),
                "school".into(),
                "hotel".into()
            ])
        );
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(
            Condition::parse("\"Office\"").expr(),
            &ConditionExpr::Equals { literal: "office".into(), quoted: true }
        );
        assert_eq!(
            Condition::parse("true").expr(),
            &ConditionExpr::Equals { literal: "true".into(), quoted: false }
        );
    }

    #[test]
    fn test_split_options_keeps_quoted_separators() {
        assert_eq!(
            split_options("\"a, b\", c;\"d;e\""),
            vec!["a, b".to_string(), "c".to_string(), "d;e".to_string()]
        );
    }

    #[test]
    fn test_split_options_escaped_quote_and_blanks() {
        assert_eq!(
            split_options("\"say \"\"hi\"\"\",, x\r\n"),
            vec!["say \"hi\"".to_string(), "x".to_string()]
        );
    }

    #[test]
    fn test_raw_is_trimmed() {
        assert_eq!(Condition::parse("  <= 5 ").raw(), "<= 5");
        assert_eq!(Condition::parse("  <= 5 ").to_string(), "<= 5");
    }
}
