//! Condition matcher: one context value against one condition cell
//!
//! Matching is exhaustive over [`Value`]:
//!
//! - `Empty` conditions accept anything, including a missing field.
//! - `Absent` never satisfies a non-empty condition.
//! - Numbers use numeric semantics against comparisons. Against number lists
//!   they match an element numerically or by exact text form, without
//!   aliases. Against literals and option lists they compare as text (`1`,
//!   not `1.0`).
//! - Booleans compare as `true` / `false` text.
//! - Text compares case-insensitively after trimming. A numeric-looking
//!   condition is compared as text against its raw cell, never coerced.
//!
//! Every text equality goes through the table's [`AliasTable`]: when both
//! sides are known spellings, canonical equality decides.

use crate::alias::AliasTable;
use crate::condition::{Condition, ConditionExpr};
use crate::value::{format_number, Value};

/// Does `value` satisfy `condition`?
pub fn matches(value: &Value, condition: &Condition, aliases: &AliasTable) -> bool {
    match (value, condition.expr()) {
        (_, ConditionExpr::Empty) => true,
        (Value::Absent, _) => false,
        (Value::Number(n), _) => match_number(*n, condition, aliases),
        (Value::Boolean(b), _) => match_text(if *b { "true" } else { "false" }, condition, aliases),
        (Value::Text(s), _) => match_text(s, condition, aliases),
    }
}

/// Like [`matches`], for a field that may not be in the context at all
pub fn matches_field(value: Option<&Value>, condition: &Condition, aliases: &AliasTable) -> bool {
    match value {
        Some(value) => matches(value, condition, aliases),
        None => condition.is_empty(),
    }
}

fn match_number(n: f64, condition: &Condition, aliases: &AliasTable) -> bool {
    match condition.expr() {
        ConditionExpr::Empty => true,
        ConditionExpr::Compare { op, threshold } => op.apply(n, *threshold),
        ConditionExpr::NumberList { numbers, options } => {
            let text = format_number(n);
            numbers.iter().any(|x| *x == n) || options.iter().any(|o| *o == text)
        }
        ConditionExpr::Equals { .. } | ConditionExpr::OneOf(_) => {
            match_text(&format_number(n), condition, aliases)
        }
        ConditionExpr::Malformed => false,
    }
}

fn match_text(value: &str, condition: &Condition, aliases: &AliasTable) -> bool {
    let value = value.trim().to_lowercase();
    match condition.expr() {
        ConditionExpr::Empty => true,
        ConditionExpr::Equals { literal, .. } => text_eq(&value, literal, aliases),
        ConditionExpr::OneOf(options) | ConditionExpr::NumberList { options, .. } => {
            in_options(&value, options, aliases)
        }
        ConditionExpr::Compare { .. } | ConditionExpr::Malformed => {
            text_eq(&value, &condition.raw().to_lowercase(), aliases)
        }
    }
}

fn text_eq(value: &str, literal: &str, aliases: &AliasTable) -> bool {
    aliases
        .same(value, literal)
        .unwrap_or_else(|| value == literal)
}

fn in_options(value: &str, options: &[String], aliases: &AliasTable) -> bool {
    if let Some(canonical) = aliases.canonicalize(value) {
        if options
            .iter()
            .any(|o| aliases.canonicalize(o) == Some(canonical))
        {
            return true;
        }
    }
    options.iter().any(|o| o == value)
}
