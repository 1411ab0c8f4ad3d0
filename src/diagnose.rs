//! Near-miss diagnostics
//!
//! When a table yields no match, rank the fields that would most likely
//! produce one if the caller supplied them.
//!
//! A *near miss* is a rule with no contradicted cell, at least one satisfied
//! cell, and at least one cell on a missing field. The best near misses
//! (most satisfied, then fewest missing) vote for their missing fields,
//! weighted by how much of the rule is already satisfied. Without any near
//! miss, every missing field the table constrains is ranked by how often it
//! is constrained.

use crate::condition::Condition;
use crate::matcher::matches;
use crate::table::{Column, DecisionTable};
use crate::value::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A field worth asking for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldHint {
    pub field: String,
    /// Column label to present to the user
    pub question: String,
    pub table_name: String,
    /// Number of retained rules that need this field
    pub missing_in_rule_count: usize,
    pub score: usize,
}

/// How one constrained cell stands against the context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellState {
    /// Field not supplied, null, or blank text
    Missing,
    Satisfied,
    Contradicted,
}

pub(crate) fn cell_state(
    table: &DecisionTable,
    column: &Column,
    condition: &Condition,
    context: &Context,
) -> CellState {
    match context.get(&column.field) {
        Some(value) if !value.is_missing() => {
            if matches(value, condition, table.aliases()) {
                CellState::Satisfied
            } else {
                CellState::Contradicted
            }
        }
        _ => CellState::Missing,
    }
}

struct NearMiss<'a> {
    satisfied: usize,
    missing: Vec<&'a str>,
}

/// Rank the fields that, if supplied, would most likely let `table` match.
///
/// At most `top_k` near-miss rules (at least one) contribute. Hints are
/// ordered by score, then rule count, both descending, then field name.
pub fn diagnose_missing_inputs(
    table: &DecisionTable,
    context: &Context,
    top_k: usize,
) -> Vec<FieldHint> {
    let mut near_misses: Vec<NearMiss> = table
        .rules()
        .iter()
        .filter_map(|rule| {
            let mut satisfied = 0;
            let mut missing = Vec::new();
            for (column, condition) in table.constraints(rule) {
                match cell_state(table, column, condition, context) {
                    CellState::Satisfied => satisfied += 1,
                    CellState::Missing => missing.push(column.field.as_str()),
                    CellState::Contradicted => return None,
                }
            }
            (satisfied > 0 && !missing.is_empty()).then_some(NearMiss { satisfied, missing })
        })
        .collect();

    // stable: equal keys keep table order
    near_misses.sort_by_key(|m| (std::cmp::Reverse(m.satisfied), m.missing.len()));
    near_misses.truncate(top_k.max(1));

    // field -> (score, count)
    let mut tally: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for near_miss in &near_misses {
        for &field in &near_miss.missing {
            let entry = tally.entry(field).or_default();
            entry.0 += near_miss.satisfied;
            entry.1 += 1;
        }
    }

    if tally.is_empty() {
        for rule in table.rules() {
            for (column, _) in table.constraints(rule) {
                let entry = tally.entry(column.field.as_str()).or_default();
                entry.0 += 1;
                entry.1 += 1;
            }
        }
        tally.retain(|field, _| context.is_missing(field));
    }

    let mut hints: Vec<FieldHint> = tally
        .into_iter()
        .map(|(field, (score, count))| FieldHint {
            field: field.to_string(),
            question: table.question_for(field).to_string(),
            table_name: table.name().to_string(),
            missing_in_rule_count: count,
            score,
        })
        .collect();

    hints.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.missing_in_rule_count.cmp(&a.missing_in_rule_count))
            .then_with(|| a.field.cmp(&b.field))
    });
    hints
}
