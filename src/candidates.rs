//! Candidate output enumeration
//!
//! Given partial input, list every output value that some rule could still
//! produce: rules contradicted by a supplied field are dropped, fields not
//! yet supplied are reported as what is still needed.

use crate::diagnose::{cell_state, CellState};
use crate::table::DecisionTable;
use crate::util::json_cell_text;
use crate::value::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An output value still reachable from the current context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub value: serde_json::Value,
    pub missing_fields: Vec<String>,
    pub missing_questions: Vec<String>,
    /// Constrained cells the context already satisfies
    pub satisfied: usize,
    pub missing_count: usize,
    pub rule_number: usize,
}

impl Candidate {
    fn rank(&self) -> (usize, std::cmp::Reverse<usize>, usize) {
        (self.missing_count, std::cmp::Reverse(self.satisfied), self.rule_number)
    }
}

/// Enumerate the values of `output_field` (the first output when `None`)
/// not contradicted by `context`.
///
/// One candidate per distinct value, from the rule needing the fewest missing
/// fields, then satisfying the most cells, then appearing first. Ordered by
/// missing count, satisfied count descending, then value text; at most
/// `limit` entries.
pub fn enumerate_candidates(
    table: &DecisionTable,
    context: &Context,
    output_field: Option<&str>,
    limit: usize,
) -> Vec<Candidate> {
    let output_index = match output_field {
        Some(field) => table.output_index(field),
        None => (!table.outputs().is_empty()).then_some(0),
    };
    let Some(output_index) = output_index else {
        return Vec::new();
    };

    let mut by_value: HashMap<String, Candidate> = HashMap::new();

    'rules: for (index, rule) in table.rules().iter().enumerate() {
        let mut satisfied = 0;
        let mut missing_fields = Vec::new();
        for (column, condition) in table.constraints(rule) {
            match cell_state(table, column, condition, context) {
                CellState::Satisfied => satisfied += 1,
                CellState::Missing => missing_fields.push(column.field.clone()),
                CellState::Contradicted => continue 'rules,
            }
        }

        let value = table.output_value(rule, output_index);
        if value.is_null() || value.as_str() == Some("") {
            continue;
        }

        let candidate = Candidate {
            missing_questions: missing_fields
                .iter()
                .map(|f| table.question_for(f).to_string())
                .collect(),
            missing_count: missing_fields.len(),
            missing_fields,
            satisfied,
            rule_number: index + 1,
            value,
        };

        // keyed by JSON text so "1" and 1 stay distinct
        let key = candidate.value.to_string();
        match by_value.get(&key) {
            Some(prev) if prev.rank() <= candidate.rank() => {}
            _ => {
                by_value.insert(key, candidate);
            }
        }
    }

    let mut candidates: Vec<Candidate> = by_value.into_values().collect();
    candidates.sort_by(|a, b| {
        a.missing_count
            .cmp(&b.missing_count)
            .then(b.satisfied.cmp(&a.satisfied))
            .then_with(|| json_cell_text(&a.value).cmp(&json_cell_text(&b.value)))
            .then(a.rule_number.cmp(&b.rule_number))
    });
    candidates.truncate(limit);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn table() -> DecisionTable {
        DecisionTable::from_json(
            &json!({
                "id": "rk",
                "name": "Risikoklasse",
                "inputs": [
                    { "id": "i1", "field": "anvendelseskategori", "name": "Use category" },
                    { "id": "i2", "field": "floors", "name": "Number of floors" },
                    { "id": "i3", "field": "sprinklered" }
                ],
                "outputs": [
                    { "id": "o1", "field": "risikoklasse" },
                    { "id": "o2", "field": "note" }
                ],
                "rules": [
                    { "i1": "1", "i2": "<=2", "i3": "", "o1": "1", "o2": "low" },
                    { "i1": "1", "i2": ">2", "i3": "true", "o1": "2", "o2": "" },
                    { "i1": "1", "i2": "", "i3": "", "o1": "\"2\"", "o2": "mid" },
                    { "i1": "2", "i2": "", "i3": "", "o1": "3", "o2": "high" },
                    { "i1": "1", "i2": ">4", "i3": "", "o1": "", "o2": "x" }
                ]
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_contradicted_rules_are_dropped() {
        let ctx = Context::new().with("anvendelseskategori", 1);
        let candidates = enumerate_candidates(&table(), &ctx, None, 12);
        let values: Vec<_> = candidates.iter().map(|c| c.value.clone()).collect();
        assert_eq!(values, vec![json!("2"), json!("1")]);
        assert!(candidates.iter().all(|c| c.rule_number != 4));
    }

    #[test]
    fn test_best_rule_kept_per_value() {
        let ctx = Context::new().with("anvendelseskategori", 1);
        let candidates = enumerate_candidates(&table(), &ctx, None, 12);

        // rules 2 and 3 both give "2"; rule 3 needs nothing more
        let two = &candidates[0];
        assert_eq!(two.rule_number, 3);
        assert_eq!(two.missing_count, 0);
        assert_eq!(two.satisfied, 1);

        let one = &candidates[1];
        assert_eq!(one.rule_number, 1);
        assert_eq!(one.missing_fields, vec!["floors".to_string()]);
        assert_eq!(one.missing_questions, vec!["Number of floors".to_string()]);
    }

    #[test]
    fn test_empty_outputs_skipped() {
        let ctx = Context::new().with("anvendelseskategori", 1).with("floors", 6);
        let candidates = enumerate_candidates(&table(), &ctx, Some("risikoklasse"), 12);
        // rule 2 is outranked by rule 3 for "2", rule 5 has no output
        let rules: Vec<_> = candidates.iter().map(|c| c.rule_number).collect();
        assert_eq!(rules, vec![3]);
    }

    #[test]
    fn test_named_output_and_limit() {
        let ctx = Context::new().with("anvendelseskategori", Value::Absent);
        let notes = enumerate_candidates(&table(), &ctx, Some("note"), 2);
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|c| c.missing_fields.contains(&"anvendelseskategori".to_string())));

        assert!(enumerate_candidates(&table(), &ctx, Some("unknown"), 12).is_empty());
    }
}
