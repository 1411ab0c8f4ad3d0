//! Optimization suggestions
//!
//! Lower numeric outputs are better. For every rule producing a strictly
//! lower value than the current one, work out what the context would have
//! to look like to reach it:
//!
//! - numeric fields that fail a numeric comparison become *adjustments*
//!   (direction and distance to the threshold),
//! - any other supplied field that fails becomes a *required* change,
//! - fields not supplied yet are listed as missing.
//!
//! Each target value keeps its cheapest rule according to [`ScoreWeights`].

use crate::condition::CompareOp;
use crate::diagnose::{cell_state, CellState};
use crate::table::DecisionTable;
use crate::util::json_first_int;
use crate::value::{Context, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// Weights of the suggestion effort score; lower scores are better
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScoreWeights {
    /// Per categorical (non-numeric) change
    pub categorical: f64,
    /// Per numeric adjustment
    pub numeric: f64,
    /// Per field not yet supplied
    pub missing: f64,
    /// Summed numeric distance is divided by this
    pub delta_divisor: f64,
    /// Subtracted per already satisfied cell
    pub satisfied: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            categorical: 10.0,
            numeric: 5.0,
            missing: 2.0,
            delta_divisor: 1000.0,
            satisfied: 0.5,
        }
    }
}

impl ScoreWeights {
    pub fn score(
        &self,
        categorical: usize,
        numeric: usize,
        missing: usize,
        delta_sum: f64,
        satisfied: usize,
    ) -> f64 {
        let delta = if self.delta_divisor > 0.0 {
            delta_sum / self.delta_divisor
        } else {
            0.0
        };
        self.categorical * categorical as f64
            + self.numeric * numeric as f64
            + self.missing * missing as f64
            + delta
            - self.satisfied * satisfied as f64
    }
}

/// Which way a numeric field must move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
    Set,
}

/// A categorical field that would have to hold a different value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequiredField {
    pub field: String,
    pub question: String,
    /// Condition text the field must satisfy
    pub expected: String,
}

/// A numeric field and how far it is from its threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NumericAdjustment {
    pub field: String,
    pub question: String,
    pub expected: String,
    pub current: f64,
    pub op: CompareOp,
    pub threshold: f64,
    pub direction: Direction,
    pub delta_abs: f64,
}

impl NumericAdjustment {
    /// Distance from `current` to the nearest value satisfying `op threshold`
    pub fn distance(op: CompareOp, current: f64, threshold: f64) -> (Direction, f64) {
        match op {
            CompareOp::Lt | CompareOp::Le => (Direction::Decrease, (current - threshold).max(0.0)),
            CompareOp::Gt | CompareOp::Ge => (Direction::Increase, (threshold - current).max(0.0)),
            CompareOp::Eq => (Direction::Set, (current - threshold).abs()),
        }
    }
}

/// A strictly better output and what it would take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub target_value: i64,
    pub required_fields: Vec<RequiredField>,
    pub numeric_adjustments: Vec<NumericAdjustment>,
    pub missing_fields: Vec<String>,
    pub missing_questions: Vec<String>,
    pub score: f64,
    pub rule_number: usize,
}

/// Options for [`suggest_better`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuggestOptions<'a> {
    pub limit: usize,
    /// Rules needing a larger numeric change than this are discarded
    pub max_numeric_delta: Option<f64>,
    pub weights: &'a ScoreWeights,
}

/// Suggest rules that yield a lower value of `output_field` than `current`.
///
/// Without a current value every rule with an integer output qualifies.
/// Results are ordered by score then target value, at most `limit` of them.
pub fn suggest_better(
    table: &DecisionTable,
    context: &Context,
    output_field: &str,
    current: Option<i64>,
    options: SuggestOptions<'_>,
) -> Vec<Suggestion> {
    let Some(output_index) = table.output_index(output_field) else {
        return Vec::new();
    };

    let mut by_target: HashMap<i64, Suggestion> = HashMap::new();

    'rules: for (index, rule) in table.rules().iter().enumerate() {
        let Some(target) = rule.output(output_index).and_then(json_first_int) else {
            continue;
        };
        if current.is_some_and(|c| target >= c) {
            continue;
        }

        let mut satisfied = 0;
        let mut missing_fields = Vec::new();
        let mut required_fields = Vec::new();
        let mut numeric_adjustments = Vec::new();

        for (column, condition) in table.constraints(rule) {
            match cell_state(table, column, condition, context) {
                CellState::Satisfied => satisfied += 1,
                CellState::Missing => missing_fields.push(column.field.clone()),
                CellState::Contradicted => {
                    let question = table.question_for(&column.field).to_string();
                    let expected = condition.raw().to_string();
                    let numeric = context.get(&column.field).and_then(Value::as_number);

                    match (numeric, condition.numeric()) {
                        (Some(value), Some((op, threshold))) => {
                            let (direction, delta_abs) =
                                NumericAdjustment::distance(op, value, threshold);
                            if options.max_numeric_delta.is_some_and(|max| delta_abs > max) {
                                trace!(
                                    table = table.name(),
                                    rule = index + 1,
                                    field = %column.field,
                                    delta_abs,
                                    "numeric change too large, rule skipped"
                                );
                                continue 'rules;
                            }
                            numeric_adjustments.push(NumericAdjustment {
                                field: column.field.clone(),
                                question,
                                expected,
                                current: value,
                                op,
                                threshold,
                                direction,
                                delta_abs,
                            });
                        }
                        _ => required_fields.push(RequiredField {
                            field: column.field.clone(),
                            question,
                            expected,
                        }),
                    }
                }
            }
        }

        let delta_sum: f64 = numeric_adjustments.iter().map(|a| a.delta_abs).sum();
        let score = options.weights.score(
            required_fields.len(),
            numeric_adjustments.len(),
            missing_fields.len(),
            delta_sum,
            satisfied,
        );

        let suggestion = Suggestion {
            target_value: target,
            missing_questions: missing_fields
                .iter()
                .map(|f| table.question_for(f).to_string())
                .collect(),
            required_fields,
            numeric_adjustments,
            missing_fields,
            score,
            rule_number: index + 1,
        };

        match by_target.get(&target) {
            Some(prev) if prev.score <= suggestion.score => {}
            _ => {
                by_target.insert(target, suggestion);
            }
        }
    }

    let mut suggestions: Vec<Suggestion> = by_target.into_values().collect();
    suggestions.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then(a.target_value.cmp(&b.target_value))
    });
    suggestions.truncate(options.limit);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn table() -> DecisionTable {
        DecisionTable::from_json(
            &json!({
                "id": "bk",
                "name": "Brandklasse",
                "inputs": [
                    { "id": "i1", "field": "risikoklasse", "name": "Risk class" },
                    { "id": "i2", "field": "sprinklered_area", "name": "Sprinklered area" },
                    { "id": "i3", "field": "sprinkler", "name": "Sprinkler installed?" },
                    { "id": "i4", "field": "escape_routes" }
                ],
                "outputs": [{ "id": "o1", "field": "brandklasse" }],
                "rules": [
                    { "i1": "2", "i2": "<=500", "i3": "", "i4": "", "o1": "2" },
                    { "i1": "2", "i2": "", "i3": "true", "i4": ">=2", "o1": "1" },
                    { "i1": "2", "i2": "<=100", "i3": "", "i4": "", "o1": "1" },
                    { "i1": "2", "i2": "", "i3": "", "i4": "", "o1": "3" },
                    { "i1": "2", "i2": "", "i3": "", "i4": "", "o1": "\"n/a\"" }
                ]
            })
            .to_string(),
        )
        .unwrap()
    }

    fn options(weights: &ScoreWeights) -> SuggestOptions<'_> {
        SuggestOptions {
            limit: 5,
            max_numeric_delta: None,
            weights,
        }
    }

    fn context() -> Context {
        Context::new()
            .with("risikoklasse", 2)
            .with("sprinklered_area", 650)
            .with("sprinkler", false)
    }

    #[test]
    fn test_numeric_adjustment_toward_threshold() {
        let weights = ScoreWeights::default();
        let suggestions = suggest_better(&table(), &context(), "brandklasse", Some(3), options(&weights));

        let two = suggestions.iter().find(|s| s.target_value == 2).unwrap();
        assert_eq!(two.rule_number, 1);
        assert_eq!(
            two.numeric_adjustments,
            vec![NumericAdjustment {
                field: "sprinklered_area".into(),
                question: "Sprinklered area".into(),
                expected: "<=500".into(),
                current: 650.0,
                op: CompareOp::Le,
                threshold: 500.0,
                direction: Direction::Decrease,
                delta_abs: 150.0,
            }]
        );
        assert!(two.required_fields.is_empty());
        // 5 * 1 + 150 / 1000 - 0.5 * 1
        assert!((two.score - 4.65).abs() < 1e-9);
    }

    #[test]
    fn test_only_strictly_better_targets() {
        let weights = ScoreWeights::default();
        let suggestions = suggest_better(&table(), &context(), "brandklasse", Some(2), options(&weights));
        assert!(suggestions.iter().all(|s| s.target_value < 2));
        assert!(!suggestions.is_empty());

        let all = suggest_better(&table(), &context(), "brandklasse", None, options(&weights));
        let targets: Vec<_> = all.iter().map(|s| s.target_value).collect();
        assert_eq!(targets.len(), 3);
        assert!(targets.contains(&3));
    }

    #[test]
    fn test_best_rule_per_target() {
        let weights = ScoreWeights::default();
        let suggestions = suggest_better(&table(), &context(), "brandklasse", Some(2), options(&weights));
        assert_eq!(suggestions.len(), 1);

        // rule 2: sprinkler change (10) + escape_routes missing (2) - 0.5 = 11.5
        // rule 3: area adjustment 550 (5 + 0.55) - 0.5 = 5.05
        let one = &suggestions[0];
        assert_eq!(one.rule_number, 3);
        assert_eq!(one.numeric_adjustments[0].delta_abs, 550.0);
    }

    #[test]
    fn test_max_delta_discards_rule() {
        let weights = ScoreWeights::default();
        let opts = SuggestOptions {
            max_numeric_delta: Some(500.0),
            ..options(&weights)
        };
        let suggestions = suggest_better(&table(), &context(), "brandklasse", Some(2), opts);

        let one = &suggestions[0];
        assert_eq!(one.rule_number, 2);
        assert_eq!(
            one.required_fields,
            vec![RequiredField {
                field: "sprinkler".into(),
                question: "Sprinkler installed?".into(),
                expected: "true".into(),
            }]
        );
        assert_eq!(one.missing_fields, vec!["escape_routes".to_string()]);
        assert_eq!(one.missing_questions, vec!["escape_routes".to_string()]);
        assert!((one.score - 11.5).abs() < 1e-9);
    }

    #[test]
    fn test_weights_are_configurable() {
        let weights = ScoreWeights {
            categorical: 0.0,
            ..ScoreWeights::default()
        };
        let suggestions = suggest_better(&table(), &context(), "brandklasse", Some(2), options(&weights));
        // rule 2 now costs 2 - 0.5 = 1.5
        assert_eq!(suggestions[0].rule_number, 2);
    }

    #[test]
    fn test_distance() {
        assert_eq!(NumericAdjustment::distance(CompareOp::Lt, 10.0, 4.0), (Direction::Decrease, 6.0));
        assert_eq!(NumericAdjustment::distance(CompareOp::Ge, 1.0, 4.0), (Direction::Increase, 3.0));
        assert_eq!(NumericAdjustment::distance(CompareOp::Eq, 1.0, 4.0), (Direction::Set, 3.0));
    }

    #[test]
    fn test_unknown_output_field() {
        let weights = ScoreWeights::default();
        assert!(suggest_better(&table(), &context(), "nope", None, options(&weights)).is_empty());
    }
}
