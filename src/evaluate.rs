//! Decision table evaluator
//!
//! Rules are tried in table order. A rule matches when every constrained
//! input column is satisfied by the context; a column whose field is not in
//! the context fails the rule. Under [`HitPolicy::FirstMatch`] the first
//! matching rule wins, under [`HitPolicy::CollectAll`] every matching rule is
//! returned in table order.

use crate::matcher::matches_field;
use crate::table::{DecisionTable, HitPolicy, Rule};
use crate::value::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// A matched rule and its resolved outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// `<tableId>_rule_<index>`
    pub matched_rule_id: String,
    /// The rule's own identifier as authored
    pub rule_id: String,
    pub rule_index: usize,
    /// 1-based position of the rule in the table
    pub rule_number: usize,
    pub table_id: String,
    pub table_name: String,
    pub description: String,
    /// Output field → value, in output column order, quotes removed
    #[serde(flatten)]
    pub outputs: serde_json::Map<String, serde_json::Value>,
    /// The single output's value, for single-output tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl MatchResult {
    /// Resolved value of an output field
    pub fn output(&self, field: &str) -> Option<&serde_json::Value> {
        self.outputs.get(field)
    }
}

/// Evaluation outcome, shaped by the hit policy
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    FirstMatch(Option<MatchResult>),
    CollectAll(Vec<MatchResult>),
}

impl Evaluation {
    pub fn is_match(&self) -> bool {
        match self {
            Evaluation::FirstMatch(m) => m.is_some(),
            Evaluation::CollectAll(v) => !v.is_empty(),
        }
    }

    /// First match under either policy
    pub fn first(self) -> Option<MatchResult> {
        match self {
            Evaluation::FirstMatch(m) => m,
            Evaluation::CollectAll(v) => v.into_iter().next(),
        }
    }

    /// All matches under either policy
    pub fn into_matches(self) -> Vec<MatchResult> {
        match self {
            Evaluation::FirstMatch(m) => m.into_iter().collect(),
            Evaluation::CollectAll(v) => v,
        }
    }
}

/// Evaluate a table, using `hit_policy` when given and the table's own otherwise
pub fn evaluate(table: &DecisionTable, context: &Context, hit_policy: Option<HitPolicy>) -> Evaluation {
    let policy = hit_policy.unwrap_or(table.hit_policy());

    if table.outputs().is_empty() {
        debug!(table = table.name(), "table has no output columns");
        return match policy {
            HitPolicy::FirstMatch => Evaluation::FirstMatch(None),
            HitPolicy::CollectAll => Evaluation::CollectAll(Vec::new()),
        };
    }

    let mut matched = table
        .rules()
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule_matches(table, rule, context))
        .map(|(index, rule)| build_result(table, rule, index));

    match policy {
        HitPolicy::FirstMatch => {
            let result = matched.next();
            debug!(
                table = table.name(),
                matched = result.as_ref().map(|r| r.rule_number),
                "first-match evaluation"
            );
            Evaluation::FirstMatch(result)
        }
        HitPolicy::CollectAll => {
            let results: Vec<_> = matched.collect();
            debug!(table = table.name(), count = results.len(), "collect evaluation");
            Evaluation::CollectAll(results)
        }
    }
}

/// First-match evaluation regardless of the table's declared policy
pub fn evaluate_first(table: &DecisionTable, context: &Context) -> Option<MatchResult> {
    evaluate(table, context, Some(HitPolicy::FirstMatch)).first()
}

/// Collect evaluation regardless of the table's declared policy
pub fn evaluate_all(table: &DecisionTable, context: &Context) -> Vec<MatchResult> {
    evaluate(table, context, Some(HitPolicy::CollectAll)).into_matches()
}

/// Every constrained column of `rule` is satisfied by `context`
pub fn rule_matches(table: &DecisionTable, rule: &Rule, context: &Context) -> bool {
    let aliases = table.aliases();
    let ok = table
        .constraints(rule)
        .all(|(column, condition)| matches_field(context.get(&column.field), condition, aliases));
    trace!(table = table.name(), rule = rule.id(), matched = ok, "rule checked");
    ok
}

fn build_result(table: &DecisionTable, rule: &Rule, index: usize) -> MatchResult {
    let outputs: serde_json::Map<_, _> = table
        .outputs()
        .iter()
        .enumerate()
        .map(|(i, column)| (column.field.clone(), table.output_value(rule, i)))
        .collect();

    let value = match table.outputs() {
        [single] => outputs.get(&single.field).cloned(),
        _ => None,
    };

    MatchResult {
        matched_rule_id: format!("{}_rule_{}", table.id(), index),
        rule_id: rule.id().to_string(),
        rule_index: index,
        rule_number: index + 1,
        table_id: table.id().to_string(),
        table_name: table.name().to_string(),
        description: rule.description().to_string(),
        outputs,
        value,
    }
}
