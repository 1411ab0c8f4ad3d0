//! Explanations of a flow result
//!
//! For every resolved stage, look up the matched rule again and state the
//! conditions it applied, phrased with the column labels and the values the
//! caller supplied.

use crate::flow::{FlowResult, Stage, StageValue};
use crate::table::{DecisionModel, DecisionTable, Rule};
use crate::value::{Context, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Why one stage resolved the way it did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageExplanation {
    pub stage: Stage,
    pub value: Option<StageValue>,
    pub description: String,
    /// `<question>: <value>` per constrained column of the matched rule
    pub conditions: Vec<String>,
    pub text: String,
}

/// Explanations of every resolved stage, plus a summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Explanation {
    pub stages: Vec<StageExplanation>,
    pub summary: String,
}

/// Explain `result`, a flow run over `context`
pub fn explain(model: &DecisionModel, context: &Context, result: &FlowResult) -> Explanation {
    // stage values are part of what later stages were decided on
    let mut context = context.clone();
    for stage in &result.stages {
        if let Some(value) = &stage.value {
            if context.is_missing(&stage.field) {
                context.insert(stage.field.clone(), value.to_value());
            }
        }
    }

    let stages: Vec<StageExplanation> = result
        .stages
        .iter()
        .filter(|s| s.is_resolved())
        .filter_map(|s| {
            let table = model.table(s.table_name.as_deref()?)?;
            let rule = matched_rule(table, s.matched_rule_id.as_deref()?)?;
            let conditions = conditions(table, rule, &context);
            let description = match rule.description().trim() {
                "" => s.description.clone().unwrap_or_default(),
                d => d.to_string(),
            };

            let value = s
                .value
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown".to_string());
            let basis = if conditions.is_empty() {
                "the supplied parameters".to_string()
            } else {
                conditions.join(", ")
            };
            let text = [
                format!("{} {}.", s.stage.label(), value),
                description.clone(),
                format!("Based on: {}.", basis),
            ]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

            Some(StageExplanation {
                stage: s.stage,
                value: s.value.clone(),
                description,
                conditions,
                text,
            })
        })
        .collect();

    let summary = stages
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    Explanation { stages, summary }
}

/// Rule behind a `<tableId>_rule_<index>` identifier
fn matched_rule<'a>(table: &'a DecisionTable, matched_rule_id: &str) -> Option<&'a Rule> {
    let index: usize = matched_rule_id
        .strip_prefix(table.id())?
        .strip_prefix("_rule_")?
        .parse()
        .ok()?;
    table.rules().get(index)
}

fn conditions(table: &DecisionTable, rule: &Rule, context: &Context) -> Vec<String> {
    table
        .constraints(rule)
        .map(|(column, condition)| {
            let shown = match condition.raw().to_lowercase().as_str() {
                "true" => "yes".to_string(),
                "false" => "no".to_string(),
                _ => match context.get(&column.field) {
                    Some(value) if *value != Value::Absent => value.to_string(),
                    _ => condition.raw().to_string(),
                },
            };
            format!("{}: {}", column.question(), shown)
        })
        .collect()
}
