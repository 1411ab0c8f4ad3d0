//! Multi-stage classification flow
//!
//! Stages run in configured order, each a table lookup followed by a
//! first-match evaluation. A resolved stage's value is merged into the
//! context under the stage field before the next stage runs.
//!
//! When a required stage misses, the flow stops resolving: the failed stage
//! carries missing-field hints, reachable candidates and (for optimized
//! stages) suggestions, and every later stage is reported as speculative
//! with candidates and suggestions computed from the context so far. An
//! optional stage never stops the flow.
//!
//! The condensed flow is the same orchestrator over the leading stages, so
//! the stages both flows run produce identical results.

use crate::candidates::{enumerate_candidates, Candidate};
use crate::config::{EngineConfig, StageConfig, ValueKind};
use crate::diagnose::{diagnose_missing_inputs, FieldHint};
use crate::evaluate::{evaluate, MatchResult};
use crate::optimize::{suggest_better, SuggestOptions, Suggestion};
use crate::table::{DecisionModel, DecisionTable};
use crate::util::{json_cell_text, json_first_int};
use crate::value::{Context, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// A flow stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    UseCategory,
    RiskClass,
    RelevantAnnex,
    FireClass,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::UseCategory => "use_category",
            Stage::RiskClass => "risk_class",
            Stage::RelevantAnnex => "relevant_annex",
            Stage::FireClass => "fire_class",
        }
    }

    /// Human label
    pub fn label(&self) -> &'static str {
        match self {
            Stage::UseCategory => "Use category",
            Stage::RiskClass => "Risk class",
            Stage::RelevantAnnex => "Relevant annex",
            Stage::FireClass => "Fire class",
        }
    }

    /// Description used when the matched rule carries none
    fn fallback_description(&self, value: Option<&StageValue>) -> String {
        match (self, value) {
            (Stage::FireClass, Some(StageValue::Integer(n))) => format!("{} {}", self.label(), n),
            (Stage::FireClass, _) => "Requires fire consultant assessment".to_string(),
            _ => String::new(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved value of a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum StageValue {
    Integer(i64),
    Token(String),
}

impl StageValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            StageValue::Integer(n) => Some(*n),
            StageValue::Token(_) => None,
        }
    }

    /// Form merged into the context for later stages
    pub fn to_value(&self) -> Value {
        match self {
            StageValue::Integer(n) => Value::from(*n),
            StageValue::Token(t) => Value::Text(t.clone()),
        }
    }
}

impl fmt::Display for StageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageValue::Integer(n) => write!(f, "{}", n),
            StageValue::Token(t) => write!(f, "{}", t),
        }
    }
}

/// How far a stage got
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// A rule matched
    Resolved,
    /// The table was evaluated and no rule matched
    Unresolved,
    /// Not evaluated because an earlier required stage missed
    Speculative,
    /// No table for the stage in the model
    TableMissing,
}

/// Outcome of one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageResult {
    pub stage: Stage,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<StageValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Condition the result depends on, from the table's precondition output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precondition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule_id: Option<String>,
    /// Remaining outputs of the matched rule
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub outputs: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_inputs: Vec<FieldHint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
}

impl StageResult {
    fn new(config: &StageConfig, table: Option<&DecisionTable>, status: StageStatus) -> Self {
        Self {
            stage: config.stage,
            field: config.field.clone(),
            table_name: table.map(|t| t.name().to_string()),
            status,
            value: None,
            description: None,
            precondition: None,
            matched_rule_id: None,
            outputs: serde_json::Map::new(),
            missing_inputs: Vec::new(),
            candidates: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == StageStatus::Resolved
    }
}

/// Outcome of a flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowResult {
    pub success: bool,
    pub stages: Vec<StageResult>,
    pub errors: Vec<String>,
    /// Hints of every stage that was evaluated without a match, in stage order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_inputs: Vec<FieldHint>,
}

impl FlowResult {
    pub fn stage(&self, stage: Stage) -> Option<&StageResult> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Resolved value of `stage`
    pub fn value(&self, stage: Stage) -> Option<&StageValue> {
        self.stage(stage).and_then(|s| s.value.as_ref())
    }
}

/// Flow orchestrator over a decision model
#[derive(Debug, Clone, Copy)]
pub struct Flow<'a> {
    model: &'a DecisionModel,
    config: &'a EngineConfig,
}

impl<'a> Flow<'a> {
    pub fn new(model: &'a DecisionModel, config: &'a EngineConfig) -> Self {
        Self { model, config }
    }

    /// Run every configured stage
    pub fn complete(&self, inputs: &Context) -> FlowResult {
        self.run(&self.config.stages, inputs)
    }

    /// Run the condensed (leading) stages only
    pub fn basic(&self, inputs: &Context) -> FlowResult {
        self.run(self.config.condensed(), inputs)
    }

    /// Table evaluated for a stage
    pub fn table(&self, stage: &StageConfig) -> Option<&'a DecisionTable> {
        self.model
            .find(&stage.table_names(), &stage.keywords)
            .map(|t| t.as_ref())
    }

    /// Run `stages` in order over the normalized `inputs`
    pub fn run(&self, stages: &[StageConfig], inputs: &Context) -> FlowResult {
        let mut context = normalize_inputs(self.config, inputs);
        let mut result = FlowResult {
            success: true,
            stages: Vec::with_capacity(stages.len()),
            errors: Vec::new(),
            missing_inputs: Vec::new(),
        };
        let mut halted = false;

        for stage in stages {
            let Some(table) = self.table(stage) else {
                warn!(stage = %stage.stage, table = %stage.table, "decision table not found");
                if stage.required && !halted {
                    result.success = false;
                    result
                        .errors
                        .push(format!("Decision table not found: {}", stage.table));
                    halted = true;
                }
                result
                    .stages
                    .push(StageResult::new(stage, None, StageStatus::TableMissing));
                continue;
            };

            if halted {
                result.stages.push(self.speculate(stage, table, &context));
                continue;
            }

            match evaluate(table, &context, None).first() {
                Some(matched) => {
                    let stage_result = self.resolve(stage, table, &matched, &mut context);
                    debug!(
                        stage = %stage.stage,
                        table = table.name(),
                        value = ?stage_result.value,
                        rule = %matched.matched_rule_id,
                        "stage resolved"
                    );
                    result.stages.push(stage_result);
                }
                None => {
                    let stage_result = self.miss(stage, table, &context);
                    debug!(
                        stage = %stage.stage,
                        table = table.name(),
                        missing = stage_result.missing_inputs.len(),
                        candidates = stage_result.candidates.len(),
                        "stage unresolved"
                    );
                    result
                        .missing_inputs
                        .extend(stage_result.missing_inputs.iter().cloned());
                    if stage.required {
                        result.success = false;
                        result
                            .errors
                            .push(format!("No matching rule in {}", table.name()));
                        halted = true;
                    }
                    result.stages.push(stage_result);
                }
            }
        }

        result
    }

    fn resolve(
        &self,
        stage: &StageConfig,
        table: &DecisionTable,
        matched: &MatchResult,
        context: &mut Context,
    ) -> StageResult {
        let raw = matched.output(&stage.field).or(matched.value.as_ref());
        let value = raw.and_then(|raw| match stage.value_kind {
            ValueKind::Integer => json_first_int(raw).map(StageValue::Integer),
            ValueKind::Token => table
                .aliases()
                .parse_token(&Value::from(raw.clone()))
                .map(StageValue::Token),
        });

        context.insert(
            stage.field.clone(),
            value.as_ref().map(StageValue::to_value).unwrap_or(Value::Absent),
        );

        // a stage with description columns takes its text from them only
        let mut description = if stage.description_fields.is_empty() {
            matched.description.trim().to_string()
        } else {
            stage
                .description_fields
                .iter()
                .filter_map(|f| matched.output(f))
                .map(output_text)
                .find(|text| !text.is_empty())
                .unwrap_or_default()
        };
        if description.is_empty() {
            description = stage.stage.fallback_description(value.as_ref());
        }

        let precondition = stage
            .condition_fields
            .iter()
            .find_map(|f| matched.output(f))
            .map(output_text)
            .filter(|text| !text.is_empty());
        if let Some(text) = &precondition {
            description = if description.is_empty() {
                format!("Requires: {}", text)
            } else {
                format!("{} (requires: {})", description, text)
            };
        }

        let outputs = matched
            .outputs
            .iter()
            .filter(|(k, _)| **k != stage.field)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let suggestions = if stage.optimize {
            let current = value.as_ref().and_then(StageValue::as_int);
            self.suggestions(stage, table, context, current)
        } else {
            Vec::new()
        };

        StageResult {
            value,
            description: Some(description),
            precondition,
            matched_rule_id: Some(matched.matched_rule_id.clone()),
            outputs,
            suggestions,
            ..StageResult::new(stage, Some(table), StageStatus::Resolved)
        }
    }

    fn miss(&self, stage: &StageConfig, table: &DecisionTable, context: &Context) -> StageResult {
        StageResult {
            missing_inputs: diagnose_missing_inputs(table, context, self.config.diagnostics.top_k),
            ..self.speculate(stage, table, context)
        }
        .with_status(StageStatus::Unresolved)
    }

    fn speculate(&self, stage: &StageConfig, table: &DecisionTable, context: &Context) -> StageResult {
        let suggestions = if stage.optimize {
            self.suggestions(stage, table, context, None)
        } else {
            Vec::new()
        };
        StageResult {
            candidates: enumerate_candidates(
                table,
                context,
                Some(&stage.field),
                self.config.diagnostics.candidate_limit,
            ),
            suggestions,
            ..StageResult::new(stage, Some(table), StageStatus::Speculative)
        }
    }

    fn suggestions(
        &self,
        stage: &StageConfig,
        table: &DecisionTable,
        context: &Context,
        current: Option<i64>,
    ) -> Vec<Suggestion> {
        suggest_better(
            table,
            context,
            &stage.field,
            current,
            SuggestOptions {
                limit: self.config.suggestion_limit(stage),
                max_numeric_delta: stage.max_numeric_delta,
                weights: &self.config.scoring,
            },
        )
    }
}

impl StageResult {
    fn with_status(mut self, status: StageStatus) -> Self {
        self.status = status;
        self
    }
}

/// Run every configured stage
pub fn evaluate_complete(model: &DecisionModel, config: &EngineConfig, inputs: &Context) -> FlowResult {
    Flow::new(model, config).complete(inputs)
}

/// Run the condensed flow
pub fn evaluate_basic(model: &DecisionModel, config: &EngineConfig, inputs: &Context) -> FlowResult {
    Flow::new(model, config).basic(inputs)
}

/// Apply legacy field renames and lower-case configured text fields
pub fn normalize_inputs(config: &EngineConfig, inputs: &Context) -> Context {
    let mut context = inputs.clone();

    for alias in &config.input_aliases {
        if context.contains(&alias.to) {
            continue;
        }
        if let Some(value) = context.get(&alias.from).cloned() {
            context.insert(alias.to.clone(), value);
        }
    }

    for field in &config.lowercase_fields {
        if let Some(Value::Text(text)) = context.get(field) {
            let lowered = text.trim().to_lowercase();
            context.insert(field.clone(), lowered);
        }
    }

    context
}

/// Output cell as display text; lists are joined with `; `
fn output_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .map(json_cell_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        other => json_cell_text(other).trim().to_string(),
    }
}
