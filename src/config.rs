//! Engine configuration
//!
//! Loaded from YAML. Every field has a default, so an empty document gives
//! the BR18 flow: use category → risk class → relevant annex → fire class.
//!
//! ```yaml
//! version: 1
//! diagnostics:
//!   top_k: 5
//! scoring:
//!   categorical: 10
//!   numeric: 5
//! stages:
//!   - stage: use_category
//!     field: anvendelseskategori
//!     table: Anvendelseskategori 2.0
//!     keywords: [anvendelseskategori]
//! ```

use crate::alias::AliasTable;
use crate::error::{Error, Result};
use crate::flow::Stage;
use crate::optimize::ScoreWeights;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Engine configuration (`fireclass.yaml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EngineConfig {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Flow stages, in evaluation order
    #[serde(default = "default_stages")]
    pub stages: Vec<StageConfig>,

    /// Number of leading stages run by the condensed flow
    #[serde(default = "default_condensed_stages")]
    pub condensed_stages: usize,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    /// Weights of the optimization effort score
    #[serde(default)]
    pub scoring: ScoreWeights,

    /// Token aliases applied on both sides of every comparison
    #[serde(default)]
    pub aliases: AliasTable,

    /// Legacy input field names, copied to their current name when that is absent
    #[serde(default = "default_input_aliases")]
    pub input_aliases: Vec<InputAlias>,

    /// Text inputs trimmed and lower-cased before evaluation
    #[serde(default = "default_lowercase_fields")]
    pub lowercase_fields: Vec<String>,

    /// Collect-policy table listing design requirements
    #[serde(default = "default_requirements_table")]
    pub requirements_table: String,
}

/// Output type of a stage, as merged into the context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// First integer of the output (`"2, 3"` → 2)
    #[default]
    Integer,
    /// Normalized annex token (`"1.1"` → `1b`)
    Token,
}

/// One stage of the flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StageConfig {
    pub stage: Stage,

    /// Output field of the stage table, and the context field it feeds
    pub field: String,

    /// Preferred table name
    pub table: String,

    /// Other exact table names, tried in order after `table`
    #[serde(default)]
    pub alternate_names: Vec<String>,

    /// Case-insensitive substrings of the table name, tried last
    #[serde(default)]
    pub keywords: Vec<String>,

    /// A miss on a required stage stops the flow
    #[serde(default = "default_true")]
    pub required: bool,

    #[serde(default)]
    pub value_kind: ValueKind,

    /// Offer optimization suggestions for this stage
    #[serde(default)]
    pub optimize: bool,

    /// Overrides `diagnostics.suggestion_limit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion_limit: Option<usize>,

    /// Suggestions needing a larger numeric change are dropped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_numeric_delta: Option<f64>,

    /// Outputs used as the stage description, first non-empty wins
    #[serde(default)]
    pub description_fields: Vec<String>,

    /// Outputs naming a precondition of the result, first present wins
    #[serde(default)]
    pub condition_fields: Vec<String>,
}

impl StageConfig {
    fn new(stage: Stage, field: &str, table: &str, keywords: &[&str]) -> Self {
        Self {
            stage,
            field: field.to_string(),
            table: table.to_string(),
            alternate_names: Vec::new(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            required: true,
            value_kind: ValueKind::Integer,
            optimize: false,
            suggestion_limit: None,
            max_numeric_delta: None,
            description_fields: Vec::new(),
            condition_fields: Vec::new(),
        }
    }

    /// Exact table names to try, in order
    pub fn table_names(&self) -> Vec<String> {
        std::iter::once(self.table.clone())
            .chain(self.alternate_names.iter().cloned())
            .collect()
    }
}

/// Limits for the diagnostic subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DiagnosticsConfig {
    /// Near-miss rules voting for missing fields
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,

    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            candidate_limit: default_candidate_limit(),
            suggestion_limit: default_suggestion_limit(),
        }
    }
}

/// Legacy input field rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InputAlias {
    pub from: String,
    pub to: String,
}

fn default_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_condensed_stages() -> usize {
    3
}

fn default_top_k() -> usize {
    5
}

fn default_candidate_limit() -> usize {
    12
}

fn default_suggestion_limit() -> usize {
    5
}

fn default_requirements_table() -> String {
    "Designkrav".to_string()
}

fn default_lowercase_fields() -> Vec<String> {
    vec!["bygningstype".to_string()]
}

fn default_input_aliases() -> Vec<InputAlias> {
    [("fritstaaende", "fritliggende_BA"), ("tilbygning", "med_tilbygning")]
        .into_iter()
        .map(|(from, to)| InputAlias {
            from: from.to_string(),
            to: to.to_string(),
        })
        .collect()
}

fn default_stages() -> Vec<StageConfig> {
    vec![
        StageConfig::new(
            Stage::UseCategory,
            "anvendelseskategori",
            "Anvendelseskategori 2.0",
            &["anvendelseskategori"],
        ),
        StageConfig {
            optimize: true,
            suggestion_limit: Some(3),
            ..StageConfig::new(
                Stage::RiskClass,
                "risikoklasse",
                "Risikoklasse",
                &["risikoklasse", "risiko klasse", "risk class"],
            )
        },
        StageConfig {
            required: false,
            value_kind: ValueKind::Token,
            description_fields: vec!["Bilagsinformation".to_string()],
            ..StageConfig::new(
                Stage::RelevantAnnex,
                "relevant_bilag",
                "Relevant bilag",
                &["relevant bilag", "bilag"],
            )
        },
        StageConfig {
            alternate_names: vec!["Præ-accepterede løsninger".to_string()],
            optimize: true,
            suggestion_limit: Some(3),
            max_numeric_delta: Some(500.0),
            condition_fields: vec!["krav".to_string(), "Krav".to_string()],
            ..StageConfig::new(
                Stage::FireClass,
                "brandklasse",
                "Brandklasse",
                &["brandklasse", "præ-accepterede", "prae-accepterede"],
            )
        },
    ]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            stages: default_stages(),
            condensed_stages: default_condensed_stages(),
            diagnostics: DiagnosticsConfig::default(),
            scoring: ScoreWeights::default(),
            aliases: AliasTable::default(),
            input_aliases: default_input_aliases(),
            lowercase_fields: default_lowercase_fields(),
            requirements_table: default_requirements_table(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // an empty document deserializes as null
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: EngineConfig = serde_norway::from_str(yaml)?;

        if config.version != 1 {
            return Err(Error::Config(format!(
                "Unsupported config version: {}",
                config.version
            )));
        }

        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_norway::to_string(self)?)
    }

    /// Configuration of `stage`, if it takes part in the flow
    pub fn stage(&self, stage: Stage) -> Option<&StageConfig> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Stages run by the condensed flow
    pub fn condensed(&self) -> &[StageConfig] {
        &self.stages[..self.condensed_stages.min(self.stages.len())]
    }

    /// Suggestion limit for `stage`
    pub fn suggestion_limit(&self, stage: &StageConfig) -> usize {
        stage
            .suggestion_limit
            .unwrap_or(self.diagnostics.suggestion_limit)
    }

    /// Check the configuration for problems that would make the flow misbehave
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.version != 1 {
            issues.push(ConfigIssue::error(
                "E001",
                format!(
                    "Unsupported version: {}. Only version 1 is supported.",
                    self.version
                ),
            ));
        }

        if self.stages.is_empty() {
            issues.push(ConfigIssue::error("E002", "No stages configured"));
        }

        let mut seen_stages = HashSet::new();
        let mut seen_fields = HashSet::new();
        for stage in &self.stages {
            if !seen_stages.insert(stage.stage) {
                issues.push(ConfigIssue::error(
                    "E003",
                    format!("Stage '{}' is configured more than once", stage.stage),
                ));
            }
            if stage.field.trim().is_empty() {
                issues.push(ConfigIssue::error(
                    "E004",
                    format!("Stage '{}' has an empty field name", stage.stage),
                ));
            } else if !seen_fields.insert(stage.field.as_str()) {
                issues.push(ConfigIssue::error(
                    "E005",
                    format!("Field '{}' is produced by more than one stage", stage.field),
                ));
            }
            if stage.table.trim().is_empty() && stage.keywords.is_empty() {
                issues.push(ConfigIssue::error(
                    "E006",
                    format!("Stage '{}' has no table name or keywords", stage.stage),
                ));
            }
            if stage.max_numeric_delta.is_some_and(|d| d < 0.0) {
                issues.push(ConfigIssue::error(
                    "E007",
                    format!("Stage '{}' has a negative max_numeric_delta", stage.stage),
                ));
            }
            if stage.optimize && stage.value_kind != ValueKind::Integer {
                issues.push(ConfigIssue::warning(
                    "W001",
                    format!(
                        "Stage '{}' is optimized but its values are not integers",
                        stage.stage
                    ),
                ));
            }
        }

        if self.scoring.delta_divisor <= 0.0 {
            issues.push(ConfigIssue::error(
                "E008",
                "scoring.delta_divisor must be positive",
            ));
        }

        if self.condensed_stages == 0 || self.condensed_stages > self.stages.len() {
            issues.push(ConfigIssue::warning(
                "W002",
                format!(
                    "condensed_stages is {} but {} stages are configured",
                    self.condensed_stages,
                    self.stages.len()
                ),
            ));
        }

        for alias in &self.input_aliases {
            if alias.from == alias.to {
                issues.push(ConfigIssue::warning(
                    "W003",
                    format!("Input alias '{}' maps to itself", alias.from),
                ));
            }
        }

        if self.requirements_table.trim().is_empty() {
            issues.push(ConfigIssue::warning(
                "W004",
                "requirements_table is empty",
            ));
        }

        issues
    }
}

/// Severity level for validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A problem found in a configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}[{}]: {}", level, self.code, self.message)
    }
}
