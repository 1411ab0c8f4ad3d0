//! Decision tables: the data model the engine evaluates
//!
//! A table document is authored externally and handed in by the loader:
//!
//! ```json
//! {
//!   "id": "use-category",
//!   "name": "Anvendelseskategori 2.0",
//!   "hitPolicy": "first",
//!   "inputs":  [{ "id": "in1", "field": "usage", "name": "What is the building used for?" }],
//!   "outputs": [{ "id": "out1", "field": "anvendelseskategori", "name": "Use category" }],
//!   "rules": [
//!     { "_id": "r1", "_description": "Offices", "in1": "\"office\"", "out1": "1" }
//!   ]
//! }
//! ```
//!
//! Documents are compiled once into a [`DecisionTable`]: every condition cell
//! is parsed up front and the table is immutable afterwards. A
//! [`DecisionModel`] is a set of compiled tables, read either from a graph
//! document (`{ "nodes": [...] }`, only `decisionTableNode` nodes are kept),
//! a single table document, or an array of table documents.

use crate::alias::AliasTable;
use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::util::{is_quoted, json_cell_text};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Node type carrying a decision table inside a graph document
pub const DECISION_TABLE_NODE: &str = "decisionTableNode";

/// Rule-selection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum HitPolicy {
    /// The first satisfied rule in table order wins
    #[default]
    #[serde(rename = "first", alias = "firstMatch")]
    FirstMatch,
    /// Every satisfied rule, in table order
    #[serde(rename = "collect", alias = "collectAll")]
    CollectAll,
}

/// Column declaration as authored
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDocument {
    /// Key of the rule cell holding this column's value
    #[serde(default)]
    pub id: String,
    /// Context field (inputs) or result field (outputs)
    #[serde(default)]
    pub field: String,
    /// Human-readable label, used as the question for missing inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Table body shared by flat and graph documents
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableContent {
    #[serde(default)]
    pub hit_policy: HitPolicy,
    #[serde(default)]
    pub inputs: Vec<ColumnDocument>,
    #[serde(default)]
    pub outputs: Vec<ColumnDocument>,
    /// Each rule is a flat object: `_id`, `_description`, and one cell per column id
    #[serde(default)]
    pub rules: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// A flat table document
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub content: TableContent,
}

/// A node of a graph document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: serde_json::Value,
}

/// A graph document (decision model with several nodes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
}

/// A compiled column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub id: String,
    pub field: String,
    pub name: Option<String>,
}

impl Column {
    /// Label to show when asking for this field
    pub fn question(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.field)
    }
}

/// A compiled rule: one condition per input column, one cell per output column
#[derive(Debug, Clone)]
pub struct Rule {
    id: String,
    description: String,
    conditions: Vec<Condition>,
    outputs: Vec<serde_json::Value>,
}

impl Rule {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Condition for the input column at `index`
    pub fn condition(&self, index: usize) -> Option<&Condition> {
        self.conditions.get(index)
    }

    /// Raw cell for the output column at `index`
    pub fn output(&self, index: usize) -> Option<&serde_json::Value> {
        self.outputs.get(index)
    }
}

/// An immutable, compiled decision table
#[derive(Debug, Clone)]
pub struct DecisionTable {
    id: String,
    name: String,
    hit_policy: HitPolicy,
    inputs: Vec<Column>,
    outputs: Vec<Column>,
    rules: Vec<Rule>,
    aliases: Arc<AliasTable>,
}

impl DecisionTable {
    /// Compile a table document, parsing every condition cell once.
    ///
    /// Columns without an `id` or `field` cannot be addressed and are dropped.
    pub fn compile(doc: TableDocument, aliases: Arc<AliasTable>) -> Self {
        let TableDocument { id, name, content } = doc;
        let inputs = compile_columns(content.inputs);
        let outputs = compile_columns(content.outputs);

        let rules = content
            .rules
            .into_iter()
            .map(|cells| {
                let text = |keys: &[&str]| {
                    keys.iter()
                        .find_map(|k| cells.get(*k))
                        .map(json_cell_text)
                        .unwrap_or_default()
                };
                Rule {
                    id: text(&["_id", "id"]),
                    description: text(&["_description", "description"]),
                    conditions: inputs
                        .iter()
                        .map(|c| {
                            cells
                                .get(&c.id)
                                .map(|v| Condition::parse(&json_cell_text(v)))
                                .unwrap_or_default()
                        })
                        .collect(),
                    outputs: outputs
                        .iter()
                        .map(|c| cells.get(&c.id).cloned().unwrap_or(serde_json::Value::Null))
                        .collect(),
                }
            })
            .collect();

        Self {
            id,
            name,
            hit_policy: content.hit_policy,
            inputs,
            outputs,
            rules,
            aliases,
        }
    }

    /// Parse and compile a flat table document with the default alias table
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with(json, Arc::new(AliasTable::default()))
    }

    /// Parse and compile a flat table document
    pub fn from_json_with(json: &str, aliases: Arc<AliasTable>) -> Result<Self> {
        let doc: TableDocument =
            serde_json::from_str(json).map_err(|e| Error::TableParse(e.to_string()))?;
        Ok(Self::compile(doc, aliases))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hit_policy(&self) -> HitPolicy {
        self.hit_policy
    }

    pub fn inputs(&self) -> &[Column] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Column] {
        &self.outputs
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Index of the output column for `field`
    pub fn output_index(&self, field: &str) -> Option<usize> {
        self.outputs.iter().position(|c| c.field == field)
    }

    /// Input column declaring `field`
    pub fn input_column(&self, field: &str) -> Option<&Column> {
        self.inputs.iter().find(|c| c.field == field)
    }

    /// The constrained (non-empty) input cells of a rule, in column order
    pub fn constraints<'a>(
        &'a self,
        rule: &'a Rule,
    ) -> impl Iterator<Item = (&'a Column, &'a Condition)> + 'a {
        self.inputs
            .iter()
            .zip(rule.conditions.iter())
            .filter(|(_, cond)| !cond.is_empty())
    }

    /// Output cell of a rule as a result value: strings trimmed and unquoted once
    pub fn output_value(&self, rule: &Rule, index: usize) -> serde_json::Value {
        match rule.output(index) {
            Some(serde_json::Value::String(s)) => {
                let s = s.trim();
                let s = if is_quoted(s) { &s[1..s.len() - 1] } else { s };
                serde_json::Value::String(s.to_string())
            }
            Some(other) => other.clone(),
            None => serde_json::Value::Null,
        }
    }

    /// Label for `field`, falling back to the field name
    pub fn question_for<'a>(&'a self, field: &'a str) -> &'a str {
        self.input_column(field).map(Column::question).unwrap_or(field)
    }
}

fn compile_columns(docs: Vec<ColumnDocument>) -> Vec<Column> {
    docs.into_iter()
        .filter(|c| !c.id.is_empty() && !c.field.is_empty())
        .map(|c| Column {
            id: c.id,
            field: c.field,
            name: c.name,
        })
        .collect()
}

/// A set of compiled decision tables
#[derive(Debug, Clone, Default)]
pub struct DecisionModel {
    tables: Vec<Arc<DecisionTable>>,
}

impl DecisionModel {
    pub fn new(tables: Vec<DecisionTable>) -> Self {
        Self {
            tables: tables.into_iter().map(Arc::new).collect(),
        }
    }

    /// Parse a model from JSON: a graph document, a table, or a list of tables
    pub fn from_json(json: &str, aliases: Arc<AliasTable>) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| Error::TableParse(e.to_string()))?;
        Self::from_value(value, aliases)
    }

    pub fn from_value(value: serde_json::Value, aliases: Arc<AliasTable>) -> Result<Self> {
        let parse = |e: serde_json::Error| Error::TableParse(e.to_string());

        let is_graph = matches!(&value, serde_json::Value::Object(map) if map.contains_key("nodes"));

        let docs: Vec<TableDocument> = match value {
            serde_json::Value::Object(_) if is_graph => {
                let graph: ModelDocument = serde_json::from_value(value).map_err(parse)?;
                graph
                    .nodes
                    .into_iter()
                    .filter(|n| n.kind == DECISION_TABLE_NODE)
                    .map(|n| {
                        let content: TableContent =
                            serde_json::from_value(n.content).map_err(parse)?;
                        Ok(TableDocument {
                            id: n.id,
                            name: n.name,
                            content,
                        })
                    })
                    .collect::<Result<_>>()?
            }
            serde_json::Value::Array(_) => serde_json::from_value(value).map_err(parse)?,
            serde_json::Value::Object(_) => vec![serde_json::from_value(value).map_err(parse)?],
            _ => {
                return Err(Error::TableParse(
                    "Model must be a JSON object or array".into(),
                ))
            }
        };

        Ok(Self {
            tables: docs
                .into_iter()
                .map(|doc| Arc::new(DecisionTable::compile(doc, aliases.clone())))
                .collect(),
        })
    }

    pub fn tables(&self) -> &[Arc<DecisionTable>] {
        &self.tables
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name()).collect()
    }

    /// Table with exactly this name
    pub fn table(&self, name: &str) -> Option<&Arc<DecisionTable>> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// First table named one of `names`, else the first whose lower-cased
    /// name contains one of `keywords`
    pub fn find(&self, names: &[String], keywords: &[String]) -> Option<&Arc<DecisionTable>> {
        names
            .iter()
            .find_map(|n| self.table(n))
            .or_else(|| {
                self.tables.iter().find(|t| {
                    let name = t.name.to_lowercase();
                    keywords.iter().any(|k| name.contains(&k.to_lowercase()))
                })
            })
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
