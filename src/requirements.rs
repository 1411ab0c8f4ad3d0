//! Design requirements lookup
//!
//! Requirements are independent of each other, so every matching rule of
//! the requirements table applies: the table is always evaluated with the
//! collect policy, whatever it declares.

use crate::error::{Error, Result};
use crate::evaluate::{evaluate_all, MatchResult};
use crate::table::DecisionModel;
use crate::value::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Every requirement applying to a context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequirementsResult {
    pub success: bool,
    pub requirements: Vec<MatchResult>,
    pub count: usize,
}

/// Evaluate the table named `table` with the collect policy
pub fn evaluate_requirements(
    model: &DecisionModel,
    context: &Context,
    table: &str,
) -> Result<RequirementsResult> {
    let table = model
        .table(table)
        .ok_or_else(|| Error::TableNotFound(table.to_string()))?;

    let requirements = evaluate_all(table, context);
    debug!(table = table.name(), count = requirements.len(), "requirements collected");

    Ok(RequirementsResult {
        success: true,
        count: requirements.len(),
        requirements,
    })
}
