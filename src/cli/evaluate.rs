//! Flow, table, requirements and explanation commands

use super::util::{print_json, Options};
use fireclass::*;
use serde::Serialize;

pub fn cmd_evaluate(opts: &Options) -> Result<()> {
    let config = opts.engine_config()?;
    let snapshot = opts.snapshot(&config)?;
    let result = evaluate_complete(&snapshot.model, &config, &opts.context()?);
    print_json(&result)
}

pub fn cmd_basic(opts: &Options) -> Result<()> {
    let config = opts.engine_config()?;
    let snapshot = opts.snapshot(&config)?;
    let result = evaluate_basic(&snapshot.model, &config, &opts.context()?);
    print_json(&result)
}

pub fn cmd_explain(opts: &Options) -> Result<()> {
    let config = opts.engine_config()?;
    let snapshot = opts.snapshot(&config)?;
    let context = normalize_inputs(&config, &opts.context()?);
    let result = evaluate_complete(&snapshot.model, &config, &context);
    print_json(&explain(&snapshot.model, &context, &result))
}

pub fn cmd_requirements(opts: &Options, table: Option<&str>) -> Result<()> {
    let config = opts.engine_config()?;
    let snapshot = opts.snapshot(&config)?;
    let context = normalize_inputs(&config, &opts.context()?);
    let table = table.unwrap_or(&config.requirements_table);
    print_json(&evaluate_requirements(&snapshot.model, &context, table)?)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TableReport {
    table: String,
    matched: bool,
    matches: Vec<MatchResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing_inputs: Vec<FieldHint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    candidates: Vec<Candidate>,
}

/// Evaluate one table; on a miss, report what is missing instead
pub fn cmd_table(opts: &Options, name: &str, collect: bool) -> Result<()> {
    let config = opts.engine_config()?;
    let snapshot = opts.snapshot(&config)?;
    let context = normalize_inputs(&config, &opts.context()?);
    let table = snapshot
        .model
        .table(name)
        .ok_or_else(|| Error::TableNotFound(name.to_string()))?;

    let policy = collect.then_some(HitPolicy::CollectAll);
    let matches = evaluate(table, &context, policy).into_matches();

    let report = if matches.is_empty() {
        TableReport {
            table: table.name().to_string(),
            matched: false,
            matches,
            missing_inputs: diagnose_missing_inputs(table, &context, config.diagnostics.top_k),
            candidates: enumerate_candidates(
                table,
                &context,
                None,
                config.diagnostics.candidate_limit,
            ),
        }
    } else {
        TableReport {
            table: table.name().to_string(),
            matched: true,
            matches,
            missing_inputs: Vec::new(),
            candidates: Vec::new(),
        }
    };
    print_json(&report)
}
