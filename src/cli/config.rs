//! Config and schema CLI commands

use super::util::print_json;
use fireclass::*;
use std::path::Path;

pub fn cmd_config_check(path: Option<&Path>, json_output: bool) -> Result<()> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let issues = config.validate();
    let errors = issues.iter().filter(|i| i.is_error()).count();
    let warnings = issues.len() - errors;

    if json_output {
        print_json(&serde_json::json!({
            "valid": errors == 0,
            "errors": errors,
            "warnings": warnings,
            "issues": issues,
        }))?;
    } else if issues.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        for issue in &issues {
            println!("{}", issue);
        }
        println!();
        if errors > 0 {
            println!("✗ {} error(s), {} warning(s)", errors, warnings);
        } else {
            println!("✓ {} warning(s) (no errors)", warnings);
        }
    }

    if errors > 0 {
        return Err("Configuration validation failed".into());
    }
    Ok(())
}

pub fn cmd_schema(name: &str) -> Result<()> {
    match name {
        "list" => {
            println!(
                "Available schemas: flow, stage, match, hint, candidate, suggestion, requirements, explanation, config"
            );
            Ok(())
        }
        "flow" => print_schema::<FlowResult>(),
        "stage" => print_schema::<StageResult>(),
        "match" => print_schema::<MatchResult>(),
        "hint" => print_schema::<FieldHint>(),
        "candidate" => print_schema::<Candidate>(),
        "suggestion" => print_schema::<Suggestion>(),
        "requirements" => print_schema::<RequirementsResult>(),
        "explanation" => print_schema::<Explanation>(),
        "config" => print_schema::<EngineConfig>(),
        _ => Err(format!("Unknown schema: {}", name).into()),
    }
}

fn print_schema<T: schemars::JsonSchema>() -> Result<()> {
    print_json(&schemars::schema_for!(T))
}
