//! End-to-end classification scenarios

use fireclass::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn model() -> DecisionModel {
    DecisionModel::from_value(
        json!([
            {
                "id": "ak",
                "name": "Anvendelseskategori 2.0",
                "inputs": [
                    { "id": "i1", "field": "usage", "name": "Usage" },
                    { "id": "i2", "field": "area", "name": "Floor area (m2)" },
                    { "id": "i3", "field": "floors", "name": "Floors" }
                ],
                "outputs": [{ "id": "o1", "field": "anvendelseskategori" }],
                "rules": [
                    { "i1": "\"office\"", "i2": "<=100", "i3": "", "o1": "1" },
                    { "i1": "\"warehouse\"", "i2": "", "i3": ">=2", "o1": "3" }
                ]
            },
            {
                "id": "rk",
                "name": "Risikoklasse",
                "inputs": [
                    { "id": "i1", "field": "anvendelseskategori" },
                    { "id": "i2", "field": "floors", "name": "Floors" }
                ],
                "outputs": [{ "id": "o1", "field": "risikoklasse" }],
                "rules": [
                    { "i1": "1", "i2": "<=4", "o1": "2" },
                    { "i1": "3", "i2": "", "o1": "3" }
                ]
            },
            {
                "id": "rb",
                "name": "Relevant bilag",
                "inputs": [{ "id": "i1", "field": "risikoklasse" }],
                "outputs": [
                    { "id": "o1", "field": "relevant_bilag" },
                    { "id": "o2", "field": "Bilagsinformation" }
                ],
                "rules": [
                    { "i1": "2", "o1": "\"1.1\"", "o2": "\"Annex 1b applies\"" }
                ]
            },
            {
                "id": "bk",
                "name": "Brandklasse",
                "inputs": [
                    { "id": "i1", "field": "risikoklasse" },
                    { "id": "i2", "field": "relevant_bilag" },
                    { "id": "i3", "field": "sprinklered_area", "name": "Sprinklered area (m2)" }
                ],
                "outputs": [
                    { "id": "o1", "field": "brandklasse" },
                    { "id": "o2", "field": "krav" }
                ],
                "rules": [
                    { "i1": "2", "i2": "\"1b\"", "i3": "<=500", "o1": "2", "o2": "" },
                    { "i1": "2", "i2": "", "i3": "", "o1": "3", "o2": "\"Sprinkler documentation\"" }
                ]
            }
        ]),
        Arc::new(AliasTable::default()),
    )
    .unwrap()
}

fn office() -> Context {
    Context::new()
        .with("floors", 1)
        .with("area", 80)
        .with("usage", "office")
        .with("sprinklered_area", 650)
}

#[test]
fn test_office_matches_first_use_category_rule() {
    let model = model();
    let table = model.table("Anvendelseskategori 2.0").unwrap();

    let matched = evaluate_first(table, &office()).unwrap();
    assert_eq!(matched.rule_number, 1);
    assert_eq!(matched.matched_rule_id, "ak_rule_0");
    assert_eq!(matched.output("anvendelseskategori"), Some(&json!("1")));
}

#[test]
fn test_missing_area_is_reported_as_near_miss() {
    let model = model();
    let table = model.table("Anvendelseskategori 2.0").unwrap();
    let mut ctx = office();
    ctx.remove("area");

    assert!(evaluate_first(table, &ctx).is_none());

    let hints = diagnose_missing_inputs(table, &ctx, 5);
    assert_eq!(
        hints,
        vec![FieldHint {
            field: "area".to_string(),
            question: "Floor area (m2)".to_string(),
            table_name: "Anvendelseskategori 2.0".to_string(),
            missing_in_rule_count: 1,
            score: 1,
        }]
    );
}

#[test]
fn test_flow_halts_after_required_miss() {
    let model = model();
    let config = EngineConfig::default();
    let mut ctx = office();
    ctx.remove("area");

    let result = evaluate_complete(&model, &config, &ctx);
    assert!(!result.success);
    assert_eq!(
        result.errors,
        vec!["No matching rule in Anvendelseskategori 2.0".to_string()]
    );
    assert_eq!(result.missing_inputs.len(), 1);
    assert_eq!(result.missing_inputs[0].field, "area");

    let statuses: Vec<_> = result.stages.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![
            StageStatus::Unresolved,
            StageStatus::Speculative,
            StageStatus::Speculative,
            StageStatus::Speculative,
        ]
    );
    assert!(result.value(Stage::FireClass).is_none());

    // speculative stages still say what is reachable from the inputs so far
    let risk = result.stage(Stage::RiskClass).unwrap();
    let values: Vec<_> = risk.candidates.iter().map(|c| c.value.clone()).collect();
    assert_eq!(values, vec![json!("2"), json!("3")]);
    let targets: Vec<_> = risk.suggestions.iter().map(|s| s.target_value).collect();
    assert_eq!(targets, vec![2, 3]);

    let annex = result.stage(Stage::RelevantAnnex).unwrap();
    assert_eq!(annex.candidates.len(), 1);
    assert!(annex.suggestions.is_empty());

    let fire = result.stage(Stage::FireClass).unwrap();
    let values: Vec<_> = fire.candidates.iter().map(|c| c.value.clone()).collect();
    assert_eq!(values, vec![json!("3")]);
    let targets: Vec<_> = fire.suggestions.iter().map(|s| s.target_value).collect();
    assert_eq!(targets, vec![3, 2]);
    assert_eq!(fire.suggestions[1].numeric_adjustments[0].delta_abs, 150.0);
}

#[test]
fn test_annex_value_matches_through_alias() {
    let table = DecisionTable::from_json(
        &json!({
            "id": "t",
            "name": "Annex options",
            "inputs": [{ "id": "i1", "field": "relevant_bilag" }],
            "outputs": [{ "id": "o1", "field": "ok" }],
            "rules": [{ "i1": "\"1a\", \"1b\"", "o1": "true" }]
        })
        .to_string(),
    )
    .unwrap();

    let ctx = Context::new().with("relevant_bilag", "1.1");
    assert!(evaluate_first(&table, &ctx).is_some());

    let ctx = Context::new().with("relevant_bilag", "2");
    assert!(evaluate_first(&table, &ctx).is_none());
}

#[test]
fn test_full_flow_resolves_every_stage() {
    let model = model();
    let result = evaluate_complete(&model, &EngineConfig::default(), &office());

    assert!(result.success, "{:?}", result.errors);
    assert_eq!(result.value(Stage::UseCategory), Some(&StageValue::Integer(1)));
    assert_eq!(result.value(Stage::RiskClass), Some(&StageValue::Integer(2)));
    assert_eq!(
        result.value(Stage::RelevantAnnex),
        Some(&StageValue::Token("1b".to_string()))
    );
    assert_eq!(result.value(Stage::FireClass), Some(&StageValue::Integer(3)));

    let annex = result.stage(Stage::RelevantAnnex).unwrap();
    assert_eq!(annex.description.as_deref(), Some("Annex 1b applies"));

    let fire = result.stage(Stage::FireClass).unwrap();
    assert_eq!(fire.precondition.as_deref(), Some("Sprinkler documentation"));
    assert_eq!(
        fire.description.as_deref(),
        Some("Fire class 3 (requires: Sprinkler documentation)")
    );
}

#[test]
fn test_fire_class_suggests_smaller_sprinklered_area() {
    let model = model();
    let result = evaluate_complete(&model, &EngineConfig::default(), &office());
    let fire = result.stage(Stage::FireClass).unwrap();

    assert_eq!(fire.suggestions.len(), 1);
    let suggestion = &fire.suggestions[0];
    assert_eq!(suggestion.target_value, 2);
    assert!(suggestion.required_fields.is_empty());
    assert_eq!(suggestion.numeric_adjustments.len(), 1);

    let adjustment = &suggestion.numeric_adjustments[0];
    assert_eq!(adjustment.field, "sprinklered_area");
    assert_eq!(adjustment.direction, Direction::Decrease);
    assert_eq!(adjustment.delta_abs, 150.0);

    let serialized = serde_json::to_value(adjustment).unwrap();
    assert_eq!(serialized["direction"], json!("decrease"));
    assert_eq!(serialized["deltaAbs"], json!(150.0));
}

#[test]
fn test_condensed_flow_matches_leading_stages() {
    let model = model();
    let config = EngineConfig::default();

    for ctx in [office(), Context::new().with("usage", "warehouse").with("floors", 3), Context::new()] {
        let complete = evaluate_complete(&model, &config, &ctx);
        let basic = evaluate_basic(&model, &config, &ctx);

        assert_eq!(basic.stages.len(), config.condensed_stages);
        assert_eq!(basic.stages[..], complete.stages[..basic.stages.len()]);
    }
}

#[test]
fn test_missing_optional_table_does_not_fail_flow() {
    let mut config = EngineConfig::default();
    for stage in &mut config.stages {
        if stage.stage == Stage::RelevantAnnex {
            stage.table = "Bilag 9".to_string();
            stage.keywords = vec!["does-not-exist".to_string()];
        }
    }
    let model = model();

    let result = evaluate_complete(&model, &config, &office().with("relevant_bilag", "1b"));
    assert!(result.success, "{:?}", result.errors);
    assert_eq!(
        result.stage(Stage::RelevantAnnex).unwrap().status,
        StageStatus::TableMissing
    );
    assert_eq!(result.value(Stage::FireClass), Some(&StageValue::Integer(3)));
}
