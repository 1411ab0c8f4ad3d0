//! Property tests for condition matching and rule selection

use fireclass::*;
use proptest::prelude::*;
use serde_json::json;

fn any_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Boolean),
        (-10_000i32..10_000).prop_map(|n| Value::Number(f64::from(n))),
        "[a-zA-Z0-9 ]{0,10}".prop_map(Value::Text),
        Just(Value::Absent),
    ]
}

fn any_condition() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        (prop::sample::select(vec!["<", "<=", ">", ">=", "="]), -1000i32..1000)
            .prop_map(|(op, n)| format!("{}{}", op, n)),
        prop::collection::vec(0i32..20, 1..4).prop_map(|ns| ns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")),
        "[a-z]{1,8}".prop_map(|s| format!("\"{}\"", s)),
        "[a-z]{1,6}".prop_map(|s| format!("\"{}\", \"other\"", s)),
    ]
}

proptest! {
    #[test]
    fn empty_condition_accepts_everything(value in any_value()) {
        let aliases = AliasTable::default();
        prop_assert!(matches(&value, &Condition::parse(""), &aliases));
        prop_assert!(matches_field(None, &Condition::parse(""), &aliases));
    }

    #[test]
    fn absent_never_satisfies_a_constraint(cell in any_condition()) {
        let condition = Condition::parse(&cell);
        prop_assume!(!condition.is_empty());
        let aliases = AliasTable::default();
        prop_assert!(!matches(&Value::Absent, &condition, &aliases));
        prop_assert!(!matches_field(None, &condition, &aliases));
    }

    #[test]
    fn comparisons_follow_numeric_order(n in -5000i32..5000, t in -5000i32..5000) {
        let aliases = AliasTable::empty();
        let (n, t) = (f64::from(n), f64::from(t));
        let value = Value::Number(n);
        prop_assert_eq!(matches(&value, &Condition::parse(&format!("<={}", t)), &aliases), n <= t);
        prop_assert_eq!(matches(&value, &Condition::parse(&format!("<{}", t)), &aliases), n < t);
        prop_assert_eq!(matches(&value, &Condition::parse(&format!(">={}", t)), &aliases), n >= t);
        prop_assert_eq!(matches(&value, &Condition::parse(&format!(">{}", t)), &aliases), n > t);
    }

    #[test]
    fn text_equality_ignores_case_and_padding(s in "[a-z]{1,12}") {
        let aliases = AliasTable::default();
        let condition = Condition::parse(&format!("\"{}\"", s));
        let shouted = Value::Text(format!("  {}  ", s.to_uppercase()));
        prop_assert!(matches(&shouted, &condition, &aliases));
    }

    #[test]
    fn annex_spellings_match_their_canonical_token(
        spelling in prop::sample::select(vec!["1", "1.0", "1a", "1A", "1.1", "11", "1b", "1B"]),
    ) {
        let aliases = AliasTable::default();
        let canonical = aliases.canonicalize(spelling).unwrap().to_string();
        let value = Value::Text(spelling.to_string());

        let quoted = Condition::parse(&format!("\"{}\"", canonical));
        prop_assert!(matches(&value, &quoted, &aliases));

        let listed = Condition::parse(&format!("{}, 2", canonical));
        prop_assert!(matches(&value, &listed, &aliases));

        let other = if canonical == "1a" { "1b" } else { "1a" };
        let other_quoted = Condition::parse(&format!("\"{}\"", other));
        prop_assert!(!matches(&value, &other_quoted, &aliases));
    }

    #[test]
    fn first_match_is_first_of_collected(
        cells in prop::collection::vec(any_condition(), 1..8),
        value in any_value(),
    ) {
        let rules: Vec<_> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| json!({ "i1": cell, "o1": i.to_string() }))
            .collect();
        let table = DecisionTable::from_json(
            &json!({
                "id": "p",
                "name": "Property",
                "inputs": [{ "id": "i1", "field": "x" }],
                "outputs": [{ "id": "o1", "field": "out" }],
                "rules": rules
            })
            .to_string(),
        )
        .unwrap();
        let ctx = Context::new().with("x", value);

        let first = evaluate_first(&table, &ctx).map(|m| m.rule_number);
        let all: Vec<_> = evaluate_all(&table, &ctx).iter().map(|m| m.rule_number).collect();

        prop_assert_eq!(first, all.first().copied());
        prop_assert!(all.windows(2).all(|w| w[0] < w[1]));
    }
}
