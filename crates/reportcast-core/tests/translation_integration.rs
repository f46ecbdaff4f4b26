//! End-to-end integration tests for the expression translation pipeline
//!
//! These tests drive the public API the way the batch converter does:
//! formulas in, PL/SQL program units out.

use pretty_assertions::assert_eq;
use reportcast_core::translation::trigger::suppress_trigger;
use reportcast_core::{
    translate, ConversionConfig, Expression, StubPolicy, Translator, TriggerSequence, ValueKind,
    WarningCode,
};

fn config() -> ConversionConfig {
    ConversionConfig::default()
}

#[test]
fn test_field_reference_normalization_property() {
    let cfg = config();
    let qualified = translate(
        &Expression::new("A", "{orders.amount}", ValueKind::Number),
        &cfg,
    )
    .unwrap();
    let bare = translate(&Expression::new("B", "{AMOUNT}", ValueKind::Number), &cfg).unwrap();

    assert!(qualified.plsql.contains("RETURN (:AMOUNT);"));
    assert!(bare.plsql.contains("RETURN (:AMOUNT);"));
    assert_eq!(qualified.referenced_columns, bare.referenced_columns);
}

#[test]
fn test_operator_case_insensitivity_property() {
    let cfg = config();
    let variants = ["{A} AND {B}", "{A} and {B}", "{A} And {B}"];
    let bodies: Vec<String> = variants
        .iter()
        .enumerate()
        .map(|(i, text)| {
            translate(
                &Expression::new(format!("F{}", i), *text, ValueKind::Boolean),
                &cfg,
            )
            .unwrap()
            .plsql
            .lines()
            .find(|l| l.contains("RETURN ("))
            .unwrap()
            .trim()
            .to_string()
        })
        .collect();
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[1], bodies[2]);
    assert!(bodies[0].contains(":A AND :B"));
}

#[test]
fn test_nested_conditional_collapse_property() {
    let cfg = config();
    let result = translate(
        &Expression::new(
            "Bucket",
            "IIF({A}>1,'X',IIF({B}>2,'Y','Z'))",
            ValueKind::String,
        ),
        &cfg,
    )
    .unwrap();
    let body = result
        .plsql
        .lines()
        .find(|l| l.contains("RETURN ("))
        .unwrap();
    assert_eq!(body.matches("WHEN").count(), 2);
    assert_eq!(body.matches("CASE").count(), 1);
    assert_eq!(body.matches(" END").count(), 1);
}

#[test]
fn test_empty_expression_property() {
    let cfg = config();
    let result = translate(&Expression::new("Blank", "", ValueKind::String), &cfg).unwrap();
    assert!(result.success);
    assert!(result.plsql.contains("RETURN (NULL);"));
    assert!(result
        .warnings
        .iter()
        .any(|w| w.code == WarningCode::EmptyExpression));
}

#[test]
fn test_function_template_property() {
    let cfg = config();
    let result = translate(
        &Expression::new("Prefix", "Left({customers.name}, 5)", ValueKind::String),
        &cfg,
    )
    .unwrap();
    assert!(result.plsql.contains("SUBSTR(:NAME, 1, 5)"));
    assert_eq!(result.referenced_columns, vec!["NAME".to_string()]);
}

#[test]
fn test_trigger_determinism_property() {
    let cfg = config();
    let translator = Translator::new(&cfg);
    let mut sequence = TriggerSequence::new();

    let first = suppress_trigger(&translator, &cfg, &mut sequence, "Balance", "{balance} < 0");
    sequence.reset();
    let second = suppress_trigger(&translator, &cfg, &mut sequence, "Balance", "{balance} < 0");
    assert_eq!(first.name, second.name);
    assert_eq!(first.plsql, second.plsql);

    let third = suppress_trigger(&translator, &cfg, &mut sequence, "Balance", "{balance} < 0");
    assert_ne!(second.name, third.name);
}

#[test]
fn test_mixed_reference_kinds() {
    let cfg = config();
    let result = translate(
        &Expression::new(
            "Flagged",
            "{orders.total} > {?Limit} and not IsNull({@Approver})",
            ValueKind::Boolean,
        ),
        &cfg,
    )
    .unwrap();
    assert!(result.plsql.contains(":TOTAL > :P_LIMIT AND NOT (CF_APPROVER IS NULL)"));
}

#[test]
fn test_concatenation_and_string_literals() {
    let cfg = config();
    let result = translate(
        &Expression::new(
            "Label",
            "{customers.last} & ', ' & {customers.first}",
            ValueKind::String,
        ),
        &cfg,
    )
    .unwrap();
    assert!(result.plsql.contains(":LAST || ', ' || :FIRST"));
}

#[test]
fn test_unsupported_function_policies() {
    let source = Expression::new("Branchy", "Switch({a}>1,'x',{a}>2,'y')", ValueKind::String);

    let placeholder = translate(&source, &config()).unwrap();
    assert!(placeholder.success);
    assert!(placeholder.is_placeholder);
    assert!(placeholder.plsql.contains("Switch({a}>1,'x',{a}>2,'y')"));

    let skip_cfg = ConversionConfig {
        stub_policy: StubPolicy::Skip,
        ..ConversionConfig::default()
    };
    let skipped = translate(&source, &skip_cfg).unwrap();
    assert!(!skipped.success);
    assert!(skipped.plsql.is_empty());

    let fail_cfg = ConversionConfig {
        stub_policy: StubPolicy::Fail,
        ..ConversionConfig::default()
    };
    assert!(translate(&source, &fail_cfg).is_err());
}

#[test]
fn test_date_arithmetic_end_to_end() {
    let cfg = config();
    let result = translate(
        &Expression::new(
            "Age Days",
            "DateDiff('d', {orders.ordered_at}, CurrentDate())",
            ValueKind::Number,
        ),
        &cfg,
    )
    .unwrap();
    assert!(result
        .plsql
        .contains("(TRUNC(TRUNC(SYSDATE)) - TRUNC(:ORDERED_AT))"));
    assert!(result.warnings.is_empty());
}

#[test]
fn test_running_total_flagged() {
    let cfg = config();
    let result = translate(
        &Expression::new("Running", "RunningTotal({orders.amount})", ValueKind::Number),
        &cfg,
    )
    .unwrap();
    assert!(result.plsql.contains("SUM(:AMOUNT) OVER (ORDER BY ROWNUM)"));
    assert!(result
        .warnings
        .iter()
        .any(|w| w.code == WarningCode::Approximation));
    assert!(!result.is_placeholder);
}
