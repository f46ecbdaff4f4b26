//! Expression translation engine
//!
//! Rewrites formulas and conditions from the source report language into
//! PL/SQL program units. Translation is a fixed-order sequence of
//! whole-string rewrite passes over an explicit intermediate value; the
//! ordering is a hard contract documented on each pass.
//!
//! Copyright (c) 2025 Reportcast Team
//! Licensed under the Apache-2.0 license

pub(crate) mod conditional;
pub(crate) mod functions;
pub(crate) mod passes;
pub mod trigger;

use crate::config::{target_identifier, ConversionConfig};
use crate::error::{Error, Severity, StubPolicy};
use crate::formats::{map_type, safe_default};
use crate::types::{Expression, TranslatedExpression, Warning, WarningCode};
use crate::Result;
use passes::Rewrite;
use std::collections::HashSet;
use tracing::debug;

/// Translates source expressions into target program units
///
/// The translator is cheap to construct and holds only the configuration
/// and the set of target names already handed out, which keeps derived
/// identifiers collision-free within one report run.
pub struct Translator<'a> {
    config: &'a ConversionConfig,
    used_names: HashSet<String>,
}

impl<'a> Translator<'a> {
    pub fn new(config: &'a ConversionConfig) -> Self {
        Self {
            config,
            used_names: HashSet::new(),
        }
    }

    /// Translate one formula into a target program unit
    ///
    /// Never fails for malformed input under the `Placeholder` (default)
    /// and `Skip` policies; under `Fail` an untranslatable expression
    /// raises [`Error::PolicyViolation`] for that expression only.
    pub fn translate(&mut self, expression: &Expression) -> Result<TranslatedExpression> {
        let target_name = self.claim_target_name(&expression.name);
        let return_type = map_type(expression.value_kind, None, None, None);
        let default = safe_default(expression.value_kind);

        if expression.text.trim().is_empty() {
            let warning = Warning::new(
                WarningCode::EmptyExpression,
                &expression.name,
                "Expression body is empty; translated to NULL",
            );
            let plsql = wrap_function(&target_name, &return_type, "NULL", default);
            return Ok(TranslatedExpression {
                source_name: expression.name.clone(),
                target_name,
                plsql,
                return_type,
                success: true,
                is_placeholder: false,
                warnings: vec![warning],
                referenced_columns: Vec::new(),
            });
        }

        let rw = self.rewrite(&expression.name, &expression.text);
        debug!(formula = %expression.name, "rewrote expression body");

        let needs_stub = rw.warnings.iter().any(|w| {
            matches!(
                w.code,
                WarningCode::UnsupportedFunction | WarningCode::ManualReview
            )
        });

        if needs_stub {
            match self.config.stub_policy {
                StubPolicy::Fail => {
                    return Err(Error::PolicyViolation {
                        message: format!(
                            "formula '{}' requires a placeholder: {}",
                            expression.name,
                            first_stub_reason(&rw.warnings)
                        ),
                        policy: StubPolicy::Fail,
                        severity: Severity::Error,
                    });
                }
                StubPolicy::Skip => {
                    return Ok(TranslatedExpression {
                        source_name: expression.name.clone(),
                        target_name,
                        plsql: String::new(),
                        return_type,
                        success: false,
                        is_placeholder: false,
                        warnings: rw.warnings,
                        referenced_columns: rw.referenced_columns,
                    });
                }
                StubPolicy::Placeholder => {
                    let plsql = wrap_placeholder(
                        &target_name,
                        &return_type,
                        &expression.text,
                        &rw.text,
                        &first_stub_reason(&rw.warnings),
                        default,
                    );
                    return Ok(TranslatedExpression {
                        source_name: expression.name.clone(),
                        target_name,
                        plsql,
                        return_type,
                        success: true,
                        is_placeholder: true,
                        warnings: rw.warnings,
                        referenced_columns: rw.referenced_columns,
                    });
                }
            }
        }

        let plsql = wrap_function(&target_name, &return_type, &rw.text, default);
        Ok(TranslatedExpression {
            source_name: expression.name.clone(),
            target_name,
            plsql,
            return_type,
            success: true,
            is_placeholder: false,
            warnings: rw.warnings,
            referenced_columns: rw.referenced_columns,
        })
    }

    /// Run the rewrite pipeline on a bare condition, without wrapping
    ///
    /// Used by the trigger specialization, which owns its own boolean
    /// wrapping and naming.
    pub(crate) fn rewrite_condition(&self, path: &str, text: &str) -> Rewrite {
        if text.trim().is_empty() {
            let mut rw = Rewrite::new("FALSE");
            rw.warnings.push(Warning::new(
                WarningCode::EmptyExpression,
                path,
                "Condition body is empty; translated to FALSE",
            ));
            return rw;
        }
        self.rewrite(path, text)
    }

    /// The fixed-order pass pipeline; ordering is load-bearing
    fn rewrite(&self, path: &str, text: &str) -> Rewrite {
        let rw = Rewrite::new(text);
        let rw = passes::map_field_references(rw);
        let rw = passes::map_formula_references(rw, self.config);
        let rw = passes::map_parameter_references(rw, self.config);
        let rw = passes::map_operators(rw);
        let rw = functions::map_function_calls(rw, path);
        let rw = conditional::flatten_conditionals(rw, path);
        passes::cleanup(rw)
    }

    /// Derive a deterministic, collision-avoided target identifier
    fn claim_target_name(&mut self, source_name: &str) -> String {
        let base = target_identifier(&self.config.formula_prefix, source_name);
        let mut candidate = base.clone();
        let mut n = 1;
        while self.used_names.contains(&candidate) {
            n += 1;
            let suffix = format!("_{}", n);
            let mut stem = base.clone();
            stem.truncate(30 - suffix.len());
            candidate = format!("{}{}", stem, suffix);
        }
        self.used_names.insert(candidate.clone());
        candidate
    }
}

/// Wrap a rewritten body in a target function declaration
///
/// The exception handler converts any runtime error into the safe default
/// so one bad formula cannot abort whole-document generation.
pub(crate) fn wrap_function(name: &str, return_type: &str, body: &str, default: &str) -> String {
    format!(
        "FUNCTION {name} RETURN {return_type} IS\n\
         BEGIN\n\
         \x20\x20RETURN ({body});\n\
         EXCEPTION\n\
         \x20\x20WHEN OTHERS THEN\n\
         \x20\x20\x20\x20RETURN {default};\n\
         END;"
    )
}

fn wrap_placeholder(
    name: &str,
    return_type: &str,
    original: &str,
    partial: &str,
    reason: &str,
    default: &str,
) -> String {
    let mut commented = String::new();
    for line in original.lines() {
        commented.push_str("  --   ");
        commented.push_str(line);
        commented.push('\n');
    }
    format!(
        "FUNCTION {name} RETURN {return_type} IS\n\
         \x20\x20-- Automatic translation incomplete; original expression:\n\
         {commented}\
         \x20\x20-- Partial rewrite: {partial}\n\
         \x20\x20-- Reason: {reason}\n\
         BEGIN\n\
         \x20\x20RETURN {default};\n\
         END;"
    )
}

fn first_stub_reason(warnings: &[Warning]) -> String {
    warnings
        .iter()
        .find(|w| {
            matches!(
                w.code,
                WarningCode::UnsupportedFunction | WarningCode::ManualReview
            )
        })
        .map(|w| w.message.clone())
        .unwrap_or_else(|| "unsupported construct".to_string())
}

/// Convenience entry point: translate one expression with a throwaway
/// translator
pub fn translate(expression: &Expression, config: &ConversionConfig) -> Result<TranslatedExpression> {
    Translator::new(config).translate(expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueKind;

    fn config() -> ConversionConfig {
        ConversionConfig::default()
    }

    fn expr(name: &str, text: &str, kind: ValueKind) -> Expression {
        Expression::new(name, text, kind)
    }

    #[test]
    fn test_full_pipeline() {
        let cfg = config();
        let result = translate(
            &expr("Net Total", "{orders.amount} - {orders.discount}", ValueKind::Currency),
            &cfg,
        )
        .unwrap();
        assert_eq!(result.target_name, "CF_NET_TOTAL");
        assert_eq!(result.return_type, "NUMBER(15,2)");
        assert!(result.success);
        assert!(!result.is_placeholder);
        assert!(result.plsql.contains("RETURN (:AMOUNT - :DISCOUNT);"));
        assert!(result.plsql.contains("WHEN OTHERS THEN"));
        assert!(result.plsql.contains("RETURN 0;"));
        assert_eq!(result.referenced_columns, vec!["AMOUNT", "DISCOUNT"]);
    }

    #[test]
    fn test_empty_expression() {
        let cfg = config();
        let result = translate(&expr("Blank", "", ValueKind::String), &cfg).unwrap();
        assert!(result.success);
        assert!(!result.is_placeholder);
        assert!(result.plsql.contains("RETURN (NULL);"));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, WarningCode::EmptyExpression);
        assert_eq!(result.warnings[0].severity, Severity::Info);
    }

    #[test]
    fn test_function_template_with_field() {
        let cfg = config();
        let result = translate(
            &expr("Short Name", "Left({customer.name}, 5)", ValueKind::String),
            &cfg,
        )
        .unwrap();
        assert!(result.plsql.contains("SUBSTR(:NAME, 1, 5)"));
        assert_eq!(result.referenced_columns, vec!["NAME"]);
    }

    #[test]
    fn test_placeholder_policy() {
        let cfg = config();
        let result = translate(
            &expr("Branchy", "Switch({a} > 1, 'x', {a} > 2, 'y')", ValueKind::String),
            &cfg,
        )
        .unwrap();
        assert!(result.success);
        assert!(result.is_placeholder);
        assert!(result.plsql.contains("-- Automatic translation incomplete"));
        assert!(result.plsql.contains("Switch({a} > 1, 'x', {a} > 2, 'y')"));
        assert!(result.plsql.contains("RETURN NULL;"));
    }

    #[test]
    fn test_skip_policy() {
        let cfg = ConversionConfig {
            stub_policy: StubPolicy::Skip,
            ..ConversionConfig::default()
        };
        let result = translate(&expr("Branchy", "Choose(2, 'a', 'b')", ValueKind::String), &cfg)
            .unwrap();
        assert!(!result.success);
        assert!(!result.is_placeholder);
        assert!(result.plsql.is_empty());
    }

    #[test]
    fn test_fail_policy() {
        let cfg = ConversionConfig {
            stub_policy: StubPolicy::Fail,
            ..ConversionConfig::default()
        };
        let result = translate(&expr("Branchy", "Choose(2, 'a', 'b')", ValueKind::String), &cfg);
        assert!(matches!(result, Err(Error::PolicyViolation { .. })));
    }

    #[test]
    fn test_boolean_wrapping() {
        let cfg = config();
        let result = translate(
            &expr("Is Overdue", "{due_date} < CurrentDate()", ValueKind::Boolean),
            &cfg,
        )
        .unwrap();
        assert_eq!(result.return_type, "BOOLEAN");
        assert!(result.plsql.contains("RETURN (:DUE_DATE < TRUNC(SYSDATE));"));
        assert!(result.plsql.contains("RETURN FALSE;"));
    }

    #[test]
    fn test_name_collision_avoidance() {
        let cfg = config();
        let mut translator = Translator::new(&cfg);
        let a = translator
            .translate(&expr("Total", "1", ValueKind::Number))
            .unwrap();
        let b = translator
            .translate(&expr("Total", "2", ValueKind::Number))
            .unwrap();
        assert_eq!(a.target_name, "CF_TOTAL");
        assert_eq!(b.target_name, "CF_TOTAL_2");
    }

    #[test]
    fn test_nested_conditional_end_to_end() {
        let cfg = config();
        let result = translate(
            &expr(
                "Bucket",
                "IIF({A}>1,'X',IIF({B}>2,'Y','Z'))",
                ValueKind::String,
            ),
            &cfg,
        )
        .unwrap();
        assert!(result
            .plsql
            .contains("CASE WHEN :A>1 THEN 'X' WHEN :B>2 THEN 'Y' ELSE 'Z' END"));
    }

    #[test]
    fn test_comment_stripping() {
        let cfg = config();
        let result = translate(
            &expr("Net", "{a} // net of tax\n + {b}", ValueKind::Number),
            &cfg,
        )
        .unwrap();
        assert!(result.plsql.contains("RETURN (:A + :B);"));
    }
}
