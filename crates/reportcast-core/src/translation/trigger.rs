//! Format-trigger generation
//!
//! Suppress conditions and suppress-if-zero/blank flags become boolean
//! PL/SQL format triggers. The pipeline is the same as for formulas; only
//! the entry points, the boolean wrapping, and the run-scoped naming
//! differ. Trigger names combine the configured prefix, the sanitized
//! owning-field name, and the caller-owned [`TriggerSequence`] counter, so
//! resetting the sequence between reports reproduces identical names.

use super::{wrap_function, Translator};
use crate::config::{sanitize_identifier, ConversionConfig};
use crate::types::{Trigger, TriggerKind, TriggerSequence};

/// Derive the run-unique trigger name
fn trigger_name(config: &ConversionConfig, field_name: &str, sequence: &mut TriggerSequence) -> String {
    let counter = sequence.advance();
    let suffix = format!("_{}", counter);
    let mut stem = format!(
        "{}{}",
        config.trigger_prefix,
        sanitize_identifier(field_name)
    );
    stem.truncate(30 - suffix.len());
    while stem.ends_with('_') {
        stem.pop();
    }
    format!("{}{}", stem, suffix)
}

/// Build a suppress trigger from a free-text boolean condition
pub fn suppress_trigger(
    translator: &Translator<'_>,
    config: &ConversionConfig,
    sequence: &mut TriggerSequence,
    field_name: &str,
    condition: &str,
) -> Trigger {
    let name = trigger_name(config, field_name, sequence);
    let rw = translator.rewrite_condition(&name, condition);
    let plsql = wrap_function(&name, "BOOLEAN", &rw.text, "FALSE");
    Trigger {
        name,
        plsql,
        kind: TriggerKind::Suppress,
        original_condition: condition.to_string(),
        warnings: rw.warnings,
    }
}

/// Build a suppress trigger from the zero/blank flag pair
///
/// The two checks are OR-combined against the field's own bound name; at
/// least one flag must be set by the caller.
pub fn flag_trigger(
    config: &ConversionConfig,
    sequence: &mut TriggerSequence,
    field_name: &str,
    bound_name: &str,
    suppress_if_zero: bool,
    suppress_if_blank: bool,
) -> Trigger {
    let name = trigger_name(config, field_name, sequence);
    let mut checks = Vec::new();
    if suppress_if_zero {
        checks.push(format!("(:{} = 0)", bound_name));
    }
    if suppress_if_blank {
        checks.push(format!("(:{0} IS NULL OR :{0} = '')", bound_name));
    }
    let body = if checks.is_empty() {
        "FALSE".to_string()
    } else {
        checks.join(" OR ")
    };
    let original = match (suppress_if_zero, suppress_if_blank) {
        (true, true) => "suppress if zero or blank",
        (true, false) => "suppress if zero",
        (false, true) => "suppress if blank",
        (false, false) => "suppress disabled",
    };
    let plsql = wrap_function(&name, "BOOLEAN", &body, "FALSE");
    Trigger {
        name,
        plsql,
        kind: TriggerKind::Suppress,
        original_condition: original.to_string(),
        warnings: Vec::new(),
    }
}

/// Build a conditional-format trigger from a free-text condition
pub fn conditional_format_trigger(
    translator: &Translator<'_>,
    config: &ConversionConfig,
    sequence: &mut TriggerSequence,
    field_name: &str,
    condition: &str,
) -> Trigger {
    let name = trigger_name(config, field_name, sequence);
    let rw = translator.rewrite_condition(&name, condition);
    let plsql = wrap_function(&name, "BOOLEAN", &rw.text, "FALSE");
    Trigger {
        name,
        plsql,
        kind: TriggerKind::ConditionalFormat,
        original_condition: condition.to_string(),
        warnings: rw.warnings,
    }
}
