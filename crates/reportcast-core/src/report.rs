//! Report conversion orchestration
//!
//! Sequences the transformation engine over one whole report: top-level
//! formulas first, then layout synthesis, then the merge of formula and
//! trigger units into one program-unit collection for code generation.
//! Aggregates the success/warning/failure counts callers rely on; every
//! translation attempt increments exactly one counter.

use crate::config::ConversionConfig;
use crate::error::Error;
use crate::layout::Synthesizer;
use crate::translation::Translator;
use crate::types::{
    ConversionMetadata, ConversionStats, ProgramUnit, ProgramUnitKind, ReportConversion,
    ReportDefinition, TranslatedExpression, TriggerSequence, Warning, WarningCode,
};
use std::time::Instant;
use tracing::{info, warn};

/// Convert one report definition end to end
///
/// A fresh [`TriggerSequence`] is created per invocation, so converting the
/// same report twice produces identical trigger names. Formula-level
/// failures under the `Fail` policy abort only that formula, never the run.
pub fn convert_report(report: &ReportDefinition, config: &ConversionConfig) -> ReportConversion {
    let start_time = Instant::now();
    let mut translator = Translator::new(config);
    let mut sequence = TriggerSequence::new();
    let mut stats = ConversionStats::default();

    // Step 1: top-level formulas
    let mut formulas: Vec<TranslatedExpression> = Vec::new();
    for expression in &report.formulas {
        stats.attempted += 1;
        match translator.translate(expression) {
            Ok(translated) => {
                if !translated.success {
                    // Skip policy drops the unit; nothing is generated
                    stats.failed += 1;
                } else if translated.is_placeholder || !translated.warnings.is_empty() {
                    stats.converted_with_warnings += 1;
                } else {
                    stats.converted += 1;
                }
                formulas.push(translated);
            }
            Err(err) => {
                stats.failed += 1;
                warn!(formula = %expression.name, error = %err, "formula translation failed");
                formulas.push(failed_result(expression.name.clone(), &err));
            }
        }
    }

    // Step 2: layout synthesis, collecting field and section triggers
    let synthesizer = Synthesizer::new(config);
    let layout = synthesizer.synthesize(
        &report.sections,
        &report.groups,
        report.page_width,
        report.page_height,
        &translator,
        &mut sequence,
    );
    stats.triggers_generated = layout.triggers.len();

    // Step 3: merge formula and trigger units for code generation
    let mut program_units: Vec<ProgramUnit> = Vec::new();
    for formula in &formulas {
        if formula.success && !formula.plsql.is_empty() {
            program_units.push(ProgramUnit {
                name: formula.target_name.clone(),
                kind: ProgramUnitKind::Formula,
                source: formula.plsql.clone(),
            });
        }
    }
    for trigger in &layout.triggers {
        program_units.push(ProgramUnit {
            name: trigger.name.clone(),
            kind: ProgramUnitKind::FormatTrigger,
            source: trigger.plsql.clone(),
        });
    }

    let status = stats.status();
    info!(
        report = %report.name,
        converted = stats.converted,
        with_warnings = stats.converted_with_warnings,
        failed = stats.failed,
        status = ?status,
        "report conversion finished"
    );

    let metadata = ConversionMetadata {
        report: report.name.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        duration_ms: Some(start_time.elapsed().as_millis() as u64),
        policy: config.stub_policy,
    };

    ReportConversion {
        formulas,
        layout,
        program_units,
        stats,
        metadata,
    }
}

/// Record for a formula whose translation raised a hard error
fn failed_result(source_name: String, err: &Error) -> TranslatedExpression {
    TranslatedExpression {
        target_name: String::new(),
        plsql: String::new(),
        return_type: String::new(),
        success: false,
        is_placeholder: false,
        warnings: vec![Warning::new(
            WarningCode::ManualReview,
            &source_name,
            err.to_string(),
        )],
        referenced_columns: Vec::new(),
        source_name,
    }
}
