//! Field conversion for the layout synthesizer
//!
//! Turns source fields into positioned output fields: coordinates move to
//! the target unit, source references are normalized to target identifiers,
//! fonts and alignments resolve through fixed lookup tables, display masks
//! go through the format mapper, and suppress rules become format triggers.

use crate::config::{sanitize_identifier, target_identifier, ConversionConfig};
use crate::formats::map_format_mask;
use crate::translation::passes::bind_column_name;
use crate::translation::trigger::{flag_trigger, suppress_trigger};
use crate::translation::Translator;
use crate::types::{
    Alignment, Field, FieldKind, OutputField, Trigger, TriggerSequence, Warning, WarningCode,
};
use crate::units::{twips_to, Unit};

/// Source face names mapped to the target platform's printer fonts
const FONT_FACES: &[(&str, &str)] = &[
    ("arial", "helvetica"),
    ("helvetica", "helvetica"),
    ("verdana", "helvetica"),
    ("tahoma", "helvetica"),
    ("calibri", "helvetica"),
    ("ms sans serif", "helvetica"),
    ("times new roman", "times"),
    ("times", "times"),
    ("georgia", "times"),
    ("courier new", "courier"),
    ("courier", "courier"),
    ("lucida console", "courier"),
];

/// Special source variables mapped to target system variables
const SPECIAL_SOURCES: &[(&str, &str)] = &[
    ("page number", "PHYSICAL_PAGE_NUMBER"),
    ("pagenumber", "PHYSICAL_PAGE_NUMBER"),
    ("total page count", "TOTAL_PHYSICAL_PAGES"),
    ("totalpagecount", "TOTAL_PHYSICAL_PAGES"),
    ("page n of m", "PAGE_N_OF_M"),
    ("print date", "CURRENT_DATE"),
    ("printdate", "CURRENT_DATE"),
    ("print time", "CURRENT_DATE"),
    ("record number", "ROWNUM"),
    ("recordnumber", "ROWNUM"),
];

pub(crate) fn resolve_font_face(face: &str, config: &ConversionConfig) -> String {
    let lower = face.trim().to_ascii_lowercase();
    FONT_FACES
        .iter()
        .find(|(source, _)| *source == lower)
        .map(|(_, target)| (*target).to_string())
        .unwrap_or_else(|| config.default_font_face.clone())
}

pub(crate) fn alignment_keyword(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Default | Alignment::Left => "LEFT",
        Alignment::Center => "CENTER",
        Alignment::Right => "RIGHT",
        Alignment::Justified => "JUSTIFY",
    }
}

/// Normalize a field's source reference to its target identifier
///
/// Strips `@`/`?` markers and braces, drops the table segment of column
/// references, and uppercases the remainder.
pub(crate) fn normalize_source(field: &Field, config: &ConversionConfig) -> String {
    let raw = field
        .source
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .trim();
    match field.kind {
        FieldKind::Column => bind_column_name(raw),
        FieldKind::Formula => {
            target_identifier(&config.formula_prefix, raw.trim_start_matches('@'))
        }
        FieldKind::Parameter => format!(
            "{}{}",
            config.parameter_prefix,
            sanitize_identifier(raw.trim_start_matches('?'))
        ),
        FieldKind::Special => {
            let lower = raw.to_ascii_lowercase();
            SPECIAL_SOURCES
                .iter()
                .find(|(source, _)| *source == lower)
                .map(|(_, target)| (*target).to_string())
                .unwrap_or_else(|| sanitize_identifier(raw))
        }
        FieldKind::Literal => raw.to_string(),
    }
}

/// Convert one source field into an output field, generating its format
/// trigger when a suppress rule is present
#[allow(clippy::too_many_arguments)]
pub(crate) fn convert_field(
    field: &Field,
    config: &ConversionConfig,
    unit: Unit,
    y_offset: f64,
    translator: &Translator<'_>,
    sequence: &mut TriggerSequence,
    triggers: &mut Vec<Trigger>,
    warnings: &mut Vec<Warning>,
) -> OutputField {
    let source = normalize_source(field, config);

    let format_mask = match field.format.mask.as_deref() {
        Some(mask) => {
            let mapped = map_format_mask(mask);
            if mapped.is_none() {
                warnings.push(Warning::new(
                    WarningCode::UnknownFormatMask,
                    &field.name,
                    format!("Format mask '{}' has no recognized components", mask),
                ));
            }
            mapped
        }
        None => None,
    };

    let mut format_trigger = None;
    let mut visible = true;
    if let Some(condition) = field.suppress_condition.as_deref() {
        // An explicit condition takes precedence over the zero/blank flags
        let trigger = suppress_trigger(translator, config, sequence, &field.name, condition);
        format_trigger = Some(trigger.name.clone());
        triggers.push(trigger);
        visible = false;
    } else if field.format.suppress_if_zero || field.format.suppress_if_blank {
        let trigger = flag_trigger(
            config,
            sequence,
            &field.name,
            &source,
            field.format.suppress_if_zero,
            field.format.suppress_if_blank,
        );
        format_trigger = Some(trigger.name.clone());
        triggers.push(trigger);
    }

    let (font_face, font_size, font_weight, font_style) = match &field.font {
        Some(font) => (
            resolve_font_face(&font.face, config),
            font.size,
            if font.bold { "BOLD" } else { "NORMAL" }.to_string(),
            if font.italic { "ITALIC" } else { "NORMAL" }.to_string(),
        ),
        None => (
            config.default_font_face.clone(),
            config.default_font_size,
            "NORMAL".to_string(),
            "NORMAL".to_string(),
        ),
    };

    OutputField {
        name: target_identifier(&config.field_prefix, &field.name),
        source,
        source_kind: field.kind,
        x: twips_to(field.x, unit),
        y: twips_to(field.y + y_offset, unit),
        width: twips_to(field.width, unit),
        height: twips_to(field.height, unit),
        font_face,
        font_size,
        font_weight,
        font_style,
        alignment: alignment_keyword(field.format.alignment).to_string(),
        format_mask,
        format_trigger,
        visible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldFormat, FontSpec};

    fn field(name: &str, source: &str, kind: FieldKind) -> Field {
        Field {
            name: name.to_string(),
            source: source.to_string(),
            kind,
            x: 1440.0,
            y: 720.0,
            width: 2880.0,
            height: 240.0,
            font: None,
            format: FieldFormat::default(),
            suppress_condition: None,
        }
    }

    fn convert(f: &Field) -> (OutputField, Vec<Trigger>, Vec<Warning>) {
        let cfg = ConversionConfig::default();
        let translator = Translator::new(&cfg);
        let mut seq = TriggerSequence::new();
        let mut triggers = Vec::new();
        let mut warnings = Vec::new();
        let out = convert_field(
            f,
            &cfg,
            Unit::Point,
            0.0,
            &translator,
            &mut seq,
            &mut triggers,
            &mut warnings,
        );
        (out, triggers, warnings)
    }

    #[test]
    fn test_column_source_normalization() {
        let (out, _, _) = convert(&field("Amount", "orders.amount", FieldKind::Column));
        assert_eq!(out.source, "AMOUNT");
        assert_eq!(out.name, "F_AMOUNT");
        assert_eq!(out.x, 72.0);
        assert_eq!(out.y, 36.0);
        assert_eq!(out.width, 144.0);
        assert_eq!(out.height, 12.0);
    }

    #[test]
    fn test_formula_and_parameter_sources() {
        let (formula, _, _) = convert(&field("Total", "{@Net Total}", FieldKind::Formula));
        assert_eq!(formula.source, "CF_NET_TOTAL");

        let (param, _, _) = convert(&field("Cutoff", "?Cutoff Date", FieldKind::Parameter));
        assert_eq!(param.source, "P_CUTOFF_DATE");
    }

    #[test]
    fn test_special_source_lookup() {
        let (out, _, _) = convert(&field("Page", "Page Number", FieldKind::Special));
        assert_eq!(out.source, "PHYSICAL_PAGE_NUMBER");
    }

    #[test]
    fn test_font_lookup_table() {
        let cfg = ConversionConfig::default();
        assert_eq!(resolve_font_face("Arial", &cfg), "helvetica");
        assert_eq!(resolve_font_face("Times New Roman", &cfg), "times");
        assert_eq!(resolve_font_face("Wingdings", &cfg), cfg.default_font_face);
    }

    #[test]
    fn test_explicit_suppress_condition() {
        let mut f = field("Balance", "ledger.balance", FieldKind::Column);
        f.suppress_condition = Some("{ledger.balance} < 0".to_string());
        let (out, triggers, _) = convert(&f);
        assert!(!out.visible);
        assert_eq!(triggers.len(), 1);
        assert_eq!(out.format_trigger.as_deref(), Some(triggers[0].name.as_str()));
        assert!(triggers[0].plsql.contains(":BALANCE < 0"));
    }

    #[test]
    fn test_zero_blank_flags_keep_field_visible() {
        let mut f = field("Amount", "orders.amount", FieldKind::Column);
        f.format.suppress_if_zero = true;
        f.format.suppress_if_blank = true;
        let (out, triggers, _) = convert(&f);
        assert!(out.visible);
        assert_eq!(triggers.len(), 1);
        assert!(triggers[0]
            .plsql
            .contains("(:AMOUNT = 0) OR (:AMOUNT IS NULL OR :AMOUNT = '')"));
    }

    #[test]
    fn test_unknown_mask_warns() {
        let mut f = field("Code", "items.code", FieldKind::Column);
        f.format.mask = Some("@@##".to_string());
        let (out, _, warnings) = convert(&f);
        assert!(out.format_mask.is_none());
        assert_eq!(warnings[0].code, WarningCode::UnknownFormatMask);
    }

    #[test]
    fn test_default_font_applied() {
        let (out, _, _) = convert(&field("X", "t.x", FieldKind::Column));
        assert_eq!(out.font_face, "helvetica");
        assert_eq!(out.font_size, 10);

        let mut f = field("Y", "t.y", FieldKind::Column);
        f.font = Some(FontSpec {
            face: "Courier New".to_string(),
            size: 8,
            bold: true,
            italic: false,
            underline: false,
        });
        let (out, _, _) = convert(&f);
        assert_eq!(out.font_face, "courier");
        assert_eq!(out.font_weight, "BOLD");
    }
}
