//! Value-type and display-format mapping between the two platforms
//!
//! Type mapping is a fixed table keyed by the closed [`ValueKind`] set, with
//! per-call size/precision overrides that replace (never merge with) the
//! defaults. Format-mask mapping first tries an exact lookup against a
//! curated table of common masks, then falls back to ordered component
//! substitution; a mask with no recognized components maps to `None` rather
//! than a false positive.

use crate::types::ValueKind;

/// Map a declared value type to a target type declaration
///
/// `length` applies to string kinds, `precision`/`scale` to numeric kinds.
/// Overrides replace the table defaults; unknown kinds fall back to a
/// generic wide text type.
pub fn map_type(
    kind: ValueKind,
    length: Option<u32>,
    precision: Option<u32>,
    scale: Option<u32>,
) -> String {
    match kind {
        ValueKind::String => format!("VARCHAR2({})", length.unwrap_or(255)),
        ValueKind::Memo => format!("VARCHAR2({})", length.unwrap_or(4000)),
        ValueKind::Number => match (precision, scale) {
            (Some(p), Some(s)) => format!("NUMBER({},{})", p, s),
            (Some(p), None) => format!("NUMBER({})", p),
            _ => "NUMBER".to_string(),
        },
        ValueKind::Currency => format!(
            "NUMBER({},{})",
            precision.unwrap_or(15),
            scale.unwrap_or(2)
        ),
        ValueKind::Date | ValueKind::DateTime | ValueKind::Time => "DATE".to_string(),
        ValueKind::Boolean => "BOOLEAN".to_string(),
        ValueKind::Unknown => "VARCHAR2(4000)".to_string(),
    }
}

/// Default value a generated program unit returns from its error handler
pub fn safe_default(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Number | ValueKind::Currency => "0",
        ValueKind::Boolean => "FALSE",
        ValueKind::String
        | ValueKind::Memo
        | ValueKind::Date
        | ValueKind::DateTime
        | ValueKind::Time
        | ValueKind::Unknown => "NULL",
    }
}

/// Exact-match table of common source masks
const EXACT_MASKS: &[(&str, &str)] = &[
    ("#,##0", "FM999G999G990"),
    ("#,##0.00", "FM999G999G990D00"),
    ("0.00", "FM990D00"),
    ("0", "FM990"),
    ("0%", "FM990\"%\""),
    ("0.00%", "FM990D00\"%\""),
    ("$#,##0.00", "FML999G999G990D00"),
    ("$#,##0", "FML999G999G990"),
    ("($#,##0.00)", "FML999G999G990D00PR"),
    ("-$#,##0.00", "FML999G999G990D00MI"),
    ("MM/dd/yyyy", "MM/DD/YYYY"),
    ("M/d/yy", "MM/DD/RR"),
    ("dd/MM/yyyy", "DD/MM/YYYY"),
    ("yyyy-MM-dd", "YYYY-MM-DD"),
    ("dd-MMM-yyyy", "DD-MON-YYYY"),
    ("dd-MMM-yy", "DD-MON-RR"),
    ("MMMM d, yyyy", "MONTH DD, YYYY"),
    ("HH:mm:ss", "HH24:MI:SS"),
    ("HH:mm", "HH24:MI"),
    ("hh:mm:ss tt", "HH12:MI:SS AM"),
    ("hh:mm tt", "HH12:MI AM"),
    ("MM/dd/yyyy HH:mm:ss", "MM/DD/YYYY HH24:MI:SS"),
];

/// Date components, substituted before time components so `mm` is still
/// unambiguously a minute token when the time pass runs
const DATE_COMPONENTS: &[(&str, &str)] = &[
    ("yyyy", "YYYY"),
    ("yy", "RR"),
    ("MMMM", "MONTH"),
    ("MMM", "MON"),
    ("MM", "MM"),
    ("M", "MM"),
    ("dddd", "DAY"),
    ("ddd", "DY"),
    ("dd", "DD"),
    ("d", "DD"),
];

const TIME_COMPONENTS: &[(&str, &str)] = &[
    ("HH", "HH24"),
    ("hh", "HH12"),
    ("mm", "MI"),
    ("m", "MI"),
    ("ss", "SS"),
    ("s", "SS"),
    ("tt", "AM"),
];

/// Map a source display mask to a target format mask
///
/// Returns `None` when neither the exact table nor component substitution
/// recognized anything, so callers never receive a mask that is really just
/// the unmapped input.
pub fn map_format_mask(mask: &str) -> Option<String> {
    if mask.is_empty() {
        return None;
    }
    if let Some((_, target)) = EXACT_MASKS.iter().find(|(source, _)| *source == mask) {
        return Some((*target).to_string());
    }
    let substituted = substitute_components(mask);
    if substituted == mask {
        None
    } else {
        Some(substituted)
    }
}

/// Single left-to-right scan substituting the longest matching component at
/// each position, date tokens first
fn substitute_components(mask: &str) -> String {
    let mut out = String::with_capacity(mask.len());
    let mut i = 0;
    'outer: while i < mask.len() {
        let rest = &mask[i..];
        for (source, target) in DATE_COMPONENTS.iter().chain(TIME_COMPONENTS) {
            if rest.starts_with(source) {
                out.push_str(target);
                i += source.len();
                continue 'outer;
            }
        }
        if let Some(ch) = rest.chars().next() {
            out.push(ch);
            i += ch.len_utf8();
        } else {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_table_defaults() {
        assert_eq!(map_type(ValueKind::String, None, None, None), "VARCHAR2(255)");
        assert_eq!(map_type(ValueKind::Memo, None, None, None), "VARCHAR2(4000)");
        assert_eq!(map_type(ValueKind::Number, None, None, None), "NUMBER");
        assert_eq!(map_type(ValueKind::Currency, None, None, None), "NUMBER(15,2)");
        assert_eq!(map_type(ValueKind::Date, None, None, None), "DATE");
        assert_eq!(map_type(ValueKind::DateTime, None, None, None), "DATE");
        assert_eq!(map_type(ValueKind::Boolean, None, None, None), "BOOLEAN");
        assert_eq!(map_type(ValueKind::Unknown, None, None, None), "VARCHAR2(4000)");
    }

    #[test]
    fn test_type_overrides_replace() {
        assert_eq!(map_type(ValueKind::String, Some(80), None, None), "VARCHAR2(80)");
        assert_eq!(map_type(ValueKind::Number, None, Some(10), Some(4)), "NUMBER(10,4)");
        assert_eq!(map_type(ValueKind::Number, None, Some(10), None), "NUMBER(10)");
        // Currency overrides replace the 15,2 default entirely
        assert_eq!(map_type(ValueKind::Currency, None, Some(9), Some(0)), "NUMBER(9,0)");
    }

    #[test]
    fn test_exact_mask_lookup() {
        assert_eq!(map_format_mask("#,##0.00").as_deref(), Some("FM999G999G990D00"));
        assert_eq!(map_format_mask("dd-MMM-yy").as_deref(), Some("DD-MON-RR"));
        assert_eq!(map_format_mask("HH:mm:ss").as_deref(), Some("HH24:MI:SS"));
    }

    #[test]
    fn test_component_substitution() {
        assert_eq!(
            map_format_mask("yyyy.MM.dd").as_deref(),
            Some("YYYY.MM.DD")
        );
        assert_eq!(
            map_format_mask("dddd, MMMM d yyyy").as_deref(),
            Some("DAY, MONTH DD YYYY")
        );
        assert_eq!(map_format_mask("hh:mm tt").as_deref(), Some("HH12:MI AM"));
    }

    #[test]
    fn test_unrecognized_mask_is_none() {
        assert_eq!(map_format_mask("@@##!!"), None);
        assert_eq!(map_format_mask(""), None);
    }

    #[test]
    fn test_safe_defaults() {
        assert_eq!(safe_default(ValueKind::Number), "0");
        assert_eq!(safe_default(ValueKind::Boolean), "FALSE");
        assert_eq!(safe_default(ValueKind::String), "NULL");
    }
}
