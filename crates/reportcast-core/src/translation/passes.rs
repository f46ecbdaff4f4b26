//! Reference and operator rewrite passes
//!
//! Each pass is a pure function over the [`Rewrite`] intermediate value and
//! targets one non-overlapping syntactic category. The pass order in
//! [`super::Translator::translate`] is a hard contract: a later, more
//! general pass must never re-match text produced or protected by an
//! earlier one. Field references run before any function matching so brace
//! content is never mistaken for a call.

use crate::config::{sanitize_identifier, target_identifier, ConversionConfig};
use crate::types::Warning;
use once_cell::sync::Lazy;
use regex::Regex;

/// Intermediate value threaded through the rewrite pipeline
#[derive(Debug, Clone)]
pub(crate) struct Rewrite {
    pub text: String,
    pub warnings: Vec<Warning>,
    pub referenced_columns: Vec<String>,
}

impl Rewrite {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            warnings: Vec::new(),
            referenced_columns: Vec::new(),
        }
    }
}

static FIELD_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\s*([A-Za-z_][A-Za-z0-9_ ]*(?:\.[A-Za-z_][A-Za-z0-9_ ]*)*)\s*\}")
        .expect("field reference pattern")
});

static BRACED_FORMULA_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{@\s*([^{}]+?)\s*\}").expect("braced formula pattern"));

static BARE_FORMULA_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z_][A-Za-z0-9_]*)").expect("bare formula pattern"));

static BRACED_PARAM_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\?\s*([^{}]+?)\s*\}").expect("braced parameter pattern"));

static BARE_PARAM_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?([A-Za-z_][A-Za-z0-9_]*)").expect("bare parameter pattern"));

static WORD_OPERATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(and|or|not|mod)\b").expect("word operator pattern"));

/// Normalize a field reference to its bind-variable column name
///
/// Takes the last dot-segment of a `table.column` path, uppercases, and
/// maps interior spaces to underscores.
pub(crate) fn bind_column_name(reference: &str) -> String {
    let last = reference.rsplit('.').next().unwrap_or(reference);
    last.trim().to_ascii_uppercase().replace(' ', "_")
}

/// Pass 1: `{column}` / `{table.column}` references become bind variables
///
/// Only braces whose content starts with an identifier character match;
/// `{@formula}` and `{?parameter}` are left for the later passes.
pub(crate) fn map_field_references(mut rw: Rewrite) -> Rewrite {
    let mut columns: Vec<String> = Vec::new();
    let text = FIELD_REF
        .replace_all(&rw.text, |caps: &regex::Captures<'_>| {
            let column = bind_column_name(&caps[1]);
            if !columns.contains(&column) {
                columns.push(column.clone());
            }
            format!(":{}", column)
        })
        .into_owned();
    rw.text = text;
    rw.referenced_columns.extend(columns);
    rw
}

/// Pass 2: `@formula` / `{@formula}` references become calls to the derived
/// target program unit
pub(crate) fn map_formula_references(mut rw: Rewrite, config: &ConversionConfig) -> Rewrite {
    let braced = BRACED_FORMULA_REF.replace_all(&rw.text, |caps: &regex::Captures<'_>| {
        target_identifier(&config.formula_prefix, &caps[1])
    });
    let text = BARE_FORMULA_REF
        .replace_all(&braced, |caps: &regex::Captures<'_>| {
            target_identifier(&config.formula_prefix, &caps[1])
        })
        .into_owned();
    rw.text = text;
    rw
}

/// Pass 3: `?parameter` / `{?parameter}` references become parameter bind
/// variables
pub(crate) fn map_parameter_references(mut rw: Rewrite, config: &ConversionConfig) -> Rewrite {
    let braced = BRACED_PARAM_REF.replace_all(&rw.text, |caps: &regex::Captures<'_>| {
        format!(":{}{}", config.parameter_prefix, sanitize_identifier(&caps[1]))
    });
    let text = BARE_PARAM_REF
        .replace_all(&braced, |caps: &regex::Captures<'_>| {
            format!(":{}{}", config.parameter_prefix, sanitize_identifier(&caps[1]))
        })
        .into_owned();
    rw.text = text;
    rw
}

/// Pass 4: word operators and the string-concatenation symbol
///
/// Word operators are matched case-insensitively at word boundaries. The
/// `&` concatenation symbol maps to `||`, guarded so the `&&` logical-AND
/// token is never split into two half-replacements.
pub(crate) fn map_operators(mut rw: Rewrite) -> Rewrite {
    let text = WORD_OPERATOR
        .replace_all(&rw.text, |caps: &regex::Captures<'_>| {
            caps[1].to_ascii_uppercase()
        })
        .into_owned();
    rw.text = map_concatenation(&text);
    rw
}

/// Replace single `&` with `||`; `&&` stays a logical AND keyword
fn map_concatenation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '&' {
            if i + 1 < chars.len() && chars[i + 1] == '&' {
                out.push_str(" AND ");
                i += 2;
            } else {
                out.push_str("||");
                i += 1;
            }
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Pass 7: strip source line comments and collapse whitespace
///
/// Both transformations respect single-quoted string literals.
pub(crate) fn cleanup(mut rw: Rewrite) -> Rewrite {
    let stripped = strip_line_comments(&rw.text);
    rw.text = collapse_whitespace(&stripped);
    rw
}

fn strip_line_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let mut in_string = false;
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            if ch == '\'' {
                in_string = !in_string;
            }
            if !in_string && ch == '/' && i + 1 < chars.len() && chars[i + 1] == '/' {
                break;
            }
            out.push(ch);
            i += 1;
        }
        out.push('\n');
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut pending_space = false;
    for ch in text.chars() {
        if ch == '\'' {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            in_string = !in_string;
            out.push(ch);
        } else if !in_string && ch.is_whitespace() {
            pending_space = true;
        } else {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        }
    }
    out.trim().to_string()
}
