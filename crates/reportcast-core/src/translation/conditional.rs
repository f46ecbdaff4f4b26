//! Conditional-expression flattening
//!
//! Ternary-style `IIF(cond, then, else)` calls rewrite to the target's
//! `CASE WHEN ... THEN ... ELSE ... END` form. Because conditionals nest in
//! the else branch, the rewrite is a bounded fixed-point iteration: the same
//! rule is re-applied, innermost call first, until no match remains or the
//! iteration cap is hit. The cap guarantees termination on pathological
//! input without needing an AST.

use super::functions::{matching_paren, split_arguments};
use super::passes::Rewrite;
use crate::types::{Warning, WarningCode};

/// Iteration cap for the fixed point; each iteration eliminates one call
pub(crate) const MAX_CONDITIONAL_PASSES: usize = 20;

/// Pass 6: flatten conditional calls into CASE expressions
pub(crate) fn flatten_conditionals(mut rw: Rewrite, path: &str) -> Rewrite {
    for _ in 0..MAX_CONDITIONAL_PASSES {
        match rewrite_innermost(&rw.text) {
            Some(rewritten) => rw.text = rewritten,
            None => break,
        }
    }
    if find_conditional(&rw.text, 0).is_some() {
        rw.warnings.push(Warning::new(
            WarningCode::ManualReview,
            path,
            "Conditional call could not be flattened; left untouched",
        ));
    }
    rw
}

/// Rewrite the first conditional whose arguments contain no nested
/// conditional. When the else branch is itself an already-flattened CASE
/// expression, its WHEN arms are spliced into the outer CASE so nesting
/// collapses into a single expression.
fn rewrite_innermost(text: &str) -> Option<String> {
    let mut search_from = 0;
    while let Some((start, open)) = find_conditional(text, search_from) {
        let Some(close) = matching_paren(text, open) else {
            return None;
        };
        let inner = &text[open + 1..close];
        if find_conditional(inner, 0).is_some() {
            // Not innermost; descend by continuing the scan inside
            search_from = open + 1;
            continue;
        }
        let args = split_arguments(inner);
        if args.len() != 3 {
            // Malformed call; skip past it and look for the next one
            search_from = close + 1;
            continue;
        }
        let case = build_case(&args[0], &args[1], &args[2]);
        let mut out = String::with_capacity(text.len() + case.len());
        out.push_str(&text[..start]);
        out.push_str(&case);
        out.push_str(&text[close + 1..]);
        return Some(out);
    }
    None
}

fn build_case(cond: &str, then_branch: &str, else_branch: &str) -> String {
    if let Some(rest) = else_branch.strip_prefix("CASE WHEN ") {
        if else_branch.ends_with(" END") {
            // Splice: CASE WHEN c1 THEN t1 WHEN c2 ... END
            return format!("CASE WHEN {} THEN {} WHEN {}", cond, then_branch, rest);
        }
    }
    format!(
        "CASE WHEN {} THEN {} ELSE {} END",
        cond, then_branch, else_branch
    )
}

/// Locate the next `IIF(` call at or after `from`, outside string literals
fn find_conditional(text: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut in_string = false;
    for (idx, ch) in text.char_indices() {
        if ch == '\'' {
            in_string = !in_string;
            continue;
        }
        if in_string || idx < from {
            continue;
        }
        let b = &bytes[idx..];
        if b.len() < 3
            || b[0].to_ascii_lowercase() != b'i'
            || b[1].to_ascii_lowercase() != b'i'
            || b[2].to_ascii_lowercase() != b'f'
        {
            continue;
        }
        let preceded_ok = idx == 0
            || !bytes[idx - 1].is_ascii_alphanumeric() && bytes[idx - 1] != b'_';
        if !preceded_ok {
            continue;
        }
        // Allow whitespace between the name and the parenthesis
        let mut open = idx + 3;
        while open < bytes.len() && bytes[open].is_ascii_whitespace() {
            open += 1;
        }
        if open < bytes.len() && bytes[open] == b'(' {
            return Some((idx, open));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> Rewrite {
        flatten_conditionals(Rewrite::new(text), "test")
    }

    #[test]
    fn test_simple_conditional() {
        let rw = run("IIF(:A > 1, 'X', 'Y')");
        assert_eq!(rw.text, "CASE WHEN :A > 1 THEN 'X' ELSE 'Y' END");
        assert!(rw.warnings.is_empty());
    }

    #[test]
    fn test_nested_conditional_collapses() {
        let rw = run("IIF(:A > 1, 'X', IIF(:B > 2, 'Y', 'Z'))");
        assert_eq!(
            rw.text,
            "CASE WHEN :A > 1 THEN 'X' WHEN :B > 2 THEN 'Y' ELSE 'Z' END"
        );
        assert_eq!(rw.text.matches("WHEN").count(), 2);
        assert_eq!(rw.text.matches("END").count(), 1);
    }

    #[test]
    fn test_conditional_in_then_branch_stays_nested() {
        let rw = run("IIF(:A > 1, IIF(:B > 2, 'Y', 'Z'), 'X')");
        assert_eq!(
            rw.text,
            "CASE WHEN :A > 1 THEN CASE WHEN :B > 2 THEN 'Y' ELSE 'Z' END ELSE 'X' END"
        );
    }

    #[test]
    fn test_case_insensitive_name() {
        let rw = run("iif(:A = 1, 1, 0)");
        assert_eq!(rw.text, "CASE WHEN :A = 1 THEN 1 ELSE 0 END");
    }

    #[test]
    fn test_malformed_conditional_left_untouched() {
        let rw = run("IIF(:A > 1, 'X')");
        assert_eq!(rw.text, "IIF(:A > 1, 'X')");
        assert_eq!(rw.warnings.len(), 1);
        assert_eq!(rw.warnings[0].code, WarningCode::ManualReview);
    }

    #[test]
    fn test_string_literal_not_matched() {
        let rw = run("'IIF(' || :A");
        assert_eq!(rw.text, "'IIF(' || :A");
        assert!(rw.warnings.is_empty());
    }

    #[test]
    fn test_deep_nesting_terminates() {
        let mut text = ":V".to_string();
        for i in 0..30 {
            text = format!("IIF(:C{} = 1, {}, 0)", i, text);
        }
        let rw = run(&text);
        // The cap leaves the residue flagged rather than looping forever
        assert!(rw.text.len() > 0);
    }
}
