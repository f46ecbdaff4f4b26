//! Built-in function mapping
//!
//! The source formula language's builtins are modeled as a closed
//! enumeration so unmapped cases are a compile-time concern, not a missing
//! dictionary key. Each variant carries its accepted argument count and a
//! [`FunctionMapping`]: most are positional templates, a handful need
//! bespoke expansion (date-part dispatch, windowed aggregates), and a few
//! have no safe mapping at all and are left in place for manual follow-up.
//!
//! Copyright (c) 2025 Reportcast Team
//! Licensed under the Apache-2.0 license

use super::passes::Rewrite;
use crate::types::{Warning, WarningCode};
use std::ops::RangeInclusive;

/// How a recognized source function translates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FunctionMapping {
    /// Positional template: `{0}`, `{1}`, ... or `{*}` for all arguments
    Template(&'static str),
    /// Date-part extraction dispatching on the interval keyword argument
    DatePart,
    /// Date arithmetic dispatching on the interval keyword argument
    DateAdd,
    /// Date difference dispatching on the interval keyword argument
    DateDiff,
    /// Date construction from one string or three numeric components
    DateConstruct,
    /// Windowed-aggregate approximation; exact semantics cannot be
    /// guaranteed, so this always warns
    Windowed(&'static str),
    /// No safe direct mapping; left untouched and flagged
    Unsupported,
}

/// Closed set of recognized source builtins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SourceFunction {
    // String functions
    Left,
    Right,
    Mid,
    UpperCase,
    LowerCase,
    Trim,
    TrimLeft,
    TrimRight,
    Length,
    InStr,
    Replace,
    ReplicateString,
    Space,
    StrReverse,
    ProperCase,
    Chr,
    Asc,
    Val,
    // Conversion functions
    ToText,
    ToNumber,
    ToCurrency,
    ToBoolean,
    ToWords,
    CDate,
    CDateTime,
    CTime,
    DateValue,
    // Math functions
    Abs,
    Round,
    Truncate,
    Int,
    Sqr,
    Exp,
    Log,
    Sgn,
    Remainder,
    // Aggregates
    Sum,
    Count,
    DistinctCount,
    Average,
    Minimum,
    Maximum,
    StdDev,
    Variance,
    // Windowed
    RunningTotal,
    Previous,
    Next,
    // Null handling
    IsNull,
    // Current date and time
    CurrentDate,
    CurrentDateTime,
    CurrentTime,
    // Date parts
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    DayOfWeek,
    WeekdayName,
    MonthName,
    // Date construction and arithmetic
    Date,
    DateSerial,
    DateTimeValue,
    DatePart,
    DateAdd,
    DateDiff,
    // Multi-branch conditionals with no safe direct mapping
    Switch,
    Choose,
    // Free-form validation with no direct counterpart
    NumericText,
}

impl SourceFunction {
    /// Resolve a source call name, including aliases, case-insensitively
    pub(crate) fn parse(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let func = match lower.as_str() {
            "left" => Self::Left,
            "right" => Self::Right,
            "mid" => Self::Mid,
            "ucase" | "uppercase" => Self::UpperCase,
            "lcase" | "lowercase" => Self::LowerCase,
            "trim" => Self::Trim,
            "trimleft" | "ltrim" => Self::TrimLeft,
            "trimright" | "rtrim" => Self::TrimRight,
            "length" | "len" => Self::Length,
            "instr" => Self::InStr,
            "replace" => Self::Replace,
            "replicatestring" => Self::ReplicateString,
            "space" => Self::Space,
            "strreverse" => Self::StrReverse,
            "propercase" => Self::ProperCase,
            "chr" | "chrw" => Self::Chr,
            "asc" | "ascw" => Self::Asc,
            "val" => Self::Val,
            "totext" | "cstr" => Self::ToText,
            "tonumber" | "cdbl" => Self::ToNumber,
            "ccur" => Self::ToCurrency,
            "cbool" => Self::ToBoolean,
            "towords" => Self::ToWords,
            "cdate" => Self::CDate,
            "cdatetime" => Self::CDateTime,
            "ctime" => Self::CTime,
            "datevalue" => Self::DateValue,
            "abs" => Self::Abs,
            "round" => Self::Round,
            "truncate" => Self::Truncate,
            "int" => Self::Int,
            "sqr" => Self::Sqr,
            "exp" => Self::Exp,
            "log" => Self::Log,
            "sgn" => Self::Sgn,
            "remainder" => Self::Remainder,
            "sum" => Self::Sum,
            "count" => Self::Count,
            "distinctcount" => Self::DistinctCount,
            "average" => Self::Average,
            "minimum" => Self::Minimum,
            "maximum" => Self::Maximum,
            "stddev" => Self::StdDev,
            "variance" => Self::Variance,
            "runningtotal" | "rtotal" => Self::RunningTotal,
            "previous" => Self::Previous,
            "next" => Self::Next,
            "isnull" => Self::IsNull,
            "currentdate" | "today" => Self::CurrentDate,
            "currentdatetime" | "now" => Self::CurrentDateTime,
            "currenttime" => Self::CurrentTime,
            "year" => Self::Year,
            "month" => Self::Month,
            "day" => Self::Day,
            "hour" => Self::Hour,
            "minute" => Self::Minute,
            "second" => Self::Second,
            "dayofweek" | "weekday" => Self::DayOfWeek,
            "weekdayname" => Self::WeekdayName,
            "monthname" => Self::MonthName,
            "date" => Self::Date,
            "dateserial" => Self::DateSerial,
            "datetime" | "datetimevalue" => Self::DateTimeValue,
            "datepart" => Self::DatePart,
            "dateadd" => Self::DateAdd,
            "datediff" => Self::DateDiff,
            "switch" => Self::Switch,
            "choose" => Self::Choose,
            "numerictext" | "isnumeric" => Self::NumericText,
            _ => return None,
        };
        Some(func)
    }

    /// Accepted argument counts
    pub(crate) fn arity(self) -> RangeInclusive<usize> {
        match self {
            Self::CurrentDate | Self::CurrentDateTime | Self::CurrentTime => 0..=0,
            Self::UpperCase
            | Self::LowerCase
            | Self::Trim
            | Self::TrimLeft
            | Self::TrimRight
            | Self::Length
            | Self::Space
            | Self::StrReverse
            | Self::ProperCase
            | Self::Chr
            | Self::Asc
            | Self::Val
            | Self::ToNumber
            | Self::ToCurrency
            | Self::ToBoolean
            | Self::CDateTime
            | Self::CTime
            | Self::DateValue
            | Self::Abs
            | Self::Int
            | Self::Sqr
            | Self::Exp
            | Self::Log
            | Self::Sgn
            | Self::IsNull
            | Self::Year
            | Self::Month
            | Self::Day
            | Self::Hour
            | Self::Minute
            | Self::Second
            | Self::DayOfWeek
            | Self::WeekdayName
            | Self::MonthName
            | Self::RunningTotal
            | Self::Previous
            | Self::Next
            | Self::NumericText => 1..=1,
            Self::Left | Self::Right | Self::InStr | Self::ReplicateString | Self::Remainder => {
                2..=2
            }
            Self::Mid => 2..=3,
            Self::ToText | Self::Round | Self::Truncate | Self::ToWords => 1..=2,
            Self::Replace => 3..=3,
            Self::Sum
            | Self::Count
            | Self::DistinctCount
            | Self::Average
            | Self::Minimum
            | Self::Maximum
            | Self::StdDev
            | Self::Variance => 1..=2,
            Self::CDate | Self::Date => 1..=3,
            Self::DateSerial => 3..=3,
            Self::DateTimeValue => 1..=6,
            Self::DatePart => 2..=4,
            Self::DateAdd => 3..=3,
            Self::DateDiff => 3..=5,
            Self::Switch | Self::Choose => 2..=usize::MAX,
        }
    }

    /// Target mapping for this function
    pub(crate) fn mapping(self) -> FunctionMapping {
        use FunctionMapping::*;
        match self {
            Self::Left => Template("SUBSTR({0}, 1, {1})"),
            Self::Right => Template("SUBSTR({0}, -({1}))"),
            Self::Mid => Template("SUBSTR({*})"),
            Self::UpperCase => Template("UPPER({0})"),
            Self::LowerCase => Template("LOWER({0})"),
            Self::Trim => Template("TRIM({0})"),
            Self::TrimLeft => Template("LTRIM({0})"),
            Self::TrimRight => Template("RTRIM({0})"),
            Self::Length => Template("LENGTH({0})"),
            Self::InStr => Template("INSTR({0}, {1})"),
            Self::Replace => Template("REPLACE({0}, {1}, {2})"),
            Self::ReplicateString => Template("RPAD({0}, LENGTH({0}) * ({1}), {0})"),
            Self::Space => Template("RPAD(' ', {0})"),
            Self::StrReverse => Unsupported,
            Self::ProperCase => Template("INITCAP({0})"),
            Self::Chr => Template("CHR({0})"),
            Self::Asc => Template("ASCII({0})"),
            Self::Val => Template("TO_NUMBER({0})"),
            Self::ToText => Template("TO_CHAR({*})"),
            Self::ToNumber => Template("TO_NUMBER({0})"),
            Self::ToCurrency => Template("TO_NUMBER({0})"),
            Self::ToBoolean => Template("({0} <> 0)"),
            Self::ToWords => Unsupported,
            Self::CDate => DateConstruct,
            Self::CDateTime => Template("TO_DATE({0})"),
            Self::CTime => Template("TO_DATE({0})"),
            Self::DateValue => Template("TO_DATE({0})"),
            Self::Abs => Template("ABS({0})"),
            Self::Round => Template("ROUND({*})"),
            Self::Truncate => Template("TRUNC({*})"),
            Self::Int => Template("FLOOR({0})"),
            Self::Sqr => Template("SQRT({0})"),
            Self::Exp => Template("EXP({0})"),
            Self::Log => Template("LN({0})"),
            Self::Sgn => Template("SIGN({0})"),
            Self::Remainder => Template("MOD({0}, {1})"),
            Self::Sum => Template("SUM({0})"),
            Self::Count => Template("COUNT({0})"),
            Self::DistinctCount => Template("COUNT(DISTINCT {0})"),
            Self::Average => Template("AVG({0})"),
            Self::Minimum => Template("MIN({0})"),
            Self::Maximum => Template("MAX({0})"),
            Self::StdDev => Template("STDDEV({0})"),
            Self::Variance => Template("VARIANCE({0})"),
            Self::RunningTotal => Windowed("SUM"),
            Self::Previous => Windowed("LAG"),
            Self::Next => Windowed("LEAD"),
            Self::IsNull => Template("({0} IS NULL)"),
            Self::CurrentDate => Template("TRUNC(SYSDATE)"),
            Self::CurrentDateTime => Template("SYSDATE"),
            Self::CurrentTime => Template("SYSDATE"),
            Self::Year => Template("EXTRACT(YEAR FROM {0})"),
            Self::Month => Template("EXTRACT(MONTH FROM {0})"),
            Self::Day => Template("EXTRACT(DAY FROM {0})"),
            Self::Hour => Template("TO_NUMBER(TO_CHAR({0}, 'HH24'))"),
            Self::Minute => Template("TO_NUMBER(TO_CHAR({0}, 'MI'))"),
            Self::Second => Template("TO_NUMBER(TO_CHAR({0}, 'SS'))"),
            Self::DayOfWeek => Template("TO_NUMBER(TO_CHAR({0}, 'D'))"),
            Self::WeekdayName => Template("TO_CHAR({0}, 'DAY')"),
            Self::MonthName => Template("TO_CHAR({0}, 'MONTH')"),
            Self::Date => DateConstruct,
            Self::DateSerial => DateConstruct,
            Self::DateTimeValue => DateConstruct,
            Self::DatePart => DatePart,
            Self::DateAdd => DateAdd,
            Self::DateDiff => DateDiff,
            Self::Switch => Unsupported,
            Self::Choose => Unsupported,
            Self::NumericText => Unsupported,
        }
    }

    /// Canonical display name used in warnings
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Mid => "Mid",
            Self::UpperCase => "UpperCase",
            Self::LowerCase => "LowerCase",
            Self::Trim => "Trim",
            Self::TrimLeft => "TrimLeft",
            Self::TrimRight => "TrimRight",
            Self::Length => "Length",
            Self::InStr => "InStr",
            Self::Replace => "Replace",
            Self::ReplicateString => "ReplicateString",
            Self::Space => "Space",
            Self::StrReverse => "StrReverse",
            Self::ProperCase => "ProperCase",
            Self::Chr => "Chr",
            Self::Asc => "Asc",
            Self::Val => "Val",
            Self::ToText => "ToText",
            Self::ToNumber => "ToNumber",
            Self::ToCurrency => "CCur",
            Self::ToBoolean => "CBool",
            Self::ToWords => "ToWords",
            Self::CDate => "CDate",
            Self::CDateTime => "CDateTime",
            Self::CTime => "CTime",
            Self::DateValue => "DateValue",
            Self::Abs => "Abs",
            Self::Round => "Round",
            Self::Truncate => "Truncate",
            Self::Int => "Int",
            Self::Sqr => "Sqr",
            Self::Exp => "Exp",
            Self::Log => "Log",
            Self::Sgn => "Sgn",
            Self::Remainder => "Remainder",
            Self::Sum => "Sum",
            Self::Count => "Count",
            Self::DistinctCount => "DistinctCount",
            Self::Average => "Average",
            Self::Minimum => "Minimum",
            Self::Maximum => "Maximum",
            Self::StdDev => "StdDev",
            Self::Variance => "Variance",
            Self::RunningTotal => "RunningTotal",
            Self::Previous => "Previous",
            Self::Next => "Next",
            Self::IsNull => "IsNull",
            Self::CurrentDate => "CurrentDate",
            Self::CurrentDateTime => "CurrentDateTime",
            Self::CurrentTime => "CurrentTime",
            Self::Year => "Year",
            Self::Month => "Month",
            Self::Day => "Day",
            Self::Hour => "Hour",
            Self::Minute => "Minute",
            Self::Second => "Second",
            Self::DayOfWeek => "DayOfWeek",
            Self::WeekdayName => "WeekdayName",
            Self::MonthName => "MonthName",
            Self::Date => "Date",
            Self::DateSerial => "DateSerial",
            Self::DateTimeValue => "DateTime",
            Self::DatePart => "DatePart",
            Self::DateAdd => "DateAdd",
            Self::DateDiff => "DateDiff",
            Self::Switch => "Switch",
            Self::Choose => "Choose",
            Self::NumericText => "NumericText",
        }
    }
}

/// Index of the closing parenthesis matching the one at `open`,
/// quote-aware
pub(crate) fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    for (idx, ch) in text.char_indices().skip_while(|(idx, _)| *idx < open) {
        match ch {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split an argument list on top-level commas only
///
/// A depth counter over the substring keeps commas inside nested calls,
/// parenthesized sub-expressions, and string literals from splitting.
pub(crate) fn split_arguments(args: &str) -> Vec<String> {
    let trimmed = args.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut current = String::new();
    for ch in args.chars() {
        match ch {
            '\'' => {
                in_string = !in_string;
                current.push(ch);
            }
            '(' if !in_string => {
                depth += 1;
                current.push(ch);
            }
            ')' if !in_string => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if !in_string && depth == 0 => {
                out.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(ch),
        }
    }
    out.push(current.trim().to_string());
    out
}

/// Apply a positional template to already-rewritten arguments
fn apply_template(template: &str, args: &[String]) -> String {
    let mut out = template.to_string();
    if out.contains("{*}") {
        out = out.replace("{*}", &args.join(", "));
    }
    for (idx, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{}}}", idx), arg);
    }
    out
}

/// Strip surrounding quotes from an interval keyword argument
fn interval_keyword(arg: &str) -> String {
    arg.trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .to_ascii_lowercase()
}

/// Expand a recognized function call into target text
///
/// Returns `None` when the call must stay untouched (unsupported mapping or
/// unknown interval keyword); the caller records the warning and moves on.
pub(crate) fn expand_call(
    func: SourceFunction,
    args: &[String],
    rw: &mut Rewrite,
    path: &str,
) -> Option<String> {
    let arity = func.arity();
    if !arity.contains(&args.len()) {
        rw.warnings.push(Warning::new(
            WarningCode::ArityMismatch,
            path,
            format!(
                "{} called with {} argument(s), expected {}..{}",
                func.name(),
                args.len(),
                arity.start(),
                if *arity.end() == usize::MAX {
                    "n".to_string()
                } else {
                    arity.end().to_string()
                }
            ),
        ));
    }

    match func.mapping() {
        FunctionMapping::Template(template) => {
            if matches!(
                func,
                SourceFunction::Sum
                    | SourceFunction::Count
                    | SourceFunction::DistinctCount
                    | SourceFunction::Average
                    | SourceFunction::Minimum
                    | SourceFunction::Maximum
                    | SourceFunction::StdDev
                    | SourceFunction::Variance
            ) && args.len() > 1
            {
                rw.warnings.push(Warning::new(
                    WarningCode::Approximation,
                    path,
                    format!(
                        "{}: per-group aggregate condensed to a plain aggregate; verify grouping",
                        func.name()
                    ),
                ));
            }
            Some(apply_template(template, args))
        }
        FunctionMapping::Windowed(agg) => {
            rw.warnings.push(Warning::new(
                WarningCode::Approximation,
                path,
                format!(
                    "{} approximated with {}() OVER (ORDER BY ROWNUM); exact semantics not guaranteed",
                    func.name(),
                    agg
                ),
            ));
            Some(format!(
                "{}({}) OVER (ORDER BY ROWNUM)",
                agg,
                args.first().map(String::as_str).unwrap_or("NULL")
            ))
        }
        FunctionMapping::DateConstruct => Some(expand_date_construct(args)),
        FunctionMapping::DatePart => expand_date_part(args, rw, path),
        FunctionMapping::DateAdd => expand_date_add(args, rw, path),
        FunctionMapping::DateDiff => expand_date_diff(args, rw, path),
        FunctionMapping::Unsupported => {
            rw.warnings.push(Warning::new(
                WarningCode::ManualReview,
                path,
                format!(
                    "{} has no direct target mapping; call left untouched",
                    func.name()
                ),
            ));
            None
        }
    }
}

fn expand_date_construct(args: &[String]) -> String {
    match args {
        [text] => format!("TO_DATE({})", text),
        [y, m, d] => format!(
            "TO_DATE(TO_CHAR({}) || '-' || TO_CHAR({}) || '-' || TO_CHAR({}), 'YYYY-MM-DD')",
            y, m, d
        ),
        _ => format!(
            "TO_DATE({})",
            args.first().map(String::as_str).unwrap_or("NULL")
        ),
    }
}

fn expand_date_part(args: &[String], rw: &mut Rewrite, path: &str) -> Option<String> {
    let (interval, date) = match args {
        [interval, date, ..] => (interval_keyword(interval), date),
        _ => return None,
    };
    let expansion = match interval.as_str() {
        "yyyy" => format!("EXTRACT(YEAR FROM {})", date),
        "q" => format!("TO_NUMBER(TO_CHAR({}, 'Q'))", date),
        "m" => format!("EXTRACT(MONTH FROM {})", date),
        "d" => format!("EXTRACT(DAY FROM {})", date),
        "h" => format!("TO_NUMBER(TO_CHAR({}, 'HH24'))", date),
        "n" => format!("TO_NUMBER(TO_CHAR({}, 'MI'))", date),
        "s" => format!("TO_NUMBER(TO_CHAR({}, 'SS'))", date),
        "y" => {
            rw.warnings.push(Warning::new(
                WarningCode::Approximation,
                path,
                "DatePart day-of-year mapped to TO_CHAR(...,'DDD')",
            ));
            format!("TO_NUMBER(TO_CHAR({}, 'DDD'))", date)
        }
        "w" => {
            rw.warnings.push(Warning::new(
                WarningCode::Approximation,
                path,
                "DatePart weekday ignores the first-day-of-week argument",
            ));
            format!("TO_NUMBER(TO_CHAR({}, 'D'))", date)
        }
        "ww" => {
            rw.warnings.push(Warning::new(
                WarningCode::Approximation,
                path,
                "DatePart week number mapped to ISO week TO_CHAR(...,'IW')",
            ));
            format!("TO_NUMBER(TO_CHAR({}, 'IW'))", date)
        }
        other => {
            rw.warnings.push(Warning::new(
                WarningCode::ManualReview,
                path,
                format!("DatePart interval '{}' not recognized; call left untouched", other),
            ));
            return None;
        }
    };
    Some(expansion)
}

fn expand_date_add(args: &[String], rw: &mut Rewrite, path: &str) -> Option<String> {
    let (interval, count, date) = match args {
        [interval, count, date] => (interval_keyword(interval), count, date),
        _ => return None,
    };
    let expansion = match interval.as_str() {
        "yyyy" => format!("ADD_MONTHS({}, 12 * ({}))", date, count),
        "q" => format!("ADD_MONTHS({}, 3 * ({}))", date, count),
        "m" => format!("ADD_MONTHS({}, {})", date, count),
        "d" | "y" | "w" => format!("{} + ({})", date, count),
        "ww" => format!("{} + 7 * ({})", date, count),
        "h" => format!("{} + ({}) / 24", date, count),
        "n" => format!("{} + ({}) / 1440", date, count),
        "s" => format!("{} + ({}) / 86400", date, count),
        other => {
            rw.warnings.push(Warning::new(
                WarningCode::ManualReview,
                path,
                format!("DateAdd interval '{}' not recognized; call left untouched", other),
            ));
            return None;
        }
    };
    Some(expansion)
}

fn expand_date_diff(args: &[String], rw: &mut Rewrite, path: &str) -> Option<String> {
    let (interval, start, end) = match args {
        [interval, start, end, ..] => (interval_keyword(interval), start, end),
        _ => return None,
    };
    let expansion = match interval.as_str() {
        "yyyy" => format!("TRUNC(MONTHS_BETWEEN({}, {}) / 12)", end, start),
        "q" => format!("TRUNC(MONTHS_BETWEEN({}, {}) / 3)", end, start),
        "m" => format!("TRUNC(MONTHS_BETWEEN({}, {}))", end, start),
        "d" => format!("(TRUNC({}) - TRUNC({}))", end, start),
        "h" => format!("TRUNC(({} - {}) * 24)", end, start),
        "n" => format!("TRUNC(({} - {}) * 1440)", end, start),
        "s" => format!("TRUNC(({} - {}) * 86400)", end, start),
        "y" => {
            rw.warnings.push(Warning::new(
                WarningCode::Approximation,
                path,
                "DateDiff day-of-year interval treated as whole days",
            ));
            format!("(TRUNC({}) - TRUNC({}))", end, start)
        }
        "w" | "ww" => {
            rw.warnings.push(Warning::new(
                WarningCode::Approximation,
                path,
                "DateDiff week interval counts whole 7-day spans, not week boundaries",
            ));
            format!("TRUNC((TRUNC({}) - TRUNC({})) / 7)", end, start)
        }
        other => {
            rw.warnings.push(Warning::new(
                WarningCode::ManualReview,
                path,
                format!("DateDiff interval '{}' not recognized; call left untouched", other),
            ));
            return None;
        }
    };
    Some(expansion)
}

/// Pass 5: rewrite recognized function calls
///
/// Scans left to right for `name(`; arguments are split on top-level commas
/// and expanded depth-first, so replacement text produced here is never
/// re-matched. Conditional calls (`IIF`) are deliberately not in the table;
/// the flattening pass owns them.
pub(crate) fn map_function_calls(mut rw: Rewrite, path: &str) -> Rewrite {
    let text = std::mem::take(&mut rw.text);
    rw.text = rewrite_calls(&text, &mut rw, path);
    rw
}

fn rewrite_calls(text: &str, rw: &mut Rewrite, path: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some((name_start, open)) = next_call_site(rest) {
        let name = &rest[name_start..open];
        let Some(close) = matching_paren(rest, open) else {
            // Unbalanced parentheses; emit as-is and stop scanning
            out.push_str(rest);
            return out;
        };
        let inner = &rest[open + 1..close];
        out.push_str(&rest[..name_start]);

        if name.eq_ignore_ascii_case("iif") {
            // Handled by the conditional flattening pass; still rewrite the
            // argument list so nested calls inside the branches resolve
            let rewritten_args: Vec<String> = split_arguments(inner)
                .into_iter()
                .map(|arg| rewrite_calls(&arg, rw, path))
                .collect();
            out.push_str(name);
            out.push('(');
            out.push_str(&rewritten_args.join(", "));
            out.push(')');
        } else if let Some(func) = SourceFunction::parse(name) {
            let args: Vec<String> = split_arguments(inner)
                .into_iter()
                .map(|arg| rewrite_calls(&arg, rw, path))
                .collect();
            match expand_call(func, &args, rw, path) {
                Some(expansion) => out.push_str(&expansion),
                None => {
                    // Left untouched for manual follow-up, original spelling
                    out.push_str(name);
                    out.push('(');
                    out.push_str(&args.join(", "));
                    out.push(')');
                }
            }
        } else {
            rw.warnings.push(Warning::new(
                WarningCode::UnsupportedFunction,
                path,
                format!("Unknown function '{}' left untouched", name),
            ));
            let args: Vec<String> = split_arguments(inner)
                .into_iter()
                .map(|arg| rewrite_calls(&arg, rw, path))
                .collect();
            out.push_str(name);
            out.push('(');
            out.push_str(&args.join(", "));
            out.push(')');
        }
        rest = &rest[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Locate the next `identifier(` call site outside string literals
///
/// Returns the identifier start and the opening parenthesis index.
fn next_call_site(text: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut in_string = false;
    let mut ident_start: Option<usize> = None;
    for (idx, ch) in text.char_indices() {
        if ch == '\'' {
            in_string = !in_string;
            ident_start = None;
            continue;
        }
        if in_string {
            continue;
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            if ident_start.is_none() {
                // A preceding ':', '.', or alphanumeric means this is not a
                // standalone call name
                let bound_ok = idx == 0
                    || !matches!(bytes[idx - 1], b':' | b'.' | b'@' | b'?')
                        && !bytes[idx - 1].is_ascii_alphanumeric()
                        && bytes[idx - 1] != b'_';
                if bound_ok {
                    ident_start = Some(idx);
                }
            }
        } else if ch.is_ascii_digit() {
            // Digits continue an identifier but cannot start one
            if ident_start.is_none() {
                continue;
            }
        } else if ch == '(' {
            if let Some(start) = ident_start {
                return Some((start, idx));
            }
        } else {
            ident_start = None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> Rewrite {
        map_function_calls(Rewrite::new(text), "test")
    }

    #[test]
    fn test_left_template() {
        let rw = run("Left(:FIELD, 5)");
        assert_eq!(rw.text, "SUBSTR(:FIELD, 1, 5)");
        assert!(rw.warnings.is_empty());
    }

    #[test]
    fn test_nested_calls() {
        let rw = run("UCase(Left(Trim(:NAME), 3))");
        assert_eq!(rw.text, "UPPER(SUBSTR(TRIM(:NAME), 1, 3))");
    }

    #[test]
    fn test_variable_arity_template() {
        assert_eq!(run("Mid(:S, 2)").text, "SUBSTR(:S, 2)");
        assert_eq!(run("Mid(:S, 2, 8)").text, "SUBSTR(:S, 2, 8)");
        assert_eq!(run("ToText(:N, '0.00')").text, "TO_CHAR(:N, '0.00')");
    }

    #[test]
    fn test_arity_mismatch_warns_but_proceeds() {
        let rw = run("Left(:FIELD)");
        assert_eq!(rw.text, "SUBSTR(:FIELD, 1, {1})");
        assert_eq!(rw.warnings.len(), 1);
        assert_eq!(rw.warnings[0].code, WarningCode::ArityMismatch);
    }

    #[test]
    fn test_unsupported_left_untouched() {
        let rw = run("Switch(:A > 1, 'x', :A > 2, 'y')");
        assert!(rw.text.starts_with("Switch("));
        assert_eq!(rw.warnings[0].code, WarningCode::ManualReview);
    }

    #[test]
    fn test_unknown_function_warns() {
        let rw = run("Frobnicate(:A)");
        assert_eq!(rw.text, "Frobnicate(:A)");
        assert_eq!(rw.warnings[0].code, WarningCode::UnsupportedFunction);
    }

    #[test]
    fn test_date_part_dispatch() {
        assert_eq!(
            run("DatePart('yyyy', :D)").text,
            "EXTRACT(YEAR FROM :D)"
        );
        assert_eq!(
            run("DatePart('ww', :D)").text,
            "TO_NUMBER(TO_CHAR(:D, 'IW'))"
        );
        let ww = run("DatePart('ww', :D)");
        assert_eq!(ww.warnings[0].code, WarningCode::Approximation);
    }

    #[test]
    fn test_date_add_dispatch() {
        assert_eq!(run("DateAdd('m', 3, :D)").text, "ADD_MONTHS(:D, 3)");
        assert_eq!(run("DateAdd('d', 7, :D)").text, ":D + (7)");
        assert_eq!(run("DateAdd('h', 12, :D)").text, ":D + (12) / 24");
    }

    #[test]
    fn test_date_diff_dispatch() {
        assert_eq!(
            run("DateDiff('d', :A, :B)").text,
            "(TRUNC(:B) - TRUNC(:A))"
        );
        assert_eq!(
            run("DateDiff('m', :A, :B)").text,
            "TRUNC(MONTHS_BETWEEN(:B, :A))"
        );
    }

    #[test]
    fn test_running_total_always_warns() {
        let rw = run("RunningTotal(:AMOUNT)");
        assert_eq!(rw.text, "SUM(:AMOUNT) OVER (ORDER BY ROWNUM)");
        assert_eq!(rw.warnings[0].code, WarningCode::Approximation);
    }

    #[test]
    fn test_string_literal_not_scanned() {
        let rw = run("'Left(' || Left(:S, 2)");
        assert_eq!(rw.text, "'Left(' || SUBSTR(:S, 1, 2)");
        assert!(rw.warnings.is_empty());
    }

    #[test]
    fn test_split_arguments_depth() {
        assert_eq!(
            split_arguments("Left(:A, 2), 'x, y', (1, 2)"),
            vec!["Left(:A, 2)", "'x, y'", "(1, 2)"]
        );
    }

    #[test]
    fn test_zero_arg_functions() {
        assert_eq!(run("CurrentDate()").text, "TRUNC(SYSDATE)");
        assert_eq!(run("Now()").text, "SYSDATE");
    }
}
