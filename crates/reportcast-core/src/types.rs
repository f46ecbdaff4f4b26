//! Core types and data structures for the Reportcast transformation engine
//!
//! This module defines the report object graph consumed from the extraction
//! layer and the translation results handed to the target-side code
//! generator. Everything here is plain serializable data; behavior lives in
//! the translation and layout modules.

use serde::{Deserialize, Serialize};

// Re-export error types for convenience
pub use crate::error::{Severity, StubPolicy, WarningCode};

/// Name of the sentinel group binding the innermost repeating frame
/// to the detail section.
pub const DETAIL_GROUP: &str = "DETAIL";

/// Declared value type of a formula, parameter, or database field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Currency,
    Date,
    DateTime,
    Time,
    Boolean,
    Memo,
    #[default]
    Unknown,
}

/// A single formula or condition in the source report language
///
/// The text is treated as an immutable input; every rewrite pass produces a
/// new string rather than mutating in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expression {
    /// Name of the formula as it appears in the source report
    pub name: String,

    /// Free-text body in the source formula language
    pub text: String,

    /// Declared return type, when the source report carries one
    #[serde(default)]
    pub value_kind: ValueKind,
}

impl Expression {
    /// Convenience constructor for a named expression
    pub fn new(name: impl Into<String>, text: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            value_kind,
        }
    }
}

/// A single warning accumulated during translation or layout synthesis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Category of the deviation
    pub code: WarningCode,

    /// Element the warning refers to (formula name, field name, mask, ...)
    pub path: String,

    /// Human-readable description for the migration report
    pub message: String,

    /// Severity for user-visible reporting
    pub severity: Severity,
}

impl Warning {
    pub fn new(code: WarningCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        let severity = match code {
            WarningCode::EmptyExpression => Severity::Info,
            WarningCode::UnsupportedFunction | WarningCode::ManualReview => Severity::Error,
            _ => Severity::Warning,
        };
        Self {
            code,
            path: path.into(),
            message: message.into(),
            severity,
        }
    }
}

/// Result of translating one source expression into a target program unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedExpression {
    /// Name of the expression in the source report
    pub source_name: String,

    /// Derived target identifier (prefix + sanitized name, collision-avoided)
    pub target_name: String,

    /// Generated PL/SQL function source
    pub plsql: String,

    /// Mapped target return type declaration
    pub return_type: String,

    /// False only when the expression was skipped or failed outright
    pub success: bool,

    /// True when a stub documenting the original text was emitted instead
    /// of a real translation
    pub is_placeholder: bool,

    /// Warnings accumulated across the rewrite passes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,

    /// Database columns referenced by the expression, in order of first use
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_columns: Vec<String>,
}

/// Kind of generated boolean rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Hides the owning element when the condition is true
    Suppress,
    /// Applies conditional formatting when the condition is true
    ConditionalFormat,
}

/// A generated boolean format-trigger function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    /// Unique trigger name within one synthesizer run
    pub name: String,

    /// Generated PL/SQL function source (always boolean-returning)
    pub plsql: String,

    /// What the trigger implements
    pub kind: TriggerKind,

    /// The source condition the trigger was derived from
    pub original_condition: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

/// Caller-owned counter making trigger names unique within one report run
///
/// One instance (or an explicit [`reset`](TriggerSequence::reset)) per report
/// keeps generated names reproducible and collision-free. The sequence is
/// deliberately not shared global state; concurrent report conversions each
/// own their own instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerSequence {
    next: u32,
}

impl TriggerSequence {
    /// Create a fresh sequence starting at 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the counter so the next run reproduces the same names
    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Advance and return the next counter value (1-based)
    pub fn advance(&mut self) -> u32 {
        self.next += 1;
        self.next
    }
}

/// Role of a report section in the banded layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionRole {
    ReportHeader,
    PageHeader,
    GroupHeader,
    Detail,
    GroupFooter,
    PageFooter,
    ReportFooter,
}

impl SectionRole {
    /// Infer a role from a section name when no explicit role tag survived
    /// extraction. Falls back to `Detail`.
    pub fn infer_from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("report header") {
            SectionRole::ReportHeader
        } else if lower.contains("page header") {
            SectionRole::PageHeader
        } else if lower.contains("group header") {
            SectionRole::GroupHeader
        } else if lower.contains("group footer") {
            SectionRole::GroupFooter
        } else if lower.contains("page footer") {
            SectionRole::PageFooter
        } else if lower.contains("report footer") {
            SectionRole::ReportFooter
        } else {
            SectionRole::Detail
        }
    }
}

/// Horizontal alignment of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Default,
    Left,
    Center,
    Right,
    Justified,
}

/// Font attributes of a source field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontSpec {
    /// Face name as the source platform records it
    pub face: String,

    /// Size in points
    pub size: u16,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    #[serde(default)]
    pub underline: bool,
}

/// Display formatting of a source field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldFormat {
    #[serde(default)]
    pub alignment: Alignment,

    /// Display format mask in the source platform's notation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,

    /// Hide the field when its value is zero
    #[serde(default)]
    pub suppress_if_zero: bool,

    /// Hide the field when its value is null or blank
    #[serde(default)]
    pub suppress_if_blank: bool,
}

/// What a placed field's source reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Column,
    Formula,
    Parameter,
    Special,
    Literal,
}

/// A field placed in a source report section
///
/// Coordinates and extents are in twips (1/1440 inch), the source
/// platform's native unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    /// Source reference text (`table.column`, `@formula`, `?parameter`, ...)
    pub source: String,

    pub kind: FieldKind,

    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<FontSpec>,

    #[serde(default)]
    pub format: FieldFormat,

    /// Boolean condition hiding the field when true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress_condition: Option<String>,
}

/// One band of the source report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub name: String,

    /// Explicit role tag; absent when extraction could not recognize one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<SectionRole>,

    /// Band height in twips
    pub height: f64,

    /// Statically suppressed sections produce no output frame
    #[serde(default)]
    pub suppress: bool,

    /// Boolean condition hiding the section when true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress_condition: Option<String>,

    /// 1-based position in the group list; required for group header/footer
    /// roles, absent otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_index: Option<usize>,

    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Section {
    /// Resolve the effective role, falling back to the name heuristic
    pub fn effective_role(&self) -> SectionRole {
        self.role
            .unwrap_or_else(|| SectionRole::infer_from_name(&self.name))
    }
}

/// Sort direction of a grouping rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// One grouping rule of the source report
///
/// Groups form an ordered list whose position defines nesting depth: index 0
/// is outermost and the detail section nests innermost. That ordering is the
/// single source of truth for layout synthesis; there is no separate
/// parent/child structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub name: String,

    /// Column the group breaks on
    pub field_name: String,

    #[serde(default)]
    pub sort_direction: SortDirection,

    #[serde(default)]
    pub keep_together: bool,

    #[serde(default)]
    pub repeat_header: bool,
}

/// Kind of a target layout container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Margin,
    Header,
    Body,
    Trailer,
    Repeating,
}

/// Elasticity of a frame or field edge in the target layout model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Elasticity {
    #[default]
    Fixed,
    Variable,
    Expand,
    Contract,
}

/// A positioned field in the target layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputField {
    /// Target object name (`F_` prefixed)
    pub name: String,

    /// Normalized source reference (bind column, formula unit, parameter)
    pub source: String,

    pub source_kind: FieldKind,

    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,

    /// Resolved target font face
    pub font_face: String,

    /// Font size in points
    pub font_size: u16,

    #[serde(default)]
    pub font_weight: String,

    #[serde(default)]
    pub font_style: String,

    /// Target alignment keyword
    pub alignment: String,

    /// Mapped display format mask, when one was recognized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_mask: Option<String>,

    /// Name of the generated format trigger governing visibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_trigger: Option<String>,

    /// False when an explicit suppress condition hides the field by default
    pub visible: bool,
}

/// A container node in the synthesized target layout
///
/// Coordinates and extents are in the configured target unit. The tree is
/// owned by the synthesizer invocation that built it and handed to the
/// caller as an immutable result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub name: String,

    pub kind: FrameKind,

    /// For repeating frames: the bound group name, or [`DETAIL_GROUP`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_group: Option<String>,

    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,

    #[serde(default)]
    pub vertical_elasticity: Elasticity,

    #[serde(default)]
    pub horizontal_elasticity: Elasticity,

    /// Print direction for repeating frames
    pub print_direction: String,

    /// Name of the generated format trigger governing visibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_trigger: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Frame>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<OutputField>,
}

impl Frame {
    /// Depth-first iterator over this frame and all descendants
    pub fn walk(&self) -> Vec<&Frame> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }

    /// Repeating frames along the leftmost root-to-leaf path, in order
    pub fn repeating_path(&self) -> Vec<&Frame> {
        let mut out = Vec::new();
        let mut cursor = Some(self);
        while let Some(frame) = cursor {
            if frame.kind == FrameKind::Repeating {
                out.push(frame);
            }
            cursor = frame
                .children
                .iter()
                .find(|c| c.kind == FrameKind::Repeating);
        }
        out
    }
}

/// Output of one layout synthesis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutResult {
    /// Root of the frame tree, spanning the printable area
    pub margin: Frame,

    /// Every trigger generated for fields and sections, flat
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,

    /// Layout-level warnings (skipped nesting levels, defaulted roles, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

/// The parsed source report consumed by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub name: String,

    /// Page width in twips
    pub page_width: f64,

    /// Page height in twips
    pub page_height: f64,

    #[serde(default)]
    pub formulas: Vec<Expression>,

    #[serde(default)]
    pub sections: Vec<Section>,

    #[serde(default)]
    pub groups: Vec<Group>,
}

/// Kind of a generated target program unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramUnitKind {
    Formula,
    FormatTrigger,
}

/// One named PL/SQL unit handed to the target-side generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramUnit {
    pub name: String,
    pub kind: ProgramUnitKind,
    pub source: String,
}

/// Overall outcome of one report conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Success,
    Partial,
    Failed,
}

/// Aggregate statistics for one report conversion
///
/// Every translation attempt increments exactly one of `converted`,
/// `converted_with_warnings`, or `failed`; nothing is left uncounted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Formulas the orchestrator attempted to translate
    pub attempted: usize,

    /// Clean translations
    pub converted: usize,

    /// Placeholder stubs and warning-carrying translations
    pub converted_with_warnings: usize,

    /// Skipped or hard-failed translations
    pub failed: usize,

    /// Format triggers generated during layout synthesis
    pub triggers_generated: usize,
}

impl ConversionStats {
    /// Completion percentage over attempted translations (100 when none)
    pub fn completion_percent(&self) -> f64 {
        if self.attempted == 0 {
            return 100.0;
        }
        (self.converted + self.converted_with_warnings) as f64 * 100.0 / self.attempted as f64
    }

    /// Derive the overall status callers report to users
    pub fn status(&self) -> ConversionStatus {
        if self.attempted > 0 && self.converted + self.converted_with_warnings == 0 {
            ConversionStatus::Failed
        } else if self.failed > 0 || self.converted_with_warnings > 0 {
            ConversionStatus::Partial
        } else {
            ConversionStatus::Success
        }
    }
}

/// Metadata describing one conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionMetadata {
    /// Source report name
    pub report: String,

    /// RFC3339 timestamp of the run
    pub timestamp: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Stub policy the run was configured with
    pub policy: StubPolicy,
}

/// Complete result of converting one report definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConversion {
    /// One translation result per top-level formula
    pub formulas: Vec<TranslatedExpression>,

    /// The synthesized layout and its triggers
    pub layout: LayoutResult,

    /// Formula and trigger units merged for code generation
    pub program_units: Vec<ProgramUnit>,

    pub stats: ConversionStats,

    pub metadata: ConversionMetadata,
}
