//! Reportcast Core - transformation engine for report definition migration
//!
//! This crate converts banded report *definitions* (not data) from a
//! Crystal-style document model into an Oracle-style model: formulas and
//! visibility rules become PL/SQL program units, and the sectioned, grouped
//! page layout becomes a hierarchical frame tree with unit-correct
//! coordinates.
//!
//! # Main Components
//!
//! - **Expression Translation**: fixed-order rewrite passes turning source
//!   formulas into PL/SQL functions, with a closed table of builtin
//!   function mappings
//! - **Layout Synthesis**: sections and ordered groups become nested
//!   repeating frames, detail innermost
//! - **Type & Format Mapping**: value types and display masks
//! - **Unit Conversion**: twips to points, inches, and centimeters
//! - **Orchestration**: [`convert_report`] sequences the engine over one
//!   report and aggregates statistics
//!
//! # Example
//!
//! ```
//! use reportcast_core::{translate, ConversionConfig, Expression, ValueKind};
//!
//! let config = ConversionConfig::default();
//! let formula = Expression::new("Net", "{orders.amount} - {orders.discount}", ValueKind::Number);
//! let result = translate(&formula, &config).unwrap();
//! assert_eq!(result.target_name, "CF_NET");
//! assert!(result.plsql.contains(":AMOUNT - :DISCOUNT"));
//! ```
//!
//! The engine performs no I/O and holds no global state; the only run-scoped
//! mutable state is the caller-owned [`TriggerSequence`].

pub mod config;
pub mod error;
pub mod formats;
pub mod layout;
pub mod report;
pub mod translation;
pub mod types;
pub mod units;

// Re-export main types for convenience
pub use config::ConversionConfig;
pub use error::{Error, Result, Severity, StubPolicy, WarningCode};
pub use layout::Synthesizer;
pub use report::convert_report;
pub use translation::{translate, Translator};
pub use types::{
    // Source object graph
    Expression, Field, FieldFormat, FieldKind, FontSpec, Group, ReportDefinition, Section,
    SectionRole, SortDirection, ValueKind,
    // Translation results
    TranslatedExpression, Trigger, TriggerKind, TriggerSequence, Warning,
    // Layout results
    Alignment, Elasticity, Frame, FrameKind, LayoutResult, OutputField, DETAIL_GROUP,
    // Conversion results
    ConversionMetadata, ConversionStats, ConversionStatus, ProgramUnit, ProgramUnitKind,
    ReportConversion,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
