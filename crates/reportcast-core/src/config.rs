//! Conversion configuration consumed by the transformation engine
//!
//! The engine consumes, but does not own, this surface: the embedding
//! application loads it (typically from a JSON config file) and passes it
//! into the translator, synthesizer, and orchestrator.

use crate::error::StubPolicy;
use crate::units::Unit;
use serde::{Deserialize, Serialize};

/// Configuration for one report conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Prefix for generated formula program units
    pub formula_prefix: String,

    /// Prefix for parameter bind variables
    pub parameter_prefix: String,

    /// Prefix for generated format triggers
    pub trigger_prefix: String,

    /// Prefix for placed layout field objects
    pub field_prefix: String,

    /// Unit every output coordinate and extent is expressed in
    pub target_unit: Unit,

    /// Font face used when a field carries none
    pub default_font_face: String,

    /// Font size used when a field carries none
    pub default_font_size: u16,

    /// How untranslatable formulas are handled
    pub stub_policy: StubPolicy,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            formula_prefix: "CF_".to_string(),
            parameter_prefix: "P_".to_string(),
            trigger_prefix: "FT_".to_string(),
            field_prefix: "F_".to_string(),
            target_unit: Unit::Point,
            default_font_face: "helvetica".to_string(),
            default_font_size: 10,
            stub_policy: StubPolicy::Placeholder,
        }
    }
}

impl ConversionConfig {
    /// Check if untranslatable formulas should abort that expression
    pub fn should_fail_on_stub(&self) -> bool {
        matches!(self.stub_policy, StubPolicy::Fail)
    }

    /// Check if untranslatable formulas should be dropped
    pub fn should_skip_stub(&self) -> bool {
        matches!(self.stub_policy, StubPolicy::Skip)
    }
}

/// Sanitize a source name into a target identifier component
///
/// Uppercases, maps runs of non-alphanumeric characters to single
/// underscores, and trims leading/trailing underscores. Target identifiers
/// are capped at 30 characters including any prefix.
pub fn sanitize_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_uppercase());
            last_underscore = false;
        } else if !last_underscore && !out.is_empty() {
            out.push('_');
            last_underscore = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Build a prefixed target identifier, capped at the platform's
/// 30-character identifier limit
pub fn target_identifier(prefix: &str, name: &str) -> String {
    let mut ident = format!("{}{}", prefix, sanitize_identifier(name));
    ident.truncate(30);
    while ident.ends_with('_') {
        ident.pop();
    }
    ident
}
