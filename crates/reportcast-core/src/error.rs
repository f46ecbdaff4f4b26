//! Error types for the Reportcast core library
//!
//! This module defines the error handling system for Reportcast, using
//! thiserror for ergonomic error definitions and anyhow for flexible error
//! contexts.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for Reportcast operations
#[derive(Error, Debug)]
pub enum Error {
    /// Expression translation errors
    #[error("Translation failed: {message}")]
    Translation {
        message: String,
        context: Option<String>,
    },

    /// Stub-policy violations (policy = fail and a placeholder would be needed)
    #[error("Policy violation: {message} (policy: {policy:?})")]
    PolicyViolation {
        message: String,
        policy: StubPolicy,
        severity: Severity,
    },

    /// Validation errors for inputs
    #[error("Validation error: {field} - {message}")]
    Validation {
        field: String,
        message: String,
        expected: Option<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Policy for expressions that cannot be translated cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StubPolicy {
    /// Emit a stub program unit documenting the original expression
    Placeholder,
    /// Drop the expression entirely
    Skip,
    /// Fail that expression's translation with a hard error
    Fail,
}

/// Severity levels for warnings and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Warning, should be reviewed
    Warning,
    /// Error, the element needs manual follow-up
    Error,
}

/// Warning codes for translation and layout deviations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningCode {
    /// Source function with no target mapping
    UnsupportedFunction,
    /// Call made with a different argument count than the mapping declares
    ArityMismatch,
    /// Mapping is a known approximation of the source semantics
    Approximation,
    /// Blank source expression, translated to NULL
    EmptyExpression,
    /// Construct left in place for manual follow-up
    ManualReview,
    /// Display format mask had no recognized components
    UnknownFormatMask,
    /// Section referenced a group index not present in the group list
    MissingGroup,
    /// Section role missing or unrecognized, defaulted by name heuristic
    DefaultedRole,
}

impl fmt::Display for StubPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StubPolicy::Placeholder => write!(f, "Placeholder"),
            StubPolicy::Skip => write!(f, "Skip"),
            StubPolicy::Fail => write!(f, "Fail"),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningCode::UnsupportedFunction => write!(f, "UnsupportedFunction"),
            WarningCode::ArityMismatch => write!(f, "ArityMismatch"),
            WarningCode::Approximation => write!(f, "Approximation"),
            WarningCode::EmptyExpression => write!(f, "EmptyExpression"),
            WarningCode::ManualReview => write!(f, "ManualReview"),
            WarningCode::UnknownFormatMask => write!(f, "UnknownFormatMask"),
            WarningCode::MissingGroup => write!(f, "MissingGroup"),
            WarningCode::DefaultedRole => write!(f, "DefaultedRole"),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
