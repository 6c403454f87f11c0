//! Validation error types.
//!
//! A document either fails to parse at all ([`ValidationError::Syntax`]) or
//! parses but violates the expected shape in one or more places
//! ([`ValidationError::Shape`]). Shape violations are collected, never
//! short-circuited, so an author can fix every problem in one pass.

use std::fmt;

use thiserror::Error;

/// A single field that failed its expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path to the field (e.g. `levels.1.visual_config.points.0.x`).
    pub path: String,
    /// Why the field was rejected.
    pub reason: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] : {}", self.path, self.reason)
    }
}

/// Errors produced while validating an exercise or exam document.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The input is not well-formed JSON.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The input parsed but one or more fields have the wrong shape.
    #[error("{} invalid field(s)", .0.len())]
    Shape(Vec<FieldError>),
}

impl ValidationError {
    /// Field errors for a shape violation; empty for a syntax failure.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ValidationError::Syntax(_) => &[],
            ValidationError::Shape(errors) => errors,
        }
    }

    /// Returns `true` if the document could not be parsed at all.
    pub fn is_syntax(&self) -> bool {
        matches!(self, ValidationError::Syntax(_))
    }

    /// Human-readable diagnostic, one line per invalid field.
    pub fn diagnostic(&self) -> String {
        match self {
            ValidationError::Syntax(_) => self.to_string(),
            ValidationError::Shape(errors) => errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
