//! Error types shared across the crate.

use std::fmt;

use thiserror::Error;

/// A single rejected input field.
///
/// `field` is the dotted path of the offending value (for example
/// `fleet.avg_daily_miles`) so callers can map it back onto a form.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// Dotted path to the rejected field.
    pub field: String,
    /// Human-readable description of the violated constraint.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found in one input, in field order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Returns true if any violation names `field`.
    pub fn mentions(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

/// Errors returned by calculations and scenario analyses.
#[derive(Debug, Error, PartialEq)]
pub enum TcoError {
    #[error("invalid input ({} violation(s)): {0}", .0.len())]
    Validation(ValidationErrors),
    #[error("unknown stress test `{0}`")]
    UnknownStressTest(String),
    #[error("unknown assumption variable `{0}`")]
    UnknownVariable(String),
    #[error("invalid {what}: {message}")]
    InvalidRange { what: String, message: String },
    #[error("config error: {field}: {message}")]
    Config { field: String, message: String },
    /// A request body that could not be decoded at all.
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

impl TcoError {
    pub(crate) fn invalid_range(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRange {
            what: what.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationErrors> for TcoError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}
