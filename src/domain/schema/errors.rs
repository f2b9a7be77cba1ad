//! Field-level validation errors.

use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// Kind of rule a field violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    TypeMismatch,
    MissingRequired,
    MinLength,
    OutOfRange,
    BadFormat,
    NullNotAllowed,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::TypeMismatch => "type-mismatch",
            ViolationKind::MissingRequired => "missing-required",
            ViolationKind::MinLength => "min-length",
            ViolationKind::OutOfRange => "out-of-range",
            ViolationKind::BadFormat => "bad-format",
            ViolationKind::NullNotAllowed => "null-not-allowed",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single violation found while validating a candidate document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    /// Dot/bracket path into the candidate (`specifications.modelYear`, `tags[2]`).
    /// The candidate root itself is `$`.
    pub path: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn missing_required(path: impl Into<String>, name: &str) -> Self {
        Self::new(
            path,
            ViolationKind::MissingRequired,
            format!("must have required property '{}'", name),
        )
    }

    pub fn type_mismatch(path: impl Into<String>, expected: &str, actual: &str) -> Self {
        Self::new(
            path,
            ViolationKind::TypeMismatch,
            format!("must be {}, got {}", expected, actual),
        )
    }

    pub fn null_not_allowed(path: impl Into<String>) -> Self {
        Self::new(path, ViolationKind::NullNotAllowed, "must not be null")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path, self.kind, self.message)
    }
}
