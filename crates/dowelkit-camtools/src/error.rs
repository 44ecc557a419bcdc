//! Error types for the CAM tools crate.
//!
//! This module provides structured error types for dowel settings validation,
//! toolpath planning and program output.

use std::fmt;
use std::io;
use thiserror::Error;

/// Errors that can occur during CAM tool operations.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// Dowel settings violated one or more invariants.
    #[error(transparent)]
    InvalidSettings(#[from] InvalidSettings),

    /// Invalid parameters were provided to a CAM tool.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Program output was cancelled before it completed.
    #[error("Program generation cancelled")]
    Cancelled,

    /// I/O error while writing a program.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// A single violated settings constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} {constraint}")]
pub struct SettingViolation {
    /// Name of the offending field, as used in persisted settings.
    pub field: &'static str,
    /// The constraint the value failed, e.g. "must be > 0 (got -1)".
    pub constraint: String,
}

impl SettingViolation {
    pub fn new(field: &'static str, constraint: impl Into<String>) -> Self {
        Self {
            field,
            constraint: constraint.into(),
        }
    }
}

/// Every constraint a candidate settings value failed.
///
/// Never empty: a value with no violations is a valid `DowelSettings`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid settings: {}", ViolationList(.violations))]
pub struct InvalidSettings {
    violations: Vec<SettingViolation>,
}

impl InvalidSettings {
    pub(crate) fn new(violations: Vec<SettingViolation>) -> Self {
        debug_assert!(!violations.is_empty());
        Self { violations }
    }

    /// All violations, in field declaration order.
    pub fn violations(&self) -> &[SettingViolation] {
        &self.violations
    }

    /// Whether `field` is among the violated fields.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Names of the violated fields.
    pub fn fields(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.field).collect()
    }
}

struct ViolationList<'a>(&'a [SettingViolation]);

impl fmt::Display for ViolationList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;
