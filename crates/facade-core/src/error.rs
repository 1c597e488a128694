//! Core error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Facade validation failed: {}", format_issues(.issues))]
    Validation { issues: Vec<ValidationIssue> },

    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// A single problem found while validating a Facade spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Field path (e.g., "spec.facadeKind")
    pub path: String,
    /// Human-readable message
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_joins_issues() {
        let err = CoreError::Validation {
            issues: vec![
                ValidationIssue::new("spec.facadeKind", "must not be empty"),
                ValidationIssue::new("spec.openAPIV3Schema", "is required"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Facade validation failed: spec.facadeKind: must not be empty; spec.openAPIV3Schema: is required"
        );
    }
}
