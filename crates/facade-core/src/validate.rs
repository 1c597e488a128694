//! Facade spec validation
//!
//! Validation is a pure check over the spec, run before anything touches the
//! control plane. A spec that fails validation is reported through the
//! `ValidationFailed` condition and never reaches installation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CoreError, Result, ValidationIssue};
use crate::facade::FacadeSpec;

/// Longest kind accepted; its lowercase form must fit a DNS label
pub const MAX_KIND_LENGTH: usize = 63;

static KIND_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").expect("valid regex"));

/// Checks a Facade spec before it is acted upon
pub trait Validator: Send + Sync {
    /// Returns `Ok(())` when the spec is valid, or every problem found
    fn validate(&self, spec: &FacadeSpec) -> Result<()>;

    /// Boolean form of [`Validator::validate`]
    fn is_valid(&self, spec: &FacadeSpec) -> bool {
        self.validate(spec).is_ok()
    }
}

/// Default structural checks for Facade specs
#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeValidator;

impl Validator for FacadeValidator {
    fn validate(&self, spec: &FacadeSpec) -> Result<()> {
        let mut issues = Vec::new();

        let kind = spec.facade_kind.as_str();
        if kind.is_empty() {
            issues.push(ValidationIssue::new("spec.facadeKind", "must not be empty"));
        } else {
            if !KIND_PATTERN.is_match(kind) {
                issues.push(ValidationIssue::new(
                    "spec.facadeKind",
                    format!(
                        "'{}' must start with an uppercase letter and contain only letters and digits",
                        kind
                    ),
                ));
            }
            if kind.len() > MAX_KIND_LENGTH {
                issues.push(ValidationIssue::new(
                    "spec.facadeKind",
                    format!("must be at most {} characters", MAX_KIND_LENGTH),
                ));
            }
        }

        match &spec.open_api_v3_schema {
            None => issues.push(ValidationIssue::new("spec.openAPIV3Schema", "is required")),
            Some(schema) => {
                if !schema.is_object() {
                    issues.push(ValidationIssue::new(
                        "spec.openAPIV3Schema",
                        "must be a schema object",
                    ));
                } else if let Some(type_) = schema.get("type") {
                    if type_ != "object" {
                        issues.push(ValidationIssue::new(
                            "spec.openAPIV3Schema.type",
                            format!("must be 'object', got {}", type_),
                        ));
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation { issues })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object_schema() -> Option<serde_json::Value> {
        Some(json!({"type": "object"}))
    }

    fn issues(spec: &FacadeSpec) -> Vec<ValidationIssue> {
        match FacadeValidator.validate(spec) {
            Err(CoreError::Validation { issues }) => issues,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_spec() {
        let spec = FacadeSpec::new("Widget", object_schema());
        assert!(FacadeValidator.is_valid(&spec));
    }

    #[test]
    fn test_schema_without_type_is_accepted() {
        let spec = FacadeSpec::new("Widget", Some(json!({"properties": {}})));
        assert!(FacadeValidator.is_valid(&spec));
    }

    #[test]
    fn test_empty_kind() {
        let found = issues(&FacadeSpec::new("", object_schema()));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "spec.facadeKind");
    }

    #[test]
    fn test_lowercase_kind_rejected() {
        let found = issues(&FacadeSpec::new("widget", object_schema()));
        assert!(found[0].message.contains("uppercase"));
    }

    #[test]
    fn test_kind_with_symbols_rejected() {
        assert!(!FacadeValidator.is_valid(&FacadeSpec::new("My-Widget", object_schema())));
        assert!(!FacadeValidator.is_valid(&FacadeSpec::new("My Widget", object_schema())));
    }

    #[test]
    fn test_overlong_kind_rejected() {
        let kind = format!("W{}", "a".repeat(MAX_KIND_LENGTH));
        let found = issues(&FacadeSpec::new(kind, object_schema()));
        assert!(found.iter().any(|i| i.message.contains("at most")));
    }

    #[test]
    fn test_missing_schema() {
        let found = issues(&FacadeSpec::new("Widget", None));
        assert_eq!(found[0].path, "spec.openAPIV3Schema");
    }

    #[test]
    fn test_non_object_schema() {
        let found = issues(&FacadeSpec::new("Widget", Some(json!({"type": "string"}))));
        assert_eq!(found[0].path, "spec.openAPIV3Schema.type");
        assert_eq!(found[0].message, "must be 'object', got \"string\"");
    }

    #[test]
    fn test_schema_must_be_a_mapping() {
        let found = issues(&FacadeSpec::new("Widget", Some(json!(["object"]))));
        assert_eq!(found[0].path, "spec.openAPIV3Schema");
    }

    #[test]
    fn test_collects_all_issues() {
        let found = issues(&FacadeSpec::new("", None));
        assert_eq!(found.len(), 2);
    }
}
