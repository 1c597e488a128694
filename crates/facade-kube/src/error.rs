//! Error types for facade-kube

use facade_core::CoreError;
use thiserror::Error;

/// Result type for facade-kube operations
pub type Result<T> = std::result::Result<T, FacadeError>;

/// Errors that can occur while generating, installing or reconciling facades
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FacadeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Object does not exist in the control plane
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    /// Write rejected: the object already exists or its version is stale
    #[error("conflict writing {kind} '{name}': {message}")]
    Conflict {
        kind: String,
        name: String,
        message: String,
    },

    /// Write rejected by control plane validation
    #[error("{kind} '{name}' rejected by the API server: {message}")]
    Rejected {
        kind: String,
        name: String,
        message: String,
    },

    /// Facade spec failed validation
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// Schema fragment could not be converted
    #[error("invalid schema at {path}: {message}")]
    Translation { path: String, message: String },

    /// Definition finalized before a schema was set
    #[error("schema is not set for '{name}', use set_spec or set_schema first")]
    SchemaNotSet { name: String },

    /// Generated definition failed structural checks
    #[error("invalid CRD '{name}': {}", .problems.join("; "))]
    InvalidDefinition { name: String, problems: Vec<String> },

    /// Looking up an existing definition failed for a reason other than not-found
    #[error("failed to look up CRD '{name}': {source}")]
    TransientLookup {
        name: String,
        #[source]
        source: Box<FacadeError>,
    },

    /// Creating the definition failed
    #[error("failed to create CRD '{name}': {source}")]
    Install {
        name: String,
        #[source]
        source: Box<FacadeError>,
    },

    /// Status could not be written back
    #[error("failed to update status of '{key}' after {attempts} attempt(s): {source}")]
    StatusPersist {
        key: String,
        attempts: u32,
        #[source]
        source: Box<FacadeError>,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for FacadeError {
    fn from(e: serde_json::Error) -> Self {
        FacadeError::Serialization(e.to_string())
    }
}

impl FacadeError {
    /// Create a translation error at a JSON path
    pub fn translation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Translation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Api(kube::Error::Api(resp)) => resp.code == 404,
            _ => false,
        }
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Api(kube::Error::Api(resp)) => resp.code == 409,
            _ => false,
        }
    }

    /// Whether retrying the same input can succeed
    ///
    /// Validation and schema problems need a spec change; control plane
    /// failures may clear up on their own.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Validation(_)
                | Self::Translation { .. }
                | Self::SchemaNotSet { .. }
                | Self::InvalidDefinition { .. }
                | Self::InvalidConfig(_)
        )
    }

    /// Short CamelCase reason code recorded on the `Error` condition
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationFailed",
            Self::Translation { .. } => "InvalidSchema",
            Self::SchemaNotSet { .. } => "SchemaNotSet",
            Self::InvalidDefinition { .. } => "InvalidDefinition",
            Self::TransientLookup { .. } => "FacadeCRDLookupFailed",
            Self::Install { .. } => "CreateFacadeCRDFailed",
            Self::StatusPersist { .. } => "StatusUpdateFailed",
            _ => "ReconcileFailed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facade_core::ValidationIssue;

    fn api_error(code: u16) -> FacadeError {
        FacadeError::Api(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "boom".to_string(),
            reason: "Test".to_string(),
            code,
        }))
    }

    #[test]
    fn test_classification() {
        assert!(api_error(404).is_not_found());
        assert!(!api_error(404).is_conflict());
        assert!(api_error(409).is_conflict());
        assert!(!api_error(500).is_not_found());

        let not_found = FacadeError::NotFound {
            kind: "Facade".to_string(),
            name: "x".to_string(),
        };
        assert!(not_found.is_not_found());
    }

    #[test]
    fn test_retryable() {
        assert!(api_error(500).is_retryable());
        assert!(!FacadeError::translation("spec", "bad").is_retryable());
        assert!(
            !FacadeError::Validation(CoreError::Validation {
                issues: vec![ValidationIssue::new("spec.facadeKind", "must not be empty")],
            })
            .is_retryable()
        );
    }

    #[test]
    fn test_install_error_message_includes_cause() {
        let err = FacadeError::Install {
            name: "widgets.facade.compositions.google.com".to_string(),
            source: Box::new(api_error(500)),
        };
        assert_eq!(err.reason(), "CreateFacadeCRDFailed");
        assert!(err.to_string().contains("widgets.facade.compositions.google.com"));
        assert!(err.to_string().contains("boom"));
    }
}
