//! Controller error types with exit code handling

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// Process-level error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Config file missing, unreadable or malformed
    #[error("Configuration error: {message}")]
    #[diagnostic(code(facade_controller::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Cluster access failed
    #[error("Kubernetes error: {message}")]
    #[diagnostic(code(facade_controller::kube))]
    Kube {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid flag combination or value
    #[error("Invalid usage: {message}")]
    #[diagnostic(code(facade_controller::usage))]
    Usage { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(facade_controller::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Kube { .. } => exit_codes::KUBE_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn kube_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Kube {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }
}

impl From<facade_kube::FacadeError> for CliError {
    fn from(err: facade_kube::FacadeError) -> Self {
        match err {
            facade_kube::FacadeError::Api(e) => CliError::Kube {
                message: e.to_string(),
                help: Some(format!(
                    "Check that the Facade CRD (facades.{}) is installed",
                    facade_core::FACADE_API_GROUP
                )),
            },
            facade_kube::FacadeError::InvalidConfig(message) => CliError::Config {
                message,
                help: None,
            },
            other => CliError::Other {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, CliError>;
