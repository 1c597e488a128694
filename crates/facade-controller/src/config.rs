//! Controller configuration file

use std::path::Path;
use std::time::Duration;

use facade_kube::crd::{DEFAULT_VERSION, FACADE_GROUP};
use facade_kube::{ControllerSettings, ReconcilerConfig, RetryConfig};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Controller configuration, read from `--config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Namespace to watch; all namespaces when unset
    pub namespace: Option<String>,

    /// Group for generated definitions
    pub default_group: String,

    /// Version for generated definitions
    pub default_version: String,

    /// Backoff for Facade status write conflicts
    pub status_retry: StatusRetryConfig,

    /// Delay before a failed pass is retried
    #[serde(with = "humantime_serde")]
    pub requeue_after: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            default_group: FACADE_GROUP.to_string(),
            default_version: DEFAULT_VERSION.to_string(),
            status_retry: StatusRetryConfig::default(),
            requeue_after: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct StatusRetryConfig {
    pub steps: u32,
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    pub factor: f64,
    pub jitter: f64,
    #[serde(with = "humantime_serde")]
    pub max_delay: Option<Duration>,
}

impl Default for StatusRetryConfig {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

impl From<RetryConfig> for StatusRetryConfig {
    fn from(r: RetryConfig) -> Self {
        Self {
            steps: r.steps,
            initial_delay: r.initial_delay,
            factor: r.factor,
            jitter: r.jitter,
            max_delay: r.max_delay,
        }
    }
}

impl From<StatusRetryConfig> for RetryConfig {
    fn from(c: StatusRetryConfig) -> Self {
        Self {
            steps: c.steps,
            initial_delay: c.initial_delay,
            factor: c.factor,
            jitter: c.jitter,
            max_delay: c.max_delay,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from a YAML file
    ///
    /// A missing file is an error: the path was given explicitly.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::config_with_help(
                format!("cannot read {}: {}", path.display(), e),
                "Pass an existing file to --config, or omit the flag to use defaults",
            )
        })?;
        serde_yaml::from_str(&content)
            .map_err(|e| CliError::config(format!("{}: {}", path.display(), e)))
    }

    /// Check values and build the library settings
    pub fn to_settings(&self) -> Result<ControllerSettings> {
        if self.default_group.is_empty() {
            return Err(CliError::config("defaultGroup must not be empty"));
        }
        if self.default_version.is_empty() {
            return Err(CliError::config("defaultVersion must not be empty"));
        }

        let status_retry = RetryConfig::from(self.status_retry.clone());
        status_retry.validate()?;

        Ok(ControllerSettings {
            namespace: self.namespace.clone().filter(|ns| !ns.is_empty()),
            reconciler: ReconcilerConfig {
                default_group: self.default_group.clone(),
                default_version: self.default_version.clone(),
                status_retry,
            },
            requeue_after: self.requeue_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = ControllerConfig::default().to_settings().unwrap();
        assert_eq!(settings, ControllerSettings::default());
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r#"
namespace: platform
defaultGroup: example.com
defaultVersion: v2
statusRetry:
  steps: 3
  initialDelay: 50ms
  factor: 2.0
  jitter: 0.0
  maxDelay: 1s
requeueAfter: 30s
"#,
        );

        let config = ControllerConfig::load_from(file.path()).unwrap();
        let settings = config.to_settings().unwrap();

        assert_eq!(settings.namespace.as_deref(), Some("platform"));
        assert_eq!(settings.reconciler.default_group, "example.com");
        assert_eq!(settings.reconciler.default_version, "v2");
        assert_eq!(settings.reconciler.status_retry.steps, 3);
        assert_eq!(
            settings.reconciler.status_retry.initial_delay,
            Duration::from_millis(50)
        );
        assert_eq!(
            settings.reconciler.status_retry.max_delay,
            Some(Duration::from_secs(1))
        );
        assert_eq!(settings.requeue_after, Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config("requeueAfter: 1m\n");

        let config = ControllerConfig::load_from(file.path()).unwrap();
        assert_eq!(config.requeue_after, Duration::from_secs(60));
        assert_eq!(config.default_group, FACADE_GROUP);
        assert_eq!(config.status_retry, StatusRetryConfig::default());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ControllerConfig::load_from(&dir.path().join("absent.yaml")).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::CONFIG_ERROR);
    }

    #[test]
    fn test_unknown_field_is_error() {
        let file = write_config("defaultGruop: example.com\n");
        assert!(ControllerConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn test_invalid_retry_rejected() {
        let config = ControllerConfig {
            status_retry: StatusRetryConfig {
                steps: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.to_settings().unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::CONFIG_ERROR);
    }

    #[test]
    fn test_empty_namespace_means_all() {
        let config = ControllerConfig {
            namespace: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.to_settings().unwrap().namespace, None);
    }
}
