//! Definition installation
//!
//! Installing is create-if-absent. An existing definition with the same name
//! is left alone even when its schema differs from the freshly computed one;
//! the difference is only logged.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

use super::definition::FacadeDefinition;
use super::validate::validate_definition;
use crate::error::{FacadeError, Result};
use crate::store::ObjectStore;

/// Result of [`Installer::ensure_installed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// A definition with this name already existed, nothing was written
    AlreadyPresent,
    /// The definition was created
    Created,
}

/// Create-if-absent installer for generated definitions
pub struct Installer<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ObjectStore + ?Sized> Installer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Make sure a definition named `definition.name()` exists
    ///
    /// No retry happens here; a failed install is retried by the next
    /// reconciliation pass.
    pub async fn ensure_installed(&self, definition: &FacadeDefinition) -> Result<InstallOutcome> {
        let name = definition.name();

        tracing::debug!(crd = %name, "Checking if CRD exists");
        match self.store.get_definition(&name).await {
            Ok(existing) => {
                tracing::info!(crd = %name, "CRD exists, not creating");
                log_drift(&existing, definition);
                return Ok(InstallOutcome::AlreadyPresent);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                tracing::error!(crd = %name, error = %e, "Failed to look up CRD");
                return Err(FacadeError::TransientLookup {
                    name,
                    source: Box::new(e),
                });
            }
        }

        let crd = definition.crd()?;
        validate_definition(&crd)?;

        match self.store.create_definition(&crd).await {
            Ok(_) => {
                tracing::info!(crd = %name, "Created CRD");
                Ok(InstallOutcome::Created)
            }
            Err(e) if e.is_conflict() => self.recheck_after_conflict(name, e).await,
            Err(e) => {
                tracing::error!(crd = %name, error = %e, "Failed to create CRD");
                Err(FacadeError::Install {
                    name,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Another installer may have won the create race; look again before failing
    async fn recheck_after_conflict(&self, name: String, conflict: FacadeError) -> Result<InstallOutcome> {
        tracing::debug!(crd = %name, "Create conflicted, checking again");

        match self.store.get_definition(&name).await {
            Ok(_) => {
                tracing::info!(crd = %name, "CRD was created concurrently");
                Ok(InstallOutcome::AlreadyPresent)
            }
            Err(e) => {
                tracing::error!(crd = %name, error = %conflict, recheck_error = %e, "Failed to create CRD");
                Err(FacadeError::Install {
                    name,
                    source: Box::new(conflict),
                })
            }
        }
    }
}

/// Warn when the stored schema differs from the computed one
fn log_drift(existing: &CustomResourceDefinition, definition: &FacadeDefinition) {
    let Ok(computed) = definition.crd() else {
        return;
    };

    let stored_version = existing
        .spec
        .versions
        .iter()
        .find(|v| v.name == definition.version());
    let Some(stored_version) = stored_version else {
        tracing::warn!(
            crd = %definition,
            version = definition.version(),
            "Installed CRD does not serve the facade version; leaving it unchanged"
        );
        return;
    };

    let computed_schema = computed.spec.versions.first().and_then(|v| v.schema.as_ref());
    if stored_version.schema.as_ref() != computed_schema {
        tracing::warn!(
            crd = %definition,
            "Installed CRD schema differs from the facade schema; leaving it unchanged"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::FacadeDefinitionBuilder;
    use crate::store::{InjectedFailure, MockObjectStore, Operation};
    use facade_core::EnglishPluralizer;
    use serde_json::json;

    fn widget() -> FacadeDefinition {
        let mut def = FacadeDefinitionBuilder::new("Widget").build(&EnglishPluralizer);
        def.set_spec(&json!({"type": "object", "properties": {"size": {"type": "string"}}}))
            .unwrap();
        def
    }

    #[tokio::test]
    async fn test_creates_when_absent() {
        let store = MockObjectStore::new();
        let def = widget();

        let outcome = Installer::new(&store).ensure_installed(&def).await.unwrap();

        assert_eq!(outcome, InstallOutcome::Created);
        assert!(store.definition(&def.name()).is_some());
    }

    #[tokio::test]
    async fn test_second_call_is_a_no_op() {
        let store = MockObjectStore::new();
        let def = widget();
        let installer = Installer::new(&store);

        installer.ensure_installed(&def).await.unwrap();
        let outcome = installer.ensure_installed(&def).await.unwrap();

        assert_eq!(outcome, InstallOutcome::AlreadyPresent);
        assert_eq!(store.operation_counts().definition_creates, 1);
    }

    #[tokio::test]
    async fn test_drift_is_not_written() {
        let store = MockObjectStore::new();
        let installer = Installer::new(&store);
        installer.ensure_installed(&widget()).await.unwrap();

        let mut changed = FacadeDefinitionBuilder::new("Widget").build(&EnglishPluralizer);
        changed
            .set_spec(&json!({"type": "object", "properties": {"color": {"type": "string"}}}))
            .unwrap();

        let outcome = installer.ensure_installed(&changed).await.unwrap();

        assert_eq!(outcome, InstallOutcome::AlreadyPresent);
        assert_eq!(store.operation_counts().definition_creates, 1);
        let stored = store.definition(&changed.name()).unwrap();
        assert_eq!(stored.spec, widget().crd().unwrap().spec);
    }

    #[tokio::test]
    async fn test_lookup_failure_skips_create() {
        let store = MockObjectStore::new();
        store.inject(Operation::GetDefinition, InjectedFailure::Unavailable, 1);

        let err = Installer::new(&store)
            .ensure_installed(&widget())
            .await
            .unwrap_err();

        assert!(matches!(err, FacadeError::TransientLookup { .. }));
        assert_eq!(err.reason(), "FacadeCRDLookupFailed");
        assert_eq!(store.operation_counts().definition_creates, 0);
    }

    #[tokio::test]
    async fn test_missing_schema_fails_before_create() {
        let store = MockObjectStore::new();
        let def = FacadeDefinitionBuilder::new("Widget").build(&EnglishPluralizer);

        let err = Installer::new(&store).ensure_installed(&def).await.unwrap_err();

        assert!(matches!(err, FacadeError::SchemaNotSet { .. }));
        assert_eq!(store.operation_counts().definition_creates, 0);
    }

    #[tokio::test]
    async fn test_invalid_definition_fails_before_create() {
        let store = MockObjectStore::new();
        let mut def = FacadeDefinitionBuilder::new("Widget")
            .group("nodots")
            .build(&EnglishPluralizer);
        def.set_spec(&json!({"type": "object"})).unwrap();

        let err = Installer::new(&store).ensure_installed(&def).await.unwrap_err();

        assert!(matches!(err, FacadeError::InvalidDefinition { .. }));
        assert_eq!(store.operation_counts().definition_creates, 0);
    }

    #[tokio::test]
    async fn test_create_rejected() {
        let store = MockObjectStore::new();
        store.inject(Operation::CreateDefinition, InjectedFailure::Rejected, 1);

        let err = Installer::new(&store)
            .ensure_installed(&widget())
            .await
            .unwrap_err();

        assert!(matches!(err, FacadeError::Install { .. }));
        assert_eq!(err.reason(), "CreateFacadeCRDFailed");
    }

    #[tokio::test]
    async fn test_create_conflict_rechecks() {
        let store = MockObjectStore::new();
        let def = widget();
        // Another installer created it between our lookup and create
        store.inject(Operation::GetDefinition, InjectedFailure::NotFound, 1);
        store.insert_definition(def.crd().unwrap());

        let outcome = Installer::new(&store).ensure_installed(&def).await.unwrap();

        assert_eq!(outcome, InstallOutcome::AlreadyPresent);
        assert_eq!(store.operation_counts().definition_gets, 2);
        assert_eq!(store.operation_counts().definition_creates, 1);
    }

    #[tokio::test]
    async fn test_create_conflict_still_absent() {
        let store = MockObjectStore::new();
        store.inject(Operation::CreateDefinition, InjectedFailure::Conflict, 1);

        let err = Installer::new(&store)
            .ensure_installed(&widget())
            .await
            .unwrap_err();

        assert!(matches!(err, FacadeError::Install { .. }));
        assert_eq!(store.operation_counts().definition_gets, 2);
    }
}
