//! Facade reconciliation
//!
//! One pass is `fetch → validate → install → record → persist`. The status is
//! worked on in memory and written back once at the end of every pass that
//! found the Facade, whichever branch was taken. Status writes that lose an
//! optimistic-concurrency race are retried a bounded number of times and then
//! dropped; the next pass will try again.

use std::sync::Arc;

use facade_core::{
    ConditionStatus, ConditionType, ConditionUpdate, Facade, FacadeStatus, ObjectKey, Pluralizer,
    Validator,
};
use tracing::Instrument;

use crate::crd::{DEFAULT_VERSION, FACADE_GROUP, FacadeDefinition, FacadeDefinitionBuilder, Installer};
use crate::error::{FacadeError, Result};
use crate::retry::{RetryConfig, RetryFailure, retry_on_conflict};
use crate::store::ObjectStore;

/// Reason recorded on `Ready=True`
pub const REASON_INSTALLED: &str = "FacadeCRDInstalled";

/// Settings for the reconciler
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilerConfig {
    /// Group for generated definitions
    pub default_group: String,
    /// Version for generated definitions
    pub default_version: String,
    /// Backoff for status write conflicts
    pub status_retry: RetryConfig,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            default_group: FACADE_GROUP.to_string(),
            default_version: DEFAULT_VERSION.to_string(),
            status_retry: RetryConfig::default(),
        }
    }
}

/// Drives Facades to installed definitions
///
/// All collaborators are passed in; nothing is looked up from global state.
pub struct Reconciler<S: ObjectStore + ?Sized> {
    store: Arc<S>,
    validator: Arc<dyn Validator>,
    pluralizer: Arc<dyn Pluralizer>,
    config: ReconcilerConfig,
}

impl<S: ObjectStore + ?Sized> Reconciler<S> {
    pub fn new(
        store: Arc<S>,
        validator: Arc<dyn Validator>,
        pluralizer: Arc<dyn Pluralizer>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            validator,
            pluralizer,
            config,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Run one reconciliation pass for a Facade
    ///
    /// A missing Facade is treated as deleted and is not an error. Otherwise
    /// the error of the validate or install step, if any, is returned after
    /// the status has been persisted, so the caller can back off and retry.
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<()> {
        let span = tracing::info_span!(
            "reconcile",
            namespace = %key.namespace,
            name = %key.name,
            generation = tracing::field::Empty,
        );
        self.reconcile_inner(key).instrument(span).await
    }

    async fn reconcile_inner(&self, key: &ObjectKey) -> Result<()> {
        let facade = match self.store.get_facade(key).await {
            Ok(facade) => facade,
            Err(e) if e.is_not_found() => {
                tracing::debug!("Facade not found, assuming it was deleted");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if let Some(generation) = facade.generation() {
            tracing::Span::current().record("generation", generation);
        }

        let original = facade.status_or_default();
        let mut status = original.clone();

        let result = self.run_pass(&facade, &mut status).await;

        if status != original {
            if let Err(e) = self.persist_status(key, &status).await {
                tracing::warn!(error = %e, "Dropping status update");
            }
        } else {
            tracing::debug!("Status unchanged, skipping update");
        }

        result
    }

    /// Validate and install, recording the outcome as conditions
    async fn run_pass(&self, facade: &Facade, status: &mut FacadeStatus) -> Result<()> {
        let generation = facade.generation();

        if let Err(e) = self.validator.validate(&facade.spec) {
            tracing::info!(error = %e, "Facade failed validation");
            status.set_condition(
                ConditionUpdate::new(
                    ConditionType::ValidationFailed,
                    ConditionStatus::True,
                    "ValidationFailed",
                )
                .message(e.to_string())
                .observed_generation(generation),
            );
            status.set_condition(
                ConditionUpdate::new(ConditionType::Ready, ConditionStatus::False, "ValidationFailed")
                    .message("Facade spec is invalid")
                    .observed_generation(generation),
            );
            return Err(FacadeError::Validation(e));
        }
        status.clear_condition(ConditionType::ValidationFailed);

        // Error is cleared only on success; a failure overwrites it in place
        match self.install(facade).await {
            Ok(definition) => {
                status.clear_condition(ConditionType::Error);
                status.set_condition(
                    ConditionUpdate::new(ConditionType::Ready, ConditionStatus::True, REASON_INSTALLED)
                        .message(format!("CRD {} is installed", definition))
                        .observed_generation(generation),
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install facade CRD");
                status.set_condition(
                    ConditionUpdate::new(ConditionType::Error, ConditionStatus::True, e.reason())
                        .message(e.to_string())
                        .observed_generation(generation),
                );
                status.set_condition(
                    ConditionUpdate::new(ConditionType::Ready, ConditionStatus::False, e.reason())
                        .message("CRD is not installed")
                        .observed_generation(generation),
                );
                Err(e)
            }
        }
    }

    /// Build the definition for a Facade and make sure it exists
    async fn install(&self, facade: &Facade) -> Result<FacadeDefinition> {
        let mut definition = self.definition_for(facade)?;
        if let Some(schema) = &facade.spec.open_api_v3_schema {
            definition.set_spec(schema)?;
        }

        let outcome = Installer::new(self.store.as_ref())
            .ensure_installed(&definition)
            .await?;
        tracing::debug!(crd = %definition, ?outcome, "CRD ensured");

        Ok(definition)
    }

    /// Definition identity for a Facade, without a schema
    pub fn definition_for(&self, facade: &Facade) -> Result<FacadeDefinition> {
        if facade.spec.facade_kind.is_empty() {
            return Err(facade_core::CoreError::MissingField {
                field: "spec.facadeKind".to_string(),
            }
            .into());
        }

        Ok(FacadeDefinitionBuilder::new(facade.spec.facade_kind.clone())
            .group(self.config.default_group.clone())
            .version(self.config.default_version.clone())
            .build(self.pluralizer.as_ref()))
    }

    /// Write `status` onto the latest version of the Facade
    async fn persist_status(&self, key: &ObjectKey, status: &FacadeStatus) -> Result<()> {
        let store = self.store.as_ref();

        let written = retry_on_conflict(&self.config.status_retry, move || async move {
            let mut latest = store.get_facade(key).await?;
            latest.status = Some(status.clone());
            store.update_facade_status(&latest).await
        })
        .await;

        match written {
            Ok(_) => {
                tracing::debug!("Status updated");
                Ok(())
            }
            Err(RetryFailure { attempts, error }) => Err(FacadeError::StatusPersist {
                key: key.to_string(),
                attempts,
                source: Box::new(error),
            }),
        }
    }
}
