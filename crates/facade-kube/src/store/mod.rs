//! Object store access for facades and their definitions
//!
//! The reconciler only needs four calls against the control plane. They sit
//! behind [`ObjectStore`] so the reconciliation logic can be driven by the
//! in-memory [`MockObjectStore`] in tests:
//! - **Facades**: read by namespaced name, write back the status
//! - **Definitions**: read by name, create

mod cluster;
mod mock;

pub use cluster::KubeObjectStore;
pub use mock::{InjectedFailure, MockObjectStore, Operation, OperationCounts};

use async_trait::async_trait;
use facade_core::{Facade, ObjectKey};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

use crate::error::Result;

/// Control plane operations used by the reconciler
///
/// Implementations must be Send + Sync for use across async tasks.
/// Missing objects are reported as errors for which
/// [`FacadeError::is_not_found`](crate::FacadeError::is_not_found) holds, and
/// stale or duplicate writes as errors for which
/// [`FacadeError::is_conflict`](crate::FacadeError::is_conflict) holds.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Get a facade by namespaced name
    async fn get_facade(&self, key: &ObjectKey) -> Result<Facade>;

    /// Replace the status of a facade
    ///
    /// The write carries the object's `resourceVersion`; a stale version is a
    /// conflict.
    async fn update_facade_status(&self, facade: &Facade) -> Result<Facade>;

    /// Get a definition by its fully-qualified name
    async fn get_definition(&self, name: &str) -> Result<CustomResourceDefinition>;

    /// Create a definition; an existing name is a conflict
    async fn create_definition(
        &self,
        crd: &CustomResourceDefinition,
    ) -> Result<CustomResourceDefinition>;
}
