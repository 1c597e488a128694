//! Mock object store for testing
//!
//! Keeps facades and definitions in memory, bumps `resourceVersion` on every
//! write and rejects stale status writes the way the API server does. Failures
//! and latency can be scripted per operation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use facade_core::{Facade, ObjectKey};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

use super::ObjectStore;
use crate::error::{FacadeError, Result};

/// Store operations that can be counted, failed or delayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetFacade,
    UpdateFacadeStatus,
    GetDefinition,
    CreateDefinition,
}

/// Failure returned by a scripted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    NotFound,
    Conflict,
    Rejected,
    /// Any other API failure, e.g. a 503 from an overloaded server
    Unavailable,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub facade_gets: usize,
    pub status_updates: usize,
    pub definition_gets: usize,
    pub definition_creates: usize,
}

#[derive(Debug, Default)]
struct Script {
    /// Pending failures, consumed one per call
    failures: HashMap<Operation, Vec<InjectedFailure>>,
    delays: HashMap<Operation, Duration>,
}

/// In-memory object store for testing
#[derive(Clone, Default)]
pub struct MockObjectStore {
    facades: Arc<RwLock<HashMap<ObjectKey, Facade>>>,
    definitions: Arc<RwLock<HashMap<String, CustomResourceDefinition>>>,
    operations: Arc<RwLock<OperationCounts>>,
    script: Arc<RwLock<Script>>,
}

impl MockObjectStore {
    /// Create a new empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a pre-populated facade
    pub fn with_facade(facade: Facade) -> Self {
        let store = Self::new();
        store.insert_facade(facade);
        store
    }

    /// Store a facade as-is, assigning a resourceVersion if missing
    pub fn insert_facade(&self, mut facade: Facade) {
        if facade.metadata.resource_version.is_none() {
            facade.metadata.resource_version = Some("1".to_string());
        }
        self.facades.write().unwrap().insert(facade.key(), facade);
    }

    /// Store a definition as-is
    pub fn insert_definition(&self, crd: CustomResourceDefinition) {
        let name = crd.metadata.name.clone().unwrap_or_default();
        self.definitions.write().unwrap().insert(name, crd);
    }

    /// Current stored facade (for testing)
    pub fn facade(&self, key: &ObjectKey) -> Option<Facade> {
        self.facades.read().unwrap().get(key).cloned()
    }

    /// Current stored definition (for testing)
    pub fn definition(&self, name: &str) -> Option<CustomResourceDefinition> {
        self.definitions.read().unwrap().get(name).cloned()
    }

    /// Number of stored definitions
    pub fn definition_count(&self) -> usize {
        self.definitions.read().unwrap().len()
    }

    /// Fail the next `times` calls of an operation
    pub fn inject(&self, operation: Operation, failure: InjectedFailure, times: usize) {
        let mut script = self.script.write().unwrap();
        script
            .failures
            .entry(operation)
            .or_default()
            .extend(std::iter::repeat_n(failure, times));
    }

    /// Delay every call of an operation
    pub fn delay(&self, operation: Operation, delay: Duration) {
        self.script.write().unwrap().delays.insert(operation, delay);
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        let mut ops = self.operations.write().unwrap();
        *ops = OperationCounts::default();
    }

    /// Count the call, wait out any scripted delay and pop a scripted failure
    async fn enter(&self, operation: Operation, kind: &str, name: &str) -> Result<()> {
        {
            let mut ops = self.operations.write().unwrap();
            match operation {
                Operation::GetFacade => ops.facade_gets += 1,
                Operation::UpdateFacadeStatus => ops.status_updates += 1,
                Operation::GetDefinition => ops.definition_gets += 1,
                Operation::CreateDefinition => ops.definition_creates += 1,
            }
        }

        let delay = self.script.read().unwrap().delays.get(&operation).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = {
            let mut script = self.script.write().unwrap();
            script.failures.get_mut(&operation).and_then(|pending| {
                if pending.is_empty() {
                    None
                } else {
                    Some(pending.remove(0))
                }
            })
        };

        match failure {
            None => Ok(()),
            Some(failure) => Err(failure_error(failure, kind, name)),
        }
    }
}

fn failure_error(failure: InjectedFailure, kind: &str, name: &str) -> FacadeError {
    match failure {
        InjectedFailure::NotFound => not_found(kind, name),
        InjectedFailure::Conflict => FacadeError::Conflict {
            kind: kind.to_string(),
            name: name.to_string(),
            message: "injected conflict".to_string(),
        },
        InjectedFailure::Rejected => FacadeError::Rejected {
            kind: kind.to_string(),
            name: name.to_string(),
            message: "injected rejection".to_string(),
        },
        InjectedFailure::Unavailable => FacadeError::Api(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "the server is currently unable to handle the request".to_string(),
            reason: "ServiceUnavailable".to_string(),
            code: 503,
        })),
    }
}

fn not_found(kind: &str, name: &str) -> FacadeError {
    FacadeError::NotFound {
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

fn next_version(current: Option<&str>) -> String {
    let n: u64 = current.and_then(|v| v.parse().ok()).unwrap_or(0);
    (n + 1).to_string()
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn get_facade(&self, key: &ObjectKey) -> Result<Facade> {
        self.enter(Operation::GetFacade, "Facade", &key.to_string())
            .await?;

        let facades = self.facades.read().unwrap();
        facades
            .get(key)
            .cloned()
            .ok_or_else(|| not_found("Facade", &key.to_string()))
    }

    async fn update_facade_status(&self, facade: &Facade) -> Result<Facade> {
        let key = facade.key();
        self.enter(Operation::UpdateFacadeStatus, "Facade", &key.to_string())
            .await?;

        let mut facades = self.facades.write().unwrap();
        let stored = facades
            .get_mut(&key)
            .ok_or_else(|| not_found("Facade", &key.to_string()))?;

        if facade.metadata.resource_version.is_some()
            && facade.metadata.resource_version != stored.metadata.resource_version
        {
            return Err(FacadeError::Conflict {
                kind: "Facade".to_string(),
                name: key.to_string(),
                message: "the object has been modified; please apply your changes to the latest version and try again".to_string(),
            });
        }

        // Only the status subresource is written
        stored.status = facade.status.clone();
        stored.metadata.resource_version =
            Some(next_version(stored.metadata.resource_version.as_deref()));

        Ok(stored.clone())
    }

    async fn get_definition(&self, name: &str) -> Result<CustomResourceDefinition> {
        self.enter(Operation::GetDefinition, "CustomResourceDefinition", name)
            .await?;

        let definitions = self.definitions.read().unwrap();
        definitions
            .get(name)
            .cloned()
            .ok_or_else(|| not_found("CustomResourceDefinition", name))
    }

    async fn create_definition(
        &self,
        crd: &CustomResourceDefinition,
    ) -> Result<CustomResourceDefinition> {
        let name = crd.metadata.name.clone().unwrap_or_default();
        self.enter(Operation::CreateDefinition, "CustomResourceDefinition", &name)
            .await?;

        let mut definitions = self.definitions.write().unwrap();
        if definitions.contains_key(&name) {
            return Err(FacadeError::Conflict {
                kind: "CustomResourceDefinition".to_string(),
                name: name.clone(),
                message: format!("customresourcedefinitions \"{}\" already exists", name),
            });
        }

        let mut created = crd.clone();
        created.metadata.resource_version = Some("1".to_string());
        definitions.insert(name, created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facade_core::{FacadeSpec, FacadeStatus};
    use kube::api::ObjectMeta;

    fn facade(name: &str) -> Facade {
        let mut facade = Facade::new(name, FacadeSpec::new("Widget", None));
        facade.metadata = ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        };
        facade
    }

    fn crd(name: &str) -> CustomResourceDefinition {
        CustomResourceDefinition {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mock_get_facade() {
        let store = MockObjectStore::with_facade(facade("web"));

        let fetched = store.get_facade(&ObjectKey::new("default", "web")).await.unwrap();
        assert_eq!(fetched.metadata.resource_version.as_deref(), Some("1"));

        let missing = store.get_facade(&ObjectKey::new("default", "nope")).await;
        assert!(missing.unwrap_err().is_not_found());

        assert_eq!(store.operation_counts().facade_gets, 2);
    }

    #[tokio::test]
    async fn test_mock_status_update_bumps_version() {
        let store = MockObjectStore::with_facade(facade("web"));
        let key = ObjectKey::new("default", "web");

        let mut fetched = store.get_facade(&key).await.unwrap();
        fetched.status = Some(FacadeStatus::default());
        let updated = store.update_facade_status(&fetched).await.unwrap();

        assert_eq!(updated.metadata.resource_version.as_deref(), Some("2"));
        assert_eq!(store.facade(&key).unwrap().status, Some(FacadeStatus::default()));
    }

    #[tokio::test]
    async fn test_mock_stale_status_update_conflicts() {
        let store = MockObjectStore::with_facade(facade("web"));
        let key = ObjectKey::new("default", "web");

        let first = store.get_facade(&key).await.unwrap();
        let stale = first.clone();
        store.update_facade_status(&first).await.unwrap();

        let err = store.update_facade_status(&stale).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_mock_create_duplicate_conflicts() {
        let store = MockObjectStore::new();

        store.create_definition(&crd("widgets.example.com")).await.unwrap();
        let err = store
            .create_definition(&crd("widgets.example.com"))
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(store.definition_count(), 1);
        assert_eq!(store.operation_counts().definition_creates, 2);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let store = MockObjectStore::new();
        store.insert_definition(crd("widgets.example.com"));
        store.inject(Operation::GetDefinition, InjectedFailure::Unavailable, 2);

        assert!(store.get_definition("widgets.example.com").await.is_err());
        assert!(store.get_definition("widgets.example.com").await.is_err());
        assert!(store.get_definition("widgets.example.com").await.is_ok());
        assert_eq!(store.operation_counts().definition_gets, 3);
    }

    #[tokio::test]
    async fn test_reset_counts() {
        let store = MockObjectStore::new();
        let _ = store.get_definition("widgets.example.com").await;
        store.reset_counts();

        assert_eq!(store.operation_counts(), OperationCounts::default());
    }
}
