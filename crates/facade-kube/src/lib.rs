//! Facade Kube - Kubernetes integration for facades
//!
//! This crate provides:
//! - **CRD Generation**: Translate a Facade's schema fragment into a complete CustomResourceDefinition
//! - **Installation**: Create-if-absent with race re-checks and drift warnings
//! - **Object Store**: Narrow async access to Facades and definitions, kube-backed or in-memory
//! - **Reconciler**: Validate, install, record conditions and persist status with conflict retry
//! - **Controller**: Watch Facades with the kube runtime and apply requeue policy

pub mod controller;
pub mod crd;
pub mod error;
pub mod reconcile;
pub mod retry;
pub mod store;

pub use controller::{ControllerContext, ControllerSettings, error_policy, reconcile_facade, run};
pub use crd::{
    FACADE_GROUP, FacadeDefinition, FacadeDefinitionBuilder, InstallOutcome, Installer,
    SchemaProperty, SchemaTranslator, validate_definition,
};
pub use error::{FacadeError, Result};
pub use reconcile::{REASON_INSTALLED, Reconciler, ReconcilerConfig};
pub use retry::{RetryConfig, RetryFailure, retry_on_conflict};
pub use store::{
    InjectedFailure, KubeObjectStore, MockObjectStore, ObjectStore, Operation, OperationCounts,
};
