//! The Facade custom object
//!
//! A Facade declares a new resource type: its kind and the OpenAPI schema of
//! the `spec` its instances carry. The controller turns each Facade into an
//! installed CustomResourceDefinition.

use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::FacadeStatus;

/// API group serving Facade objects
pub const FACADE_API_GROUP: &str = "composition.google.com";

/// API version serving Facade objects
pub const FACADE_API_VERSION: &str = "v1alpha1";

/// Desired state of a Facade
#[derive(CustomResource, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[kube(
    group = "composition.google.com",
    version = "v1alpha1",
    kind = "Facade",
    plural = "facades",
    namespaced,
    status = "FacadeStatus",
    derive = "PartialEq",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct FacadeSpec {
    /// Kind of the generated resource type (e.g., "Widget")
    ///
    /// Immutable after creation.
    #[serde(default)]
    pub facade_kind: String,

    /// Schema of the generated type's `spec` field
    ///
    /// Kept as the raw document so that every key the user wrote reaches the
    /// translator, including misspelled ones.
    #[serde(
        rename = "openAPIV3Schema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub open_api_v3_schema: Option<Value>,
}

impl FacadeSpec {
    /// Create a spec for the given kind and schema fragment
    pub fn new(facade_kind: impl Into<String>, schema: Option<Value>) -> Self {
        Self {
            facade_kind: facade_kind.into(),
            open_api_v3_schema: schema,
        }
    }
}

impl Facade {
    /// Identity of this object
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace().unwrap_or_default(), self.name_any())
    }

    /// Current status, or an empty one when none has been recorded yet
    pub fn status_or_default(&self) -> FacadeStatus {
        self.status.clone().unwrap_or_default()
    }

    /// Generation of the spec this object currently carries
    pub fn generation(&self) -> Option<i64> {
        self.metadata.generation
    }
}

/// Namespaced identity of an object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}
