//! Kubernetes-backed object store

use async_trait::async_trait;
use facade_core::{Facade, ObjectKey};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    Client,
    api::{Api, PostParams},
};

use super::ObjectStore;
use crate::error::{FacadeError, Result};

const FACADE_KIND: &str = "Facade";
const CRD_KIND: &str = "CustomResourceDefinition";

/// Object store talking to the API server through a kube client
#[derive(Clone)]
pub struct KubeObjectStore {
    client: Client,
}

impl KubeObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn facades(&self, namespace: &str) -> Api<Facade> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn definitions(&self) -> Api<CustomResourceDefinition> {
        Api::all(self.client.clone())
    }
}

/// Map API status codes onto the error kinds the reconciler branches on
fn classify(err: kube::Error, kind: &str, name: &str) -> FacadeError {
    match &err {
        kube::Error::Api(resp) if resp.code == 404 => FacadeError::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
        },
        kube::Error::Api(resp) if resp.code == 409 => FacadeError::Conflict {
            kind: kind.to_string(),
            name: name.to_string(),
            message: resp.message.clone(),
        },
        kube::Error::Api(resp) if resp.code == 422 => FacadeError::Rejected {
            kind: kind.to_string(),
            name: name.to_string(),
            message: resp.message.clone(),
        },
        _ => FacadeError::Api(err),
    }
}

#[async_trait]
impl ObjectStore for KubeObjectStore {
    async fn get_facade(&self, key: &ObjectKey) -> Result<Facade> {
        self.facades(&key.namespace)
            .get(&key.name)
            .await
            .map_err(|e| classify(e, FACADE_KIND, &key.to_string()))
    }

    async fn update_facade_status(&self, facade: &Facade) -> Result<Facade> {
        let key = facade.key();
        let data = serde_json::to_vec(facade)?;

        self.facades(&key.namespace)
            .replace_status(&key.name, &PostParams::default(), data)
            .await
            .map_err(|e| classify(e, FACADE_KIND, &key.to_string()))
    }

    async fn get_definition(&self, name: &str) -> Result<CustomResourceDefinition> {
        self.definitions()
            .get(name)
            .await
            .map_err(|e| classify(e, CRD_KIND, name))
    }

    async fn create_definition(
        &self,
        crd: &CustomResourceDefinition,
    ) -> Result<CustomResourceDefinition> {
        let name = crd.metadata.name.as_deref().unwrap_or_default();

        self.definitions()
            .create(&PostParams::default(), crd)
            .await
            .map_err(|e| classify(e, CRD_KIND, name))
    }
}
