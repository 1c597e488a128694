//! Controller wiring
//!
//! Watches Facade objects and feeds them to the [`Reconciler`]. The kube
//! runtime serializes passes per object, coalesces bursts of events and
//! applies the requeue [`Action`] returned by each pass.

use std::sync::Arc;
use std::time::Duration;

use facade_core::{EnglishPluralizer, Facade, FacadeValidator};
use futures::StreamExt;
use kube::{
    Client,
    api::{Api, ListParams},
    runtime::{Controller, controller::Action, watcher},
};

use crate::error::{FacadeError, Result};
use crate::reconcile::{Reconciler, ReconcilerConfig};
use crate::store::{KubeObjectStore, ObjectStore};

/// Settings for [`run`]
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    /// Namespace to watch; all namespaces when unset
    pub namespace: Option<String>,
    pub reconciler: ReconcilerConfig,
    /// Delay before a failed pass is retried
    pub requeue_after: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            namespace: None,
            reconciler: ReconcilerConfig::default(),
            requeue_after: Duration::from_secs(5),
        }
    }
}

/// State shared by every reconciliation
pub struct ControllerContext<S: ObjectStore + ?Sized> {
    pub reconciler: Reconciler<S>,
    pub requeue_after: Duration,
}

/// Reconcile entry point for the kube runtime
pub async fn reconcile_facade<S: ObjectStore + ?Sized>(
    facade: Arc<Facade>,
    ctx: Arc<ControllerContext<S>>,
) -> Result<Action> {
    ctx.reconciler.reconcile(&facade.key()).await?;
    Ok(Action::await_change())
}

/// Backoff for failed passes
///
/// Control plane failures are retried after `requeue_after`. Invalid specs
/// wait for the user to change the Facade.
pub fn error_policy<S: ObjectStore + ?Sized>(
    facade: Arc<Facade>,
    error: &FacadeError,
    ctx: Arc<ControllerContext<S>>,
) -> Action {
    if error.is_retryable() {
        tracing::warn!(facade = %facade.key(), error = %error, "Reconcile failed, requeueing");
        Action::requeue(ctx.requeue_after)
    } else {
        tracing::info!(facade = %facade.key(), error = %error, "Reconcile failed, waiting for change");
        Action::await_change()
    }
}

/// Watch Facades until SIGINT/SIGTERM
pub async fn run(client: Client, settings: ControllerSettings) -> Result<()> {
    let facades: Api<Facade> = match &settings.namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };

    // Fail early when the Facade type is not installed
    facades
        .list(&ListParams::default().limit(1))
        .await
        .map_err(FacadeError::Api)?;

    let reconciler = Reconciler::new(
        Arc::new(KubeObjectStore::new(client)),
        Arc::new(FacadeValidator),
        Arc::new(EnglishPluralizer),
        settings.reconciler,
    );
    let ctx = Arc::new(ControllerContext {
        reconciler,
        requeue_after: settings.requeue_after,
    });

    tracing::info!(namespace = ?settings.namespace, "Starting facade controller");

    Controller::new(facades, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile_facade, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => tracing::debug!(facade = %object.name, "Reconciled"),
                Err(e) => tracing::debug!(error = %e, "Reconcile error"),
            }
        })
        .await;

    tracing::info!("Facade controller stopped");
    Ok(())
}
