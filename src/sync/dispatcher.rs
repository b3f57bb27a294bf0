// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watches Claudie Secrets and hands their keys to a pool of reconcile workers.
//!
//! Deleted Secrets must still be reconciled (their SveltosCluster has to go),
//! so notifications are turned into keys and the reconciler fetches the
//! current state itself.

use crate::config::Config;
use crate::constants::labels;
use crate::error::Error;
use crate::kubernetes::scoped_apis;
use crate::reconcilers::SecretReconciler;
use crate::sync::queue::WorkQueue;
use futures::{stream, StreamExt};
use k8s_openapi::api::core::v1::Secret;
use kube::Client;
use kube_runtime::{reflector::ObjectRef, watcher, WatchStreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

pub type SecretQueue = WorkQueue<ObjectRef<Secret>>;

pub struct Dispatcher {
    client: Client,
    namespaces: Vec<String>,
    concurrency: usize,
    requeue_after: Duration,
    reconciler: Arc<SecretReconciler>,
    queue: Arc<SecretQueue>,
}

impl Dispatcher {
    pub fn new(client: Client, config: &Config, reconciler: Arc<SecretReconciler>) -> Self {
        Self {
            client,
            namespaces: config.watch_namespaces.clone(),
            concurrency: config.concurrent_reconciles.max(1),
            requeue_after: config.requeue_after,
            reconciler,
            queue: Arc::new(WorkQueue::new()),
        }
    }

    pub fn queue(&self) -> Arc<SecretQueue> {
        Arc::clone(&self.queue)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!(
            "Starting {} reconcile workers, watching {}",
            self.concurrency,
            describe_namespaces(&self.namespaces)
        );

        let tasks = self.spawn_workers();
        self.watch_secrets().await;

        // The watch stream only ends if the client is gone
        self.queue.shutdown();
        futures::future::join_all(tasks).await;
        warn!("Secret watch ended");
        Ok(())
    }

    /// Start the retry driver and the worker pool. All tasks exit once the
    /// queue is shut down.
    pub fn spawn_workers(&self) -> Vec<JoinHandle<()>> {
        let queue = Arc::clone(&self.queue);
        let retries = tokio::spawn(
            async move { queue.run_retries().await }.instrument(info_span!("retries")),
        );

        let workers = (0..self.concurrency).map(|id| {
            let queue = Arc::clone(&self.queue);
            let reconciler = Arc::clone(&self.reconciler);
            let requeue_after = self.requeue_after;
            tokio::spawn(
                worker(queue, reconciler, requeue_after).instrument(info_span!("worker", id)),
            )
        });

        std::iter::once(retries).chain(workers).collect()
    }

    async fn watch_secrets(&self) {
        let config = watcher_config();
        let streams = scoped_apis::<Secret>(&self.client, &self.namespaces)
            .into_iter()
            .map(|api| watcher(api, config.clone()).default_backoff().boxed());
        let mut events = stream::select_all(streams);

        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    if let Some(secret_ref) = event_key(event) {
                        self.queue.add(secret_ref);
                    }
                }
                Err(e) => warn!("Secret watch error: {}", e),
            }
        }
    }
}

/// Only Secrets carrying all three Claudie labels are watched
fn watcher_config() -> watcher::Config {
    watcher::Config::default().labels(labels::CLAUDIE_SECRET_SELECTOR)
}

/// The Secret key to reconcile for a watch event, if any.
/// Deletions yield a key too, so the reconciler can clean up.
fn event_key(event: watcher::Event<Secret>) -> Option<ObjectRef<Secret>> {
    match event {
        watcher::Event::Apply(secret)
        | watcher::Event::InitApply(secret)
        | watcher::Event::Delete(secret) => Some(ObjectRef::from_obj(&secret)),
        watcher::Event::Init => {
            debug!("Secret watch (re)listing");
            None
        }
        watcher::Event::InitDone => {
            info!("Secret watch synced");
            None
        }
    }
}

async fn worker(
    queue: Arc<SecretQueue>,
    reconciler: Arc<SecretReconciler>,
    requeue_after: Duration,
) {
    while let Some(secret_ref) = queue.get().await {
        match reconciler.reconcile(&secret_ref).await {
            Ok(()) => debug!("Reconciled secret: {}", secret_ref),
            Err(e) => {
                let delay = error_policy(&secret_ref, &e, requeue_after);
                queue.add_after(secret_ref.clone(), delay);
            }
        }
        queue.done(&secret_ref);
    }
}

fn error_policy(
    secret_ref: &ObjectRef<Secret>,
    error: &Error,
    requeue_after: Duration,
) -> Duration {
    error!("Reconciliation error for {}: {}", secret_ref, error);
    requeue_after
}

fn describe_namespaces(namespaces: &[String]) -> String {
    if namespaces.is_empty() {
        "all namespaces".to_string()
    } else {
        format!("namespaces {}", namespaces.join(","))
    }
}
