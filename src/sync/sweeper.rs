// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Background removal of SveltosClusters whose Claudie Secret is gone.
//!
//! Delete notifications can be missed, for instance while the controller is
//! down, and the Secret to SveltosCluster index does not survive a restart.
//! The sweeper periodically checks every Claudie SveltosCluster against the
//! API server and deletes the ones whose owning Secret no longer exists.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::kubernetes::scoped_apis;
use crate::types::{ClaudieSecretExt, SveltosCluster};
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{DeleteParams, ListParams},
    runtime::reflector::ObjectRef,
    Api, Client, ResourceExt,
};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Outcome of a single sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    /// Claudie SveltosClusters looked at
    pub examined: usize,
    pub deleted: usize,
    /// SveltosClusters without a Secret owner reference
    pub skipped: usize,
    /// Secret lookups or deletes that failed; retried on the next sweep
    pub failed: usize,
}

pub struct Sweeper {
    client: Client,
    namespaces: Vec<String>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            namespaces: config.watch_namespaces.clone(),
            interval: config.sweep_interval,
        }
    }

    /// Sweep forever, sleeping `interval` before each pass
    pub async fn run(self) -> anyhow::Result<()> {
        info!("Stale SveltosCluster sweeper started, interval {:?}", self.interval);

        loop {
            sleep(self.interval).await;

            let summary = self.sweep().await;
            if summary.deleted > 0 || summary.failed > 0 {
                info!(
                    examined = summary.examined,
                    deleted = summary.deleted,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "Sweep complete"
                );
            } else {
                debug!(examined = summary.examined, "Sweep complete, nothing stale");
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn sweep(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();

        for clusters in scoped_apis::<SveltosCluster>(&self.client, &self.namespaces) {
            let list = match clusters.list(&ListParams::default()).await {
                Ok(list) => list,
                Err(e) => {
                    warn!("Failed to list SveltosClusters: {}", e);
                    continue;
                }
            };

            for cluster in &list.items {
                self.sweep_cluster(cluster, &mut summary).await;
            }
        }

        summary
    }

    async fn sweep_cluster(&self, cluster: &SveltosCluster, summary: &mut SweepSummary) {
        if cluster.is_terminating() || !cluster.is_claudie_managed() {
            return;
        }
        summary.examined += 1;

        let namespace = cluster.namespace().unwrap_or_default();
        let name = cluster.name_any();

        let Some(secret_ref) = cluster.claudie_secret() else {
            info!("Found SveltosCluster {}/{} with no Claudie reference", namespace, name);
            summary.skipped += 1;
            return;
        };

        match self.is_claudie_secret_removed(&secret_ref).await {
            Ok(false) => return,
            Ok(true) => {}
            Err(e) => {
                warn!(
                    "Failed to check Secret {} for SveltosCluster {}/{}: {}",
                    secret_ref, namespace, name, e
                );
                summary.failed += 1;
                return;
            }
        }

        info!(
            "Deleting SveltosCluster {}/{}, Secret {} is gone",
            namespace, name, secret_ref.name
        );

        let clusters: Api<SveltosCluster> = Api::namespaced(self.client.clone(), &namespace);
        match clusters.delete(&name, &DeleteParams::default()).await {
            Ok(_) => summary.deleted += 1,
            Err(e) => {
                let err = Error::from(e);
                if err.is_not_found() {
                    debug!("SveltosCluster {}/{} already deleted", namespace, name);
                } else {
                    warn!("Failed to delete SveltosCluster {}/{}: {}", namespace, name, err);
                    summary.failed += 1;
                }
            }
        }
    }

    /// A Secret counts as removed when it is not found or is being deleted.
    /// Deletion can stall on finalizers, so a terminating Secret is treated as gone.
    pub async fn is_claudie_secret_removed(&self, secret_ref: &ObjectRef<Secret>) -> Result<bool> {
        let namespace = secret_ref.namespace.as_deref().ok_or_else(|| {
            Error::InvalidKey(format!("Secret {} has no namespace", secret_ref.name))
        })?;
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        Ok(match secrets.get_opt(&secret_ref.name).await? {
            None => true,
            Some(secret) => secret.is_terminating(),
        })
    }
}
