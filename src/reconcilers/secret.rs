// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret reconciler - keeps one SveltosCluster per Claudie kubeconfig Secret.

use crate::constants::OPERATOR_NAME;
use crate::error::{Error, Result};
use crate::reconcilers::index::SecretClusterIndex;
use crate::types::{ClaudieSecretExt, SveltosCluster};
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{DeleteParams, PostParams},
    runtime::reflector::ObjectRef,
    Api, Client, ResourceExt,
};
use tracing::{debug, info, instrument, warn};

pub struct SecretReconciler {
    client: Client,
    index: SecretClusterIndex,
}

impl SecretReconciler {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            index: SecretClusterIndex::new(),
        }
    }

    pub fn index(&self) -> &SecretClusterIndex {
        &self.index
    }

    /// Run one reconciliation pass for the Secret identified by `secret_ref`.
    ///
    /// The Secret is always fetched again, so the pass is safe to repeat and
    /// does not depend on the order in which notifications arrive.
    #[instrument(skip(self, secret_ref), fields(secret = %secret_ref))]
    pub async fn reconcile(&self, secret_ref: &ObjectRef<Secret>) -> Result<()> {
        let namespace = secret_namespace(secret_ref)?;
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        let Some(secret) = secrets.get_opt(&secret_ref.name).await? else {
            debug!("Secret not found, cleaning up");
            return self.clean_sveltos_cluster(secret_ref).await;
        };

        if secret.is_terminating() {
            debug!("Secret is being deleted, cleaning up");
            return self.clean_sveltos_cluster(secret_ref).await;
        }

        if !secret.is_claudie_kubeconfig() {
            debug!("Secret is not a Claudie kubeconfig, skipping");
            return Ok(());
        }

        self.create_sveltos_cluster(&secret).await
    }

    /// Remove the SveltosCluster recorded for a Secret, if any.
    ///
    /// The index entry is dropped only once the SveltosCluster is confirmed gone,
    /// so a failed delete is retried against the same target.
    async fn clean_sveltos_cluster(&self, secret_ref: &ObjectRef<Secret>) -> Result<()> {
        let Some(cluster_ref) = self.index.lookup(secret_ref) else {
            return Ok(());
        };

        info!(cluster = %cluster_ref, "Removing SveltosCluster for Secret");

        let namespace = cluster_ref.namespace.as_deref().unwrap_or_default();
        let clusters: Api<SveltosCluster> = Api::namespaced(self.client.clone(), namespace);

        if clusters.get_opt(&cluster_ref.name).await?.is_none() {
            debug!(cluster = %cluster_ref, "SveltosCluster already gone");
            self.index.forget(secret_ref);
            return Ok(());
        }

        match clusters.delete(&cluster_ref.name, &DeleteParams::default()).await {
            Ok(_) => {}
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!(cluster = %cluster_ref, "SveltosCluster deleted concurrently");
            }
            Err(e) => return Err(e.into()),
        }

        self.index.forget(secret_ref);
        info!(cluster = %cluster_ref, "SveltosCluster removed");
        Ok(())
    }

    /// Create, or bring up to date, the SveltosCluster for a Claudie Secret.
    /// The Secret is recorded as owner of the SveltosCluster.
    async fn create_sveltos_cluster(&self, secret: &Secret) -> Result<()> {
        let Some(cluster_ref) = secret.sveltos_cluster_ref() else {
            warn!("Claudie Secret has an empty cluster label, skipping");
            return Ok(());
        };

        self.index.record(ObjectRef::from_obj(secret), cluster_ref.clone());

        let namespace = cluster_ref.namespace.as_deref().unwrap_or_default();
        let clusters: Api<SveltosCluster> = Api::namespaced(self.client.clone(), namespace);
        let pp = PostParams {
            field_manager: Some(OPERATOR_NAME.to_string()),
            ..Default::default()
        };

        match clusters.get_opt(&cluster_ref.name).await? {
            None => {
                let cluster =
                    SveltosCluster::for_kubeconfig_secret(namespace, &cluster_ref.name, secret);
                clusters.create(&pp, &cluster).await?;
                info!(cluster = %cluster_ref, "Created SveltosCluster");
            }
            Some(mut cluster) => {
                let annotated = cluster.mark_claudie_managed();
                let owned = cluster.add_secret_owner(secret);
                let repointed = cluster.set_kubeconfig_name(&secret.name_any());

                if !(annotated || owned || repointed) {
                    debug!(cluster = %cluster_ref, "SveltosCluster up to date");
                    return Ok(());
                }

                clusters.replace(&cluster_ref.name, &pp, &cluster).await?;
                info!(cluster = %cluster_ref, "Updated SveltosCluster");
            }
        }

        Ok(())
    }
}

fn secret_namespace(secret_ref: &ObjectRef<Secret>) -> Result<&str> {
    secret_ref
        .namespace
        .as_deref()
        .ok_or_else(|| Error::InvalidKey(format!("Secret {} has no namespace", secret_ref.name)))
}
