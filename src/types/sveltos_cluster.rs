// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::annotations;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::runtime::reflector::ObjectRef;
use kube::{CustomResource, Resource, ResourceExt};
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "lib.projectsveltos.io", version = "v1alpha1", kind = "SveltosCluster")]
#[kube(namespaced)]
#[kube(status = "SveltosClusterStatus")]
#[serde(rename_all = "camelCase")]
pub struct SveltosClusterSpec {
    /// Name of the Secret, in the same namespace, holding the kubeconfig
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
}

impl SveltosCluster {
    /// Build a SveltosCluster pointing at the kubeconfig stored in `secret`
    pub fn for_kubeconfig_secret(namespace: &str, name: &str, secret: &Secret) -> Self {
        let mut cluster = SveltosCluster::new(
            name,
            SveltosClusterSpec {
                kubeconfig_name: Some(secret.name_any()),
                paused: None,
            },
        );
        cluster.metadata.namespace = Some(namespace.to_string());
        // Labels drive add-on selection and are left to users
        cluster.mark_claudie_managed();
        cluster.add_secret_owner(secret);
        cluster
    }

    /// Check if this SveltosCluster was created for a Claudie Secret
    pub fn is_claudie_managed(&self) -> bool {
        self.metadata
            .annotations
            .as_ref()
            .is_some_and(|a| a.contains_key(annotations::CLAUDIE))
    }

    pub fn is_terminating(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Set the Claudie annotation. Returns true if the object changed.
    pub fn mark_claudie_managed(&mut self) -> bool {
        let current = self.annotations_mut();
        let value = current.get(annotations::CLAUDIE).map(String::as_str);
        if value == Some(annotations::CLAUDIE_VALUE) {
            return false;
        }
        current.insert(
            annotations::CLAUDIE.to_string(),
            annotations::CLAUDIE_VALUE.to_string(),
        );
        true
    }

    /// Add `secret` as owner unless a Secret owner with the same name is already listed.
    /// Returns true if the object changed.
    pub fn add_secret_owner(&mut self, secret: &Secret) -> bool {
        let kind = Secret::kind(&());
        let name = secret.name_any();
        let owners = self.owner_references_mut();

        if owners.iter().any(|o| o.kind == kind && o.name == name) {
            return false;
        }

        owners.push(OwnerReference {
            api_version: Secret::api_version(&()).to_string(),
            kind: kind.to_string(),
            name,
            uid: secret.uid().unwrap_or_default(),
            ..Default::default()
        });
        true
    }

    /// Point the SveltosCluster at the kubeconfig secret. Returns true if the object changed.
    pub fn set_kubeconfig_name(&mut self, secret_name: &str) -> bool {
        if self.spec.kubeconfig_name.as_deref() == Some(secret_name) {
            return false;
        }
        self.spec.kubeconfig_name = Some(secret_name.to_string());
        true
    }

    /// The Claudie Secret owning this SveltosCluster, taken from its owner references
    pub fn claudie_secret(&self) -> Option<ObjectRef<Secret>> {
        let namespace = self.namespace();
        self.owner_references()
            .iter()
            .find_map(|owner| ObjectRef::from_owner_ref(namespace.as_deref(), owner, ()))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SveltosClusterStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
}
