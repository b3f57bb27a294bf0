// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Helpers for recognising the kubeconfig Secrets Claudie produces.

use crate::constants::labels;
use crate::types::SveltosCluster;
use k8s_openapi::api::core::v1::Secret;
use kube::runtime::reflector::ObjectRef;
use kube::ResourceExt;

pub trait ClaudieSecretExt {
    /// Only Claudie secrets containing a cluster kubeconfig are reconciled
    fn is_claudie_kubeconfig(&self) -> bool;

    /// Name of the cluster this kubeconfig belongs to
    fn claudie_cluster_name(&self) -> Option<&str>;

    /// The SveltosCluster this Secret maps to. It lives in the Secret's namespace.
    fn sveltos_cluster_ref(&self) -> Option<ObjectRef<SveltosCluster>>;

    fn is_terminating(&self) -> bool;
}

impl ClaudieSecretExt for Secret {
    fn is_claudie_kubeconfig(&self) -> bool {
        let labels = self.labels();
        [labels::PART_OF, labels::OUTPUT, labels::CLUSTER]
            .iter()
            .all(|key| labels.contains_key(*key))
    }

    fn claudie_cluster_name(&self) -> Option<&str> {
        self.metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(labels::CLUSTER))
            .map(String::as_str)
    }

    fn sveltos_cluster_ref(&self) -> Option<ObjectRef<SveltosCluster>> {
        let namespace = self.namespace()?;
        let name = self.claudie_cluster_name().filter(|n| !n.is_empty())?;
        Some(ObjectRef::new(name).within(&namespace))
    }

    fn is_terminating(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }
}
