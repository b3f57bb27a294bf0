// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Claudie Secret to SveltosCluster association.
//!
//! When a Secret is deleted its body, and with it the cluster label, is gone.
//! The index remembers which SveltosCluster was created for each Secret so the
//! delete notification can still be acted on. It is a per-process cache, not a
//! ledger: it starts empty and the sweeper covers whatever it misses.

use crate::types::SveltosCluster;
use k8s_openapi::api::core::v1::Secret;
use kube::runtime::reflector::ObjectRef;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct SecretClusterIndex {
    entries: Mutex<HashMap<ObjectRef<Secret>, ObjectRef<SveltosCluster>>>,
}

impl SecretClusterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the SveltosCluster created for `secret`, returning the previous association
    pub fn record(
        &self,
        secret: ObjectRef<Secret>,
        cluster: ObjectRef<SveltosCluster>,
    ) -> Option<ObjectRef<SveltosCluster>> {
        self.entries.lock().insert(secret, cluster)
    }

    pub fn lookup(&self, secret: &ObjectRef<Secret>) -> Option<ObjectRef<SveltosCluster>> {
        self.entries.lock().get(secret).cloned()
    }

    pub fn forget(&self, secret: &ObjectRef<Secret>) -> Option<ObjectRef<SveltosCluster>> {
        self.entries.lock().remove(secret)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
