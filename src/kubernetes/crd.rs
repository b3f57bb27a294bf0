// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use crate::types::SveltosCluster;
use kube::{discovery::Discovery, Client, Resource};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Wait for the SveltosCluster CRD to become available in the cluster.
/// This uses exponential backoff starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_sveltos_cluster_crd(client: &Client) -> Result<()> {
    let api_version = SveltosCluster::api_version(&());
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match check_sveltos_cluster_crd_exists(client).await {
            Ok(true) => {
                info!("SveltosCluster CRD ({}) is available", api_version);
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "SveltosCluster CRD ({}) not yet available, waiting {} seconds...",
                    api_version, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for SveltosCluster CRD: {}, retrying in {} seconds...",
                    e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;

        // Exponential backoff with max cap
        interval = (interval * 2).min(POLL_MAX_INTERVAL_SECS);
    }
}

/// Check if the SveltosCluster CRD is served by discovering its API group.
async fn check_sveltos_cluster_crd_exists(client: &Client) -> Result<bool> {
    let group = SveltosCluster::group(&());
    let discovery = Discovery::new(client.clone())
        .filter(&[group.as_ref()])
        .run()
        .await?;

    let found = discovery
        .groups()
        .filter(|g| g.name() == group)
        .flat_map(|g| g.recommended_resources())
        .any(|(ar, _)| {
            ar.kind == SveltosCluster::kind(&()) && ar.version == SveltosCluster::version(&())
        });

    Ok(found)
}
