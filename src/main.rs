// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use claudie_sveltos::config::Config;
use claudie_sveltos::kubernetes::wait_for_sveltos_cluster_crd;
use claudie_sveltos::reconcilers::SecretReconciler;
use claudie_sveltos::sync::{Dispatcher, Sweeper};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Claudie to Sveltos controller");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        watch_namespaces = ?config.watch_namespaces,
        concurrent_reconciles = config.concurrent_reconciles,
        requeue_after = ?config.requeue_after,
        sweep_interval = ?config.sweep_interval,
        "Configuration loaded"
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // SveltosCluster objects cannot be managed before the CRD is served
    info!("Waiting for SveltosCluster CRD to become available...");
    wait_for_sveltos_cluster_crd(&client).await?;

    let reconciler = Arc::new(SecretReconciler::new(client.clone()));
    let dispatcher = Dispatcher::new(client.clone(), &config, reconciler);
    let sweeper = Sweeper::new(client, &config);

    info!("Starting dispatcher and sweeper...");

    run_until_stopped(dispatcher.run(), sweeper.run(), tokio::signal::ctrl_c()).await
}

/// Run dispatcher and sweeper until either one exits or `shutdown` resolves
async fn run_until_stopped<D, S, C>(dispatcher: D, sweeper: S, shutdown: C) -> Result<()>
where
    D: Future<Output = Result<()>>,
    S: Future<Output = Result<()>>,
    C: Future,
{
    tokio::select! {
        result = dispatcher => {
            warn!("Dispatcher stopped unexpectedly");
            result
        }
        result = sweeper => {
            warn!("Sweeper stopped unexpectedly");
            result
        }
        _ = shutdown => {
            info!("Received shutdown signal, exiting");
            Ok(())
        }
    }
}
