// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::defaults;
use anyhow::{ensure, Context, Result};
use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Namespaces to watch for Claudie secrets. Empty means all namespaces.
    pub watch_namespaces: Vec<String>,
    /// Number of secrets reconciled in parallel
    pub concurrent_reconciles: usize,
    /// Delay before a failed reconciliation is retried
    pub requeue_after: Duration,
    /// Period of the stale SveltosCluster sweep
    pub sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            watch_namespaces: Vec::new(),
            concurrent_reconciles: defaults::CONCURRENT_RECONCILES,
            requeue_after: Duration::from_secs(defaults::REQUEUE_AFTER_SECS),
            sweep_interval: Duration::from_secs(defaults::SWEEP_INTERVAL_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(namespaces) = lookup("WATCH_NAMESPACES") {
            config.watch_namespaces = namespaces
                .split(',')
                .map(str::trim)
                .filter(|ns| !ns.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(value) = lookup("CONCURRENT_RECONCILES") {
            config.concurrent_reconciles = value
                .trim()
                .parse()
                .with_context(|| format!("CONCURRENT_RECONCILES is not a number: {}", value))?;
        }
        ensure!(
            config.concurrent_reconciles > 0,
            "CONCURRENT_RECONCILES must be at least 1"
        );

        if let Some(value) = lookup("REQUEUE_AFTER_SECS") {
            let secs: u64 = value
                .trim()
                .parse()
                .with_context(|| format!("REQUEUE_AFTER_SECS is not a number: {}", value))?;
            config.requeue_after = Duration::from_secs(secs);
        }

        if let Some(value) = lookup("SWEEP_INTERVAL_SECS") {
            let secs: u64 = value
                .trim()
                .parse()
                .with_context(|| format!("SWEEP_INTERVAL_SECS is not a number: {}", value))?;
            ensure!(secs > 0, "SWEEP_INTERVAL_SECS must be at least 1");
            config.sweep_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
