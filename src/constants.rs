// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Labels Claudie puts on the Secret holding a cluster kubeconfig.
/// All three must be present for the Secret to be considered.
pub mod labels {
    pub const PART_OF: &str = "app.kubernetes.io/part-of";
    pub const OUTPUT: &str = "claudie.io/output";
    /// Value is the name of the provisioned cluster
    pub const CLUSTER: &str = "claudie.io/cluster";

    /// Label selector matching Secrets that carry all three labels
    pub const CLAUDIE_SECRET_SELECTOR: &str =
        "app.kubernetes.io/part-of,claudie.io/output,claudie.io/cluster";
}

/// Annotations written on SveltosCluster resources
pub mod annotations {
    /// Marks a SveltosCluster as created for a Claudie Secret. Only key presence is checked.
    pub const CLAUDIE: &str = "projectsveltos.io/claudie";
    pub const CLAUDIE_VALUE: &str = "ok";
}

/// Field manager used for writes to the API server
pub const OPERATOR_NAME: &str = "claudie-sveltos";

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// Defaults for the environment-driven configuration
pub mod defaults {
    pub const CONCURRENT_RECONCILES: usize = 10;
    /// Delay before a failed reconciliation is retried
    pub const REQUEUE_AFTER_SECS: u64 = 10;
    /// Period of the stale SveltosCluster sweep
    pub const SWEEP_INTERVAL_SECS: u64 = 120;
}
