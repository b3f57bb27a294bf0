// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource types handled by the controller.

pub mod secret;
pub mod sveltos_cluster;

pub use secret::ClaudieSecretExt;
pub use sveltos_cluster::{SveltosCluster, SveltosClusterSpec, SveltosClusterStatus};
