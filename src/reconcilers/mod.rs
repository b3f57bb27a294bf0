// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconcilers that map Secret changes onto SveltosClusters.

pub mod index;
pub mod secret;

pub use index::SecretClusterIndex;
pub use secret::SecretReconciler;
