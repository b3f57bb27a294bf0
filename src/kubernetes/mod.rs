// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery and API scoping.

pub mod api;
pub mod crd;

pub use api::scoped_apis;
pub use crd::wait_for_sveltos_cluster_crd;
