// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Event dispatch to the Secret reconciler and the stale SveltosCluster sweep.

pub mod dispatcher;
pub mod queue;
pub mod sweeper;

pub use dispatcher::{Dispatcher, SecretQueue};
pub use queue::WorkQueue;
pub use sweeper::{SweepSummary, Sweeper};
