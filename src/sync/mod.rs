// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret reconciliation logic and outcome reporting.

pub mod report;
pub mod secrets;

pub use report::{NamespaceResult, Reporter, RunSummary, TracingReporter};
pub use secrets::{build_secret, reconcile_target, ReconcileOutcome, SecretTarget};
