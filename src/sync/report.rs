// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-namespace outcome reporting and the run summary

use crate::error::{Result, TokenSyncError};
use crate::sync::secrets::ReconcileOutcome;
use tracing::{error, info, warn};

/// Receives reconciliation progress. Passed explicitly so outcomes can be
/// observed without capturing global log output.
pub trait Reporter: Send + Sync {
    fn namespace_started(&self, namespace: &str);

    fn namespace_finished(&self, namespace: &str, result: &Result<ReconcileOutcome>);

    fn namespace_skipped(&self, namespace: &str, reason: &str);

    fn run_finished(&self, summary: &RunSummary);
}

/// Reports through `tracing` with structured fields
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn namespace_started(&self, namespace: &str) {
        info!(namespace, "Processing namespace");
    }

    fn namespace_finished(&self, namespace: &str, result: &Result<ReconcileOutcome>) {
        match result {
            Ok(outcome) => info!(namespace, outcome = %outcome, "Secret reconciled"),
            Err(e) => error!(namespace, error = %e, "Secret reconciliation failed"),
        }
    }

    fn namespace_skipped(&self, namespace: &str, reason: &str) {
        warn!(namespace, reason, "Namespace skipped");
    }

    fn run_finished(&self, summary: &RunSummary) {
        let (created, updated, unchanged) = summary.counts();
        let failed = summary.failed_namespaces();
        if failed.is_empty() {
            info!(
                created,
                updated,
                unchanged,
                skipped = summary.skipped.len(),
                "Reconciliation finished"
            );
        } else {
            error!(
                created,
                updated,
                unchanged,
                failed = failed.len(),
                skipped = summary.skipped.len(),
                "Reconciliation finished with failures in: {}",
                failed.join(", ")
            );
        }
    }
}

/// Result for one namespace, terminal
#[derive(Debug)]
pub struct NamespaceResult {
    pub namespace: String,
    pub result: Result<ReconcileOutcome>,
}

/// Aggregated outcome of one run, in namespace input order
#[derive(Debug, Default)]
pub struct RunSummary {
    pub results: Vec<NamespaceResult>,
    /// Namespaces never attempted because of fail-fast or cancellation
    pub skipped: Vec<String>,
    pub cancelled: bool,
}

impl RunSummary {
    /// (created, updated, unchanged)
    pub fn counts(&self) -> (usize, usize, usize) {
        let count = |wanted: ReconcileOutcome| {
            self.results
                .iter()
                .filter(|r| matches!(r.result, Ok(outcome) if outcome == wanted))
                .count()
        };
        (
            count(ReconcileOutcome::Created),
            count(ReconcileOutcome::Updated),
            count(ReconcileOutcome::Unchanged),
        )
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_ok()).count()
    }

    pub fn errors(&self) -> Vec<&TokenSyncError> {
        self.results
            .iter()
            .filter_map(|r| r.result.as_ref().err())
            .collect()
    }

    pub fn failed_namespaces(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| r.result.is_err())
            .map(|r| r.namespace.clone())
            .collect()
    }

    pub fn outcome(&self, namespace: &str) -> Option<&Result<ReconcileOutcome>> {
        self.results
            .iter()
            .find(|r| r.namespace == namespace)
            .map(|r| &r.result)
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.skipped.is_empty() && self.errors().is_empty()
    }

    /// Collapse into the run-level result
    pub fn into_result(self) -> Result<()> {
        let failed = self.failed_namespaces();
        if !failed.is_empty() {
            return Err(TokenSyncError::Reconcile { failed });
        }
        if self.cancelled {
            return Err(TokenSyncError::Cancelled);
        }
        Ok(())
    }
}
