// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret reconciler - drives one reconciliation per target namespace.

use crate::config::{Config, FailurePolicy};
use crate::error::{Result, TokenSyncError};
use crate::kubernetes::SecretStore;
use crate::retry::RetryPolicy;
use crate::sync::{reconcile_target, NamespaceResult, ReconcileOutcome, Reporter, RunSummary, SecretTarget};
use futures::{stream, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

pub struct SecretReconciler {
    store: Arc<dyn SecretStore>,
    reporter: Arc<dyn Reporter>,
    secret_name: String,
    secret_key: String,
    policy: FailurePolicy,
    retry: RetryPolicy,
    concurrency: usize,
}

impl SecretReconciler {
    pub fn new(
        store: Arc<dyn SecretStore>,
        reporter: Arc<dyn Reporter>,
        secret_name: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            reporter,
            secret_name: secret_name.into(),
            secret_key: secret_key.into(),
            policy: FailurePolicy::default(),
            retry: RetryPolicy::default(),
            concurrency: 1,
        }
    }

    pub fn from_config(
        config: &Config,
        store: Arc<dyn SecretStore>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self::new(store, reporter, &config.secret_name, &config.secret_key)
            .with_policy(config.failure_policy)
            .with_retry(config.retry)
            .with_concurrency(config.concurrency)
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Worker count for aggregate mode. Fail-fast always runs sequentially.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Reconcile the secret in every namespace according to the failure policy
    #[instrument(skip(self, token, namespaces, cancel), fields(policy = %self.policy, namespaces = namespaces.len()))]
    pub async fn run(
        &self,
        token: &str,
        namespaces: &[String],
        cancel: &CancellationToken,
    ) -> RunSummary {
        let summary = if self.policy == FailurePolicy::Aggregate && self.concurrency > 1 {
            self.run_parallel(token, namespaces, cancel).await
        } else {
            self.run_sequential(token, namespaces, cancel).await
        };

        self.reporter.run_finished(&summary);
        summary
    }

    async fn run_sequential(
        &self,
        token: &str,
        namespaces: &[String],
        cancel: &CancellationToken,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        for (index, namespace) in namespaces.iter().enumerate() {
            if cancel.is_cancelled() {
                self.skip_rest(&mut summary, &namespaces[index..], "cancelled");
                summary.cancelled = true;
                break;
            }

            let result = self.reconcile_namespace(token, namespace, cancel).await;
            let failed = result.is_err();
            if !self.record(&mut summary, namespace, result) {
                self.skip_rest(&mut summary, &namespaces[index + 1..], "cancelled");
                break;
            }

            if failed && self.policy == FailurePolicy::FailFast {
                debug!("Fail-fast policy: stopping after failure in {}", namespace);
                self.skip_rest(&mut summary, &namespaces[index + 1..], "fail-fast");
                break;
            }
        }

        summary
    }

    async fn run_parallel(
        &self,
        token: &str,
        namespaces: &[String],
        cancel: &CancellationToken,
    ) -> RunSummary {
        let mut results: Vec<(usize, Option<Result<ReconcileOutcome>>)> =
            stream::iter(namespaces.iter().enumerate())
                .map(|(index, namespace)| async move {
                    if cancel.is_cancelled() {
                        return (index, None);
                    }
                    let result = self.reconcile_namespace(token, namespace, cancel).await;
                    (index, Some(result))
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        // Report in input order regardless of completion order
        results.sort_by_key(|(index, _)| *index);

        let mut summary = RunSummary::default();
        for (index, result) in results {
            let namespace = &namespaces[index];
            match result {
                Some(result) => {
                    self.record(&mut summary, namespace, result);
                }
                None => {
                    self.reporter.namespace_skipped(namespace, "cancelled");
                    summary.skipped.push(namespace.clone());
                    summary.cancelled = true;
                }
            }
        }
        summary
    }

    async fn reconcile_namespace(
        &self,
        token: &str,
        namespace: &str,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome> {
        self.reporter.namespace_started(namespace);

        let target = SecretTarget::new(namespace, &self.secret_name, &self.secret_key, token);
        let operation = format!("reconcile secret in namespace {}", namespace);
        self.retry
            .run(&operation, cancel, |_| {
                reconcile_target(self.store.as_ref(), &target)
            })
            .await
    }

    /// Store a namespace result. Returns false when the namespace was
    /// interrupted by cancellation, which marks it skipped instead.
    fn record(
        &self,
        summary: &mut RunSummary,
        namespace: &str,
        result: Result<ReconcileOutcome>,
    ) -> bool {
        if matches!(result, Err(TokenSyncError::Cancelled)) {
            self.reporter.namespace_skipped(namespace, "cancelled");
            summary.skipped.push(namespace.to_string());
            summary.cancelled = true;
            return false;
        }

        self.reporter.namespace_finished(namespace, &result);
        summary.results.push(NamespaceResult {
            namespace: namespace.to_string(),
            result,
        });
        true
    }

    fn skip_rest(&self, summary: &mut RunSummary, rest: &[String], reason: &str) {
        for namespace in rest {
            self.reporter.namespace_skipped(namespace, reason);
            summary.skipped.push(namespace.clone());
        }
    }
}
