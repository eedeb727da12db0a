// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! One batch cycle: fetch a token, resolve namespaces, reconcile secrets.

use crate::config::Config;
use crate::error::Result;
use crate::kubernetes::{
    resolve_targets, ClientSource, KubeNamespaceLister, KubeSecretStore,
};
use crate::reconcilers::SecretReconciler;
use crate::sync::{Reporter, RunSummary};
use crate::token::{TokenClient, TokenRequest};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Run one cycle. Per-namespace failures are in the returned summary;
/// everything before reconciliation is fatal and returned as an error.
#[instrument(skip_all, fields(secret = %config.secret_name, policy = %config.failure_policy))]
pub async fn run_once(
    config: &Config,
    source: &dyn ClientSource,
    reporter: Arc<dyn Reporter>,
    cancel: &CancellationToken,
) -> Result<RunSummary> {
    // Credential problems surface before any network call
    let request = TokenRequest::from_config(config)?;

    info!("Fetching OIDC token...");
    let token = TokenClient::new(config.token_timeout, config.retry)?
        .fetch_token(&request, cancel)
        .await?;
    info!("Successfully fetched OIDC token");

    info!("Initializing Kubernetes client ({} credentials)...", source.name());
    let client = source.client().await?;

    let lister = KubeNamespaceLister::new(client.clone(), config.list_namespaces_timeout);
    let namespaces = resolve_targets(
        config.target_namespaces.as_deref(),
        &lister,
        &config.retry,
        cancel,
    )
    .await?;

    if namespaces.is_empty() {
        info!("No namespaces identified for processing");
        return Ok(RunSummary::default());
    }
    info!("Found {} namespaces to process: {:?}", namespaces.len(), namespaces);

    let store = Arc::new(KubeSecretStore::new(client, config.secret_op_timeout));
    let reconciler = SecretReconciler::from_config(config, store, reporter);
    Ok(reconciler.run(&token, &namespaces, cancel).await)
}
