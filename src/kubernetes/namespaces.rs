// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Target namespace resolution

use crate::error::{Result, TokenSyncError};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::{api::ListParams, Api, Client, ResourceExt};
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Enumerates the namespaces of a cluster
#[async_trait]
pub trait NamespaceLister: Send + Sync {
    async fn list(&self) -> Result<Vec<String>>;
}

/// Lists namespaces through the API server. Needs cluster-wide `list` on namespaces.
pub struct KubeNamespaceLister {
    client: Client,
    timeout: Duration,
}

impl KubeNamespaceLister {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl NamespaceLister for KubeNamespaceLister {
    async fn list(&self) -> Result<Vec<String>> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());

        let list = timeout(self.timeout, namespaces.list(&ListParams::default()))
            .await
            .map_err(|_| {
                TokenSyncError::NamespaceResolution(format!(
                    "timeout after {:?} listing namespaces",
                    self.timeout
                ))
            })?
            .map_err(|e| {
                TokenSyncError::NamespaceResolution(format!("failed to list namespaces: {}", e))
            })?;

        Ok(list.items.iter().map(|ns| ns.name_any()).collect())
    }
}

/// Split a comma-separated namespace list, trimming entries and dropping empty ones.
/// Order and duplicates are preserved.
pub fn parse_namespace_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|ns| !ns.is_empty())
        .map(str::to_string)
        .collect()
}

/// Determine the namespaces to reconcile.
///
/// An explicit list is used as-is and the cluster is never contacted, which
/// keeps namespace-scoped RBAC sufficient. An explicit list that parses to
/// nothing is a valid empty result. Without one, the lister is consulted.
#[instrument(skip(lister, retry, cancel))]
pub async fn resolve_targets(
    explicit: Option<&str>,
    lister: &dyn NamespaceLister,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Vec<String>> {
    if let Some(raw) = explicit {
        let namespaces = parse_namespace_list(raw);
        if namespaces.is_empty() {
            info!("Explicit namespace list '{}' is empty after parsing", raw);
        } else {
            debug!("Using explicit namespace list: {:?}", namespaces);
        }
        return Ok(namespaces);
    }

    info!("No explicit namespaces configured, listing all namespaces in the cluster");
    retry
        .run("namespace listing", cancel, |_| lister.list())
        .await
        .map_err(|e| match e {
            TokenSyncError::NamespaceResolution(_) | TokenSyncError::Cancelled => e,
            other => TokenSyncError::NamespaceResolution(other.to_string()),
        })
}
