// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenSyncError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to fetch OIDC token: {0}")]
    TokenFetch(String),

    #[error("Failed to resolve target namespaces: {0}")]
    NamespaceResolution(String),

    #[error("Failed to {operation} secret in namespace {namespace}: {message}")]
    Operation {
        namespace: String,
        operation: &'static str,
        message: String,
    },

    #[error("Failed to create Kubernetes client: {0}")]
    KubeClient(String),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Secret reconciliation failed in {} namespace(s): {}", failed.len(), failed.join(", "))]
    Reconcile { failed: Vec<String> },

    #[error("Operation cancelled")]
    Cancelled,
}

impl TokenSyncError {
    /// Errors that a retry can never fix
    pub fn is_permanent(&self) -> bool {
        matches!(self, TokenSyncError::Config(_) | TokenSyncError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, TokenSyncError>;
