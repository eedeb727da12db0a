// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client creation from pluggable credential sources

use crate::config::KubeCredentials;
use crate::error::{Result, TokenSyncError};
use async_trait::async_trait;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KConfig};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Something that can produce an authenticated API client
#[async_trait]
pub trait ClientSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn client(&self) -> Result<Client>;
}

/// Select the credential source named by the configuration
pub fn client_source(credentials: &KubeCredentials) -> Box<dyn ClientSource> {
    match credentials {
        KubeCredentials::Auto => Box::new(InferredSource),
        KubeCredentials::InCluster => Box::new(InClusterSource),
        KubeCredentials::Kubeconfig(path) => Box::new(KubeconfigSource::new(path.clone())),
    }
}

/// Service account token and CA mounted into the pod
pub struct InClusterSource;

#[async_trait]
impl ClientSource for InClusterSource {
    fn name(&self) -> &'static str {
        "in-cluster"
    }

    async fn client(&self) -> Result<Client> {
        let config = KConfig::incluster().map_err(|e| {
            TokenSyncError::KubeClient(format!("Failed to load in-cluster config: {}", e))
        })?;
        client_from_config(config)
    }
}

/// Whatever kube infers: KUBECONFIG or ~/.kube/config, then the in-cluster environment
pub struct InferredSource;

#[async_trait]
impl ClientSource for InferredSource {
    fn name(&self) -> &'static str {
        "auto"
    }

    async fn client(&self) -> Result<Client> {
        let config = KConfig::infer()
            .await
            .map_err(|e| TokenSyncError::KubeClient(format!("Failed to infer config: {}", e)))?;
        client_from_config(config)
    }
}

/// An explicit kubeconfig file
pub struct KubeconfigSource {
    path: PathBuf,
}

impl KubeconfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ClientSource for KubeconfigSource {
    fn name(&self) -> &'static str {
        "kubeconfig"
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn client(&self) -> Result<Client> {
        let kubeconfig = read_kubeconfig(&self.path)?;
        create_client_from_kubeconfig(&kubeconfig).await
    }
}

fn read_kubeconfig(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        TokenSyncError::KubeClient(format!(
            "Failed to read kubeconfig {}: {}",
            path.display(),
            e
        ))
    })
}

/// Create a Kubernetes client from a kubeconfig string
async fn create_client_from_kubeconfig(kubeconfig: &str) -> Result<Client> {
    let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(kubeconfig)
        .map_err(|e| TokenSyncError::KubeClient(format!("Failed to parse kubeconfig: {}", e)))?;

    let client_config = KConfig::from_custom_kubeconfig(kubeconfig_parsed, &KubeConfigOptions::default())
        .await
        .map_err(|e| TokenSyncError::KubeClient(format!("Failed to create config: {}", e)))?;

    client_from_config(client_config)
}

fn client_from_config(config: KConfig) -> Result<Client> {
    info!("Using Kubernetes API server at {}", config.cluster_url);
    Client::try_from(config)
        .map_err(|e| TokenSyncError::KubeClient(format!("Failed to create client: {}", e)))
}
