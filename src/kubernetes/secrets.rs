// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret get/create/patch against the API server

use crate::constants::OPERATOR_NAME;
use crate::error::{Result, TokenSyncError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::{
    api::{Patch, PatchParams, PostParams},
    Api, Client,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// The secret operations the reconciler needs. Each call is a single atomic API operation.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret, `None` if it does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;

    async fn create(&self, namespace: &str, secret: &Secret) -> Result<()>;

    /// Set a single data key, leaving every other key and all metadata alone
    async fn patch_value(&self, namespace: &str, name: &str, key: &str, value: &str)
        -> Result<()>;
}

pub struct KubeSecretStore {
    client: Client,
    timeout: Duration,
}

impl KubeSecretStore {
    /// Every API call is bounded by `timeout`
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn bounded<T, F>(&self, namespace: &str, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, kube::Error>>,
    {
        match timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(operation_error(namespace, operation, e.to_string())),
            Err(_) => Err(operation_error(
                namespace,
                operation,
                format!("timeout after {:?}", self.timeout),
            )),
        }
    }
}

fn operation_error(namespace: &str, operation: &'static str, message: String) -> TokenSyncError {
    TokenSyncError::Operation {
        namespace: namespace.to_string(),
        operation,
        message,
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let api = self.api(namespace);
        let secret = self.bounded(namespace, "get", api.get_opt(name)).await?;
        if secret.is_none() {
            debug!("Secret {}/{} does not exist", namespace, name);
        }
        Ok(secret)
    }

    async fn create(&self, namespace: &str, secret: &Secret) -> Result<()> {
        let api = self.api(namespace);
        let pp = PostParams {
            field_manager: Some(OPERATOR_NAME.to_string()),
            ..Default::default()
        };
        self.bounded(namespace, "create", api.create(&pp, secret))
            .await
            .map(|_| ())
    }

    async fn patch_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let api = self.api(namespace);
        let data = BTreeMap::from([(key.to_string(), ByteString(value.as_bytes().to_vec()))]);
        let patch = serde_json::json!({ "data": data });
        let pp = PatchParams {
            field_manager: Some(OPERATOR_NAME.to_string()),
            ..Default::default()
        };
        self.bounded(namespace, "patch", api.patch(name, &pp, &Patch::Merge(&patch)))
            .await
            .map(|_| ())
    }
}
