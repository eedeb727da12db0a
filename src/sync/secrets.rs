// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Single-namespace secret reconciliation

use crate::constants::{labels, OPERATOR_NAME};
use crate::error::Result;
use crate::kubernetes::SecretStore;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, instrument};

/// One reconciliation unit: the token that should live at `namespace/secret_name[secret_key]`
#[derive(Clone)]
pub struct SecretTarget {
    pub namespace: String,
    pub secret_name: String,
    pub secret_key: String,
    token: String,
}

impl SecretTarget {
    pub fn new(
        namespace: impl Into<String>,
        secret_name: impl Into<String>,
        secret_key: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            secret_name: secret_name.into(),
            secret_key: secret_key.into(),
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for SecretTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretTarget")
            .field("namespace", &self.namespace)
            .field("secret_name", &self.secret_name)
            .field("secret_key", &self.secret_key)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Terminal state of a successfully reconciled namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Updated,
    Unchanged,
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileOutcome::Created => f.write_str("created"),
            ReconcileOutcome::Updated => f.write_str("updated"),
            ReconcileOutcome::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// Bring one namespace's secret in line with the target.
///
/// Missing secrets are created, differing values are patched, equal values
/// are left alone without any write.
#[instrument(skip(store, target), fields(namespace = %target.namespace, secret = %target.secret_name))]
pub async fn reconcile_target(store: &dyn SecretStore, target: &SecretTarget) -> Result<ReconcileOutcome> {
    let existing = store.get(&target.namespace, &target.secret_name).await?;

    let Some(existing) = existing else {
        debug!("Secret not found, creating");
        store
            .create(&target.namespace, &build_secret(target))
            .await?;
        return Ok(ReconcileOutcome::Created);
    };

    if stored_value(&existing, &target.secret_key) == Some(target.token.as_bytes()) {
        debug!("Secret already holds the current token");
        return Ok(ReconcileOutcome::Unchanged);
    }

    debug!("Secret holds a different value, patching");
    store
        .patch_value(
            &target.namespace,
            &target.secret_name,
            &target.secret_key,
            &target.token,
        )
        .await?;
    Ok(ReconcileOutcome::Updated)
}

/// The bytes stored under `key`, looking at `stringData` as a fallback
fn stored_value<'a>(secret: &'a Secret, key: &str) -> Option<&'a [u8]> {
    secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .map(|v| v.0.as_slice())
        .or_else(|| {
            secret
                .string_data
                .as_ref()
                .and_then(|d| d.get(key))
                .map(|v| v.as_bytes())
        })
}

/// Build a new opaque secret carrying the token, labelled as managed by this job
pub fn build_secret(target: &SecretTarget) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(target.secret_name.clone()),
            namespace: Some(target.namespace.clone()),
            labels: Some(BTreeMap::from([(
                labels::MANAGED_BY.to_string(),
                OPERATOR_NAME.to_string(),
            )])),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            target.secret_key.clone(),
            ByteString(target.token.as_bytes().to_vec()),
        )])),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}
