// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Environment variables read by the job
pub mod env {
    pub const TOKEN_URL: &str = "OIDC_TOKEN_URL";
    pub const CLIENT_ID: &str = "OIDC_CLIENT_ID";
    /// Path to a file holding the client secret
    pub const CLIENT_SECRET_FILE: &str = "OIDC_CLIENT_SECRET_FILE";
    pub const SCOPES: &str = "OIDC_SCOPES";
    /// Comma-separated namespace list; unset or empty lists the whole cluster
    pub const TARGET_NAMESPACES: &str = "TARGET_NAMESPACES";
    pub const SECRET_NAME: &str = "K8S_SECRET_NAME";
    pub const SECRET_KEY: &str = "K8S_SECRET_KEY";
    pub const FAILURE_POLICY: &str = "FAILURE_POLICY";
    pub const KUBE_CREDENTIALS: &str = "KUBE_CREDENTIALS";
    pub const KUBECONFIG: &str = "KUBECONFIG";
    pub const CONCURRENCY: &str = "RECONCILE_CONCURRENCY";
    pub const RETRY_MAX_ATTEMPTS: &str = "RETRY_MAX_ATTEMPTS";
    pub const RETRY_BASE_DELAY_SECS: &str = "RETRY_BASE_DELAY_SECS";
    pub const TOKEN_TIMEOUT_SECS: &str = "TOKEN_TIMEOUT_SECS";
    pub const SECRET_OP_TIMEOUT_SECS: &str = "K8S_SECRET_OP_TIMEOUT_SECS";
    pub const LIST_NAMESPACES_TIMEOUT_SECS: &str = "K8S_LIST_NAMESPACES_TIMEOUT_SECS";
}

/// Defaults applied when the matching variable is unset
pub mod defaults {
    pub const SCOPES: &str = "openid";
    pub const SECRET_NAME: &str = "oidc-token-secret";
    pub const SECRET_KEY: &str = "token";
    pub const CONCURRENCY: usize = 1;
    pub const RETRY_MAX_ATTEMPTS: u32 = 3;
    pub const RETRY_BASE_DELAY_SECS: u64 = 2;
    pub const TOKEN_TIMEOUT_SECS: u64 = 15;
    pub const SECRET_OP_TIMEOUT_SECS: u64 = 30;
    pub const LIST_NAMESPACES_TIMEOUT_SECS: u64 = 60;
}

/// Kubernetes label keys used on managed secrets
pub mod labels {
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
}

/// The job name, used as the managed-by label value and field manager
pub const OPERATOR_NAME: &str = "oidc-token-sync";

/// Upper bound on how much of an error response body ends up in diagnostics
pub const MAX_ERROR_BODY_LEN: usize = 512;
