// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{defaults, env as vars};
use crate::error::{Result, TokenSyncError};
use crate::retry::RetryPolicy;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// What to do when reconciling one namespace fails for good
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Attempt every namespace and report all failures at the end
    #[default]
    Aggregate,
    /// Stop at the first failed namespace
    FailFast,
}

impl FromStr for FailurePolicy {
    type Err = TokenSyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggregate" | "continue" => Ok(FailurePolicy::Aggregate),
            "fail-fast" | "failfast" => Ok(FailurePolicy::FailFast),
            other => Err(TokenSyncError::Config(format!(
                "unknown failure policy '{}', expected 'aggregate' or 'fail-fast'",
                other
            ))),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Aggregate => f.write_str("aggregate"),
            FailurePolicy::FailFast => f.write_str("fail-fast"),
        }
    }
}

/// Where Kubernetes API credentials come from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KubeCredentials {
    /// In-cluster service account if available, local kubeconfig otherwise
    #[default]
    Auto,
    InCluster,
    Kubeconfig(PathBuf),
}

/// Job configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub token_url: Url,
    pub client_id: String,
    pub client_secret_file: PathBuf,
    /// Space-delimited scopes, omitted from the token request when empty
    pub scopes: String,
    /// Raw comma-separated namespace list; `None` means list the cluster
    pub target_namespaces: Option<String>,
    pub secret_name: String,
    pub secret_key: String,
    pub failure_policy: FailurePolicy,
    pub credentials: KubeCredentials,
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub token_timeout: Duration,
    pub secret_op_timeout: Duration,
    pub list_namespaces_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = required(&lookup, vars::TOKEN_URL)?;
        let token_url = Url::parse(&raw_url).map_err(|e| {
            TokenSyncError::Config(format!("{} is not a valid URL: {}", vars::TOKEN_URL, e))
        })?;
        if !matches!(token_url.scheme(), "http" | "https") {
            return Err(TokenSyncError::Config(format!(
                "{} must use http or https, got '{}'",
                vars::TOKEN_URL,
                token_url.scheme()
            )));
        }

        let client_id = required(&lookup, vars::CLIENT_ID)?;
        let client_secret_file = PathBuf::from(required(&lookup, vars::CLIENT_SECRET_FILE)?);
        let scopes = lookup(vars::SCOPES)
            .unwrap_or_else(|| defaults::SCOPES.to_string())
            .trim()
            .to_string();

        // An empty value behaves like an unset one and triggers cluster-wide listing
        let target_namespaces = lookup(vars::TARGET_NAMESPACES).filter(|v| !v.is_empty());

        let secret_name = non_empty_or(&lookup, vars::SECRET_NAME, defaults::SECRET_NAME)?;
        let secret_key = non_empty_or(&lookup, vars::SECRET_KEY, defaults::SECRET_KEY)?;

        let failure_policy = match lookup(vars::FAILURE_POLICY) {
            Some(v) if !v.trim().is_empty() => v.parse()?,
            _ => FailurePolicy::default(),
        };

        let credentials = parse_credentials(&lookup)?;

        let concurrency: usize = parsed(&lookup, vars::CONCURRENCY, defaults::CONCURRENCY)?;
        if concurrency == 0 {
            return Err(TokenSyncError::Config(format!(
                "{} must be at least 1",
                vars::CONCURRENCY
            )));
        }

        let max_attempts: u32 =
            parsed(&lookup, vars::RETRY_MAX_ATTEMPTS, defaults::RETRY_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(TokenSyncError::Config(format!(
                "{} must be at least 1",
                vars::RETRY_MAX_ATTEMPTS
            )));
        }
        let base_delay = Duration::from_secs(parsed(
            &lookup,
            vars::RETRY_BASE_DELAY_SECS,
            defaults::RETRY_BASE_DELAY_SECS,
        )?);

        Ok(Config {
            token_url,
            client_id,
            client_secret_file,
            scopes,
            target_namespaces,
            secret_name,
            secret_key,
            failure_policy,
            credentials,
            concurrency,
            retry: RetryPolicy::new(max_attempts, base_delay),
            token_timeout: seconds(&lookup, vars::TOKEN_TIMEOUT_SECS, defaults::TOKEN_TIMEOUT_SECS)?,
            secret_op_timeout: seconds(
                &lookup,
                vars::SECRET_OP_TIMEOUT_SECS,
                defaults::SECRET_OP_TIMEOUT_SECS,
            )?,
            list_namespaces_timeout: seconds(
                &lookup,
                vars::LIST_NAMESPACES_TIMEOUT_SECS,
                defaults::LIST_NAMESPACES_TIMEOUT_SECS,
            )?,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TokenSyncError::Config(format!("environment variable {} not set", key)))
}

fn non_empty_or<F>(lookup: &F, key: &str, default: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default.to_string()),
        Some(v) if v.trim().is_empty() => Err(TokenSyncError::Config(format!(
            "environment variable {} must not be empty",
            key
        ))),
        Some(v) => Ok(v.trim().to_string()),
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => v.trim().parse().map_err(|e| {
            TokenSyncError::Config(format!("invalid value '{}' for {}: {}", v, key, e))
        }),
        _ => Ok(default),
    }
}

fn seconds<F>(lookup: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parsed(lookup, key, default)?;
    if secs == 0 {
        return Err(TokenSyncError::Config(format!("{} must be at least 1", key)));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_credentials<F>(lookup: &F) -> Result<KubeCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let mode = lookup(vars::KUBE_CREDENTIALS).unwrap_or_default();
    match mode.trim().to_ascii_lowercase().as_str() {
        "" | "auto" => Ok(KubeCredentials::Auto),
        "in-cluster" | "incluster" => Ok(KubeCredentials::InCluster),
        "kubeconfig" => {
            let path = required(lookup, vars::KUBECONFIG).map_err(|_| {
                TokenSyncError::Config(format!(
                    "{}=kubeconfig requires {} to point at a kubeconfig file",
                    vars::KUBE_CREDENTIALS,
                    vars::KUBECONFIG
                ))
            })?;
            Ok(KubeCredentials::Kubeconfig(PathBuf::from(path)))
        }
        other => Err(TokenSyncError::Config(format!(
            "unknown {} '{}', expected 'auto', 'in-cluster' or 'kubeconfig'",
            vars::KUBE_CREDENTIALS,
            other
        ))),
    }
}
