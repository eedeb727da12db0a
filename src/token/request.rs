// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Client-credentials request and response shapes

use crate::config::Config;
use crate::error::{Result, TokenSyncError};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use url::Url;

/// Everything needed for one client-credentials token request
#[derive(Clone)]
pub struct TokenRequest {
    pub token_url: Url,
    pub client_id: String,
    client_secret: String,
    pub scope: Option<String>,
}

impl TokenRequest {
    pub fn new(
        token_url: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: Option<String>,
    ) -> Self {
        Self {
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope.filter(|s| !s.trim().is_empty()),
        }
    }

    /// Build the request from configuration, reading the client secret file
    pub fn from_config(config: &Config) -> Result<Self> {
        let client_secret = read_client_secret(&config.client_secret_file)?;
        Ok(Self::new(
            config.token_url.clone(),
            config.client_id.clone(),
            client_secret,
            Some(config.scopes.clone()),
        ))
    }

    /// Form fields of the token request body
    pub fn form(&self) -> Vec<(&'static str, &str)> {
        let mut form = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];
        if let Some(scope) = &self.scope {
            form.push(("scope", scope.as_str()));
        }
        form
    }
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}

/// Read the client secret from a file, trimming surrounding whitespace
pub fn read_client_secret(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        TokenSyncError::Config(format!(
            "failed to read client secret file {}: {}",
            path.display(),
            e
        ))
    })?;

    let secret = raw.trim();
    if secret.is_empty() {
        return Err(TokenSyncError::Config(format!(
            "client secret file {} is empty",
            path.display()
        )));
    }
    Ok(secret.to_string())
}

/// Token endpoint response body. Only `access_token` is required.
#[derive(Deserialize, Clone)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Advisory lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
