// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Client-credentials token fetching

use crate::constants::MAX_ERROR_BODY_LEN;
use crate::error::{Result, TokenSyncError};
use crate::retry::RetryPolicy;
use crate::token::request::{TokenRequest, TokenResponse};
use reqwest::StatusCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

pub struct TokenClient {
    http: reqwest::Client,
    retry: RetryPolicy,
    timeout: Duration,
}

impl TokenClient {
    /// Create a client whose individual attempts are bounded by `timeout`
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TokenSyncError::TokenFetch(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            retry,
            timeout,
        })
    }

    /// Fetch an access token, retrying transport errors, non-200 statuses and
    /// malformed responses according to the retry policy.
    #[instrument(skip(self, request, cancel), fields(token_url = %request.token_url, client_id = %request.client_id))]
    pub async fn fetch_token(
        &self,
        request: &TokenRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let response = self
            .retry
            .run("token request", cancel, |attempt| self.attempt(request, attempt))
            .await?;

        info!(
            token_type = response.token_type.as_deref().unwrap_or("unknown"),
            expires_in = ?response.expires_in,
            "Fetched OIDC access token"
        );
        Ok(response.access_token)
    }

    async fn attempt(&self, request: &TokenRequest, attempt: u32) -> Result<TokenResponse> {
        debug!("Requesting token from {} (attempt {})", request.token_url, attempt);

        // form() sets Content-Type: application/x-www-form-urlencoded
        let response = self
            .http
            .post(request.token_url.clone())
            .form(&request.form())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if status != StatusCode::OK {
            return Err(TokenSyncError::TokenFetch(format!(
                "token endpoint returned status {}: {}",
                status.as_u16(),
                truncate_body(&body)
            )));
        }

        let decoded: TokenResponse = serde_json::from_slice(&body).map_err(|e| {
            TokenSyncError::TokenFetch(format!(
                "failed to decode token response ({:?} error at line {} column {})",
                e.classify(),
                e.line(),
                e.column()
            ))
        })?;

        if decoded.access_token.is_empty() {
            return Err(TokenSyncError::TokenFetch(
                "access token not found in response".to_string(),
            ));
        }

        Ok(decoded)
    }

    fn transport_error(&self, e: reqwest::Error) -> TokenSyncError {
        if e.is_timeout() {
            TokenSyncError::TokenFetch(format!("request timed out after {:?}", self.timeout))
        } else {
            TokenSyncError::TokenFetch(format!("failed to send request: {}", e))
        }
    }
}

fn truncate_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.len() <= MAX_ERROR_BODY_LEN {
        return text.to_string();
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
