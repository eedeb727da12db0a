// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded retry with linear backoff, shared by the token client, the
//! namespace lister and the secret reconciler.

use crate::error::{Result, TokenSyncError};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Run `op` until it succeeds, fails permanently or runs out of attempts.
    ///
    /// `op` receives the 1-based attempt number. No delay follows the final
    /// attempt; the last error is returned unchanged. Cancellation is checked
    /// before each attempt and interrupts the backoff sleep.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(TokenSyncError::Cancelled);
            }

            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if err.is_permanent() || attempt >= self.max_attempts {
                return Err(err);
            }

            let delay = self.delay_after(attempt);
            warn!(
                operation,
                attempt,
                max_attempts = self.max_attempts,
                "{} failed: {}, retrying in {:?}",
                operation,
                err,
                delay
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(TokenSyncError::Cancelled),
                _ = sleep(delay) => {}
            }

            attempt += 1;
        }
    }
}
