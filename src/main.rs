// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use oidc_token_sync::config::Config;
use oidc_token_sync::error::TokenSyncError;
use oidc_token_sync::job::run_once;
use oidc_token_sync::kubernetes::client_source;
use oidc_token_sync::sync::TracingReporter;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting OIDC token sync");

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    match run(&cancel).await {
        Ok(()) => {
            info!("OIDC token sync finished successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            match e.downcast_ref::<TokenSyncError>() {
                Some(TokenSyncError::Cancelled) => ExitCode::from(130),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cancel: &CancellationToken) -> Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: token_url={}, client_id={}, secret={}/{}, policy={}",
        config.token_url, config.client_id, config.secret_name, config.secret_key, config.failure_policy
    );

    let source = client_source(&config.credentials);
    let summary = run_once(&config, source.as_ref(), Arc::new(TracingReporter), cancel).await?;
    summary.into_result()?;
    Ok(())
}

/// Cancel the run on SIGINT or SIGTERM
async fn cancel_on_signal(cancel: CancellationToken) {
    wait_for_signal().await;
    warn!("Shutdown signal received, stopping before the next namespace operation");
    cancel.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
