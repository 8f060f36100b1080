// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Carepath: the medication-adherence dose lifecycle engine.

pub mod auth;
pub mod clock;
pub mod config;
pub mod correlator;
pub mod domain;
pub mod error;
pub mod ids;
pub mod state;
pub mod sweeper;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::clock::SystemClock;
use crate::config::AppConfig;
use crate::state::AppState;
use crate::sweeper::Sweeper;
use crate::transport::build_router;

/// Run the adherence core server until shutdown.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let state = Arc::new(AppState::new(config, Arc::new(SystemClock), shutdown.clone()));
    let sweeper = Sweeper::start(Arc::clone(&state));

    tracing::info!("carepath listening on {addr}");
    let router = build_router(Arc::clone(&state));
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    sweeper.stop().await;
    Ok(())
}
