// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::state::AppState;
use crate::transport::dto::HealthResponse;

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running".to_owned(),
        sweeper_running: !state.shutdown.is_cancelled(),
        users: state.identity.user_count().await,
        doses: state.doses.len().await,
    })
}
