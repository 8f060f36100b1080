// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device event ingestion.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::auth::DeviceAuth;
use crate::correlator::{correlate, DeviceEvent};
use crate::domain::identity::DeviceKind;
use crate::error::AppError;
use crate::state::AppState;

/// `POST /api/devices/{dispenser|band}/event`
pub async fn submit_event(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    auth: DeviceAuth,
    Json(event): Json<DeviceEvent>,
) -> Result<Json<serde_json::Value>, AppError> {
    let expected_kind = match kind.as_str() {
        "dispenser" => DeviceKind::Dispenser,
        "band" => DeviceKind::Band,
        other => return Err(AppError::invalid_input(format!("unknown device kind '{other}'"))),
    };
    let auth = auth.require_kind(expected_kind)?;

    correlate(&state, auth.device_id, auth.user_id, event).await?;
    Ok(Json(serde_json::json!({ "accepted": true })))
}
