// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Medication CRUD. Reference behavior leaves these endpoints
//! unauthenticated; callers supply `user_id` directly. Preserved as
//! specified and recorded as an open design question in DESIGN.md.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::domain::medication::{normalize_times, Medication};
use crate::error::AppError;
use crate::ids::{MedicationId, UserId};
use crate::state::AppState;
use crate::transport::dto::{MedicationRequest, MedicationUpdateRequest};

/// `POST /api/medications` — also materializes one `pending` dose per
/// scheduled time across the medication's active date range.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MedicationRequest>,
) -> Result<Json<Medication>, AppError> {
    let user_id: UserId = req.user_id.parse().map_err(|_| AppError::invalid_input("malformed user_id"))?;
    let times = normalize_times(&req.times)?;
    let now = state.now();
    let med = Medication {
        id: MedicationId::new(),
        user_id,
        name: req.name,
        dosage: req.dosage,
        times,
        duration_days: req.duration_days,
        start_date: req.start_date,
        created_at: now,
    };
    let med = state.medications.create(med).await;
    for dose in med.materialize_doses(now) {
        state.doses.insert(dose).await;
    }
    Ok(Json(med))
}

/// `GET /api/medications?user_id=...`
pub async fn list(
    State(state): State<Arc<AppState>>,
    axum::extract::Query(params): axum::extract::Query<std::collections::HashMap<String, String>>,
) -> Result<Json<Vec<Medication>>, AppError> {
    let user_id: UserId = params
        .get("user_id")
        .ok_or_else(|| AppError::invalid_input("user_id is required"))?
        .parse()
        .map_err(|_| AppError::invalid_input("malformed user_id"))?;
    Ok(Json(state.medications.all_for_user(user_id).await))
}

/// `GET /api/medications/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MedicationId>,
) -> Result<Json<Medication>, AppError> {
    state.medications.get(id).await.map(Json).ok_or(AppError::NotFound)
}

/// `PUT /api/medications/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MedicationId>,
    Json(req): Json<MedicationUpdateRequest>,
) -> Result<Json<Medication>, AppError> {
    let times = req.times.as_ref().map(|t| normalize_times(t)).transpose()?;
    let med = state
        .medications
        .update(id, |m| {
            if let Some(name) = req.name {
                m.name = name;
            }
            if req.dosage.is_some() {
                m.dosage = req.dosage;
            }
            if let Some(times) = times {
                m.times = times;
            }
            if let Some(duration_days) = req.duration_days {
                m.duration_days = duration_days;
            }
            if let Some(start_date) = req.start_date {
                m.start_date = start_date;
            }
        })
        .await?;
    Ok(Json(med))
}

/// `DELETE /api/medications/{id}` — cascades to doses and inventory rows
/// referencing the medication.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MedicationId>,
) -> Result<Json<Medication>, AppError> {
    let med = state.medications.delete(id).await?;
    state.doses.remove_for_medication(id).await;
    state.inventory.remove_for_medication(id).await;
    Ok(Json(med))
}
