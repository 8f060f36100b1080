// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Symptom logging, retrieval, derived correlations, and the doctor-visit
//! report.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;

use crate::auth::UserAuth;
use crate::domain::symptom::{validate_scale, SymptomEntry};
use crate::error::AppError;
use crate::ids::SymptomId;
use crate::state::AppState;
use crate::transport::dto::{
    DoctorReportQuery, DoctorReportResponse, LogSymptomRequest, SymptomCorrelation,
};
use crate::transport::stats::compute_adherence;

/// `POST /api/health/log-symptom`
pub async fn log_symptom(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
    Json(req): Json<LogSymptomRequest>,
) -> Result<Json<SymptomEntry>, AppError> {
    let severity = validate_scale(req.severity, "severity")?;
    let mood = req.mood.map(|m| validate_scale(m, "mood")).transpose()?;
    let entry = SymptomEntry {
        id: SymptomId::new(),
        user_id: auth.user_id,
        label: req.label,
        notes: req.notes,
        severity,
        mood,
        medications_taken_around: req.medications_taken_around,
        recorded_at: state.now(),
    };
    Ok(Json(state.symptoms.append(entry).await))
}

/// `GET /api/health/symptoms?days=N`
pub async fn symptoms(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
    Query(q): Query<crate::transport::dto::DaysQuery>,
) -> Json<Vec<SymptomEntry>> {
    let days = q.days.unwrap_or(30);
    let since = state.now() - chrono::Duration::days(days);
    Json(state.symptoms.for_user_since(auth.user_id, since).await)
}

/// `GET /api/health/symptom-correlations` — co-occurrence count between
/// each distinct symptom label and each medication id referenced by
/// entries for this user.
pub async fn symptom_correlations(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
) -> Json<Vec<SymptomCorrelation>> {
    let since = state.now() - chrono::Duration::days(365 * 5);
    let entries = state.symptoms.for_user_since(auth.user_id, since).await;
    Json(correlations_from(&entries))
}

fn correlations_from(entries: &[SymptomEntry]) -> Vec<SymptomCorrelation> {
    let mut counts: HashMap<(String, crate::ids::MedicationId), u32> = HashMap::new();
    for entry in entries {
        for medication_id in &entry.medications_taken_around {
            *counts.entry((entry.label.clone(), *medication_id)).or_insert(0) += 1;
        }
    }
    let mut out: Vec<_> = counts
        .into_iter()
        .map(|((label, medication_id), co_occurrences)| SymptomCorrelation {
            label,
            medication_id,
            co_occurrences,
        })
        .collect();
    out.sort_by(|a, b| b.co_occurrences.cmp(&a.co_occurrences));
    out
}

/// `GET /api/reports/doctor-visit?range=30|60|90days`
pub async fn doctor_visit(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
    Query(q): Query<DoctorReportQuery>,
) -> Result<Json<DoctorReportResponse>, AppError> {
    if ![30, 60, 90].contains(&q.range) {
        return Err(AppError::invalid_input("range must be 30, 60, or 90 days"));
    }
    let now = state.now();
    let since = now - chrono::Duration::days(q.range as i64);

    let doses: Vec<_> = state
        .doses
        .all_for_user(auth.user_id)
        .await
        .into_iter()
        .filter(|d| d.scheduled_time >= since && d.scheduled_time <= now)
        .collect();
    let adherence = compute_adherence(&doses);
    let medications = state.medications.all_for_user(auth.user_id).await;
    let entries = state.symptoms.for_user_since(auth.user_id, since).await;
    let correlations = correlations_from(&entries);

    Ok(Json(DoctorReportResponse {
        adherence,
        medications,
        symptom_count: entries.len(),
        correlations,
    }))
}
