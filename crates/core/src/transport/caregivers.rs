// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Caregiver and alert-rule handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::auth::UserAuth;
use crate::domain::caregiver::{AlertRule, AlertRuleKind, Caregiver, CaregiverPermission};
use crate::domain::inventory::DEFAULT_DOSES_PER_DAY;
use crate::error::AppError;
use crate::ids::{AlertRuleId, CaregiverId};
use crate::state::AppState;
use crate::transport::dto::{
    AddAlertRuleRequest, AddCaregiverRequest, CaregiverDashboardResponse, InventoryView,
};

fn parse_permission(s: &str) -> Result<CaregiverPermission, AppError> {
    match s {
        "view_adherence" => Ok(CaregiverPermission::ViewAdherence),
        "view_inventory" => Ok(CaregiverPermission::ViewInventory),
        "receive_alerts" => Ok(CaregiverPermission::ReceiveAlerts),
        other => Err(AppError::invalid_input(format!("unknown permission '{other}'"))),
    }
}

fn parse_alert_kind(s: &str) -> Result<AlertRuleKind, AppError> {
    match s {
        "missed_dose" => Ok(AlertRuleKind::MissedDose),
        "low_inventory" => Ok(AlertRuleKind::LowInventory),
        "symptom_severity" => Ok(AlertRuleKind::SymptomSeverity),
        other => Err(AppError::invalid_input(format!("unknown alert rule kind '{other}'"))),
    }
}

/// `POST /api/caregivers/add` — starts unauthorized until out-of-band
/// confirmation.
pub async fn add(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
    Json(req): Json<AddCaregiverRequest>,
) -> Result<Json<Caregiver>, AppError> {
    let permissions =
        req.permissions.iter().map(|p| parse_permission(p)).collect::<Result<Vec<_>, _>>()?;
    let now = state.now();
    let caregiver = Caregiver {
        id: CaregiverId::new(),
        user_id: auth.user_id,
        name: req.name,
        email: req.email,
        relationship: req.relationship,
        permissions,
        authorized: false,
        created_at: now,
        updated_at: now,
    };
    Ok(Json(state.caregivers.add_caregiver(caregiver).await))
}

/// `GET /api/caregivers/dashboard` — caregiver list, recent doses, and
/// inventory for the authenticated user.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
) -> Json<CaregiverDashboardResponse> {
    let caregivers = state.caregivers.caregivers_for_user(auth.user_id).await;
    let since = state.now() - chrono::Duration::days(7);
    let mut recent_doses: Vec<_> = state
        .doses
        .all_for_user(auth.user_id)
        .await
        .into_iter()
        .filter(|d| d.scheduled_time >= since)
        .collect();
    recent_doses.sort_by(|a, b| b.scheduled_time.cmp(&a.scheduled_time));

    let mut inventory = Vec::new();
    for row in state.inventory.all_for_user(auth.user_id).await {
        let doses_per_day = match state.medications.get(row.medication_id).await {
            Some(med) => med.doses_per_day(),
            None => DEFAULT_DOSES_PER_DAY,
        };
        let days_remaining = row.days_remaining(doses_per_day);
        inventory.push(InventoryView { inventory: row, days_remaining });
    }

    Json(CaregiverDashboardResponse { caregivers, recent_doses, inventory })
}

/// `POST /api/caregivers/alert-rules`
pub async fn add_alert_rule(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
    Json(req): Json<AddAlertRuleRequest>,
) -> Result<Json<AlertRule>, AppError> {
    state.caregivers.get_caregiver(req.caregiver_id).await?;
    let kind = parse_alert_kind(&req.kind)?;
    let rule = AlertRule {
        id: AlertRuleId::new(),
        user_id: auth.user_id,
        caregiver_id: req.caregiver_id,
        kind,
        threshold: req.threshold,
        active: true,
        created_at: state.now(),
    };
    Ok(Json(state.caregivers.add_alert_rule(rule).await))
}

/// `GET /api/caregivers/alert-rules`
pub async fn list_alert_rules(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
) -> Json<Vec<AlertRule>> {
    Json(state.caregivers.alert_rules_for_user(auth.user_id).await)
}
