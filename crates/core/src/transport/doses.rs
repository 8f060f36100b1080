// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Today's schedule and upcoming-doses projections.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use crate::auth::UserAuth;
use crate::domain::dose::{Dose, DoseStatus};
use crate::state::AppState;
use crate::transport::dto::UpcomingQuery;

#[derive(Debug, Serialize)]
pub struct TodayDose {
    #[serde(flatten)]
    pub dose: Dose,
    pub countdown_remaining_seconds: i64,
}

/// `GET /api/doses/today`
pub async fn today(State(state): State<Arc<AppState>>, auth: UserAuth) -> Json<Vec<TodayDose>> {
    let now = state.now();
    let today = now.date_naive();
    let timeout = state.config.dose_timeout();
    let doses = state.doses.all_for_user(auth.user_id).await;
    let out = doses
        .into_iter()
        .filter(|d| d.scheduled_time.date_naive() == today)
        .map(|d| {
            let countdown = d.countdown_remaining_seconds_with_timeout(now, timeout);
            TodayDose { dose: d, countdown_remaining_seconds: countdown }
        })
        .collect();
    Json(out)
}

/// `GET /api/doses/upcoming?hours=H`
pub async fn upcoming(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
    Query(q): Query<UpcomingQuery>,
) -> Json<Vec<Dose>> {
    let now = state.now();
    let hours = q.hours.unwrap_or(state.config.default_upcoming_hours).clamp(1, 72);
    let window_end = now + chrono::Duration::hours(hours as i64);
    let doses = state.doses.all_for_user(auth.user_id).await;
    let mut out: Vec<_> = doses
        .into_iter()
        .filter(|d| d.status == DoseStatus::Pending && d.scheduled_time > now && d.scheduled_time <= window_end)
        .collect();
    out.sort_by_key(|d| d.scheduled_time);
    Json(out)
}
