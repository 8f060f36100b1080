// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adherence, weekly, calendar, and history projections.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Datelike, NaiveDate};

use crate::auth::UserAuth;
use crate::domain::dose::{Dose, DoseStatus};
use crate::error::AppError;
use crate::state::AppState;
use crate::transport::dto::{
    AdherenceResponse, CalendarBucket, CalendarDay, CalendarQuery, DayBreakdown, DaysQuery,
    HistoryQuery,
};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn adherence_over(doses: &[Dose]) -> AdherenceResponse {
    let taken = doses.iter().filter(|d| d.status == DoseStatus::Taken).count() as u32;
    let missed = doses.iter().filter(|d| d.status == DoseStatus::Missed).count() as u32;
    let error = doses.iter().filter(|d| d.status == DoseStatus::Error).count() as u32;
    let total = doses.len() as u32;
    let rate = if total == 0 { 0.0 } else { round2(taken as f64 / total as f64 * 100.0) };
    AdherenceResponse { taken, missed, error, total, rate }
}

/// `GET /api/stats/adherence?days=N`
pub async fn adherence(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
    Query(q): Query<DaysQuery>,
) -> Result<Json<AdherenceResponse>, AppError> {
    let days = q.days.unwrap_or(30);
    let now = state.now();
    let since = now - chrono::Duration::days(days);
    let doses: Vec<_> = state
        .doses
        .all_for_user(auth.user_id)
        .await
        .into_iter()
        .filter(|d| d.scheduled_time >= since && d.scheduled_time <= now)
        .collect();
    Ok(Json(adherence_over(&doses)))
}

/// `GET /api/stats/weekly` — per-day breakdown for the last 7 local days,
/// oldest first.
pub async fn weekly(State(state): State<Arc<AppState>>, auth: UserAuth) -> Json<Vec<DayBreakdown>> {
    let now = state.now();
    let today = now.date_naive();
    let doses = state.doses.all_for_user(auth.user_id).await;

    let mut out = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - chrono::Duration::days(offset);
        let day_doses: Vec<_> =
            doses.iter().filter(|d| d.scheduled_time.date_naive() == date).collect();
        let total = day_doses.len() as u32;
        let taken = day_doses.iter().filter(|d| d.status == DoseStatus::Taken).count() as u32;
        let rate = if total == 0 { 0.0 } else { round2(taken as f64 / total as f64 * 100.0) };
        out.push(DayBreakdown { date, total, taken, rate });
    }
    Json(out)
}

/// `GET /api/history/doses?days=N[&status=...]`
pub async fn history(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<Dose>>, AppError> {
    let days = q.days.unwrap_or(30);
    let now = state.now();
    let since = now - chrono::Duration::days(days);

    let status_filter = q
        .status
        .as_deref()
        .map(|s| match s {
            "pending" => Ok(DoseStatus::Pending),
            "dispensed_waiting" => Ok(DoseStatus::DispensedWaiting),
            "taken" => Ok(DoseStatus::Taken),
            "missed" => Ok(DoseStatus::Missed),
            "error" => Ok(DoseStatus::Error),
            "skipped" => Ok(DoseStatus::Skipped),
            other => Err(AppError::invalid_input(format!("unknown status '{other}'"))),
        })
        .transpose()?;

    let mut doses: Vec<_> = state
        .doses
        .all_for_user(auth.user_id)
        .await
        .into_iter()
        .filter(|d| d.scheduled_time >= since && d.scheduled_time <= now)
        .filter(|d| status_filter.map(|s| d.status == s).unwrap_or(true))
        .collect();
    doses.sort_by(|a, b| b.scheduled_time.cmp(&a.scheduled_time));
    Ok(Json(doses))
}

/// `GET /api/stats/calendar?month=M&year=Y`
pub async fn calendar(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
    Query(q): Query<CalendarQuery>,
) -> Result<Json<Vec<CalendarDay>>, AppError> {
    if !(1..=12).contains(&q.month) {
        return Err(AppError::invalid_input("month must be between 1 and 12"));
    }
    let first = NaiveDate::from_ymd_opt(q.year, q.month, 1)
        .ok_or_else(|| AppError::invalid_input("invalid year/month"))?;
    let days_in_month = days_in_month(q.year, q.month)?;
    let doses = state.doses.all_for_user(auth.user_id).await;

    let mut out = Vec::with_capacity(days_in_month as usize);
    for day in 1..=days_in_month {
        let date = first
            .with_day(day)
            .ok_or_else(|| AppError::internal(format!("day {day} out of bounds for {q:?}")))?;
        let day_doses: Vec<_> =
            doses.iter().filter(|d| d.scheduled_time.date_naive() == date).collect();
        let total = day_doses.len() as u32;
        let taken = day_doses.iter().filter(|d| d.status == DoseStatus::Taken).count() as u32;
        let bucket = if total == 0 {
            CalendarBucket::Gray
        } else if taken == total {
            CalendarBucket::Green
        } else if taken == 0 {
            CalendarBucket::Red
        } else {
            CalendarBucket::Yellow
        };
        out.push(CalendarDay { date, total, taken, bucket });
    }
    Ok(Json(out))
}

fn days_in_month(year: i32, month: u32) -> Result<u32, AppError> {
    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| AppError::internal(format!("no next-month date for {year}-{month}")))?;
    let this_month_first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::internal(format!("invalid date for {year}-{month}")))?;
    Ok((next_month_first - this_month_first).num_days() as u32)
}

pub(crate) use adherence_over as compute_adherence;
