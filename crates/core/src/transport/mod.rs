// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the adherence core: router assembly plus handlers
//! grouped by concern.

pub mod caregivers;
pub mod devices;
pub mod doses;
pub mod dto;
pub mod health_log;
pub mod liveness;
pub mod medications;
pub mod stats;
pub mod users;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the axum `Router` with every route in the external interface
/// table, a permissive CORS layer, and shared state. Credential mode is
/// endpoint-declared via extractors rather than a blanket middleware
/// layer (see `crate::auth`).
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(liveness::health))
        .route("/api/register", post(users::register))
        .route("/api/login", post(users::login))
        .route("/api/users/{email}", delete(users::delete_user))
        .route("/api/medications", post(medications::create).get(medications::list))
        .route(
            "/api/medications/{id}",
            get(medications::get).put(medications::update).delete(medications::delete),
        )
        .route("/api/keys/generate", post(users::generate_key))
        .route("/api/keys", get(users::list_keys))
        .route("/api/keys/{id}", delete(users::revoke_key))
        .route("/api/doses/today", get(doses::today))
        .route("/api/doses/upcoming", get(doses::upcoming))
        .route("/api/stats/adherence", get(stats::adherence))
        .route("/api/stats/weekly", get(stats::weekly))
        .route("/api/stats/calendar", get(stats::calendar))
        .route("/api/history/doses", get(stats::history))
        .route("/api/health/log-symptom", post(health_log::log_symptom))
        .route("/api/health/symptoms", get(health_log::symptoms))
        .route("/api/health/symptom-correlations", get(health_log::symptom_correlations))
        .route("/api/reports/doctor-visit", get(health_log::doctor_visit))
        .route("/api/caregivers/add", post(caregivers::add))
        .route("/api/caregivers/dashboard", get(caregivers::dashboard))
        .route(
            "/api/caregivers/alert-rules",
            post(caregivers::add_alert_rule).get(caregivers::list_alert_rules),
        )
        .route("/api/devices/{kind}/event", post(devices::submit_event))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
