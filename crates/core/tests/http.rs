// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the adherence HTTP API.
//!
//! Uses `axum_test::TestServer` — no real TCP needed — driven by a
//! `FixedClock` so scenarios can advance simulated time between requests.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum_test::TestServer;
use chrono::{DateTime, Duration, Utc};
use tokio_util::sync::CancellationToken;

use carepath::auth::{ApiKeyAuth, DeviceAuth};
use carepath::clock::FixedClock;
use carepath::config::AppConfig;
use carepath::domain::identity::{Device, DeviceKind, DeviceLiveness};
use carepath::ids::{DeviceId, UserId};
use carepath::state::AppState;
use carepath::transport::build_router;

fn epoch() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T09:00:00Z").unwrap().with_timezone(&Utc)
}

fn test_config() -> AppConfig {
    AppConfig { host: "127.0.0.1".into(), port: 0, ..AppConfig::default() }
}

fn test_state(config: AppConfig, clock: Arc<FixedClock>) -> Arc<AppState> {
    Arc::new(AppState::new(config, clock, CancellationToken::new()))
}

fn test_server(state: Arc<AppState>) -> TestServer {
    let router = build_router(state);
    TestServer::new(router).expect("failed to create test server")
}

/// Register a device directly against the store (no HTTP endpoint exists
/// for device provisioning; it is assumed out-of-band).
async fn register_device(state: &AppState, user_id: UserId, kind: DeviceKind) -> (DeviceId, String) {
    let token = format!("tok-{}", uuid::Uuid::new_v4());
    let device = Device {
        id: DeviceId::new(),
        user_id,
        kind,
        auth_token: token.clone(),
        liveness: DeviceLiveness::Online,
        last_seen: state.now(),
        created_at: state.now(),
    };
    let device = state.identity.register_device(device).await;
    (device.id, token)
}

async fn register_and_login(server: &TestServer) -> (UserId, String) {
    let resp = server
        .post("/api/register")
        .json(&serde_json::json!({
            "email": "pat@example.com",
            "password": "hunter22",
            "display_name": "Pat",
        }))
        .await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    let user_id: UserId = body["user_id"].as_str().unwrap().parse().unwrap();
    let token = body["token"].as_str().unwrap().to_owned();
    (user_id, token)
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

async fn create_medication(
    server: &TestServer,
    token: &str,
    user_id: UserId,
    times: &[&str],
    start_date: &str,
) -> serde_json::Value {
    let resp = server
        .post("/api/medications")
        .add_header("authorization", bearer(token))
        .json(&serde_json::json!({
            "user_id": user_id.to_string(),
            "name": "Metformin",
            "dosage": "500mg",
            "times": times,
            "duration_days": 30,
            "start_date": start_date,
        }))
        .await;
    resp.assert_status_ok();
    resp.json()
}

#[tokio::test]
async fn health_reports_user_and_dose_counts() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), clock);
    let server = test_server(Arc::clone(&state));

    let resp = server.get("/health").await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "running");
    assert_eq!(body["sweeper_running"], true);
    assert_eq!(body["users"], 0);
    assert_eq!(body["doses"], 0);

    register_and_login(&server).await;
    let resp = server.get("/health").await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body["users"], 1);
}

#[tokio::test]
async fn register_then_login_round_trips() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), clock);
    let server = test_server(state);

    let (user_id, _token) = register_and_login(&server).await;

    let resp = server
        .post("/api/login")
        .json(&serde_json::json!({ "email": "pat@example.com", "password": "hunter22" }))
        .await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["user_id"], user_id.to_string());
    assert_eq!(body["token"], format!("session-for-{user_id}"));

    let resp = server
        .post("/api/login")
        .json(&serde_json::json!({ "email": "pat@example.com", "password": "wrong" }))
        .await;
    resp.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_duplicate_email_conflicts() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), clock);
    let server = test_server(state);

    register_and_login(&server).await;
    let resp = server
        .post("/api/register")
        .json(&serde_json::json!({
            "email": "pat@example.com",
            "password": "different",
            "display_name": "Pat Two",
        }))
        .await;
    resp.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn medication_crud_cascades_delete_to_doses() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), clock);
    let server = test_server(Arc::clone(&state));

    let (user_id, token) = register_and_login(&server).await;
    let med = create_medication(&server, &token, user_id, &["09:00"], "2026-01-01").await;
    let med_id = med["id"].as_str().unwrap().to_owned();

    let resp = server.get(&format!("/api/medications/{med_id}")).await;
    resp.assert_status_ok();

    let resp = server
        .put(&format!("/api/medications/{med_id}"))
        .json(&serde_json::json!({ "name": "Metformin XR" }))
        .await;
    resp.assert_status_ok();
    let updated: serde_json::Value = resp.json();
    assert_eq!(updated["name"], "Metformin XR");

    let (device_id, device_token) = register_device(&state, user_id, DeviceKind::Dispenser).await;
    let resp = server
        .post("/api/devices/dispenser/event")
        .add_header("x-device-id", device_id.to_string())
        .add_header("x-device-auth-token", device_token)
        .json(&serde_json::json!({
            "event_type": "pill_dispensed",
            "medication_id": med_id,
            "scheduled_time": "2026-01-01T09:00:00Z",
            "actual_dispense_time": "2026-01-01T09:00:03Z",
        }))
        .await;
    resp.assert_status_ok();
    // 30 days of materialized doses from `create_medication`, one now
    // correlated to `dispensed_waiting`, the rest still `pending`.
    let doses = state.doses.all_for_user(user_id).await;
    assert_eq!(doses.len(), 30);
    assert_eq!(
        doses.iter().filter(|d| d.status == carepath::domain::dose::DoseStatus::DispensedWaiting).count(),
        1
    );

    let resp = server.delete(&format!("/api/medications/{med_id}")).await;
    resp.assert_status_ok();
    assert_eq!(state.doses.all_for_user(user_id).await.len(), 0);

    let resp = server.get(&format!("/api/medications/{med_id}")).await;
    resp.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_key_generate_list_and_revoke() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), clock);
    let server = test_server(state);

    let (_user_id, token) = register_and_login(&server).await;
    let auth = bearer(&token);

    let resp = server
        .post("/api/keys/generate")
        .add_header("authorization", auth.clone())
        .json(&serde_json::json!({ "name": "mobile app", "permissions": ["read"] }))
        .await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    let key_id = body["id"].as_str().unwrap().to_owned();
    assert!(body["plaintext_key"].as_str().unwrap().starts_with("cpk_"));

    let resp = server.get("/api/keys").add_header("authorization", auth.clone()).await;
    resp.assert_status_ok();
    let keys: Vec<serde_json::Value> = resp.json();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].get("key_hash").is_none());

    let resp = server.delete(&format!("/api/keys/{key_id}")).add_header("authorization", auth.clone()).await;
    resp.assert_status_ok();

    let resp = server.get("/api/keys").add_header("authorization", auth).await;
    let keys: Vec<serde_json::Value> = resp.json();
    assert!(keys.is_empty());
}

/// S1. Happy path retrieval.
#[tokio::test]
async fn device_events_happy_path_retrieval_matches_s1() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), Arc::clone(&clock));
    let server = test_server(Arc::clone(&state));

    let (user_id, token) = register_and_login(&server).await;
    let med = create_medication(&server, &token, user_id, &["09:00"], "2026-01-01").await;
    let med_id = med["id"].as_str().unwrap().to_owned();
    let (device_id, device_token) = register_device(&state, user_id, DeviceKind::Dispenser).await;

    let resp = server
        .post("/api/devices/dispenser/event")
        .add_header("x-device-id", device_id.to_string())
        .add_header("x-device-auth-token", device_token.clone())
        .json(&serde_json::json!({
            "event_type": "pill_dispensed",
            "medication_id": med_id,
            "scheduled_time": "2026-01-01T09:00:00Z",
            "actual_dispense_time": "2026-01-01T09:00:03Z",
        }))
        .await;
    resp.assert_status_ok();

    clock.set(DateTime::parse_from_rfc3339("2026-01-01T09:05:23Z").unwrap().with_timezone(&Utc));
    let resp = server
        .post("/api/devices/dispenser/event")
        .add_header("x-device-id", device_id.to_string())
        .add_header("x-device-auth-token", device_token)
        .json(&serde_json::json!({
            "event_type": "pill_retrieved",
            "medication_id": med_id,
            "actual_time": "2026-01-01T09:05:23Z",
            "time_elapsed_seconds": 320,
        }))
        .await;
    resp.assert_status_ok();

    // 30 days of materialized doses; only the one correlated to the
    // 09:00:00 schedule slot should have moved to `taken`.
    let doses = state.doses.all_for_user(user_id).await;
    assert_eq!(doses.len(), 30);
    let taken = doses.iter().find(|d| d.status == carepath::domain::dose::DoseStatus::Taken).unwrap();
    assert_eq!(taken.scheduled_time, DateTime::parse_from_rfc3339("2026-01-01T09:00:00Z").unwrap());
    assert_eq!(taken.time_elapsed_seconds, Some(320));

    let resp = server.get("/api/stats/adherence?days=1").add_header("authorization", bearer(&token)).await;
    resp.assert_status_ok();
    let adherence: serde_json::Value = resp.json();
    assert_eq!(adherence["rate"], 100.0);
}

/// S2. Timeout: the background sweeper forces an overdue dose to `missed`.
#[tokio::test]
async fn sweeper_forces_overdue_dose_missed_matches_s2() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let mut config = test_config();
    config.sweep_interval_ms = 20;
    config.dose_timeout_secs = 1800;
    let state = test_state(config, Arc::clone(&clock));
    let server = test_server(Arc::clone(&state));

    let (user_id, token) = register_and_login(&server).await;
    let med = create_medication(&server, &token, user_id, &["09:00"], "2026-01-01").await;
    let med_id = med["id"].as_str().unwrap().to_owned();
    let (device_id, device_token) = register_device(&state, user_id, DeviceKind::Dispenser).await;

    let resp = server
        .post("/api/devices/dispenser/event")
        .add_header("x-device-id", device_id.to_string())
        .add_header("x-device-auth-token", device_token)
        .json(&serde_json::json!({
            "event_type": "pill_dispensed",
            "medication_id": med_id,
            "scheduled_time": "2026-01-01T09:00:00Z",
            "actual_dispense_time": "2026-01-01T09:00:03Z",
        }))
        .await;
    resp.assert_status_ok();

    clock.set(DateTime::parse_from_rfc3339("2026-01-01T09:30:00Z").unwrap().with_timezone(&Utc));
    let dose = state
        .doses
        .all_for_user(user_id)
        .await
        .into_iter()
        .find(|d| d.status == carepath::domain::dose::DoseStatus::DispensedWaiting)
        .unwrap();
    assert_eq!(dose.countdown_remaining_seconds(clock.now()), 0);

    let sweeper = carepath::sweeper::Sweeper::start(Arc::clone(&state));
    clock.set(DateTime::parse_from_rfc3339("2026-01-01T09:30:59Z").unwrap().with_timezone(&Utc));
    tokio::time::sleep(StdDuration::from_millis(150)).await;
    sweeper.stop().await;

    let dose = state.doses.get(dose.id).await.unwrap();
    assert_eq!(dose.status, carepath::domain::dose::DoseStatus::Missed);
    assert_eq!(dose.reason.as_deref(), Some("timeout_not_retrieved"));
    assert_eq!(
        dose.timeout_time,
        Some(DateTime::parse_from_rfc3339("2026-01-01T09:30:03Z").unwrap().with_timezone(&Utc))
    );
}

/// S3. Dispense error then retry; any other transition from `error` is
/// rejected.
#[tokio::test]
async fn dispense_error_then_retry_matches_s3() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), Arc::clone(&clock));
    let server = test_server(Arc::clone(&state));

    let (user_id, token) = register_and_login(&server).await;
    let med = create_medication(&server, &token, user_id, &["09:00"], "2026-01-01").await;
    let med_id = med["id"].as_str().unwrap().to_owned();
    let (device_id, device_token) = register_device(&state, user_id, DeviceKind::Dispenser).await;

    let resp = server
        .post("/api/devices/dispenser/event")
        .add_header("x-device-id", device_id.to_string())
        .add_header("x-device-auth-token", device_token)
        .json(&serde_json::json!({
            "event_type": "dispense_error",
            "medication_id": med_id,
            "scheduled_time": "2026-01-01T09:00:00Z",
            "error_code": "E102",
        }))
        .await;
    resp.assert_status_ok();

    let dose = state
        .doses
        .all_for_user(user_id)
        .await
        .into_iter()
        .find(|d| d.status == carepath::domain::dose::DoseStatus::Error)
        .unwrap();

    let retried = state
        .doses
        .transition(dose.id, carepath::domain::dose::DoseStatus::Pending, clock.now(), |_| {})
        .await
        .expect("error->pending retry must be accepted");
    assert_eq!(retried.status, carepath::domain::dose::DoseStatus::Pending);

    let rejected = state
        .doses
        .transition(dose.id, carepath::domain::dose::DoseStatus::Taken, clock.now(), |_| {})
        .await;
    assert!(rejected.is_err());
}

/// S4. Out-of-window dispense synthesizes a new dose, leaving the original
/// scheduled dose untouched.
#[tokio::test]
async fn out_of_window_dispense_synthesizes_dose_matches_s4() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), Arc::clone(&clock));
    let server = test_server(Arc::clone(&state));

    let (user_id, token) = register_and_login(&server).await;
    let med = create_medication(&server, &token, user_id, &["09:00"], "2026-01-01").await;
    let med_id = med["id"].as_str().unwrap().to_owned();
    let (device_id, device_token) = register_device(&state, user_id, DeviceKind::Dispenser).await;

    // No pre-existing pending dose: the dispenser reports a dispense far
    // outside the correlation tolerance of any scheduled time.
    let resp = server
        .post("/api/devices/dispenser/event")
        .add_header("x-device-id", device_id.to_string())
        .add_header("x-device-auth-token", device_token)
        .json(&serde_json::json!({
            "event_type": "pill_dispensed",
            "medication_id": med_id,
            "scheduled_time": "2026-01-01T09:06:00Z",
            "actual_dispense_time": "2026-01-01T09:06:00Z",
        }))
        .await;
    resp.assert_status_ok();

    // 30 materialized doses plus the synthesized out-of-window one.
    let doses = state.doses.all_for_user(user_id).await;
    assert_eq!(doses.len(), 31);
    let synthesized = doses
        .iter()
        .find(|d| d.scheduled_time == DateTime::parse_from_rfc3339("2026-01-01T09:06:00Z").unwrap())
        .unwrap();
    assert_eq!(synthesized.status, carepath::domain::dose::DoseStatus::DispensedWaiting);

    let original = doses
        .iter()
        .find(|d| d.scheduled_time == DateTime::parse_from_rfc3339("2026-01-01T09:00:00Z").unwrap())
        .unwrap();
    assert_eq!(original.status, carepath::domain::dose::DoseStatus::Pending);
}

/// S5. API-key lifetime: valid at T+13d23h, expired at T+14d+1s.
#[tokio::test]
async fn api_key_lifetime_matches_s5() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), Arc::clone(&clock));
    let server = test_server(Arc::clone(&state));

    let (_user_id, token) = register_and_login(&server).await;
    let resp = server
        .post("/api/keys/generate")
        .add_header("authorization", bearer(&token))
        .json(&serde_json::json!({ "name": "watch", "permissions": [] }))
        .await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    let plaintext = body["plaintext_key"].as_str().unwrap().to_owned();

    let parts_for = |bearer_value: String| {
        axum::http::Request::builder()
            .header("authorization", bearer_value)
            .body(())
            .unwrap()
            .into_parts()
            .0
    };

    clock.advance(Duration::days(13) + Duration::hours(23));
    let mut parts = parts_for(format!("Bearer {plaintext}"));
    let ok = <ApiKeyAuth as axum::extract::FromRequestParts<Arc<AppState>>>::from_request_parts(
        &mut parts, &state,
    )
    .await;
    assert!(ok.is_ok());

    clock.advance(Duration::days(1) + Duration::seconds(1) - Duration::hours(23));
    let mut parts = parts_for(format!("Bearer {plaintext}"));
    let expired = <ApiKeyAuth as axum::extract::FromRequestParts<Arc<AppState>>>::from_request_parts(
        &mut parts, &state,
    )
    .await;
    assert_eq!(expired.err(), Some(carepath::error::AppError::InvalidCredentials));
}

/// S6. Calendar bucketing: green (all taken), yellow (partial), red (none
/// taken of scheduled), gray (nothing scheduled).
#[tokio::test]
async fn calendar_bucketing_matches_s6() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), Arc::clone(&clock));
    let server = test_server(Arc::clone(&state));

    let (user_id, token) = register_and_login(&server).await;
    let med_id = carepath::ids::MedicationId::new();

    let green_day = "2026-01-05T09:00:00Z";
    let yellow_day = "2026-01-06T09:00:00Z";
    let red_day = "2026-01-07T09:00:00Z";

    for (day, taken_count) in [(green_day, 4), (yellow_day, 2), (red_day, 0)] {
        for i in 0..4 {
            let scheduled: DateTime<Utc> = day.parse().unwrap();
            let scheduled = scheduled + Duration::hours(i);
            let mut dose = carepath::domain::dose::Dose::new_pending(
                user_id,
                med_id,
                "Metformin".to_owned(),
                scheduled,
                clock.now(),
            );
            if i < taken_count {
                dose.status = carepath::domain::dose::DoseStatus::Taken;
            }
            state.doses.insert(dose).await;
        }
    }

    let resp = server
        .get("/api/stats/calendar?month=1&year=2026")
        .add_header("authorization", bearer(&token))
        .await;
    resp.assert_status_ok();
    let days: Vec<serde_json::Value> = resp.json();

    let find = |date: &str| days.iter().find(|d| d["date"] == date).unwrap().clone();
    assert_eq!(find("2026-01-05")["bucket"], "green");
    assert_eq!(find("2026-01-06")["bucket"], "yellow");
    assert_eq!(find("2026-01-07")["bucket"], "red");
    assert_eq!(find("2026-01-08")["bucket"], "gray");
}

#[tokio::test]
async fn symptom_log_rejects_out_of_range_severity_and_correlates() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), Arc::clone(&clock));
    let server = test_server(Arc::clone(&state));

    let (user_id, token) = register_and_login(&server).await;
    let med = create_medication(&server, &token, user_id, &["09:00"], "2026-01-01").await;
    let med_id = med["id"].as_str().unwrap().to_owned();
    let auth = bearer(&token);

    let resp = server
        .post("/api/health/log-symptom")
        .add_header("authorization", auth.clone())
        .json(&serde_json::json!({ "label": "nausea", "severity": 0 }))
        .await;
    resp.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let resp = server
        .post("/api/health/log-symptom")
        .add_header("authorization", auth.clone())
        .json(&serde_json::json!({
            "label": "nausea",
            "severity": 3,
            "medications_taken_around": [med_id],
        }))
        .await;
    resp.assert_status_ok();

    let resp = server.get("/api/health/symptom-correlations").add_header("authorization", auth).await;
    resp.assert_status_ok();
    let correlations: Vec<serde_json::Value> = resp.json();
    assert_eq!(correlations.len(), 1);
    assert_eq!(correlations[0]["label"], "nausea");
    assert_eq!(correlations[0]["co_occurrences"], 1);
}

#[tokio::test]
async fn caregiver_add_and_dashboard() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), clock);
    let server = test_server(state);

    let (_user_id, token) = register_and_login(&server).await;
    let auth = bearer(&token);

    let resp = server
        .post("/api/caregivers/add")
        .add_header("authorization", auth.clone())
        .json(&serde_json::json!({
            "name": "Sam",
            "email": "sam@example.com",
            "relationship": "spouse",
            "permissions": ["view_adherence"],
        }))
        .await;
    resp.assert_status_ok();
    let caregiver: serde_json::Value = resp.json();
    assert_eq!(caregiver["authorized"], false);

    let resp = server
        .post("/api/caregivers/alert-rules")
        .add_header("authorization", auth.clone())
        .json(&serde_json::json!({
            "caregiver_id": caregiver["id"],
            "kind": "missed_dose",
            "threshold": 2,
        }))
        .await;
    resp.assert_status_ok();

    let resp = server.get("/api/caregivers/dashboard").add_header("authorization", auth).await;
    resp.assert_status_ok();
    let dashboard: serde_json::Value = resp.json();
    assert_eq!(dashboard["caregivers"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn caregiver_dashboard_reports_inventory_days_remaining() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), Arc::clone(&clock));
    let server = test_server(Arc::clone(&state));

    let (user_id, token) = register_and_login(&server).await;
    let med = create_medication(&server, &token, user_id, &["09:00"], "2026-01-01").await;
    let med_id: carepath::ids::MedicationId = med["id"].as_str().unwrap().parse().unwrap();

    let row = carepath::domain::inventory::Inventory::new(user_id, med_id, None, 20, 7, state.now());
    state.inventory.upsert(row).await;

    let resp = server
        .get("/api/caregivers/dashboard")
        .add_header("authorization", bearer(&token))
        .await;
    resp.assert_status_ok();
    let dashboard: serde_json::Value = resp.json();
    let inventory = dashboard["inventory"].as_array().unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0]["pills_remaining"], 20);
    // One scheduled time per day -> doses_per_day == 1 -> 20 days remaining.
    assert_eq!(inventory[0]["days_remaining"], 20);
}

#[tokio::test]
async fn device_auth_rejects_wrong_kind_and_unknown_device() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), clock);
    let server = test_server(Arc::clone(&state));

    let (user_id, _token) = register_and_login(&server).await;
    let (band_id, band_token) = register_device(&state, user_id, DeviceKind::Band).await;

    let resp = server
        .post("/api/devices/dispenser/event")
        .add_header("x-device-id", band_id.to_string())
        .add_header("x-device-auth-token", band_token)
        .json(&serde_json::json!({
            "event_type": "pill_dispensed",
            "medication_id": carepath::ids::MedicationId::new().to_string(),
            "scheduled_time": "2026-01-01T09:00:00Z",
            "actual_dispense_time": "2026-01-01T09:00:03Z",
        }))
        .await;
    resp.assert_status(axum::http::StatusCode::FORBIDDEN);

    let resp = server
        .post("/api/devices/band/event")
        .add_header("x-device-id", DeviceId::new().to_string())
        .add_header("x-device-auth-token", "whatever")
        .json(&serde_json::json!({ "event_type": "band_worn" }))
        .await;
    resp.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn device_extractor_rejects_offline_device_directly() {
    let clock = Arc::new(FixedClock::new(epoch()));
    let state = test_state(test_config(), clock);
    let user_id = UserId::new();
    let device = Device {
        id: DeviceId::new(),
        user_id,
        kind: DeviceKind::Dispenser,
        auth_token: "secret".to_owned(),
        liveness: DeviceLiveness::Offline,
        last_seen: state.now(),
        created_at: state.now(),
    };
    let device = state.identity.register_device(device).await;

    let mut parts = axum::http::Request::builder()
        .header("x-device-id", device.id.to_string())
        .header("x-device-auth-token", "secret")
        .body(())
        .unwrap()
        .into_parts()
        .0;
    let result = <DeviceAuth as axum::extract::FromRequestParts<Arc<AppState>>>::from_request_parts(
        &mut parts, &state,
    )
    .await;
    assert_eq!(result.err(), Some(carepath::error::AppError::DeviceOffline));
}
