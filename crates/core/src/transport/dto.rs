// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire request/response DTOs, kept separate from domain structs so the
//! JSON boundary's shape (e.g. `times` as `"HH:MM"` strings) never leaks
//! parsing concerns into the domain model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{CaregiverId, MedicationId};

// -- Users --------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -- Medications ----------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MedicationRequest {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    pub times: Vec<String>,
    pub duration_days: u32,
    pub start_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct MedicationUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub times: Option<Vec<String>>,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

// -- API keys ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GenerateKeyRequest {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateKeyResponse {
    pub id: String,
    pub plaintext_key: String,
}

// -- Doses / history --------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub hours: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Serialize)]
pub struct AdherenceResponse {
    pub taken: u32,
    pub missed: u32,
    pub error: u32,
    pub total: u32,
    pub rate: f64,
}

#[derive(Debug, Serialize)]
pub struct DayBreakdown {
    pub date: NaiveDate,
    pub total: u32,
    pub taken: u32,
    pub rate: f64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CalendarBucket {
    Green,
    Yellow,
    Red,
    Gray,
}

#[derive(Debug, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub total: u32,
    pub taken: u32,
    pub bucket: CalendarBucket,
}

// -- Symptoms ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LogSymptomRequest {
    pub label: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub severity: u8,
    #[serde(default)]
    pub mood: Option<u8>,
    #[serde(default)]
    pub medications_taken_around: Vec<MedicationId>,
}

#[derive(Debug, Serialize)]
pub struct SymptomCorrelation {
    pub label: String,
    pub medication_id: MedicationId,
    pub co_occurrences: u32,
}

// -- Doctor report ------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DoctorReportQuery {
    pub range: u32,
}

#[derive(Debug, Serialize)]
pub struct DoctorReportResponse {
    pub adherence: AdherenceResponse,
    pub medications: Vec<crate::domain::medication::Medication>,
    pub symptom_count: usize,
    pub correlations: Vec<SymptomCorrelation>,
}

// -- Caregivers / alert rules ---------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AddCaregiverRequest {
    pub name: String,
    pub email: String,
    pub relationship: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddAlertRuleRequest {
    pub caregiver_id: CaregiverId,
    pub kind: String,
    pub threshold: i64,
}

/// An inventory row plus its derived `days_remaining` projection, computed
/// from the owning medication's real daily dose count where available.
#[derive(Debug, Serialize)]
pub struct InventoryView {
    #[serde(flatten)]
    pub inventory: crate::domain::inventory::Inventory,
    pub days_remaining: u32,
}

#[derive(Debug, Serialize)]
pub struct CaregiverDashboardResponse {
    pub caregivers: Vec<crate::domain::caregiver::Caregiver>,
    pub recent_doses: Vec<crate::domain::dose::Dose>,
    pub inventory: Vec<InventoryView>,
}

// -- Health/liveness ------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub sweeper_running: bool,
    pub users: usize,
    pub doses: usize,
}
