// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event correlator: maps an inbound device event to the right dose
//! or inventory row, or appends to the event log with no further effect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::dose::{Dose, DoseStatus};
use crate::domain::inventory::{Inventory, DEFAULT_REFILL_THRESHOLD};
use crate::error::AppError;
use crate::ids::{DeviceId, MedicationId};
use crate::state::AppState;

/// Every event kind a device may submit, discriminated by `event_type`.
/// Deserialization fails (surfaced as `invalid-input`) before any
/// correlator logic runs for an unrecognized tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DeviceEvent {
    PillDispensed {
        medication_id: MedicationId,
        scheduled_time: DateTime<Utc>,
        actual_dispense_time: DateTime<Utc>,
    },
    PillRetrieved {
        medication_id: MedicationId,
        actual_time: DateTime<Utc>,
        time_elapsed_seconds: i64,
    },
    DispenseError {
        medication_id: MedicationId,
        scheduled_time: DateTime<Utc>,
        error_code: String,
    },
    LowInventory {
        medication_id: MedicationId,
        pills_remaining: u32,
    },
    CartridgeInserted {
        medication_id: MedicationId,
        pill_count: u32,
        #[serde(default)]
        cartridge_slot: Option<u32>,
        #[serde(default)]
        calibration_weight_grams: Option<f64>,
    },
    CartridgeRemoved {
        medication_id: MedicationId,
        pills_remaining: u32,
    },
    AlertSent {
        #[serde(default)]
        detail: serde_json::Value,
    },
    BandRemoved {
        #[serde(default)]
        detail: serde_json::Value,
    },
    BandWorn {
        #[serde(default)]
        detail: serde_json::Value,
    },
    ButtonPress {
        medication_id: MedicationId,
    },
}

impl DeviceEvent {
    fn kind(&self) -> &'static str {
        match self {
            Self::PillDispensed { .. } => "pill_dispensed",
            Self::PillRetrieved { .. } => "pill_retrieved",
            Self::DispenseError { .. } => "dispense_error",
            Self::LowInventory { .. } => "low_inventory",
            Self::CartridgeInserted { .. } => "cartridge_inserted",
            Self::CartridgeRemoved { .. } => "cartridge_removed",
            Self::AlertSent { .. } => "alert_sent",
            Self::BandRemoved { .. } => "band_removed",
            Self::BandWorn { .. } => "band_worn",
            Self::ButtonPress { .. } => "button_press",
        }
    }

    fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Dispatch a validated device event by kind, appending it to the event log
/// and applying whatever dose/inventory effect it implies.
pub async fn correlate(
    state: &AppState,
    device_id: DeviceId,
    user_id: crate::ids::UserId,
    event: DeviceEvent,
) -> Result<(), AppError> {
    let now = state.now();
    let kind = event.kind();
    let payload = event.payload();
    state.event_log.append(device_id, kind, payload, now).await;

    match event {
        DeviceEvent::PillDispensed { medication_id, scheduled_time, actual_dispense_time } => {
            let found = state
                .doses
                .find_correlated(user_id, medication_id, DoseStatus::Pending, scheduled_time)
                .await;
            match found {
                Some(id) => {
                    state
                        .doses
                        .transition(id, DoseStatus::DispensedWaiting, now, |d| {
                            d.dispense_time = Some(actual_dispense_time);
                        })
                        .await?;
                }
                None => {
                    tracing::debug!(
                        %medication_id, %scheduled_time,
                        "pill_dispensed outside correlation window, synthesizing dose"
                    );
                    let medication_name = state
                        .medications
                        .get(medication_id)
                        .await
                        .map(|m| m.name)
                        .unwrap_or_default();
                    let mut dose = Dose::new_pending(
                        user_id,
                        medication_id,
                        medication_name,
                        scheduled_time,
                        now,
                    );
                    dose.status = DoseStatus::DispensedWaiting;
                    dose.dispense_time = Some(actual_dispense_time);
                    state.doses.insert(dose).await;
                }
            }
        }

        DeviceEvent::PillRetrieved { medication_id, actual_time, time_elapsed_seconds } => {
            let found = state
                .doses
                .find_in_status(user_id, medication_id, DoseStatus::DispensedWaiting)
                .await;
            match found {
                Some(id) => {
                    state
                        .doses
                        .transition(id, DoseStatus::Taken, now, |d| {
                            d.actual_time = Some(actual_time);
                            d.retrieval_time = Some(actual_time);
                            d.time_elapsed_seconds = Some(time_elapsed_seconds);
                        })
                        .await?;
                }
                None => {
                    tracing::warn!(%medication_id, "pill_retrieved with no dispensed_waiting dose; reconciliation gap");
                }
            }
        }

        DeviceEvent::DispenseError { medication_id, scheduled_time, error_code } => {
            let found = state
                .doses
                .find_correlated(user_id, medication_id, DoseStatus::Pending, scheduled_time)
                .await;
            match found {
                Some(id) => {
                    state
                        .doses
                        .transition(id, DoseStatus::Error, now, |d| {
                            d.error_message = Some(error_code.clone());
                        })
                        .await?;
                }
                None => {
                    let medication_name = state
                        .medications
                        .get(medication_id)
                        .await
                        .map(|m| m.name)
                        .unwrap_or_default();
                    let mut dose = Dose::new_pending(
                        user_id,
                        medication_id,
                        medication_name,
                        scheduled_time,
                        now,
                    );
                    dose.status = DoseStatus::Error;
                    dose.error_message = Some(error_code);
                    state.doses.insert(dose).await;
                }
            }
        }

        DeviceEvent::LowInventory { medication_id, pills_remaining } => {
            state
                .inventory
                .update_or_create(
                    medication_id,
                    || {
                        Inventory::new(
                            user_id,
                            medication_id,
                            None,
                            pills_remaining,
                            DEFAULT_REFILL_THRESHOLD,
                            now,
                        )
                    },
                    |row| row.set_pills_remaining(pills_remaining, now),
                )
                .await;
        }

        DeviceEvent::CartridgeInserted {
            medication_id,
            pill_count,
            cartridge_slot,
            calibration_weight_grams,
        } => {
            state
                .inventory
                .update_or_create(
                    medication_id,
                    || {
                        Inventory::new(
                            user_id,
                            medication_id,
                            None,
                            pill_count,
                            DEFAULT_REFILL_THRESHOLD,
                            now,
                        )
                    },
                    |row| {
                        row.reset_cartridge(pill_count, cartridge_slot, calibration_weight_grams, now)
                    },
                )
                .await;
        }

        DeviceEvent::CartridgeRemoved { medication_id, pills_remaining } => {
            state
                .inventory
                .update_or_create(
                    medication_id,
                    || {
                        Inventory::new(
                            user_id,
                            medication_id,
                            None,
                            pills_remaining,
                            DEFAULT_REFILL_THRESHOLD,
                            now,
                        )
                    },
                    |row| row.set_pills_remaining(pills_remaining, now),
                )
                .await;
        }

        DeviceEvent::AlertSent { .. } | DeviceEvent::BandRemoved { .. } | DeviceEvent::BandWorn { .. } => {
            // Log-only: already appended to the event log above.
        }

        DeviceEvent::ButtonPress { medication_id } => {
            let found =
                state.doses.find_in_status(user_id, medication_id, DoseStatus::Pending).await;
            if let Some(id) = found {
                state
                    .doses
                    .update_fields(id, now, |d| {
                        d.acknowledged = true;
                    })
                    .await
                    .ok();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::config::AppConfig;
    use crate::domain::medication::{LocalTime, Medication};
    use crate::ids::UserId;

    fn scheduled(hhmmss: &str) -> DateTime<Utc> {
        format!("2026-01-01T{hhmmss}Z").parse().unwrap()
    }

    async fn setup() -> (AppState, DeviceId, UserId, MedicationId) {
        let clock = Arc::new(crate::clock::FixedClock::new(scheduled("09:00:00")));
        let state = AppState::new(AppConfig::default(), clock, CancellationToken::new());
        let user = UserId::new();
        let device = DeviceId::new();
        let medication_id = MedicationId::new();
        let med = Medication {
            id: medication_id,
            user_id: user,
            name: "Metformin".to_owned(),
            dosage: None,
            times: vec![LocalTime { hour: 9, minute: 0 }],
            duration_days: 30,
            start_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            created_at: scheduled("09:00:00"),
        };
        state.medications.create(med).await;
        let dose = Dose::new_pending(
            user,
            medication_id,
            "Metformin".to_owned(),
            scheduled("09:00:00"),
            scheduled("09:00:00"),
        );
        state.doses.insert(dose).await;
        (state, device, user, medication_id)
    }

    #[tokio::test]
    async fn happy_path_retrieval_matches_s1() {
        let (state, device, user, medication_id) = setup().await;

        correlate(
            &state,
            device,
            user,
            DeviceEvent::PillDispensed {
                medication_id,
                scheduled_time: scheduled("09:00:00"),
                actual_dispense_time: scheduled("09:00:03"),
            },
        )
        .await
        .unwrap();

        correlate(
            &state,
            device,
            user,
            DeviceEvent::PillRetrieved {
                medication_id,
                actual_time: scheduled("09:05:23"),
                time_elapsed_seconds: 320,
            },
        )
        .await
        .unwrap();

        let doses = state.doses.all_for_user(user).await;
        assert_eq!(doses.len(), 1);
        assert_eq!(doses[0].status, DoseStatus::Taken);
        assert_eq!(doses[0].actual_time, Some(scheduled("09:05:23")));
        assert_eq!(doses[0].time_elapsed_seconds, Some(320));
    }

    #[tokio::test]
    async fn out_of_window_dispense_synthesizes_new_dose_matches_s4() {
        let (state, device, user, medication_id) = setup().await;

        correlate(
            &state,
            device,
            user,
            DeviceEvent::PillDispensed {
                medication_id,
                scheduled_time: scheduled("09:06:00"),
                actual_dispense_time: scheduled("09:06:00"),
            },
        )
        .await
        .unwrap();

        let doses = state.doses.all_for_user(user).await;
        assert_eq!(doses.len(), 2);
        let original = doses.iter().find(|d| d.scheduled_time == scheduled("09:00:00")).unwrap();
        assert_eq!(original.status, DoseStatus::Pending);
        let synthetic = doses.iter().find(|d| d.scheduled_time == scheduled("09:06:00")).unwrap();
        assert_eq!(synthetic.status, DoseStatus::DispensedWaiting);
    }

    #[tokio::test]
    async fn dispense_error_then_retry_matches_s3() {
        let (state, device, user, medication_id) = setup().await;

        correlate(
            &state,
            device,
            user,
            DeviceEvent::DispenseError {
                medication_id,
                scheduled_time: scheduled("09:00:00"),
                error_code: "E102".to_owned(),
            },
        )
        .await
        .unwrap();

        let doses = state.doses.all_for_user(user).await;
        assert_eq!(doses[0].status, DoseStatus::Error);

        let dose_id = doses[0].id;
        let now = scheduled("09:01:00");
        let retried = state.doses.transition(dose_id, DoseStatus::Pending, now, |_| {}).await.unwrap();
        assert_eq!(retried.status, DoseStatus::Pending);

        let rejected = state.doses.transition(dose_id, DoseStatus::Taken, now, |_| {}).await;
        assert!(rejected.is_err());
    }

    #[tokio::test]
    async fn cartridge_insert_then_low_inventory_updates_row() {
        let (state, device, user, medication_id) = setup().await;

        correlate(
            &state,
            device,
            user,
            DeviceEvent::CartridgeInserted {
                medication_id,
                pill_count: 40,
                cartridge_slot: Some(1),
                calibration_weight_grams: Some(12.5),
            },
        )
        .await
        .unwrap();

        correlate(
            &state,
            device,
            user,
            DeviceEvent::LowInventory { medication_id, pills_remaining: 5 },
        )
        .await
        .unwrap();

        let row = state.inventory.find_by_medication(medication_id).await.unwrap();
        assert_eq!(row.pills_remaining, 5);
        assert!(row.refill_needed);
    }
}
