// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dose state machine and dose ledger.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::ids::{DoseId, MedicationId, UserId};

/// The dose timeout constant: a dispensed-but-unclaimed dose becomes
/// `missed` no later than `dispense_time + TIMEOUT`.
pub const TIMEOUT: Duration = Duration::minutes(30);

/// Tolerance window the correlator matches device-reported schedule times
/// against the materialized schedule.
pub const CORRELATION_TOLERANCE: Duration = Duration::minutes(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseStatus {
    Pending,
    DispensedWaiting,
    Taken,
    Missed,
    Error,
    Skipped,
}

impl DoseStatus {
    /// The transition table, evaluated as a pure function so the legality
    /// check and the table live in exactly one place.
    pub fn can_transition(from: DoseStatus, to: DoseStatus) -> bool {
        use DoseStatus::*;
        matches!(
            (from, to),
            (Pending, DispensedWaiting)
                | (Pending, Error)
                | (Pending, Skipped)
                | (DispensedWaiting, Taken)
                | (DispensedWaiting, Missed)
                | (Error, Pending)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DoseStatus::Taken | DoseStatus::Missed | DoseStatus::Skipped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DoseStatus::Pending => "pending",
            DoseStatus::DispensedWaiting => "dispensed_waiting",
            DoseStatus::Taken => "taken",
            DoseStatus::Missed => "missed",
            DoseStatus::Error => "error",
            DoseStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dose {
    pub id: DoseId,
    pub user_id: UserId,
    pub medication_id: MedicationId,
    /// Denormalized snapshot of the medication name at scheduling time.
    pub medication_name: String,
    pub scheduled_time: DateTime<Utc>,
    pub status: DoseStatus,
    pub dispense_time: Option<DateTime<Utc>>,
    pub retrieval_time: Option<DateTime<Utc>>,
    pub actual_time: Option<DateTime<Utc>>,
    pub time_elapsed_seconds: Option<i64>,
    pub error_message: Option<String>,
    pub reason: Option<String>,
    pub timeout_time: Option<DateTime<Utc>>,
    pub acknowledged: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dose {
    pub fn new_pending(
        user_id: UserId,
        medication_id: MedicationId,
        medication_name: String,
        scheduled_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DoseId::new(),
            user_id,
            medication_id,
            medication_name,
            scheduled_time,
            status: DoseStatus::Pending,
            dispense_time: None,
            retrieval_time: None,
            actual_time: None,
            time_elapsed_seconds: None,
            error_message: None,
            reason: None,
            timeout_time: None,
            acknowledged: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// The client-visible countdown contract: zero outside
    /// `dispensed_waiting`, otherwise the seconds remaining until the
    /// sweeper is entitled to force a `missed` transition.
    pub fn countdown_remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.countdown_remaining_seconds_with_timeout(now, TIMEOUT)
    }

    pub fn countdown_remaining_seconds_with_timeout(
        &self,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> i64 {
        match (self.status, self.dispense_time) {
            (DoseStatus::DispensedWaiting, Some(dispense_time)) => {
                let deadline = dispense_time + timeout;
                (deadline - now).num_seconds().max(0)
            }
            _ => 0,
        }
    }

    pub fn is_overdue(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.status == DoseStatus::DispensedWaiting
            && self.dispense_time.is_some_and(|d| d + timeout <= now)
    }
}

/// Append/update store of dose records keyed by id, with a per-dose
/// exclusion region so concurrent events on the same dose serialize while
/// unrelated doses never contend.
#[derive(Default)]
pub struct DoseLedger {
    doses: RwLock<HashMap<DoseId, Arc<RwLock<Dose>>>>,
}

impl DoseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.doses.read().await.len()
    }

    pub async fn insert(&self, dose: Dose) -> Dose {
        let snapshot = dose.clone();
        self.doses.write().await.insert(dose.id, Arc::new(RwLock::new(dose)));
        snapshot
    }

    pub async fn get(&self, id: DoseId) -> Option<Dose> {
        let entry = self.doses.read().await.get(&id).cloned()?;
        Some(entry.read().await.clone())
    }

    pub async fn all_for_user(&self, user_id: UserId) -> Vec<Dose> {
        let map = self.doses.read().await;
        let mut out = Vec::new();
        for entry in map.values() {
            let dose = entry.read().await;
            if dose.user_id == user_id {
                out.push(dose.clone());
            }
        }
        out
    }

    /// Find a dose for `user_id`/`medication_id` in `status` whose
    /// `scheduled_time` is within `CORRELATION_TOLERANCE` of `around`,
    /// picking the closest match. Used by the correlator.
    pub async fn find_correlated(
        &self,
        user_id: UserId,
        medication_id: MedicationId,
        status: DoseStatus,
        around: DateTime<Utc>,
    ) -> Option<DoseId> {
        let map = self.doses.read().await;
        let mut best: Option<(DoseId, Duration)> = None;
        for entry in map.values() {
            let dose = entry.read().await;
            if dose.user_id != user_id || dose.medication_id != medication_id {
                continue;
            }
            if dose.status != status {
                continue;
            }
            let skew = (dose.scheduled_time - around).abs();
            if skew > CORRELATION_TOLERANCE {
                continue;
            }
            let better = match &best {
                Some((_, best_skew)) => skew < *best_skew,
                None => true,
            };
            if better {
                best = Some((dose.id, skew));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Find the single current dose for a medication in `status`, ignoring
    /// schedule skew. Used by `pill_retrieved`, which has no scheduled_time
    /// of its own to correlate against.
    pub async fn find_in_status(
        &self,
        user_id: UserId,
        medication_id: MedicationId,
        status: DoseStatus,
    ) -> Option<DoseId> {
        let map = self.doses.read().await;
        for entry in map.values() {
            let dose = entry.read().await;
            if dose.user_id == user_id && dose.medication_id == medication_id && dose.status == status
            {
                return Some(dose.id);
            }
        }
        None
    }

    pub async fn all_dispensed_waiting(&self) -> Vec<DoseId> {
        let map = self.doses.read().await;
        let mut out = Vec::new();
        for (id, entry) in map.iter() {
            if entry.read().await.status == DoseStatus::DispensedWaiting {
                out.push(*id);
            }
        }
        out
    }

    pub async fn remove_for_medication(&self, medication_id: MedicationId) {
        let mut map = self.doses.write().await;
        map.retain(|_, entry| {
            // `try_read` never blocks here: callers never hold a write lock
            // on an entry while also mutating the ledger's top-level map.
            entry.try_read().map(|d| d.medication_id != medication_id).unwrap_or(true)
        });
    }

    /// Apply a transition, atomically checking legality and mutating the
    /// dose in one critical section. `mutate`
    /// sets side-fields (timestamps, reason, etc.) and must not change
    /// `status` itself.
    pub async fn transition(
        &self,
        id: DoseId,
        to: DoseStatus,
        now: DateTime<Utc>,
        mutate: impl FnOnce(&mut Dose),
    ) -> Result<Dose, AppError> {
        let entry = {
            let map = self.doses.read().await;
            map.get(&id).cloned().ok_or(AppError::NotFound)?
        };
        let mut dose = entry.write().await;
        if !DoseStatus::can_transition(dose.status, to) {
            return Err(AppError::illegal_transition(dose.status.as_str()));
        }
        dose.status = to;
        dose.updated_at = now;
        mutate(&mut dose);
        Ok(dose.clone())
    }

    /// Apply a side-field mutation that does not change `status` (e.g. the
    /// `button_press` acknowledgment), under the same per-dose exclusion
    /// region `transition` uses.
    pub async fn update_fields(
        &self,
        id: DoseId,
        now: DateTime<Utc>,
        mutate: impl FnOnce(&mut Dose),
    ) -> Result<Dose, AppError> {
        let entry = {
            let map = self.doses.read().await;
            map.get(&id).cloned().ok_or(AppError::NotFound)?
        };
        let mut dose = entry.write().await;
        mutate(&mut dose);
        dose.updated_at = now;
        Ok(dose.clone())
    }
}

#[cfg(test)]
#[path = "dose_tests.rs"]
mod tests;
