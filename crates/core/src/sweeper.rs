// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background timeout sweeper.

use std::sync::Arc;

use chrono::Duration;
use tokio_util::sync::CancellationToken;

use crate::domain::dose::DoseStatus;
use crate::state::AppState;

/// Handle to the running sweeper task. Dropping it does not stop the task;
/// call `stop` explicitly for a graceful, idempotent shutdown.
pub struct Sweeper {
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl Sweeper {
    /// Start the singleton sweeper task. Only one should ever run per
    /// `AppState` — starting a second would double-force the same doses,
    /// which `DoseLedger::transition`'s legality check makes harmless but
    /// wasteful.
    pub fn start(state: Arc<AppState>) -> Self {
        let cancel = state.shutdown.child_token();
        let task_cancel = cancel.clone();
        let interval = state.config.sweep_interval();
        let timeout = state.config.dose_timeout();

        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = timer.tick() => {}
                }

                sweep_once(&state, timeout).await;
            }
        });

        Self { cancel, handle }
    }

    /// Cancel the task and wait for it to finish. Safe to call more than
    /// once or to drop without calling.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

/// Force every overdue `dispensed_waiting` dose to `missed`, and raise any
/// `missed_dose` alert rules whose threshold is now satisfied.
async fn sweep_once(state: &AppState, timeout: Duration) {
    let now = state.now();
    let candidates = state.doses.all_dispensed_waiting().await;

    for id in candidates {
        let Some(dose) = state.doses.get(id).await else { continue };
        if !dose.is_overdue(now, timeout) {
            continue;
        }

        let dispense_time = dose.dispense_time;
        let result = state
            .doses
            .transition(id, DoseStatus::Missed, now, |d| {
                d.timeout_time = dispense_time.map(|t| t + timeout);
                d.reason = Some("timeout_not_retrieved".to_owned());
            })
            .await;

        let Ok(dose) = result else { continue };
        tracing::info!(dose_id = %dose.id, user_id = %dose.user_id, "dose marked missed by sweeper");

        let hours_overdue = dose
            .dispense_time
            .map(|d| (now - d).num_hours())
            .unwrap_or(0);
        let rules = state.caregivers.due_missed_dose_rules(dose.user_id, hours_overdue).await;
        for rule in rules {
            // Delivery is out of scope; record the obligation in the log so
            // operators can see which rules would have fired.
            tracing::info!(
                rule_id = %rule.id,
                caregiver_id = %rule.caregiver_id,
                dose_id = %dose.id,
                hours_overdue,
                "missed-dose alert rule triggered"
            );
        }
    }
}
