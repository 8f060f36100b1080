// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Caregiver/alert-rule store. Caregivers and alert rules are kept as
//! separate tables keyed by id — no embedded objects, only id
//! back-references.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::ids::{AlertRuleId, CaregiverId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaregiverPermission {
    ViewAdherence,
    ViewInventory,
    ReceiveAlerts,
}

#[derive(Debug, Clone, Serialize)]
pub struct Caregiver {
    pub id: CaregiverId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub relationship: String,
    pub permissions: Vec<CaregiverPermission>,
    /// Starts `false` until out-of-band confirmation.
    pub authorized: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertRuleKind {
    MissedDose,
    LowInventory,
    SymptomSeverity,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertRule {
    pub id: AlertRuleId,
    pub user_id: UserId,
    pub caregiver_id: CaregiverId,
    pub kind: AlertRuleKind,
    /// Opaque structured condition carrying one integer threshold. For
    /// `missed_dose` this is a threshold in hours past the scheduled time;
    /// for the other kinds it is domain-specific but always a single
    /// integer, so one field suffices rather than a dynamic map.
    pub threshold: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct CaregiverStore {
    caregivers: RwLock<HashMap<CaregiverId, Caregiver>>,
    alert_rules: RwLock<HashMap<AlertRuleId, AlertRule>>,
}

impl CaregiverStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_caregiver(&self, caregiver: Caregiver) -> Caregiver {
        let snapshot = caregiver.clone();
        self.caregivers.write().await.insert(caregiver.id, caregiver);
        snapshot
    }

    pub async fn caregivers_for_user(&self, user_id: UserId) -> Vec<Caregiver> {
        self.caregivers.read().await.values().filter(|c| c.user_id == user_id).cloned().collect()
    }

    pub async fn add_alert_rule(&self, rule: AlertRule) -> AlertRule {
        let snapshot = rule.clone();
        self.alert_rules.write().await.insert(rule.id, rule);
        snapshot
    }

    pub async fn alert_rules_for_user(&self, user_id: UserId) -> Vec<AlertRule> {
        self.alert_rules.read().await.values().filter(|r| r.user_id == user_id).cloned().collect()
    }

    /// Active `missed_dose` rules for `user_id` whose threshold (hours) is
    /// satisfied by `hours_overdue`, used by the sweeper.
    pub async fn due_missed_dose_rules(
        &self,
        user_id: UserId,
        hours_overdue: i64,
    ) -> Vec<AlertRule> {
        self.alert_rules
            .read()
            .await
            .values()
            .filter(|r| {
                r.user_id == user_id
                    && r.active
                    && r.kind == AlertRuleKind::MissedDose
                    && r.threshold <= hours_overdue
            })
            .cloned()
            .collect()
    }

    pub async fn get_caregiver(&self, id: CaregiverId) -> Result<Caregiver, AppError> {
        self.caregivers.read().await.get(&id).cloned().ok_or(AppError::NotFound)
    }
}
