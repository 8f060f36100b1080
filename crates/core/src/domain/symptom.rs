// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Symptom/observation store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::ids::{MedicationId, SymptomId, UserId};

#[derive(Debug, Clone, Serialize)]
pub struct SymptomEntry {
    pub id: SymptomId,
    pub user_id: UserId,
    pub label: String,
    pub notes: Option<String>,
    pub severity: u8,
    pub mood: Option<u8>,
    pub medications_taken_around: Vec<MedicationId>,
    pub recorded_at: DateTime<Utc>,
}

/// Validate severity/mood are in range 1..=5.
pub fn validate_scale(value: u8, field: &str) -> Result<u8, AppError> {
    if (1..=5).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::invalid_input(format!("{field} must be between 1 and 5")))
    }
}

#[derive(Default)]
pub struct SymptomStore {
    entries: RwLock<HashMap<SymptomId, SymptomEntry>>,
}

impl SymptomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, entry: SymptomEntry) -> SymptomEntry {
        let snapshot = entry.clone();
        self.entries.write().await.insert(entry.id, entry);
        snapshot
    }

    pub async fn for_user_since(&self, user_id: UserId, since: DateTime<Utc>) -> Vec<SymptomEntry> {
        let mut out: Vec<_> = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id && e.recorded_at >= since)
            .cloned()
            .collect();
        out.sort_by_key(|e| e.recorded_at);
        out
    }
}
