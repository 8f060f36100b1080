// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Medication catalog.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::dose::Dose;
use crate::error::AppError;
use crate::ids::{MedicationId, UserId};

/// A daily dose time, `HH:MM` 24-hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalTime {
    pub hour: u8,
    pub minute: u8,
}

impl LocalTime {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| AppError::invalid_input(format!("malformed time '{s}'")))?;
        let hour: u8 = h.parse().map_err(|_| AppError::invalid_input(format!("malformed time '{s}'")))?;
        let minute: u8 =
            m.parse().map_err(|_| AppError::invalid_input(format!("malformed time '{s}'")))?;
        if hour > 23 || minute > 59 {
            return Err(AppError::invalid_input(format!("malformed time '{s}'")));
        }
        Ok(Self { hour, minute })
    }

    pub fn to_string_hhmm(self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for Medication {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        MedicationWire::from(self).serialize(serializer)
    }
}

#[derive(Debug, Clone, Serialize)]
struct MedicationWire {
    id: MedicationId,
    user_id: UserId,
    name: String,
    dosage: Option<String>,
    times: Vec<String>,
    duration_days: u32,
    start_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl From<&Medication> for MedicationWire {
    fn from(m: &Medication) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            name: m.name.clone(),
            dosage: m.dosage.clone(),
            times: m.times.iter().map(|t| t.to_string_hhmm()).collect(),
            duration_days: m.duration_days,
            start_date: m.start_date,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Medication {
    pub id: MedicationId,
    pub user_id: UserId,
    pub name: String,
    pub dosage: Option<String>,
    /// Unique, sorted daily local times.
    pub times: Vec<LocalTime>,
    pub duration_days: u32,
    pub start_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Medication {
    /// How many scheduled doses per day this medication calls for. Feeds the
    /// inventory projection's `days_remaining`.
    pub fn doses_per_day(&self) -> u32 {
        self.times.len() as u32
    }

    /// Whether `day` falls within this medication's active date range.
    pub fn covers(&self, day: NaiveDate) -> bool {
        day >= self.start_date && day < self.start_date + chrono::Duration::days(self.duration_days as i64)
    }

    /// Expand this medication's schedule into one `pending` dose per
    /// `times` entry for each day in `[start_date, start_date + duration_days)`.
    pub fn materialize_doses(&self, now: DateTime<Utc>) -> Vec<Dose> {
        let mut doses = Vec::with_capacity(self.times.len() * self.duration_days as usize);
        for day_offset in 0..self.duration_days {
            let day = self.start_date + chrono::Duration::days(day_offset as i64);
            let midnight = NaiveDateTime::new(day, chrono::NaiveTime::MIN);
            for time in &self.times {
                let naive = midnight
                    + chrono::Duration::hours(time.hour as i64)
                    + chrono::Duration::minutes(time.minute as i64);
                let scheduled_time = DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc);
                doses.push(Dose::new_pending(
                    self.user_id,
                    self.id,
                    self.name.clone(),
                    scheduled_time,
                    now,
                ));
            }
        }
        doses
    }
}

#[derive(Default)]
pub struct MedicationCatalog {
    medications: RwLock<HashMap<MedicationId, Medication>>,
}

impl MedicationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, med: Medication) -> Medication {
        let snapshot = med.clone();
        self.medications.write().await.insert(med.id, med);
        snapshot
    }

    pub async fn get(&self, id: MedicationId) -> Option<Medication> {
        self.medications.read().await.get(&id).cloned()
    }

    pub async fn all_for_user(&self, user_id: UserId) -> Vec<Medication> {
        self.medications.read().await.values().filter(|m| m.user_id == user_id).cloned().collect()
    }

    pub async fn update(
        &self,
        id: MedicationId,
        mutate: impl FnOnce(&mut Medication),
    ) -> Result<Medication, AppError> {
        let mut map = self.medications.write().await;
        let med = map.get_mut(&id).ok_or(AppError::NotFound)?;
        mutate(med);
        Ok(med.clone())
    }

    pub async fn delete(&self, id: MedicationId) -> Result<Medication, AppError> {
        self.medications.write().await.remove(&id).ok_or(AppError::NotFound)
    }
}

/// Validate and sort a medication's daily times, rejecting duplicates.
pub fn normalize_times(raw: &[String]) -> Result<Vec<LocalTime>, AppError> {
    let mut times = raw.iter().map(|s| LocalTime::parse(s)).collect::<Result<Vec<_>, _>>()?;
    times.sort();
    times.dedup();
    if times.len() != raw.len() {
        return Err(AppError::invalid_input("duplicate dose times"));
    }
    Ok(times)
}
