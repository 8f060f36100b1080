// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only event log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::ids::{DeviceId, EventId};

#[derive(Debug, Clone, Serialize)]
pub struct EventLogEntry {
    pub id: EventId,
    pub device_id: DeviceId,
    pub event_kind: String,
    pub payload: serde_json::Value,
    pub processed_at: DateTime<Utc>,
}

/// Append-only record of every accepted device event. Appends are
/// serialized by a single mutex; per-device ordering falls out of that —
/// monotonic insertion order by `processed_at` within a device, with no
/// cross-device ordering requirement.
#[derive(Default)]
pub struct EventLog {
    entries: Mutex<Vec<EventLogEntry>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(
        &self,
        device_id: DeviceId,
        event_kind: impl Into<String>,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> EventLogEntry {
        let entry = EventLogEntry {
            id: EventId::new(),
            device_id,
            event_kind: event_kind.into(),
            payload,
            processed_at: now,
        };
        self.entries.lock().await.push(entry.clone());
        entry
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn for_device(&self, device_id: DeviceId) -> Vec<EventLogEntry> {
        self.entries.lock().await.iter().filter(|e| e.device_id == device_id).cloned().collect()
    }
}
