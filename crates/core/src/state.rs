// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::domain::caregiver::CaregiverStore;
use crate::domain::dose::DoseLedger;
use crate::domain::event_log::EventLog;
use crate::domain::identity::IdentityStore;
use crate::domain::inventory::InventoryLedger;
use crate::domain::medication::MedicationCatalog;
use crate::domain::symptom::SymptomStore;

/// Shared application state: every store plus the clock and shutdown
/// handle, mirroring the teacher's single `Arc`-shared state root.
pub struct AppState {
    pub config: AppConfig,
    pub clock: Arc<dyn Clock>,
    pub shutdown: CancellationToken,

    pub identity: IdentityStore,
    pub medications: MedicationCatalog,
    pub doses: DoseLedger,
    pub inventory: InventoryLedger,
    pub event_log: EventLog,
    pub symptoms: SymptomStore,
    pub caregivers: CaregiverStore,
}

impl AppState {
    pub fn new(config: AppConfig, clock: Arc<dyn Clock>, shutdown: CancellationToken) -> Self {
        Self {
            config,
            clock,
            shutdown,
            identity: IdentityStore::new(),
            medications: MedicationCatalog::new(),
            doses: DoseLedger::new(),
            inventory: InventoryLedger::new(),
            event_log: EventLog::new(),
            symptoms: SymptomStore::new(),
            caregivers: CaregiverStore::new(),
        }
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}
