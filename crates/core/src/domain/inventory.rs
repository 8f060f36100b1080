// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inventory ledger: per-cartridge pill counts and refill thresholds.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::ids::{DeviceId, InventoryId, MedicationId, UserId};

/// Fallback daily dose count for the `days_remaining` projection, used only
/// when an inventory row has no matching medication record.
pub const DEFAULT_DOSES_PER_DAY: u32 = 2;

pub const DEFAULT_REFILL_THRESHOLD: u32 = 7;

#[derive(Debug, Clone, Serialize)]
pub struct Inventory {
    pub id: InventoryId,
    pub user_id: UserId,
    pub medication_id: MedicationId,
    pub device_id: Option<DeviceId>,
    pub cartridge_slot: Option<u32>,
    pub pills_remaining: u32,
    pub initial_pill_count: u32,
    pub refill_threshold: u32,
    pub refill_needed: bool,
    pub calibration_weight_grams: Option<f64>,
    pub last_updated: DateTime<Utc>,
}

impl Inventory {
    pub fn new(
        user_id: UserId,
        medication_id: MedicationId,
        device_id: Option<DeviceId>,
        initial_pill_count: u32,
        refill_threshold: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let mut inv = Self {
            id: InventoryId::new(),
            user_id,
            medication_id,
            device_id,
            cartridge_slot: None,
            pills_remaining: initial_pill_count,
            initial_pill_count,
            refill_threshold,
            refill_needed: false,
            calibration_weight_grams: None,
            last_updated: now,
        };
        inv.recompute_refill_needed();
        inv
    }

    pub fn recompute_refill_needed(&mut self) {
        self.refill_needed = self.pills_remaining <= self.refill_threshold;
    }

    /// Update the observed pill count (`low_inventory`, `cartridge_removed`
    /// events). Clamped to `initial_pill_count`.
    pub fn set_pills_remaining(&mut self, pills: u32, now: DateTime<Utc>) {
        self.pills_remaining = pills.min(self.initial_pill_count);
        self.recompute_refill_needed();
        self.last_updated = now;
    }

    /// A fresh cartridge was inserted: overwrite the count fields and clear
    /// `refill_needed` unconditionally, rather than recomputing it.
    pub fn reset_cartridge(
        &mut self,
        initial_pill_count: u32,
        cartridge_slot: Option<u32>,
        calibration_weight_grams: Option<f64>,
        now: DateTime<Utc>,
    ) {
        self.initial_pill_count = initial_pill_count;
        self.pills_remaining = initial_pill_count;
        self.cartridge_slot = cartridge_slot;
        self.calibration_weight_grams = calibration_weight_grams;
        self.refill_needed = false;
        self.last_updated = now;
    }

    pub fn days_remaining(&self, doses_per_day: u32) -> u32 {
        let per_day = doses_per_day.max(1);
        self.pills_remaining / per_day
    }
}

#[derive(Default)]
pub struct InventoryLedger {
    rows: RwLock<HashMap<InventoryId, Inventory>>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all_for_user(&self, user_id: UserId) -> Vec<Inventory> {
        self.rows.read().await.values().filter(|r| r.user_id == user_id).cloned().collect()
    }

    pub async fn find_by_medication(&self, medication_id: MedicationId) -> Option<Inventory> {
        self.rows.read().await.values().find(|r| r.medication_id == medication_id).cloned()
    }

    pub async fn upsert(&self, row: Inventory) -> Inventory {
        let snapshot = row.clone();
        self.rows.write().await.insert(row.id, row);
        snapshot
    }

    /// Apply `mutate` to the inventory row for `medication_id`, creating one
    /// via `make_default` if none exists yet. Runs under the map's single
    /// write lock, the per-medication exclusion region. Inventory rows are
    /// few and short-lived to touch, so a single lock for the whole ledger
    /// is sufficient rather than one per row.
    pub async fn update_or_create(
        &self,
        medication_id: MedicationId,
        make_default: impl FnOnce() -> Inventory,
        mutate: impl FnOnce(&mut Inventory),
    ) -> Inventory {
        let mut rows = self.rows.write().await;
        let existing_id = rows.values().find(|r| r.medication_id == medication_id).map(|r| r.id);
        let id = match existing_id {
            Some(id) => id,
            None => {
                let row = make_default();
                let id = row.id;
                rows.insert(id, row);
                id
            }
        };
        // Safe: `id` was just looked up or inserted in this same critical section.
        let row = match rows.get_mut(&id) {
            Some(row) => row,
            None => unreachable!("inventory row vanished under exclusive lock"),
        };
        mutate(row);
        row.clone()
    }

    pub async fn remove_for_medication(&self, medication_id: MedicationId) {
        self.rows.write().await.retain(|_, r| r.medication_id != medication_id);
    }
}
