// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injectable wall-clock source.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// A source of the current instant, abstracted so tests can fix time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that can be advanced manually, for deterministic tests and for
/// scenario-style integration tests that step through simulated time.
#[derive(Debug)]
pub struct FixedClock {
    micros_since_epoch: AtomicI64,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { micros_since_epoch: AtomicI64::new(at.timestamp_micros()) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.micros_since_epoch.store(at.timestamp_micros(), Ordering::SeqCst);
    }

    pub fn advance(&self, delta: chrono::Duration) {
        self.micros_since_epoch.fetch_add(delta.num_microseconds().unwrap_or(0), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let micros = self.micros_since_epoch.load(Ordering::SeqCst);
        DateTime::from_timestamp_micros(micros).unwrap_or_else(Utc::now)
    }
}
