// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the adherence core server.
#[derive(Debug, Clone, clap::Args)]
pub struct AppConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "CAREPATH_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "CAREPATH_PORT")]
    pub port: u16,

    /// Sweeper tick period in milliseconds.
    #[arg(long, default_value_t = 15_000, env = "CAREPATH_SWEEP_MS")]
    pub sweep_interval_ms: u64,

    /// Dose timeout in seconds. Exposed so tests can use
    /// a shorter timeout than the reference 30 minutes; production
    /// deployments should leave this at the default.
    #[arg(long, default_value_t = 1800, env = "CAREPATH_DOSE_TIMEOUT_SECS")]
    pub dose_timeout_secs: u64,

    /// Default lookahead window, in hours, for `GET /api/doses/upcoming`
    /// when `hours` is not supplied.
    #[arg(long, default_value_t = 4, env = "CAREPATH_DEFAULT_UPCOMING_HOURS")]
    pub default_upcoming_hours: u32,
}

impl AppConfig {
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn dose_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.dose_timeout_secs as i64)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            sweep_interval_ms: 15_000,
            dose_timeout_secs: 1800,
            default_upcoming_hours: 4,
        }
    }
}
