use chrono::{DateTime, Utc};
use serde::Serialize;

/// Scheduler run-state counters, protected under a single mutex.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerStats {
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub processed_last: u64,
    pub succeeded_last: u64,
    pub failed_last: u64,
    pub total_ticks: u64,
}
