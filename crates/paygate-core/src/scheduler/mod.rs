//! Scheduler + Retry Queue.

mod decline;
mod service;
mod stats;

pub use decline::classify as classify_decline;
pub use service::{Scheduler, SchedulerConfig, TickResult};
pub use stats::SchedulerStats;
