//! Retry queue model: one persistent soft-decline
//! retry track per subscription, at most one active at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fixed back-off schedule: attempt *n* (1-indexed) waits this many
/// hours before being retried. Attempts beyond the table length reuse
/// the last interval.
pub const RETRY_INTERVALS_HOURS: [i64; 3] = [1, 24, 72];
pub const MAX_RETRY_ATTEMPTS: i32 = RETRY_INTERVALS_HOURS.len() as i32;

/// Interval to wait before attempt `attempt` (1-indexed), clamped to
/// the last entry in the table for attempts beyond it.
pub fn retry_interval_hours(attempt: i32) -> i64 {
    let idx = (attempt.max(1) - 1) as usize;
    RETRY_INTERVALS_HOURS[idx.min(RETRY_INTERVALS_HOURS.len() - 1)]
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "retry_status", rename_all = "snake_case")]
pub enum RetryStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Exhausted,
}

impl RetryStatus {
    /// Whether this status counts against the one-active-per-subscription
    /// invariant.
    pub fn is_active(&self) -> bool {
        matches!(self, RetryStatus::Pending | RetryStatus::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "decline_type", rename_all = "snake_case")]
pub enum DeclineType {
    Soft,
    Hard,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RetryEntry {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub attempt: i32,
    pub max_attempts: i32,
    pub status: RetryStatus,
    pub last_error_code: Option<String>,
    pub last_error_message: Option<String>,
    pub decline_type: Option<DeclineType>,
    pub next_retry_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub transaction_id: Option<Uuid>,
    pub processor_used: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RetryEntry {
    pub fn new(subscription_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_id,
            attempt: 0,
            max_attempts: MAX_RETRY_ATTEMPTS,
            status: RetryStatus::Pending,
            last_error_code: None,
            last_error_message: None,
            decline_type: None,
            next_retry_at: now,
            last_attempt_at: None,
            transaction_id: None,
            processor_used: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a soft decline, either rescheduling for another attempt
    /// or exhausting the entry if the max has been reached (spec
    /// §4.4.3 state machine).
    pub fn apply_soft_decline(&mut self, now: DateTime<Utc>, error_code: String, error_message: String) {
        self.last_attempt_at = Some(now);
        self.last_error_code = Some(error_code);
        self.last_error_message = Some(error_message);
        self.decline_type = Some(DeclineType::Soft);
        self.attempt += 1;
        self.updated_at = now;

        if self.attempt >= self.max_attempts {
            self.status = RetryStatus::Exhausted;
            self.resolved_at = Some(now);
        } else {
            self.status = RetryStatus::Pending;
            let hours = retry_interval_hours(self.attempt);
            self.next_retry_at = now + chrono::Duration::hours(hours);
        }
    }

    /// Apply a hard decline: terminal, never retried.
    pub fn apply_hard_decline(&mut self, now: DateTime<Utc>, error_code: String, error_message: String) {
        self.last_attempt_at = Some(now);
        self.last_error_code = Some(error_code);
        self.last_error_message = Some(error_message);
        self.decline_type = Some(DeclineType::Hard);
        self.status = RetryStatus::Failed;
        self.resolved_at = Some(now);
        self.updated_at = now;
    }

    pub fn apply_success(&mut self, now: DateTime<Utc>, transaction_id: Uuid, processor_used: String) {
        self.last_attempt_at = Some(now);
        self.status = RetryStatus::Succeeded;
        self.transaction_id = Some(transaction_id);
        self.processor_used = Some(processor_used);
        self.resolved_at = Some(now);
        self.updated_at = now;
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> crate::Result<()> {
        if !self.status.is_active() {
            return Err(crate::Error::validation(
                "retry entry can only be canceled while pending or processing",
            ));
        }
        self.status = RetryStatus::Canceled;
        self.resolved_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn begin_processing(&mut self, now: DateTime<Utc>) -> crate::Result<()> {
        if self.status != RetryStatus::Pending {
            return Err(crate::Error::validation(
                "retry entry must be pending to begin processing",
            ));
        }
        self.status = RetryStatus::Processing;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_interval_matches_fixed_schedule() {
        assert_eq!(retry_interval_hours(1), 1);
        assert_eq!(retry_interval_hours(2), 24);
        assert_eq!(retry_interval_hours(3), 72);
        // attempts beyond the table reuse the last interval
        assert_eq!(retry_interval_hours(4), 72);
        assert_eq!(retry_interval_hours(100), 72);
    }

    #[test]
    fn soft_decline_reschedules_until_exhausted() {
        let now = Utc::now();
        let mut entry = RetryEntry::new(Uuid::new_v4(), now);

        entry.apply_soft_decline(now, "insufficient_funds".into(), "".into());
        assert_eq!(entry.attempt, 1);
        assert_eq!(entry.status, RetryStatus::Pending);
        assert!((entry.next_retry_at - now).num_hours() >= 1);

        entry.apply_soft_decline(now, "insufficient_funds".into(), "".into());
        assert_eq!(entry.attempt, 2);
        assert_eq!(entry.status, RetryStatus::Pending);

        entry.apply_soft_decline(now, "insufficient_funds".into(), "".into());
        assert_eq!(entry.attempt, 3);
        assert_eq!(entry.status, RetryStatus::Exhausted);
        assert!(entry.resolved_at.is_some());
    }

    #[test]
    fn hard_decline_is_terminal() {
        let now = Utc::now();
        let mut entry = RetryEntry::new(Uuid::new_v4(), now);
        entry.apply_hard_decline(now, "expired_card".into(), "".into());
        assert_eq!(entry.status, RetryStatus::Failed);
        assert!(entry.status.is_terminal());
    }

    #[test]
    fn cancel_only_allowed_while_active() {
        let now = Utc::now();
        let mut entry = RetryEntry::new(Uuid::new_v4(), now);
        entry.apply_hard_decline(now, "expired_card".into(), "".into());
        assert!(entry.cancel(now).is_err());
    }
}
