//! Job model: one billing attempt claimed by the scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_type", rename_all = "snake_case")]
pub enum JobType {
    Billing,
    Retry,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    pub attempt: i32,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub transaction_id: Option<Uuid>,
    pub processor_used: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl Job {
    pub fn new_billing(subscription_id: Uuid, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_id,
            job_type: JobType::Billing,
            status: JobStatus::Pending,
            attempt: 1,
            scheduled_at,
            started_at: None,
            completed_at: None,
            transaction_id: None,
            processor_used: None,
            error_code: None,
            error_message: None,
        }
    }

    pub fn new_retry(subscription_id: Uuid, attempt: i32, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_id,
            job_type: JobType::Retry,
            status: JobStatus::Pending,
            attempt,
            scheduled_at,
            started_at: None,
            completed_at: None,
            transaction_id: None,
            processor_used: None,
            error_code: None,
            error_message: None,
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Running;
        self.started_at = Some(now);
    }

    pub fn complete(&mut self, now: DateTime<Utc>, transaction_id: Uuid, processor_used: String) {
        self.status = JobStatus::Completed;
        self.completed_at = Some(now);
        self.transaction_id = Some(transaction_id);
        self.processor_used = Some(processor_used);
    }

    pub fn fail(&mut self, now: DateTime<Utc>, error_code: String, error_message: String) {
        self.status = JobStatus::Failed;
        self.completed_at = Some(now);
        self.error_code = Some(error_code);
        self.error_message = Some(error_message);
    }
}
