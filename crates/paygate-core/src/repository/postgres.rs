//! Postgres-backed repository implementations. Every query is
//! parameter-bound — user-controlled values never reach a `format!`
//! call that builds SQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Job, PaymentMethod, RetryEntry, Subscription, Transaction};
use crate::{Error, Result};

use super::traits::{
    JobRepository, PaymentMethodRepository, RetryEntryRepository, SubscriptionRepository, TransactionRepository,
    TransactionStats,
};

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(Error::from)
}

pub struct PgPaymentMethodRepository {
    pool: PgPool,
}

impl PgPaymentMethodRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentMethodRepository for PgPaymentMethodRepository {
    async fn find(&self, id: Uuid) -> Result<Option<PaymentMethod>> {
        let row = sqlx::query_as::<_, PaymentMethod>(
            "SELECT id, user_id, token_type, network_token, processor_a_token, processor_b_token, created_at
             FROM payment_methods WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn find(&self, id: Uuid) -> Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, Transaction>(
            "SELECT id, subscription_id, payment_method_id, processor_used, amount, currency, status,
                    transaction_type, idempotency_key, processor_transaction_id, original_transaction_id,
                    error_code, error_message, created_at
             FROM transactions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, Transaction>(
            "SELECT id, subscription_id, payment_method_id, processor_used, amount, currency, status,
                    transaction_type, idempotency_key, processor_transaction_id, original_transaction_id,
                    error_code, error_message, created_at
             FROM transactions WHERE idempotency_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert(&self, transaction: Transaction) -> Result<Transaction> {
        sqlx::query(
            "INSERT INTO transactions
                (id, subscription_id, payment_method_id, processor_used, amount, currency, status,
                 transaction_type, idempotency_key, processor_transaction_id, original_transaction_id,
                 error_code, error_message, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             ON CONFLICT (idempotency_key) DO NOTHING",
        )
        .bind(transaction.id)
        .bind(transaction.subscription_id)
        .bind(transaction.payment_method_id)
        .bind(&transaction.processor_used)
        .bind(transaction.amount)
        .bind(&transaction.currency)
        .bind(transaction.status)
        .bind(transaction.transaction_type)
        .bind(&transaction.idempotency_key)
        .bind(&transaction.processor_transaction_id)
        .bind(transaction.original_transaction_id)
        .bind(&transaction.error_code)
        .bind(&transaction.error_message)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await?;

        // A concurrent insert may have won the race; re-read by key so
        // the caller always observes the authoritative row.
        self.find_by_idempotency_key(&transaction.idempotency_key)
            .await?
            .ok_or_else(|| Error::Other("transaction vanished immediately after insert".to_string()))
    }

    async fn stats_last_24h(&self) -> Result<TransactionStats> {
        let row: (i64, i64, i64, Option<Decimal>, Option<Decimal>) = sqlx::query_as(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'success') AS successful,
                COUNT(*) FILTER (WHERE status = 'failed') AS failed,
                COALESCE(SUM(amount) FILTER (WHERE status = 'success'), 0) AS total_volume,
                AVG(amount) FILTER (WHERE status = 'success') AS avg_size
             FROM transactions
             WHERE transaction_type = 'charge' AND created_at >= now() - interval '24 hours'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TransactionStats {
            total: row.0,
            successful: row.1,
            failed: row.2,
            total_volume: row.3.unwrap_or_default(),
            avg_size: row.4.unwrap_or_default(),
        })
    }
}

pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find(&self, id: Uuid) -> Result<Option<Subscription>> {
        let row = sqlx::query_as::<_, Subscription>(
            "SELECT id, user_id, plan_id, payment_method_id, status, amount, currency, billing_cycle,
                    current_period_start, current_period_end, next_billing_date, cancel_at_period_end,
                    canceled_at, trial_start, trial_end, created_at, updated_at
             FROM subscriptions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, subscription: &Subscription) -> Result<()> {
        sqlx::query(
            "UPDATE subscriptions SET
                status = $2, current_period_start = $3, current_period_end = $4, next_billing_date = $5,
                cancel_at_period_end = $6, canceled_at = $7, updated_at = $8
             WHERE id = $1",
        )
        .bind(subscription.id)
        .bind(subscription.status)
        .bind(subscription.current_period_start)
        .bind(subscription.current_period_end)
        .bind(subscription.next_billing_date)
        .bind(subscription.cancel_at_period_end)
        .bind(subscription.canceled_at)
        .bind(subscription.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn due_for_billing(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Subscription>> {
        let rows = sqlx::query_as::<_, Subscription>(
            "SELECT id, user_id, plan_id, payment_method_id, status, amount, currency, billing_cycle,
                    current_period_start, current_period_end, next_billing_date, cancel_at_period_end,
                    canceled_at, trial_start, trial_end, created_at, updated_at
             FROM subscriptions
             WHERE status = 'active' AND next_billing_date <= $1 AND cancel_at_period_end = false
             ORDER BY next_billing_date ASC
             LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn insert(&self, job: &Job) -> Result<()> {
        sqlx::query(
            "INSERT INTO scheduler_jobs
                (id, subscription_id, job_type, status, attempt, scheduled_at, started_at, completed_at,
                 transaction_id, processor_used, error_code, error_message)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(job.id)
        .bind(job.subscription_id)
        .bind(job.job_type)
        .bind(job.status)
        .bind(job.attempt)
        .bind(job.scheduled_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(job.transaction_id)
        .bind(&job.processor_used)
        .bind(&job.error_code)
        .bind(&job.error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, job: &Job) -> Result<()> {
        sqlx::query(
            "UPDATE scheduler_jobs SET
                status = $2, started_at = $3, completed_at = $4, transaction_id = $5, processor_used = $6,
                error_code = $7, error_message = $8
             WHERE id = $1",
        )
        .bind(job.id)
        .bind(job.status)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(job.transaction_id)
        .bind(&job.processor_used)
        .bind(&job.error_code)
        .bind(&job.error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, Job>(
            "SELECT id, subscription_id, job_type, status, attempt, scheduled_at, started_at, completed_at,
                    transaction_id, processor_used, error_code, error_message
             FROM scheduler_jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self, limit: i64) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, Job>(
            "SELECT id, subscription_id, job_type, status, attempt, scheduled_at, started_at, completed_at,
                    transaction_id, processor_used, error_code, error_message
             FROM scheduler_jobs ORDER BY scheduled_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

pub struct PgRetryEntryRepository {
    pool: PgPool,
}

impl PgRetryEntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    const COLUMNS: &'static str = "id, subscription_id, attempt, max_attempts, status, last_error_code, \
         last_error_message, decline_type, next_retry_at, last_attempt_at, transaction_id, processor_used, \
         resolved_at, created_at, updated_at";
}

#[async_trait]
impl RetryEntryRepository for PgRetryEntryRepository {
    async fn find(&self, id: Uuid) -> Result<Option<RetryEntry>> {
        let query = format!("SELECT {} FROM retry_queue WHERE id = $1", Self::COLUMNS);
        let row = sqlx::query_as::<_, RetryEntry>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_active_for_subscription(&self, subscription_id: Uuid) -> Result<Option<RetryEntry>> {
        let query = format!(
            "SELECT {} FROM retry_queue WHERE subscription_id = $1 AND status IN ('pending', 'processing')",
            Self::COLUMNS
        );
        let row = sqlx::query_as::<_, RetryEntry>(&query)
            .bind(subscription_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_or_get_active(&self, subscription_id: Uuid, now: DateTime<Utc>) -> Result<RetryEntry> {
        if let Some(existing) = self.find_active_for_subscription(subscription_id).await? {
            return Ok(existing);
        }
        let entry = RetryEntry::new(subscription_id, now);
        sqlx::query(
            "INSERT INTO retry_queue
                (id, subscription_id, attempt, max_attempts, status, last_error_code, last_error_message,
                 decline_type, next_retry_at, last_attempt_at, transaction_id, processor_used, resolved_at,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             ON CONFLICT (subscription_id) WHERE status = 'pending' DO NOTHING",
        )
        .bind(entry.id)
        .bind(entry.subscription_id)
        .bind(entry.attempt)
        .bind(entry.max_attempts)
        .bind(entry.status)
        .bind(&entry.last_error_code)
        .bind(&entry.last_error_message)
        .bind(entry.decline_type)
        .bind(entry.next_retry_at)
        .bind(entry.last_attempt_at)
        .bind(entry.transaction_id)
        .bind(&entry.processor_used)
        .bind(entry.resolved_at)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;

        self.find_active_for_subscription(subscription_id)
            .await?
            .ok_or_else(|| Error::Other("retry entry vanished immediately after insert".to_string()))
    }

    async fn update(&self, entry: &RetryEntry) -> Result<()> {
        sqlx::query(
            "UPDATE retry_queue SET
                attempt = $2, status = $3, last_error_code = $4, last_error_message = $5, decline_type = $6,
                next_retry_at = $7, last_attempt_at = $8, transaction_id = $9, processor_used = $10,
                resolved_at = $11, updated_at = $12
             WHERE id = $1",
        )
        .bind(entry.id)
        .bind(entry.attempt)
        .bind(entry.status)
        .bind(&entry.last_error_code)
        .bind(&entry.last_error_message)
        .bind(entry.decline_type)
        .bind(entry.next_retry_at)
        .bind(entry.last_attempt_at)
        .bind(entry.transaction_id)
        .bind(&entry.processor_used)
        .bind(entry.resolved_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn due_for_retry(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<RetryEntry>> {
        let query = format!(
            "SELECT {} FROM retry_queue WHERE status = 'pending' AND next_retry_at <= $1
             ORDER BY next_retry_at ASC LIMIT $2",
            Self::COLUMNS
        );
        let rows = sqlx::query_as::<_, RetryEntry>(&query)
            .bind(now)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list(&self, status: Option<&str>) -> Result<Vec<RetryEntry>> {
        let rows = match status {
            Some(status) => {
                let query = format!("SELECT {} FROM retry_queue WHERE status = $1 ORDER BY created_at DESC", Self::COLUMNS);
                sqlx::query_as::<_, RetryEntry>(&query)
                    .bind(status)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!("SELECT {} FROM retry_queue ORDER BY created_at DESC", Self::COLUMNS);
                sqlx::query_as::<_, RetryEntry>(&query).fetch_all(&self.pool).await?
            }
        };
        Ok(rows)
    }
}
