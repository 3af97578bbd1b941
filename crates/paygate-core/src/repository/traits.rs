use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Job, PaymentMethod, RetryEntry, Subscription, Transaction};
use crate::Result;

#[async_trait]
pub trait PaymentMethodRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<PaymentMethod>>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Transaction>>;
    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Transaction>>;
    /// Insert a transaction row. Uses `ON CONFLICT (idempotency_key)
    /// DO NOTHING` so a racing duplicate insert is a no-op;
    /// the caller re-reads by key afterward to get the authoritative
    /// row.
    async fn insert(&self, transaction: Transaction) -> Result<Transaction>;
    /// 24h rollup for `/admin/stats`.
    async fn stats_last_24h(&self) -> Result<TransactionStats>;
}

#[derive(Debug, Clone, Default)]
pub struct TransactionStats {
    pub total: i64,
    pub successful: i64,
    pub failed: i64,
    pub total_volume: rust_decimal::Decimal,
    pub avg_size: rust_decimal::Decimal,
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Subscription>>;
    async fn update(&self, subscription: &Subscription) -> Result<()>;
    /// Subscriptions due for billing, ordered
    /// ascending by `next_billing_date`, capped at `limit`.
    async fn due_for_billing(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Subscription>>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn insert(&self, job: &Job) -> Result<()>;
    async fn update(&self, job: &Job) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<Job>>;
    async fn list(&self, limit: i64) -> Result<Vec<Job>>;
}

#[async_trait]
pub trait RetryEntryRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<RetryEntry>>;
    /// Active (pending/processing) entry for a subscription, if any
    /// — enforces the one-active-per-subscription invariant at the
    /// call site; the durable backstop is a partial unique index in
    /// the schema.
    async fn find_active_for_subscription(&self, subscription_id: Uuid) -> Result<Option<RetryEntry>>;
    /// Upsert: creates a new entry, or returns the existing active one
    /// unchanged if the subscription already has one.
    async fn create_or_get_active(&self, subscription_id: Uuid, now: DateTime<Utc>) -> Result<RetryEntry>;
    async fn update(&self, entry: &RetryEntry) -> Result<()>;
    /// Entries due for retry.
    async fn due_for_retry(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<RetryEntry>>;
    async fn list(&self, status: Option<&str>) -> Result<Vec<RetryEntry>>;
}
