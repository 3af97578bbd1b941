//! Scheduler + Retry Queue: a tick-driven batch processor discovering
//! due subscriptions and due retries, built on a `JobScheduler::run`-style
//! cooperative loop. Shutdown is signaled through a `tokio::sync::Notify`
//! rather than a polled `enabled` flag, so the loop stops taking new
//! ticks as soon as shutdown is requested instead of on its next poll.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::codes;
use crate::models::{DeclineType, Job, RetryEntry, RetryStatus, SubscriptionStatus};
use crate::orchestrator::{ChargeRequest, Orchestrator};
use crate::repository::{JobRepository, RetryEntryRepository, SubscriptionRepository};
use crate::{Error, Result};

use super::decline::classify;
use super::stats::SchedulerStats;

pub struct SchedulerConfig {
    pub enabled: bool,
    pub tick_interval: Duration,
    pub batch_size: i64,
    pub shutdown_timeout: Duration,
}

pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    jobs: Arc<dyn JobRepository>,
    retries: Arc<dyn RetryEntryRepository>,
    config: SchedulerConfig,
    stats: Mutex<SchedulerStats>,
    shutdown: tokio::sync::Notify,
}

/// Result of a single tick, returned to callers of the manual
/// trigger and logged by the background loop.
#[derive(Debug, Default)]
pub struct TickResult {
    pub billed: u64,
    pub billed_succeeded: u64,
    pub retries_processed: u64,
    pub retries_succeeded: u64,
}

impl Scheduler {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        jobs: Arc<dyn JobRepository>,
        retries: Arc<dyn RetryEntryRepository>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            orchestrator,
            subscriptions,
            jobs,
            retries,
            config,
            stats: Mutex::new(SchedulerStats::default()),
            shutdown: tokio::sync::Notify::new(),
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats.lock().expect("scheduler stats mutex poisoned").clone()
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn tick_interval(&self) -> Duration {
        self.config.tick_interval
    }

    pub async fn list_jobs(&self, limit: i64) -> Result<Vec<Job>> {
        self.jobs.list(limit).await
    }

    pub async fn list_retries(&self, status: Option<&str>) -> Result<Vec<RetryEntry>> {
        self.retries.list(status).await
    }

    pub fn request_shutdown(&self) {
        self.shutdown.notify_waiters();
    }

    /// Long-lived background task: ticks on `config.tick_interval`
    /// until shutdown is requested, then waits for the in-flight tick
    /// to finish, bounded by `config.shutdown_timeout`.
    pub async fn run(self: Arc<Self>) {
        if !self.config.enabled {
            info!("scheduler disabled, not starting tick loop");
            return;
        }

        let mut ticker = tokio::time::interval(self.config.tick_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let result = tokio::time::timeout(self.config.shutdown_timeout, self.tick()).await;
                    match result {
                        Ok(Ok(tick)) => info!(
                            billed = tick.billed,
                            retries = tick.retries_processed,
                            "scheduler tick completed"
                        ),
                        Ok(Err(e)) => error!(error = %e, "scheduler tick failed"),
                        Err(_) => error!("scheduler tick exceeded shutdown_timeout budget"),
                    }
                }
                _ = self.shutdown.notified() => {
                    info!("scheduler shutdown requested, no new tick will start");
                    break;
                }
            }
        }
    }

    /// Manual trigger: runs billing discovery + charge once, out of
    /// band.
    pub async fn trigger(&self) -> Result<TickResult> {
        self.tick().await
    }

    async fn tick(&self) -> Result<TickResult> {
        let now = Utc::now();
        let mut result = TickResult::default();

        let due_subscriptions = self.subscriptions.due_for_billing(now, self.config.batch_size).await?;
        for subscription in due_subscriptions {
            result.billed += 1;
            match self.process_billing(subscription.id, subscription.payment_method_id, subscription.amount, &subscription.currency.0, now).await {
                Ok(true) => result.billed_succeeded += 1,
                Ok(false) => {}
                Err(e) => warn!(subscription_id = %subscription.id, error = %e, "billing attempt errored"),
            }
        }

        let due_retries = self.retries.due_for_retry(now, self.config.batch_size).await?;
        for entry in due_retries {
            result.retries_processed += 1;
            match self.process_retry(entry).await {
                Ok(true) => result.retries_succeeded += 1,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "retry attempt errored"),
            }
        }

        let mut stats = self.stats.lock().expect("scheduler stats mutex poisoned");
        stats.last_run = Some(now);
        stats.next_run = Some(now + chrono::Duration::from_std(self.config.tick_interval).unwrap_or_default());
        stats.processed_last = result.billed + result.retries_processed;
        stats.succeeded_last = result.billed_succeeded + result.retries_succeeded;
        stats.failed_last = stats.processed_last.saturating_sub(stats.succeeded_last);
        stats.total_ticks += 1;
        drop(stats);

        Ok(result)
    }

    /// Bill one due subscription end to end.
    /// Returns `Ok(true)` on a successful charge.
    async fn process_billing(
        &self,
        subscription_id: Uuid,
        payment_method_id: Uuid,
        amount: rust_decimal::Decimal,
        currency: &str,
        now: chrono::DateTime<Utc>,
    ) -> Result<bool> {
        let mut job = Job::new_billing(subscription_id, now);
        self.jobs.insert(&job).await?;
        job.start(now);
        self.jobs.update(&job).await?;

        let charge_request = ChargeRequest {
            subscription_id: Some(subscription_id),
            payment_method_id,
            amount,
            currency: currency.to_string(),
            idempotency_key: Some(format!("mit-{}-{}", subscription_id, now.timestamp())),
            marketplace: None,
            user_tier: None,
            client_id: None,
        };

        let outcome = self.orchestrator.charge(charge_request).await;
        let completed_at = Utc::now();

        match outcome {
            Ok(outcome) if outcome.transaction.status == crate::models::TransactionStatus::Success => {
                job.complete(completed_at, outcome.transaction.id, outcome.transaction.processor_used.clone());
                self.jobs.update(&job).await?;

                if let Some(mut subscription) = self.subscriptions.find(subscription_id).await? {
                    subscription.advance_period(completed_at);
                    self.subscriptions.update(&subscription).await?;
                }
                Ok(true)
            }
            Ok(outcome) => {
                let error_code = outcome.transaction.error_code.clone().unwrap_or_default();
                job.fail(completed_at, error_code.clone(), outcome.transaction.error_message.clone().unwrap_or_default());
                self.jobs.update(&job).await?;
                self.handle_decline(subscription_id, &error_code, completed_at).await?;
                Ok(false)
            }
            Err(e) => {
                job.fail(completed_at, e.code().to_string(), e.to_string());
                self.jobs.update(&job).await?;
                self.handle_decline(subscription_id, e.code(), completed_at).await?;
                Ok(false)
            }
        }
    }

    /// Process exactly one due retry entry.
    async fn process_retry(&self, mut entry: RetryEntry) -> Result<bool> {
        let now = Utc::now();
        entry.begin_processing(now)?;
        self.retries.update(&entry).await?;

        let subscription = self
            .subscriptions
            .find(entry.subscription_id)
            .await?
            .ok_or_else(|| {
                Error::not_found_code(codes::SUBSCRIPTION_NOT_FOUND, format!("subscription {} not found", entry.subscription_id))
            })?;

        let charge_request = ChargeRequest {
            subscription_id: Some(subscription.id),
            payment_method_id: subscription.payment_method_id,
            amount: subscription.amount,
            currency: subscription.currency.0.clone(),
            idempotency_key: Some(format!("retry-{}-{}", entry.id, entry.attempt + 1)),
            marketplace: None,
            user_tier: None,
            client_id: None,
        };

        let outcome = self.orchestrator.charge(charge_request).await;
        let completed_at = Utc::now();

        match outcome {
            Ok(outcome) if outcome.transaction.status == crate::models::TransactionStatus::Success => {
                entry.apply_success(completed_at, outcome.transaction.id, outcome.transaction.processor_used.clone());
                self.retries.update(&entry).await?;
                Ok(true)
            }
            Ok(outcome) => {
                let error_code = outcome.transaction.error_code.clone().unwrap_or_default();
                self.apply_decline_to_retry(&mut entry, &error_code, "", completed_at, subscription.id)
                    .await?;
                Ok(false)
            }
            Err(e) => {
                self.apply_decline_to_retry(&mut entry, e.code(), &e.to_string(), completed_at, subscription.id)
                    .await?;
                Ok(false)
            }
        }
    }

    /// Open or advance a RetryEntry for `subscription_id` in response
    /// to a billing-path failure.
    async fn handle_decline(&self, subscription_id: Uuid, error_code: &str, now: chrono::DateTime<Utc>) -> Result<()> {
        match classify(error_code) {
            DeclineType::Hard => {
                self.mark_past_due(subscription_id, now).await?;
                if let Some(mut entry) = self.retries.find_active_for_subscription(subscription_id).await? {
                    entry.apply_hard_decline(now, error_code.to_string(), String::new());
                    self.retries.update(&entry).await?;
                }
            }
            DeclineType::Soft => {
                let mut entry = self.retries.create_or_get_active(subscription_id, now).await?;
                if entry.status == RetryStatus::Pending {
                    entry.apply_soft_decline(now, error_code.to_string(), String::new());
                    self.retries.update(&entry).await?;
                }
            }
        }
        Ok(())
    }

    async fn apply_decline_to_retry(
        &self,
        entry: &mut RetryEntry,
        error_code: &str,
        error_message: &str,
        now: chrono::DateTime<Utc>,
        subscription_id: Uuid,
    ) -> Result<()> {
        match classify(error_code) {
            DeclineType::Hard => {
                entry.apply_hard_decline(now, error_code.to_string(), error_message.to_string());
                self.mark_past_due(subscription_id, now).await?;
            }
            DeclineType::Soft => {
                entry.apply_soft_decline(now, error_code.to_string(), error_message.to_string());
            }
        }
        self.retries.update(entry).await?;
        Ok(())
    }

    async fn mark_past_due(&self, subscription_id: Uuid, now: chrono::DateTime<Utc>) -> Result<()> {
        if let Some(mut subscription) = self.subscriptions.find(subscription_id).await? {
            subscription.status = SubscriptionStatus::PastDue;
            subscription.updated_at = now;
            self.subscriptions.update(&subscription).await?;
        }
        Ok(())
    }

    /// `retry_now(id)` manual operation: only valid
    /// while `status = pending`.
    pub async fn retry_now(&self, id: Uuid) -> Result<bool> {
        let entry = self
            .retries
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("retry entry {} not found", id)))?;
        if entry.status != RetryStatus::Pending {
            return Err(Error::validation("retry entry must be pending to retry now"));
        }
        self.process_retry(entry).await
    }

    /// `cancel(id)` manual operation: only valid while
    /// `status ∈ {pending, processing}`.
    pub async fn cancel(&self, id: Uuid) -> Result<()> {
        let mut entry = self
            .retries
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("retry entry {} not found", id)))?;
        entry.cancel(Utc::now())?;
        self.retries.update(&entry).await?;
        Ok(())
    }
}
