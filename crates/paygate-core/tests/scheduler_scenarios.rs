//! End-to-end scenarios against the scheduler + retry queue (spec
//! §4.4, §8 scenarios 5 and 6), driven by in-memory fakes for the
//! subscription/job/retry repositories and a scripted processor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use paygate_core::models::{
    BillingCycle, Currency, Job, PaymentMethod, RetryEntry, RetryStatus, Subscription, SubscriptionStatus, TokenType,
};
use paygate_core::orchestrator::Orchestrator;
use paygate_core::processor::{ChargeResult, ProcessorClient, ProcessorRegistry, RefundResult};
use paygate_core::repository::{
    JobRepository, PaymentMethodRepository, RetryEntryRepository, SubscriptionRepository, TransactionRepository,
    TransactionStats,
};
use paygate_core::rules::RuleEngine;
use paygate_core::scheduler::{Scheduler, SchedulerConfig};
use paygate_core::Result;

struct FakePaymentMethods(Mutex<HashMap<Uuid, PaymentMethod>>);

#[async_trait]
impl PaymentMethodRepository for FakePaymentMethods {
    async fn find(&self, id: Uuid) -> Result<Option<PaymentMethod>> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Default)]
struct FakeTransactions(Mutex<Vec<paygate_core::models::Transaction>>);

#[async_trait]
impl TransactionRepository for FakeTransactions {
    async fn find(&self, id: Uuid) -> Result<Option<paygate_core::models::Transaction>> {
        Ok(self.0.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<paygate_core::models::Transaction>> {
        Ok(self.0.lock().unwrap().iter().find(|t| t.idempotency_key == key).cloned())
    }

    async fn insert(&self, transaction: paygate_core::models::Transaction) -> Result<paygate_core::models::Transaction> {
        let mut rows = self.0.lock().unwrap();
        if let Some(existing) = rows.iter().find(|t| t.idempotency_key == transaction.idempotency_key) {
            return Ok(existing.clone());
        }
        rows.push(transaction.clone());
        Ok(transaction)
    }

    async fn stats_last_24h(&self) -> Result<TransactionStats> {
        Ok(TransactionStats::default())
    }
}

struct FakeSubscriptions(Mutex<HashMap<Uuid, Subscription>>);

#[async_trait]
impl SubscriptionRepository for FakeSubscriptions {
    async fn find(&self, id: Uuid) -> Result<Option<Subscription>> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }

    async fn update(&self, subscription: &Subscription) -> Result<()> {
        self.0.lock().unwrap().insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn due_for_billing(&self, now: chrono::DateTime<Utc>, limit: i64) -> Result<Vec<Subscription>> {
        let mut due: Vec<Subscription> = self
            .0
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.is_billable() && s.next_billing_date <= now)
            .cloned()
            .collect();
        due.sort_by_key(|s| s.next_billing_date);
        due.truncate(limit as usize);
        Ok(due)
    }
}

#[derive(Default)]
struct FakeJobs(Mutex<Vec<Job>>);

#[async_trait]
impl JobRepository for FakeJobs {
    async fn insert(&self, job: &Job) -> Result<()> {
        self.0.lock().unwrap().push(job.clone());
        Ok(())
    }

    async fn update(&self, job: &Job) -> Result<()> {
        let mut rows = self.0.lock().unwrap();
        if let Some(existing) = rows.iter_mut().find(|j| j.id == job.id) {
            *existing = job.clone();
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.0.lock().unwrap().iter().find(|j| j.id == id).cloned())
    }

    async fn list(&self, limit: i64) -> Result<Vec<Job>> {
        let rows = self.0.lock().unwrap();
        Ok(rows.iter().rev().take(limit as usize).cloned().collect())
    }
}

#[derive(Default)]
struct FakeRetries(Mutex<Vec<RetryEntry>>);

impl FakeRetries {
    /// Test-only hook to make an entry immediately due, simulating the
    /// passage of time across the fixed back-off schedule.
    fn force_due(&self, id: Uuid) {
        let mut rows = self.0.lock().unwrap();
        if let Some(entry) = rows.iter_mut().find(|e| e.id == id) {
            entry.next_retry_at = Utc::now() - chrono::Duration::seconds(1);
        }
    }

    fn snapshot(&self) -> Vec<RetryEntry> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl RetryEntryRepository for FakeRetries {
    async fn find(&self, id: Uuid) -> Result<Option<RetryEntry>> {
        Ok(self.0.lock().unwrap().iter().find(|e| e.id == id).cloned())
    }

    async fn find_active_for_subscription(&self, subscription_id: Uuid) -> Result<Option<RetryEntry>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.subscription_id == subscription_id && e.status.is_active())
            .cloned())
    }

    async fn create_or_get_active(&self, subscription_id: Uuid, now: chrono::DateTime<Utc>) -> Result<RetryEntry> {
        let mut rows = self.0.lock().unwrap();
        if let Some(existing) = rows.iter().find(|e| e.subscription_id == subscription_id && e.status.is_active()) {
            return Ok(existing.clone());
        }
        let entry = RetryEntry::new(subscription_id, now);
        rows.push(entry.clone());
        Ok(entry)
    }

    async fn update(&self, entry: &RetryEntry) -> Result<()> {
        let mut rows = self.0.lock().unwrap();
        if let Some(existing) = rows.iter_mut().find(|e| e.id == entry.id) {
            *existing = entry.clone();
        }
        Ok(())
    }

    async fn due_for_retry(&self, now: chrono::DateTime<Utc>, limit: i64) -> Result<Vec<RetryEntry>> {
        let mut due: Vec<RetryEntry> = self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.status == RetryStatus::Pending && e.next_retry_at <= now)
            .cloned()
            .collect();
        due.sort_by_key(|e| e.next_retry_at);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn list(&self, status: Option<&str>) -> Result<Vec<RetryEntry>> {
        let rows = self.0.lock().unwrap();
        Ok(match status {
            Some(s) => rows.iter().filter(|e| format!("{:?}", e.status).to_lowercase() == s).cloned().collect(),
            None => rows.clone(),
        })
    }
}

struct FakeProcessor {
    name: String,
    healthy: AtomicBool,
    charge_script: Mutex<Vec<ChargeResult>>,
}

impl FakeProcessor {
    fn new(name: &str, scripted: Vec<ChargeResult>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            healthy: AtomicBool::new(true),
            charge_script: Mutex::new(scripted),
        })
    }
}

#[async_trait]
impl ProcessorClient for FakeProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn charge(&self, _amount: Decimal, _currency: &str, _token: &str, _idempotency_key: &str) -> Result<ChargeResult> {
        let mut script = self.charge_script.lock().unwrap();
        if script.is_empty() {
            panic!("{} charge called more times than scripted", self.name);
        }
        Ok(script.remove(0))
    }

    async fn refund(&self, _original_transaction_id: &str, _amount: Decimal, _reason: &str) -> Result<RefundResult> {
        panic!("refund not expected in scheduler scenarios");
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn probe_health(&self) -> bool {
        true
    }
}

fn decline(error_code: &str) -> ChargeResult {
    ChargeResult {
        success: false,
        transaction_id: Some("tx".to_string()),
        auth_code: None,
        error_code: Some(error_code.to_string()),
        error_message: Some(error_code.to_string()),
    }
}

fn subscription(payment_method_id: Uuid, amount: Decimal) -> Subscription {
    let now = Utc::now();
    Subscription {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        plan_id: Uuid::new_v4(),
        payment_method_id,
        status: SubscriptionStatus::Active,
        amount,
        currency: Currency::new("USD"),
        billing_cycle: BillingCycle::Monthly,
        current_period_start: now - chrono::Duration::days(30),
        current_period_end: now,
        next_billing_date: now,
        cancel_at_period_end: false,
        canceled_at: None,
        trial_start: None,
        trial_end: None,
        created_at: now,
        updated_at: now,
    }
}

fn payment_method() -> PaymentMethod {
    PaymentMethod {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        token_type: TokenType::Network,
        network_token: Some("ntk_x".to_string()),
        processor_a_token: None,
        processor_b_token: None,
        created_at: Utc::now(),
    }
}

fn scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        enabled: true,
        tick_interval: Duration::from_secs(60),
        batch_size: 10,
        shutdown_timeout: Duration::from_secs(5),
    }
}

fn build(sub: Subscription, method: PaymentMethod, charges: Vec<ChargeResult>) -> (Arc<Scheduler>, Arc<FakeSubscriptions>, Arc<FakeRetries>) {
    build_with_config(sub, method, charges, scheduler_config())
}

fn build_with_config(
    sub: Subscription,
    method: PaymentMethod,
    charges: Vec<ChargeResult>,
    config: SchedulerConfig,
) -> (Arc<Scheduler>, Arc<FakeSubscriptions>, Arc<FakeRetries>) {
    let pm_id = method.id;
    let mut pm_map = HashMap::new();
    pm_map.insert(pm_id, method);
    let payment_methods = Arc::new(FakePaymentMethods(Mutex::new(pm_map)));
    let transactions = Arc::new(FakeTransactions::default());

    let mut registry = ProcessorRegistry::new();
    registry.insert(FakeProcessor::new("processor_a", charges));
    registry.insert(FakeProcessor::new("processor_b", Vec::new()));

    let rules = Arc::new(RuleEngine::with_rules(Vec::new()));
    let orchestrator = Arc::new(Orchestrator::new(payment_methods, transactions, registry, rules, None));

    let mut sub_map = HashMap::new();
    sub_map.insert(sub.id, sub);
    let subscriptions = Arc::new(FakeSubscriptions(Mutex::new(sub_map)));
    let jobs = Arc::new(FakeJobs::default());
    let retries = Arc::new(FakeRetries::default());

    let scheduler = Arc::new(Scheduler::new(orchestrator, subscriptions.clone(), jobs, retries.clone(), config));
    (scheduler, subscriptions, retries)
}

#[tokio::test]
async fn soft_decline_opens_a_retry_entry_and_escalates_to_exhausted() {
    let method = payment_method();
    let sub = subscription(method.id, dec!(29.00));
    let sub_id = sub.id;

    // First tick (billing) declines soft, then two more ticks (retry
    // path) decline soft again until the schedule is exhausted.
    let charges = vec![decline("insufficient_funds"), decline("insufficient_funds"), decline("insufficient_funds")];
    let (scheduler, _subscriptions, retries) = build(sub, method, charges);

    scheduler.trigger().await.expect("first tick runs");
    let entries = retries.snapshot();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].attempt, 1);
    assert_eq!(entries[0].status, RetryStatus::Pending);
    assert!((entries[0].next_retry_at - Utc::now()).num_minutes() >= 55);

    let entry_id = entries[0].id;
    retries.force_due(entry_id);
    scheduler.trigger().await.expect("second tick runs");
    let entry = retries.snapshot().into_iter().find(|e| e.id == entry_id).unwrap();
    assert_eq!(entry.attempt, 2);
    assert_eq!(entry.status, RetryStatus::Pending);

    retries.force_due(entry_id);
    scheduler.trigger().await.expect("third tick runs");
    let entry = retries.snapshot().into_iter().find(|e| e.id == entry_id).unwrap();
    assert_eq!(entry.attempt, 3);
    assert_eq!(entry.status, RetryStatus::Exhausted);

    let _ = sub_id;
}

#[tokio::test]
async fn hard_decline_marks_subscription_past_due_without_a_retry_entry() {
    let method = payment_method();
    let sub = subscription(method.id, dec!(29.00));
    let sub_id = sub.id;

    let charges = vec![decline("expired_card")];
    let (scheduler, subscriptions, retries) = build(sub, method, charges);

    scheduler.trigger().await.expect("tick runs");

    let updated = subscriptions.0.lock().unwrap().get(&sub_id).cloned().unwrap();
    assert_eq!(updated.status, SubscriptionStatus::PastDue);
    assert!(retries.snapshot().is_empty());
}

#[tokio::test]
async fn requesting_shutdown_stops_the_run_loop_within_the_configured_timeout() {
    let method = payment_method();
    let mut sub = subscription(method.id, dec!(29.00));
    // Not due: the run loop should tick quietly with nothing to process
    // while we exercise shutdown, not race a scripted charge.
    sub.next_billing_date = Utc::now() + chrono::Duration::days(1);

    let config = SchedulerConfig {
        enabled: true,
        tick_interval: Duration::from_millis(20),
        batch_size: 10,
        shutdown_timeout: Duration::from_secs(2),
    };
    let (scheduler, _subscriptions, _retries) = build_with_config(sub, method, Vec::new(), config);

    let handle = tokio::spawn(scheduler.clone().run());

    tokio::time::sleep(Duration::from_millis(60)).await;
    scheduler.request_shutdown();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("run() must stop within shutdown_timeout")
        .expect("run() task must not panic");
}
