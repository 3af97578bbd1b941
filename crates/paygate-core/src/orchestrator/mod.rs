//! Orchestrator: coordinates a single charge or refund —
//! idempotency check, routing, token pick, primary/secondary
//! failover, persistence, event emission.

mod charge;
mod events;
mod messages;
mod refund;
mod token;

pub use charge::{ChargeOutcome, ChargeRequest};
pub use events::{Event, EventBus};
pub use messages::user_message_for;
pub use refund::{RefundOutcome, RefundRequest};
pub use token::{select_token, SelectedToken};

use std::sync::Arc;

use uuid::Uuid;

use crate::cache::IdempotencyCache;
use crate::processor::ProcessorRegistry;
use crate::repository::{PaymentMethodRepository, TransactionRepository};
use crate::rules::RuleEngine;

/// `(primary, secondary)` fallback pair used when routing fails or
/// returns nothing usable.
pub const DEFAULT_ROUTE: (&str, &str) = ("processor_a", "processor_b");

pub struct Orchestrator {
    pub(crate) payment_methods: Arc<dyn PaymentMethodRepository>,
    pub(crate) transactions: Arc<dyn TransactionRepository>,
    pub(crate) processors: ProcessorRegistry,
    pub(crate) rules: Arc<RuleEngine>,
    pub(crate) idempotency: Option<IdempotencyCache>,
    pub(crate) events: EventBus,
}

impl Orchestrator {
    pub fn new(
        payment_methods: Arc<dyn PaymentMethodRepository>,
        transactions: Arc<dyn TransactionRepository>,
        processors: ProcessorRegistry,
        rules: Arc<RuleEngine>,
        idempotency: Option<IdempotencyCache>,
    ) -> Self {
        Self {
            payment_methods,
            transactions,
            processors,
            rules,
            idempotency,
            events: EventBus::new(),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn new_server_id() -> Uuid {
        Uuid::new_v4()
    }

    /// `(name, is_healthy)` for every configured processor, used by the
    /// `/health` dependency rollup.
    pub fn processor_health(&self) -> Vec<(String, bool)> {
        self.processors
            .names()
            .into_iter()
            .map(|name| {
                let healthy = self.processors.get(&name).map(|c| c.is_healthy()).unwrap_or(false);
                (name, healthy)
            })
            .collect()
    }

    pub fn cache_configured(&self) -> bool {
        self.idempotency.is_some()
    }

    /// Cache liveness for `/health`: `true` when no cache
    /// is configured at all would be misleading, so an unconfigured
    /// cache reports unhealthy rather than silently "fine".
    pub async fn cache_healthy(&self) -> bool {
        match &self.idempotency {
            Some(cache) => cache.ping().await,
            None => false,
        }
    }

    /// 24h rollup for `/admin/stats`.
    pub async fn stats_last_24h(&self) -> crate::Result<crate::repository::TransactionStats> {
        self.transactions.stats_last_24h().await
    }
}
