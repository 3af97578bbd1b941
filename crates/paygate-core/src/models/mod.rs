//! Data model for the payment control plane.

pub mod job;
pub mod payment_method;
pub mod retry_entry;
pub mod rule;
pub mod subscription;
pub mod transaction;

pub use job::{Job, JobStatus, JobType};
pub use payment_method::{PaymentMethod, TokenType};
pub use retry_entry::{DeclineType, RetryEntry, RetryStatus};
pub use rule::{ConditionType, ConditionValue, Rule, RuleRequest};
pub use subscription::{BillingCycle, Subscription, SubscriptionStatus};
pub use transaction::{Transaction, TransactionStatus, TransactionType};

use serde::{Deserialize, Serialize};

/// ISO-4217-ish currency code. Kept as a thin wrapper rather than a
/// closed enum since the orchestrator never converts currency itself
/// — it only needs to compare and persist it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct Currency(pub String);

impl Currency {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Currency::new(s)
    }
}
