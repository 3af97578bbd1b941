//! Transaction model: the append-only authoritative log of
//! every charge and refund attempt.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Currency;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
pub enum TransactionType {
    Charge,
    Refund,
}

/// One row in the append-only transaction log.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub payment_method_id: Uuid,
    /// Name of the processor that handled this attempt, or "none" if
    /// both primary and secondary failed transport-wise.
    pub processor_used: String,
    /// Signed decimal; negative indicates a refund.
    pub amount: Decimal,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub transaction_type: TransactionType,
    pub idempotency_key: String,
    /// The processor's own transaction id, if one was returned.
    pub processor_transaction_id: Option<String>,
    /// For refunds: the charge this refund applies to.
    pub original_transaction_id: Option<Uuid>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}
