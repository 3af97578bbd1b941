use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::codes;
use crate::models::{Transaction, TransactionStatus, TransactionType};
use crate::{Error, Result};

use super::Orchestrator;

#[derive(Debug, Clone)]
pub struct RefundRequest {
    pub transaction_id: Uuid,
    pub amount: Decimal,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct RefundOutcome {
    pub transaction: Transaction,
}

impl Orchestrator {
    pub async fn refund(&self, request: RefundRequest) -> Result<RefundOutcome> {
        if request.amount <= Decimal::ZERO {
            return Err(Error::validation_code(codes::INVALID_REFUND_AMOUNT, "refund amount must be positive"));
        }

        // Step 1: load the original transaction.
        let original = self
            .transactions
            .find(request.transaction_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("transaction {} not found", request.transaction_id)))?;

        // Per-request amount validation. Cumulative refund tracking
        // is out of scope here; only this request's amount is
        // checked against the original.
        if request.amount > original.amount {
            return Err(Error::validation_code(
                codes::INVALID_REFUND_AMOUNT,
                "refund amount exceeds the original transaction amount",
            ));
        }

        // Refunds always route to the processor that authorized the
        // original charge; there is no cross-processor refund.
        let client = self
            .processors
            .get(&original.processor_used)
            .ok_or_else(|| Error::unprocessable(format!("processor {} is not configured", original.processor_used)))?;

        // Step 4: the original must carry a processor transaction id.
        let original_processor_txn_id = original
            .processor_transaction_id
            .clone()
            .ok_or_else(|| Error::unprocessable("original transaction has no processor transaction id on file"))?;

        // Step 5: call refund and record the result.
        let result = client
            .refund(&original_processor_txn_id, request.amount, &request.reason)
            .await?;

        if !result.success {
            return Err(Error::payment(
                result.error_code.unwrap_or_else(|| "REFUND_FAILED".to_string()),
                "refund was declined by the processor",
            ));
        }

        let refund_transaction = Transaction {
            id: Uuid::new_v4(),
            subscription_id: original.subscription_id,
            payment_method_id: original.payment_method_id,
            processor_used: original.processor_used.clone(),
            amount: -request.amount,
            currency: original.currency.clone(),
            status: TransactionStatus::Refunded,
            transaction_type: TransactionType::Refund,
            idempotency_key: format!("refund-{}", Uuid::new_v4()),
            processor_transaction_id: result.refund_id,
            original_transaction_id: Some(original.id),
            error_code: None,
            error_message: None,
            created_at: Utc::now(),
        };

        let persisted = self.transactions.insert(refund_transaction).await?;
        Ok(RefundOutcome { transaction: persisted })
    }
}
