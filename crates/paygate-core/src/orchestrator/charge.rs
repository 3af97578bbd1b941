use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::codes;
use crate::models::rule::RuleRequest;
use crate::models::{Currency, Transaction, TransactionStatus, TransactionType};
use crate::{Error, Result};

use super::events::Event;
use super::token::select_token;
use super::{Orchestrator, DEFAULT_ROUTE};

#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub subscription_id: Option<Uuid>,
    pub payment_method_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub idempotency_key: Option<String>,
    pub marketplace: Option<String>,
    pub user_tier: Option<String>,
    pub client_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub transaction: Transaction,
    pub replayed: bool,
    pub user_message: Option<String>,
    pub failover: Option<(String, String)>,
}

impl Orchestrator {
    pub async fn charge(&self, request: ChargeRequest) -> Result<ChargeOutcome> {
        if request.amount <= Decimal::ZERO {
            return Err(Error::validation_code(codes::VALIDATION_ERROR, "amount must be positive"));
        }
        if request.currency.trim().is_empty() {
            return Err(Error::validation_code(codes::INVALID_REQUEST, "currency is required"));
        }

        let server_id = Self::new_server_id();
        let idempotency_key = request
            .idempotency_key
            .clone()
            .unwrap_or_else(|| format!("auto-{}", server_id));
        let has_client_key = request.idempotency_key.is_some();

        self.events.emit(Event::ChargeInitiated {
            transaction_id: server_id,
            at: Utc::now(),
        });

        // Step 2: idempotency check (cache, then durable store).
        if has_client_key {
            if let Some(cached) = self.load_replay(&idempotency_key).await? {
                return Ok(ChargeOutcome {
                    transaction: cached,
                    replayed: true,
                    user_message: None,
                    failover: None,
                });
            }
        }

        // Step 3: routing.
        let mut rule_request = RuleRequest::default();
        rule_request.amount = request.amount;
        rule_request.currency = request.currency.clone();
        rule_request.marketplace = request.marketplace.clone();
        rule_request.user_tier = request.user_tier.clone();
        rule_request.client_id = request.client_id.clone();

        let evaluation = self.rules.evaluate(&rule_request);
        let primary_name = if self.processors.get(&evaluation.target_processor).is_some() {
            evaluation.target_processor
        } else {
            DEFAULT_ROUTE.0.to_string()
        };
        let secondary_name = if primary_name == DEFAULT_ROUTE.0 {
            DEFAULT_ROUTE.1.to_string()
        } else {
            DEFAULT_ROUTE.0.to_string()
        };

        // Step 4: payment method load.
        let method = self
            .payment_methods
            .find(request.payment_method_id)
            .await?
            .ok_or_else(|| Error::not_found_code(codes::PAYMENT_METHOD_NOT_FOUND, "payment method not found"))?;

        // Step 5: token selection against the primary processor.
        let primary_token = select_token(&method, &primary_name);

        let mut processor_used = "none".to_string();
        let mut processor_transaction_id = None;
        let mut status = TransactionStatus::Failed;
        let mut error_code = None;
        let mut error_message = None;
        let mut failover_triggered = None;

        let primary_client = self.processors.get(&primary_name);
        let primary_attempt = match (&primary_client, &primary_token) {
            (Some(client), Some(token)) if client.is_healthy() => {
                Some(client.charge(request.amount, &request.currency, token.value(), &idempotency_key).await)
            }
            _ => None,
        };

        let mut needs_failover = primary_attempt.is_none();

        match primary_attempt {
            Some(Ok(result)) if result.success => {
                processor_used = primary_name.clone();
                processor_transaction_id = result.transaction_id;
                status = TransactionStatus::Success;
            }
            Some(Ok(result)) => {
                // Business decline: final, no failover.
                processor_used = primary_name.clone();
                processor_transaction_id = result.transaction_id;
                status = TransactionStatus::Failed;
                error_code = result.error_code;
                error_message = result.error_message;
            }
            Some(Err(Error::Network(_))) => {
                needs_failover = true;
            }
            Some(Err(other)) => {
                // Fatal for this attempt; not a failover trigger.
                processor_used = primary_name.clone();
                status = TransactionStatus::Failed;
                error_code = Some(other.code().to_string());
                error_message = Some(other.to_string());
            }
            None => {
                needs_failover = true;
            }
        }

        if needs_failover {
            let secondary_client = self.processors.get(&secondary_name);
            let secondary_token = select_token(&method, &secondary_name);

            let secondary_attempt = match (&secondary_client, &secondary_token) {
                (Some(client), Some(token)) if client.is_healthy() => Some(
                    client
                        .charge(request.amount, &request.currency, token.value(), &idempotency_key)
                        .await,
                ),
                _ => None,
            };

            match secondary_attempt {
                Some(Ok(result)) => {
                    processor_used = secondary_name.clone();
                    processor_transaction_id = result.transaction_id;
                    status = if result.success {
                        TransactionStatus::Success
                    } else {
                        TransactionStatus::Failed
                    };
                    error_code = result.error_code;
                    error_message = result.error_message;
                    failover_triggered = Some((primary_name.clone(), secondary_name.clone()));
                }
                _ => {
                    processor_used = "none".to_string();
                    status = TransactionStatus::Failed;
                    error_code = Some(codes::PROCESSORS_UNAVAILABLE.to_string());
                    error_message = Some("both processors are unavailable".to_string());
                }
            }
        }

        let new_transaction = Transaction {
            id: server_id,
            subscription_id: request.subscription_id,
            payment_method_id: request.payment_method_id,
            processor_used,
            amount: request.amount,
            currency: Currency::new(&request.currency),
            status,
            transaction_type: TransactionType::Charge,
            idempotency_key: idempotency_key.clone(),
            processor_transaction_id,
            original_transaction_id: None,
            error_code: error_code.clone(),
            error_message,
            created_at: Utc::now(),
        };

        // Step 8: persist. A persistence failure is logged upstream by
        // the caller; the decision we already computed still goes
        // back to the caller.
        let persisted = self.transactions.insert(new_transaction).await?;

        // Step 9: cache the response for replay.
        if let Some(cache) = &self.idempotency {
            let _ = cache.set(&idempotency_key, &persisted).await;
        }

        if let Some((from, to)) = &failover_triggered {
            self.events.emit(Event::FailoverTriggered {
                transaction_id: persisted.id,
                from: from.clone(),
                to: to.clone(),
            });
        }

        match persisted.status {
            TransactionStatus::Success => {
                self.events.emit(Event::ChargeSucceeded {
                    transaction_id: persisted.id,
                    processor_used: persisted.processor_used.clone(),
                    amount: persisted.amount,
                });
            }
            _ => {
                self.events.emit(Event::ChargeFailed {
                    transaction_id: persisted.id,
                    error_code: persisted.error_code.clone().unwrap_or_default(),
                });
            }
        }

        let user_message = persisted.error_code.as_deref().map(super::messages::user_message_for).map(str::to_string);

        Ok(ChargeOutcome {
            transaction: persisted,
            replayed: false,
            user_message,
            failover: failover_triggered,
        })
    }

    /// Idempotency check: cache first, then the durable store — a
    /// cache miss with a DB hit still replays the prior result.
    async fn load_replay(&self, idempotency_key: &str) -> Result<Option<Transaction>> {
        if let Some(cache) = &self.idempotency {
            if let Some(hit) = cache.get::<Transaction>(idempotency_key).await? {
                return Ok(Some(hit));
            }
        }
        if let Some(hit) = self.transactions.find_by_idempotency_key(idempotency_key).await? {
            if let Some(cache) = &self.idempotency {
                let _ = cache.set(idempotency_key, &hit).await;
            }
            return Ok(Some(hit));
        }
        Ok(None)
    }
}
