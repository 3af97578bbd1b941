//! HTTP processor client, built around a `StripeGateway`-style reqwest
//! call pattern generalized to a generic
//! `{success, transaction_id, auth_code, error_code, error_message}`
//! wire contract.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct ChargeResult {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub auth_code: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RefundResult {
    pub success: bool,
    pub refund_id: Option<String>,
    pub error_code: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChargeWireRequest<'a> {
    amount: Decimal,
    currency: &'a str,
    token: &'a str,
    idempotency_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChargeWireResponse {
    success: bool,
    transaction_id: Option<String>,
    auth_code: Option<String>,
    error_code: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Serialize)]
struct RefundWireRequest<'a> {
    original_transaction_id: &'a str,
    amount: Decimal,
    reason: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefundWireResponse {
    success: bool,
    refund_id: Option<String>,
    error_code: Option<String>,
}

/// A single upstream processor, identified by a stable name
/// (`processor_a`, `processor_b`, ...). `charge`/`refund` never
/// dedupe client-side — the upstream processor is expected to honor
/// `idempotency_key`.
#[async_trait]
pub trait ProcessorClient: Send + Sync {
    fn name(&self) -> &str;

    async fn charge(
        &self,
        amount: Decimal,
        currency: &str,
        token: &str,
        idempotency_key: &str,
    ) -> Result<ChargeResult>;

    async fn refund(&self, original_transaction_id: &str, amount: Decimal, reason: &str) -> Result<RefundResult>;

    /// Advisory health bit, consulted before each call. A
    /// call-time transport failure flips it false immediately; a
    /// background probe is the only thing that flips it back on.
    fn is_healthy(&self) -> bool;

    /// Hit the processor's `/health` endpoint and update the bit.
    /// Returns the freshly observed health state.
    async fn probe_health(&self) -> bool;
}

pub struct HttpProcessorClient {
    name: String,
    base_url: String,
    http: reqwest::Client,
    healthy: Arc<AtomicBool>,
}

impl HttpProcessorClient {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, call_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .expect("processor http client builds");

        Self {
            name: name.into(),
            base_url: base_url.into(),
            http,
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }

    fn mark_unhealthy(&self) {
        self.healthy.store(false, Ordering::SeqCst);
    }

    fn mark_healthy(&self) {
        self.healthy.store(true, Ordering::SeqCst);
    }

    /// Outcome classification for a completed HTTP response.
    /// Transport-failure statuses mark the client
    /// unhealthy and surface as `Error::Network` so the orchestrator
    /// knows to fail over; any other non-success 4xx is fatal for the
    /// attempt but is not a failover trigger.
    fn classify_status(&self, status: StatusCode) -> Option<Error> {
        if status.is_success() {
            return None;
        }
        if status == StatusCode::PAYMENT_REQUIRED {
            // Business decline: final for this attempt, not a
            // transport failure. Caller inspects the parsed body.
            return None;
        }
        let transport_failure = matches!(
            status.as_u16(),
            408 | 429 | 500 | 502 | 503 | 504
        );
        if transport_failure {
            self.mark_unhealthy();
            Some(Error::network(format!(
                "processor {} returned transport failure status {}",
                self.name, status
            )))
        } else {
            Some(Error::payment(
                "FATAL_REQUEST_ERROR",
                format!("processor {} rejected the request: {}", self.name, status),
            ))
        }
    }
}

#[async_trait]
impl ProcessorClient for HttpProcessorClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn charge(
        &self,
        amount: Decimal,
        currency: &str,
        token: &str,
        idempotency_key: &str,
    ) -> Result<ChargeResult> {
        let url = format!("{}/charge", self.base_url);
        let body = ChargeWireRequest {
            amount,
            currency,
            token,
            idempotency_key,
        };

        let response = self.http.post(&url).json(&body).send().await.map_err(|e| {
            self.mark_unhealthy();
            Error::network(format!("processor {} charge call failed: {}", self.name, e))
        })?;

        let status = response.status();
        if let Some(err) = self.classify_status(status) {
            return Err(err);
        }

        let wire: ChargeWireResponse = response
            .json()
            .await
            .map_err(|e| Error::network(format!("processor {} returned malformed charge body: {}", self.name, e)))?;

        Ok(ChargeResult {
            success: wire.success,
            transaction_id: wire.transaction_id,
            auth_code: wire.auth_code,
            error_code: wire.error_code,
            error_message: wire.error_message,
        })
    }

    async fn refund(&self, original_transaction_id: &str, amount: Decimal, reason: &str) -> Result<RefundResult> {
        let url = format!("{}/refund", self.base_url);
        let body = RefundWireRequest {
            original_transaction_id,
            amount,
            reason,
        };

        let response = self.http.post(&url).json(&body).send().await.map_err(|e| {
            self.mark_unhealthy();
            Error::network(format!("processor {} refund call failed: {}", self.name, e))
        })?;

        let status = response.status();
        if let Some(err) = self.classify_status(status) {
            return Err(err);
        }

        let wire: RefundWireResponse = response
            .json()
            .await
            .map_err(|e| Error::network(format!("processor {} returned malformed refund body: {}", self.name, e)))?;

        Ok(RefundResult {
            success: wire.success,
            refund_id: wire.refund_id,
            error_code: wire.error_code,
        })
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn probe_health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                self.mark_healthy();
                true
            }
            _ => {
                self.mark_unhealthy();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpProcessorClient {
        HttpProcessorClient::new("processor_a", "http://localhost:9001", Duration::from_secs(5))
    }

    #[test]
    fn decline_status_does_not_mark_unhealthy() {
        let c = client();
        let err = c.classify_status(StatusCode::PAYMENT_REQUIRED);
        assert!(err.is_none());
        assert!(c.is_healthy());
    }

    #[test]
    fn transport_failure_marks_unhealthy() {
        let c = client();
        let err = c.classify_status(StatusCode::SERVICE_UNAVAILABLE);
        assert!(matches!(err, Some(Error::Network(_))));
        assert!(!c.is_healthy());
    }

    #[test]
    fn other_4xx_is_fatal_not_transport() {
        let c = client();
        let err = c.classify_status(StatusCode::BAD_REQUEST);
        assert!(matches!(err, Some(Error::Payment { .. })));
        assert!(c.is_healthy());
    }
}
