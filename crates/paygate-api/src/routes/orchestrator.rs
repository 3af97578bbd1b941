//! `/orchestrator/*` — charge and refund.

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use paygate_core::models::Transaction;
use paygate_core::orchestrator::{ChargeRequest, RefundRequest};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orchestrator/charge", post(charge))
        .route("/orchestrator/refund", post(refund))
}

#[derive(Debug, Deserialize)]
struct ChargeBody {
    subscription_id: Option<Uuid>,
    payment_method_id: Uuid,
    amount: Decimal,
    currency: String,
    idempotency_key: Option<String>,
    marketplace: Option<String>,
    user_tier: Option<String>,
    client_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct TransactionView {
    id: Uuid,
    subscription_id: Option<Uuid>,
    payment_method_id: Uuid,
    processor_used: String,
    amount: Decimal,
    currency: String,
    status: String,
    transaction_type: String,
    processor_transaction_id: Option<String>,
    original_transaction_id: Option<Uuid>,
    error_code: Option<String>,
    error_message: Option<String>,
    user_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl TransactionView {
    fn new(transaction: &Transaction, user_message: Option<String>) -> Self {
        Self {
            id: transaction.id,
            subscription_id: transaction.subscription_id,
            payment_method_id: transaction.payment_method_id,
            processor_used: transaction.processor_used.clone(),
            amount: transaction.amount,
            currency: transaction.currency.0.clone(),
            status: format!("{:?}", transaction.status).to_lowercase(),
            transaction_type: format!("{:?}", transaction.transaction_type).to_lowercase(),
            processor_transaction_id: transaction.processor_transaction_id.clone(),
            original_transaction_id: transaction.original_transaction_id,
            error_code: transaction.error_code.clone(),
            error_message: transaction.error_message.clone(),
            user_message,
            created_at: transaction.created_at,
        }
    }
}

async fn charge(State(state): State<AppState>, Json(body): Json<ChargeBody>) -> ApiResult<Response> {
    let request = ChargeRequest {
        subscription_id: body.subscription_id,
        payment_method_id: body.payment_method_id,
        amount: body.amount,
        currency: body.currency,
        idempotency_key: body.idempotency_key,
        marketplace: body.marketplace,
        user_tier: body.user_tier,
        client_id: body.client_id,
    };

    let outcome = state.orchestrator.charge(request).await.map_err(ApiError::from)?;

    let status = if outcome.transaction.status == paygate_core::models::TransactionStatus::Success {
        StatusCode::CREATED
    } else {
        StatusCode::PAYMENT_REQUIRED
    };

    let view = TransactionView::new(&outcome.transaction, outcome.user_message);
    let mut response = (status, Json(view)).into_response();
    if outcome.replayed {
        response
            .headers_mut()
            .insert("X-Idempotent-Replay", HeaderValue::from_static("true"));
    }
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct RefundBody {
    transaction_id: Uuid,
    amount: Decimal,
    reason: String,
}

async fn refund(State(state): State<AppState>, Json(body): Json<RefundBody>) -> ApiResult<Json<TransactionView>> {
    let request = RefundRequest {
        transaction_id: body.transaction_id,
        amount: body.amount,
        reason: body.reason,
    };
    let outcome = state.orchestrator.refund(request).await.map_err(ApiError::from)?;
    Ok(Json(TransactionView::new(&outcome.transaction, None)))
}
