//! `/bpas/*` — rule engine HTTP surface.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paygate_core::models::rule::{Rule, RuleRequest};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bpas/evaluate", post(evaluate))
        .route("/bpas/rules", get(list_rules))
        .route("/bpas/rules/:name", put(replace_rule))
        .route("/bpas/reload", post(reload))
}

#[derive(Debug, Deserialize)]
struct EvaluateBody {
    amount: Decimal,
    currency: String,
    marketplace: Option<String>,
    user_tier: Option<String>,
    user_id: Option<String>,
    client_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct AlternativeView {
    target_processor: String,
    rule_name: Option<String>,
    confidence: f64,
}

#[derive(Debug, Serialize)]
struct EvaluationView {
    target_processor: String,
    rule_matched: Option<String>,
    rule_priority: Option<i32>,
    confidence: f64,
    alternatives: Vec<AlternativeView>,
}

async fn evaluate(State(state): State<AppState>, Json(body): Json<EvaluateBody>) -> Json<EvaluationView> {
    let request = RuleRequest {
        amount: body.amount,
        currency: body.currency,
        marketplace: body.marketplace,
        user_tier: body.user_tier,
        user_id: body.user_id,
        client_id: body.client_id,
    };
    let evaluation = state.rules.evaluate(&request);
    Json(EvaluationView {
        target_processor: evaluation.target_processor,
        rule_matched: evaluation.rule_matched,
        rule_priority: evaluation.rule_priority,
        confidence: evaluation.confidence,
        alternatives: evaluation
            .alternatives
            .into_iter()
            .map(|a| AlternativeView {
                target_processor: a.target_processor,
                rule_name: a.rule_name,
                confidence: a.confidence,
            })
            .collect(),
    })
}

async fn list_rules(State(state): State<AppState>) -> Json<Vec<Rule>> {
    Json(state.rules.rules())
}

async fn replace_rule(State(state): State<AppState>, Path(name): Path<String>, Json(rule): Json<Rule>) -> StatusCodeOnly {
    state.rules.update(&name, rule);
    StatusCodeOnly
}

#[derive(Debug, Serialize)]
struct ReloadView {
    reload_count: u64,
}

async fn reload(State(state): State<AppState>) -> ApiResult<Json<ReloadView>> {
    state.rules.reload().map_err(ApiError::from)?;
    Ok(Json(ReloadView {
        reload_count: state.rules.reload_count(),
    }))
}

/// A bare 204, used by handlers that mutate state with nothing
/// meaningful to return.
struct StatusCodeOnly;

impl axum::response::IntoResponse for StatusCodeOnly {
    fn into_response(self) -> axum::response::Response {
        axum::http::StatusCode::NO_CONTENT.into_response()
    }
}
