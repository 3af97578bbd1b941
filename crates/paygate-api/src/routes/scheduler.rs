//! `/scheduler/*`: status, manual trigger, job/retry
//! listings, and the per-retry manual operations.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use paygate_core::models::{Job, RetryEntry};
use paygate_core::scheduler::{SchedulerStats, TickResult};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/scheduler/status", get(status))
        .route("/scheduler/trigger", post(trigger))
        .route("/scheduler/jobs", get(jobs))
        .route("/scheduler/retries", get(retries))
        .route("/scheduler/retries/:id/retry-now", post(retry_now))
        .route("/scheduler/retries/:id/cancel", post(cancel))
        .route("/scheduler/stats", get(stats))
}

#[derive(Debug, Serialize)]
struct StatusView {
    enabled: bool,
    tick_interval_secs: u64,
    last_run: Option<DateTime<Utc>>,
    next_run: Option<DateTime<Utc>>,
}

async fn status(State(state): State<AppState>) -> Json<StatusView> {
    let stats = state.scheduler.stats();
    Json(StatusView {
        enabled: state.scheduler.enabled(),
        tick_interval_secs: state.scheduler.tick_interval().as_secs(),
        last_run: stats.last_run,
        next_run: stats.next_run,
    })
}

#[derive(Debug, Serialize)]
struct TriggerView {
    billed: u64,
    billed_succeeded: u64,
    retries_processed: u64,
    retries_succeeded: u64,
}

impl From<TickResult> for TriggerView {
    fn from(r: TickResult) -> Self {
        Self {
            billed: r.billed,
            billed_succeeded: r.billed_succeeded,
            retries_processed: r.retries_processed,
            retries_succeeded: r.retries_succeeded,
        }
    }
}

async fn trigger(State(state): State<AppState>) -> ApiResult<Json<TriggerView>> {
    let result = state.scheduler.trigger().await?;
    Ok(Json(result.into()))
}

#[derive(Debug, Deserialize)]
struct JobsQuery {
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    100
}

async fn jobs(State(state): State<AppState>, Query(query): Query<JobsQuery>) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.scheduler.list_jobs(query.limit).await?))
}

#[derive(Debug, Deserialize)]
struct RetriesQuery {
    status: Option<String>,
}

async fn retries(State(state): State<AppState>, Query(query): Query<RetriesQuery>) -> ApiResult<Json<Vec<RetryEntry>>> {
    Ok(Json(state.scheduler.list_retries(query.status.as_deref()).await?))
}

async fn retry_now(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    state.scheduler.retry_now(id).await?;
    Ok(StatusCode::OK)
}

async fn cancel(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    state.scheduler.cancel(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn stats(State(state): State<AppState>) -> Json<SchedulerStats> {
    Json(state.scheduler.stats())
}
