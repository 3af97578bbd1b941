//! `/health` and `/admin/stats`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/admin/stats", get(stats))
}

#[derive(Debug, Serialize)]
struct Dependencies {
    database: bool,
    cache: bool,
    processor_a: bool,
    processor_b: bool,
}

#[derive(Debug, Serialize)]
struct HealthView {
    service: &'static str,
    status: &'static str,
    timestamp: DateTime<Utc>,
    dependencies: Dependencies,
}

async fn health(State(state): State<AppState>) -> Json<HealthView> {
    let database = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let cache = state.orchestrator.cache_healthy().await;
    let health = state.orchestrator.processor_health();
    let processor_a = health.iter().find(|(n, _)| n == "processor_a").map(|(_, h)| *h).unwrap_or(false);
    let processor_b = health.iter().find(|(n, _)| n == "processor_b").map(|(_, h)| *h).unwrap_or(false);

    let status = if database && processor_a && processor_b { "healthy" } else { "degraded" };

    Json(HealthView {
        service: "paygate",
        status,
        timestamp: Utc::now(),
        dependencies: Dependencies {
            database,
            cache,
            processor_a,
            processor_b,
        },
    })
}

#[derive(Debug, Serialize)]
struct StatsView {
    total: i64,
    successful: i64,
    failed: i64,
    total_volume: Decimal,
    avg_size: Decimal,
}

async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsView>> {
    let stats = state.orchestrator.stats_last_24h().await?;
    Ok(Json(StatsView {
        total: stats.total,
        successful: stats.successful,
        failed: stats.failed,
        total_volume: stats.total_volume,
        avg_size: stats.avg_size,
    }))
}
