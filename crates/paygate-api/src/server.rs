//! Server bootstrap: wires config into repositories, processor
//! clients, the rule engine, the orchestrator, and the scheduler, then
//! serves the HTTP surface.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use paygate_core::cache::{IdempotencyCache, RedisPool};
use paygate_core::orchestrator::Orchestrator;
use paygate_core::processor::{spawn_health_probe, HttpProcessorClient, ProcessorClient, ProcessorRegistry};
use paygate_core::repository::{
    create_pool, PgJobRepository, PgPaymentMethodRepository, PgRetryEntryRepository, PgSubscriptionRepository,
    PgTransactionRepository,
};
use paygate_core::rules::RuleEngine;
use paygate_core::scheduler::{Scheduler, SchedulerConfig as SchedulerRunConfig};
use paygate_core::{Config, Result};

use crate::state::AppState;

pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config).await?;
    let app = build_router(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| paygate_core::Error::config(format!("invalid server host/port: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| paygate_core::Error::network(format!("failed to bind {}: {}", addr, e)))?;

    info!("paygate listening on http://{}", addr);
    log_routes();

    let scheduler = state.scheduler.clone();
    let scheduler_handle = tokio::spawn(scheduler.clone().run());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(scheduler))
        .await
        .map_err(|e| paygate_core::Error::network(e.to_string()))?;

    scheduler_handle.abort();
    Ok(())
}

/// Graceful shutdown: stop accepting new ticks as soon
/// as the process receives a termination signal; the in-flight tick
/// still gets its own `shutdown_timeout` budget inside `Scheduler::run`.
async fn shutdown_signal(scheduler: Arc<Scheduler>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
    scheduler.request_shutdown();
}

async fn build_state(config: &Config) -> Result<AppState> {
    let pool = create_pool(&config.database.url, config.database.max_connections).await?;
    paygate_core::db::Migrator::new(&pool).run().await?;

    let payment_methods = Arc::new(PgPaymentMethodRepository::new(pool.clone()));
    let transactions = Arc::new(PgTransactionRepository::new(pool.clone()));
    let subscriptions = Arc::new(PgSubscriptionRepository::new(pool.clone()));
    let jobs = Arc::new(PgJobRepository::new(pool.clone()));
    let retries = Arc::new(PgRetryEntryRepository::new(pool.clone()));

    let mut processors = ProcessorRegistry::new();
    for (name, processor_config) in &config.processors.clients {
        let client = Arc::new(HttpProcessorClient::new(
            name.clone(),
            processor_config.base_url.clone(),
            Duration::from_millis(processor_config.call_timeout_ms),
        ));
        spawn_health_probe(
            client.clone() as Arc<dyn ProcessorClient>,
            Duration::from_secs(processor_config.health_probe_interval_secs),
        );
        processors.insert(client);
    }

    let idempotency = if config.cache.enabled {
        match RedisPool::connect(&config.cache.redis).await {
            Ok(redis_pool) => Some(IdempotencyCache::new(redis_pool, config.cache.idempotency_ttl_secs)),
            Err(e) => {
                tracing::warn!(error = %e, "redis unavailable, running without idempotency cache");
                None
            }
        }
    } else {
        None
    };

    let rules = Arc::new(RuleEngine::load(&config.rules.config_path));

    let orchestrator = Arc::new(Orchestrator::new(payment_methods, transactions, processors, rules.clone(), idempotency));

    let scheduler_config = SchedulerRunConfig {
        enabled: config.scheduler.enabled,
        tick_interval: config.scheduler.tick_interval,
        batch_size: config.scheduler.batch_size,
        shutdown_timeout: config.scheduler.shutdown_timeout,
    };
    let scheduler = Arc::new(Scheduler::new(orchestrator.clone(), subscriptions, jobs, retries, scheduler_config));

    Ok(AppState::new(orchestrator, rules, scheduler, pool))
}

fn build_router(state: AppState) -> axum::Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    axum::Router::new()
        .merge(crate::routes::orchestrator::router())
        .merge(crate::routes::rules::router())
        .merge(crate::routes::scheduler::router())
        .merge(crate::routes::health::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn log_routes() {
    info!("  POST /orchestrator/charge");
    info!("  POST /orchestrator/refund");
    info!("  GET  /health");
    info!("  GET  /admin/stats");
    info!("  POST /bpas/evaluate");
    info!("  GET  /bpas/rules");
    info!("  PUT  /bpas/rules/:name");
    info!("  POST /bpas/reload");
    info!("  GET  /scheduler/status");
    info!("  POST /scheduler/trigger");
    info!("  GET  /scheduler/jobs");
    info!("  GET  /scheduler/retries");
    info!("  POST /scheduler/retries/:id/retry-now");
    info!("  POST /scheduler/retries/:id/cancel");
    info!("  GET  /scheduler/stats");
}
