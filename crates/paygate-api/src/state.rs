use std::sync::Arc;

use paygate_core::orchestrator::Orchestrator;
use paygate_core::rules::RuleEngine;
use paygate_core::scheduler::Scheduler;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub rules: Arc<RuleEngine>,
    pub scheduler: Arc<Scheduler>,
    pub pool: PgPool,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, rules: Arc<RuleEngine>, scheduler: Arc<Scheduler>, pool: PgPool) -> Self {
        Self {
            orchestrator,
            rules,
            scheduler,
            pool,
        }
    }
}
