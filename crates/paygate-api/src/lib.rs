//! HTTP surface for the payment orchestration platform:
//! orchestrator charge/refund, rule engine evaluate/rules/reload,
//! scheduler status/trigger/jobs/retries, and `/health`.

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use server::run;
pub use state::AppState;
