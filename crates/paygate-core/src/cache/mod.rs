//! Redis-backed caching: idempotency replay only. Rule list and
//! processor health stay in in-process shared state — they
//! are single-process-local by the concurrency model, not shared
//! cluster state.

mod idempotency;
mod redis_pool;

pub use idempotency::IdempotencyCache;
pub use redis_pool::RedisPool;
