//! Idempotency replay cache: `idempotency:<key>`
//! holding the serialized prior response, 24h TTL. The durable
//! backstop is `transactions.idempotency_key UNIQUE` — this cache is
//! purely a fast path.

use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};

use super::RedisPool;
use crate::{Error, Result};

#[derive(Clone)]
pub struct IdempotencyCache {
    pool: RedisPool,
    ttl_secs: u64,
}

impl IdempotencyCache {
    pub fn new(pool: RedisPool, ttl_secs: u64) -> Self {
        Self { pool, ttl_secs }
    }

    fn cache_key(&self, idempotency_key: &str) -> String {
        self.pool.prefixed(&format!("idempotency:{}", idempotency_key))
    }

    pub async fn get<T: DeserializeOwned>(&self, idempotency_key: &str) -> Result<Option<T>> {
        let mut conn = self.pool.connection();
        let raw: Option<String> = conn
            .get(self.cache_key(idempotency_key))
            .await
            .map_err(|e| Error::cache(e.to_string()))?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn ping(&self) -> bool {
        self.pool.ping().await
    }

    pub async fn set<T: Serialize>(&self, idempotency_key: &str, value: &T) -> Result<()> {
        let mut conn = self.pool.connection();
        let raw = serde_json::to_string(value)?;
        conn.set_ex::<_, _, ()>(self.cache_key(idempotency_key), raw, self.ttl_secs)
            .await
            .map_err(|e| Error::cache(e.to_string()))?;
        Ok(())
    }
}
