//! Reconnect-on-failure wrapper around a single
//! `redis::aio::ConnectionManager`, which already multiplexes
//! concurrent callers onto one connection.

use redis::aio::ConnectionManager;
use redis::Client;

use crate::config::RedisConfig;
use crate::{Error, Result};

#[derive(Clone)]
pub struct RedisPool {
    manager: ConnectionManager,
    key_prefix: String,
}

impl RedisPool {
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str()).map_err(|e| Error::cache(e.to_string()))?;

        let mut last_err = None;
        for attempt in 0..=config.max_retries {
            match client.get_connection_manager().await {
                Ok(manager) => {
                    return Ok(Self {
                        manager,
                        key_prefix: config.key_prefix.clone(),
                    })
                }
                Err(e) => {
                    last_err = Some(e);
                    if attempt < config.max_retries {
                        tokio::time::sleep(config.retry_delay()).await;
                    }
                }
            }
        }
        Err(Error::cache(format!(
            "failed to connect to redis after {} retries: {}",
            config.max_retries,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    pub fn prefixed(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }

    pub fn connection(&self) -> ConnectionManager {
        self.manager.clone()
    }

    /// Liveness check for `/health`.
    pub async fn ping(&self) -> bool {
        redis::cmd("PING")
            .query_async::<_, String>(&mut self.manager.clone())
            .await
            .is_ok()
    }
}
