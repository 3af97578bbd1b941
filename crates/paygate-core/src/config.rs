//! Declarative configuration for the orchestrator, scheduler, and
//! processor clients. Loaded from TOML at startup, overridable by
//! environment variables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub processors: ProcessorsConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub rules: RuleEngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
            processors: ProcessorsConfig::default(),
            scheduler: SchedulerConfig::default(),
            rules: RuleEngineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read config file {}: {}", path, e)))?;

        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, honoring `PAYGATE_CONFIG` and a handful of
    /// default search paths, falling back to built-in defaults so the
    /// service can boot with no config file present at all.
    pub fn from_env() -> Result<Self> {
        if let Ok(config_path) = std::env::var("PAYGATE_CONFIG") {
            return Self::load(&config_path);
        }

        let default_paths = ["./config/default.toml", "/etc/paygate/config.toml"];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::load(path);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(url) = std::env::var("REDIS_URL") {
            self.cache.redis.url = url;
        }
        if let Ok(interval) = std::env::var("SCHEDULER_INTERVAL") {
            if let Ok(secs) = interval.parse() {
                self.scheduler.tick_interval = Duration::from_secs(secs);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::config("server.port must be non-zero"));
        }
        if self.scheduler.batch_size == 0 {
            return Err(Error::config("scheduler.batch_size must be non-zero"));
        }
        for (name, processor) in &self.processors.clients {
            if processor.base_url.is_empty() {
                return Err(Error::config(format!(
                    "processor '{}' is missing a base_url",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "postgres://localhost/paygate".to_string()
}
fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub redis: RedisConfig,
    /// TTL for the idempotency replay cache entries.
    #[serde(default = "default_idempotency_ttl")]
    pub idempotency_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redis: RedisConfig::default(),
            idempotency_ttl_secs: default_idempotency_ttl(),
        }
    }
}

fn default_idempotency_ttl() -> u64 {
    24 * 3600
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_pool_size(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl RedisConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}
fn default_pool_size() -> usize {
    10
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    200
}
fn default_key_prefix() -> String {
    "paygate".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Per-processor configuration: base URL + call deadlines. Spec.md §5
/// defaults: charge/refund 5s, health probe interval 30s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub base_url: String,
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    #[serde(default = "default_health_probe_interval_secs")]
    pub health_probe_interval_secs: u64,
}

fn default_call_timeout_ms() -> u64 {
    5_000
}
fn default_health_probe_interval_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorsConfig {
    #[serde(flatten)]
    pub clients: HashMap<String, ProcessorConfig>,
}

impl Default for ProcessorsConfig {
    fn default() -> Self {
        let mut clients = HashMap::new();
        clients.insert(
            "processor_a".to_string(),
            ProcessorConfig {
                base_url: "http://localhost:9001".to_string(),
                call_timeout_ms: default_call_timeout_ms(),
                health_probe_interval_secs: default_health_probe_interval_secs(),
            },
        );
        clients.insert(
            "processor_b".to_string(),
            ProcessorConfig {
                base_url: "http://localhost:9002".to_string(),
                call_timeout_ms: default_call_timeout_ms(),
                health_probe_interval_secs: default_health_probe_interval_secs(),
            },
        );
        Self { clients }
    }
}

/// Scheduler tick configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tick_interval", with = "duration_secs")]
    pub tick_interval: Duration,
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    #[serde(default = "default_shutdown_timeout", with = "duration_secs")]
    pub shutdown_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval: default_tick_interval(),
            batch_size: default_batch_size(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(60)
}
fn default_batch_size() -> i64 {
    100
}
fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(120)
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Path to the declarative rule-list file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEngineConfig {
    #[serde(default = "default_rules_path")]
    pub config_path: String,
}

impl Default for RuleEngineConfig {
    fn default() -> Self {
        Self {
            config_path: default_rules_path(),
        }
    }
}

fn default_rules_path() -> String {
    "./config/rules.toml".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_batch_size_rejected() {
        let mut config = Config::default();
        config.scheduler.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_from_toml() {
        let toml_str = r#"
            [server]
            port = 9090

            [scheduler]
            batch_size = 50
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.scheduler.batch_size, 50);
    }
}
