//! Core library for the payment orchestration platform: processor
//! clients (C1), the rule engine (C2), the orchestrator (C3), and the
//! recurring billing scheduler + retry queue (C4).

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod processor;
pub mod repository;
pub mod rules;
pub mod scheduler;

pub use config::Config;
pub use error::{Error, Result};
