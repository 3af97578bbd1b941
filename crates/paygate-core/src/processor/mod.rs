//! Processor Client: one instance per upstream processor.

mod client;
mod health;
mod registry;

pub use client::{ChargeResult, HttpProcessorClient, ProcessorClient, RefundResult};
pub use health::spawn_health_probe;
pub use registry::ProcessorRegistry;
