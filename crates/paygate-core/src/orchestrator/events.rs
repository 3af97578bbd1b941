//! Orchestrator event emission. No delivery channel lives in this
//! crate; instead we expose a `tokio::sync::broadcast` stream so an
//! HTTP/websocket fan-out layer elsewhere can subscribe.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum Event {
    ChargeInitiated {
        transaction_id: Uuid,
        at: DateTime<Utc>,
    },
    ChargeSucceeded {
        transaction_id: Uuid,
        processor_used: String,
        amount: Decimal,
    },
    ChargeFailed {
        transaction_id: Uuid,
        error_code: String,
    },
    FailoverTriggered {
        transaction_id: Uuid,
        from: String,
        to: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    sender: tokio::sync::broadcast::Sender<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (sender, _receiver) = tokio::sync::broadcast::channel(1024);
        Self { sender }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Best-effort: no receivers subscribed is not an error.
    pub fn emit(&self, event: Event) {
        let _ = self.sender.send(event);
    }
}
