use std::collections::HashMap;
use std::sync::Arc;

use super::ProcessorClient;

/// Named lookup of configured processor clients, consulted by the
/// orchestrator (routing + failover) and the scheduler.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    clients: HashMap<String, Arc<dyn ProcessorClient>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    pub fn insert(&mut self, client: Arc<dyn ProcessorClient>) {
        self.clients.insert(client.name().to_string(), client);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ProcessorClient>> {
        self.clients.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.clients.keys().cloned().collect()
    }
}
