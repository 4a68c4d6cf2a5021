use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ticket::TicketSource;
use crate::ticket::types::{TicketContext, TicketLookup};

/// Mock ticket source keyed by ticket key. Unknown keys are "not found".
#[derive(Default)]
pub struct MockTicketSource {
    lookups: HashMap<String, TicketLookup>,
    requested: Mutex<Vec<String>>,
}

impl MockTicketSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticket(mut self, key: &str, ticket: TicketContext) -> Self {
        self.lookups.insert(key.into(), TicketLookup::found(ticket));
        self
    }

    pub fn with_failure(mut self, key: &str, message: &str) -> Self {
        self.lookups.insert(key.into(), TicketLookup::unavailable(message));
        self
    }

    /// Keys asked for, in call order.
    pub fn requested_keys(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl TicketSource for MockTicketSource {
    async fn fetch_ticket(&self, key: &str) -> TicketLookup {
        self.requested.lock().unwrap().push(key.to_string());
        self.lookups
            .get(key)
            .cloned()
            .unwrap_or_else(|| TicketLookup::unavailable(format!("Ticket {key} not found")))
    }
}
