use serde::{Deserialize, Serialize};

/// Requirements pulled from a linked ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketContext {
    pub title: String,
    /// May be empty.
    pub description: String,
    /// In ticket order. May be empty.
    pub acceptance_criteria: Vec<String>,
}

/// Result of asking a ticket source for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketLookup {
    pub success: bool,
    /// Human-readable status, shown to the user when the lookup failed.
    pub message: String,
    pub ticket: Option<TicketContext>,
}

impl TicketLookup {
    pub fn found(ticket: TicketContext) -> Self {
        Self {
            success: true,
            message: "Ticket found".into(),
            ticket: Some(ticket),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ticket: None,
        }
    }
}
