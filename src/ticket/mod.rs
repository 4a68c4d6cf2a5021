pub mod jira;
pub mod types;

use async_trait::async_trait;
use types::{TicketContext, TicketLookup};

/// Source of ticket context (Jira today).
///
/// Never errors: an unreachable tracker or unknown key is reported as a
/// lookup with `success == false`, and the pipeline carries on without it.
#[async_trait]
pub trait TicketSource: Send + Sync {
    async fn fetch_ticket(&self, key: &str) -> TicketLookup;
}

/// Fetch every key in order and keep the first successful ticket.
///
/// Returns that ticket (if any) and how many lookups succeeded.
pub async fn select_primary_ticket(
    source: &dyn TicketSource,
    keys: &[String],
) -> (Option<TicketContext>, usize) {
    let mut primary = None;
    let mut found = 0usize;

    for key in keys {
        let lookup = source.fetch_ticket(key).await;
        match lookup.ticket {
            Some(ticket) if lookup.success => {
                found += 1;
                if primary.is_none() {
                    tracing::info!(key = %key, title = %ticket.title, "using ticket context");
                    primary = Some(ticket);
                }
            }
            _ => {
                tracing::warn!(key = %key, message = %lookup.message, "ticket lookup failed, continuing without it");
            }
        }
    }

    (primary, found)
}
