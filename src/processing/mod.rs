pub mod fusion;
pub mod patch;

use serde::Serialize;

use crate::git::types::CompareTarget;
use crate::ticket::types::TicketContext;
use patch::DiffSummary;

/// Immutable input to one suggestion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionRequest {
    pub owner: String,
    pub repo: String,
    pub base: String,
    pub head: String,
    pub summary: DiffSummary,
    pub ticket: Option<TicketContext>,
}

impl SuggestionRequest {
    pub fn new(target: &CompareTarget, summary: DiffSummary, ticket: Option<TicketContext>) -> Self {
        Self {
            owner: target.owner.clone(),
            repo: target.repo.clone(),
            base: target.base.clone(),
            head: target.head.clone(),
            summary,
            ticket,
        }
    }
}
