use serde::Serialize;

use super::SuggestionRequest;
use crate::config::types::Settings;
use crate::util::truncate_with_marker;

/// Appended to any field cut down to its cap.
pub const TRUNCATION_MARKER: &str = "...(truncated)";

/// Character caps applied to the free-text blocks handed to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FusionLimits {
    pub added_code: usize,
    pub deleted_code: usize,
    pub ticket_description: usize,
}

impl Default for FusionLimits {
    fn default() -> Self {
        Self {
            added_code: 2000,
            deleted_code: 2000,
            ticket_description: 800,
        }
    }
}

impl FusionLimits {
    /// Build limits from `[pr_suggestion]`. Caps below the marker length are
    /// raised to it so a truncated field is always exactly the marker or longer.
    pub fn from_settings(settings: &Settings) -> Self {
        let cfg = &settings.pr_suggestion;
        Self {
            added_code: cfg.added_code_cap,
            deleted_code: cfg.deleted_code_cap,
            ticket_description: cfg.ticket_description_cap,
        }
        .clamped()
    }

    fn clamped(self) -> Self {
        let min = TRUNCATION_MARKER.chars().count();
        Self {
            added_code: self.added_code.max(min),
            deleted_code: self.deleted_code.max(min),
            ticket_description: self.ticket_description.max(min),
        }
    }
}

/// Ticket fields as they reach the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketBundle {
    pub title: String,
    pub description: String,
    pub acceptance_criteria: Vec<String>,
}

/// Bounded-size context for one prompt render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextBundle {
    pub owner: String,
    pub repo: String,
    pub base: String,
    pub head: String,
    pub files_changed: usize,
    pub additions: u32,
    pub deletions: u32,
    pub added_code: String,
    pub deleted_code: String,
    pub ticket: Option<TicketBundle>,
}

/// Cap `text` at `cap` characters, ending with [`TRUNCATION_MARKER`] when cut.
pub fn truncate_field(text: &str, cap: usize) -> String {
    truncate_with_marker(text, cap, TRUNCATION_MARKER)
}

/// Merge the diff summary and optional ticket into a [`ContextBundle`].
///
/// Counts pass through unchanged; only the code streams and the ticket
/// description are capped.
pub fn fuse(request: &SuggestionRequest, limits: &FusionLimits) -> ContextBundle {
    let limits = limits.clamped();
    let summary = &request.summary;

    let ticket = request.ticket.as_ref().map(|t| TicketBundle {
        title: t.title.clone(),
        description: truncate_field(&t.description, limits.ticket_description),
        acceptance_criteria: t.acceptance_criteria.clone(),
    });

    ContextBundle {
        owner: request.owner.clone(),
        repo: request.repo.clone(),
        base: request.base.clone(),
        head: request.head.clone(),
        files_changed: summary.files_changed,
        additions: summary.additions,
        deletions: summary.deletions,
        added_code: truncate_field(&summary.added_code, limits.added_code),
        deleted_code: truncate_field(&summary.deleted_code, limits.deleted_code),
        ticket,
    }
}
