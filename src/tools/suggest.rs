use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::ai::{AiHandler, complete_once};
use crate::config::types::{PromptTemplate, Settings};
use crate::error::{FailureKind, PrSuggestError};
use crate::git::DiffSource;
use crate::git::types::CompareTarget;
use crate::output::fallback::compose_fallback;
use crate::output::suggestion_parser::{Suggestion, parse_suggestion};
use crate::processing::SuggestionRequest;
use crate::processing::fusion::{FusionLimits, fuse};
use crate::processing::patch::{DiffSummary, extract_diff_summary};
use crate::template::render::{RenderedPrompt, build_suggestion_prompt};
use crate::ticket::types::TicketContext;
use crate::ticket::{TicketSource, select_primary_ticket};

/// Diff-to-suggestion pipeline.
///
/// Holds only immutable configuration, so one instance can serve concurrent
/// requests; each call builds its own bundle and prompt.
pub struct SuggestionPipeline {
    ai: Arc<dyn AiHandler>,
    template: PromptTemplate,
    limits: FusionLimits,
    generation_timeout: Option<Duration>,
}

impl SuggestionPipeline {
    pub fn new(ai: Arc<dyn AiHandler>, template: PromptTemplate, limits: FusionLimits) -> Self {
        Self {
            ai,
            template,
            limits,
            generation_timeout: None,
        }
    }

    /// Bound the single generation call. Expiry falls back like any other failure.
    pub fn with_generation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Build a pipeline around `ai` using the prompt, caps and timeout in `settings`.
    pub fn from_settings(settings: &Settings, ai: Arc<dyn AiHandler>) -> Self {
        let timeout = (settings.config.generation_timeout > 0)
            .then(|| Duration::from_secs(settings.config.generation_timeout));
        Self::new(
            ai,
            settings.pr_suggestion_prompt.clone(),
            FusionLimits::from_settings(settings),
        )
        .with_generation_timeout(timeout)
    }

    /// Render the prompt for `request` without calling the backend.
    pub fn render(&self, request: &SuggestionRequest) -> Result<RenderedPrompt, PrSuggestError> {
        let bundle = fuse(request, &self.limits);
        build_suggestion_prompt(&self.template, &bundle)
    }

    /// Produce a suggestion. Never fails.
    pub async fn suggest(&self, request: &SuggestionRequest) -> Suggestion {
        self.suggest_with_status(request).await.0
    }

    /// Like [`suggest`](Self::suggest), also reporting why the fallback was used.
    pub async fn suggest_with_status(
        &self,
        request: &SuggestionRequest,
    ) -> (Suggestion, Option<FailureKind>) {
        let prompt = match self.render(request) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!(error = %e, "prompt rendering failed, using fallback suggestion");
                return (
                    compose_fallback(request, FailureKind::Provider),
                    Some(FailureKind::Provider),
                );
            }
        };

        match complete_once(
            self.ai.as_ref(),
            &prompt.system,
            &prompt.user,
            self.generation_timeout,
        )
        .await
        {
            Ok(resp) => (parse_suggestion(&resp.content), None),
            Err(e) => {
                let kind = e.kind();
                tracing::warn!(
                    owner = %request.owner,
                    repo = %request.repo,
                    kind = ?kind,
                    error = %e,
                    "generation failed, using fallback suggestion"
                );
                (compose_fallback(request, kind), Some(kind))
            }
        }
    }
}

/// Everything one compare-and-suggest run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionOutcome {
    pub suggestion: Suggestion,
    pub summary: DiffSummary,
    pub has_ticket_context: bool,
    pub ticket: Option<TicketContext>,
    /// Ticket lookups that succeeded, of those requested.
    pub tickets_used: usize,
    /// Set when the suggestion came from the fallback composer.
    pub degraded: Option<FailureKind>,
}

/// Retrieve the comparison, pick a ticket and build the request.
///
/// Diff retrieval failure short-circuits with `SourceUnavailable`; ticket
/// failures only mean no ticket context. Also returns the successful ticket
/// lookup count.
pub async fn prepare_request(
    diff_source: &dyn DiffSource,
    ticket_source: Option<&dyn TicketSource>,
    ticket_keys: &[String],
    target: &CompareTarget,
) -> Result<(SuggestionRequest, usize), PrSuggestError> {
    let comparison = diff_source.compare(target).await?;
    let summary = extract_diff_summary(&comparison.files);

    let (ticket, found) = match ticket_source {
        Some(source) if !ticket_keys.is_empty() => select_primary_ticket(source, ticket_keys).await,
        None if !ticket_keys.is_empty() => {
            tracing::warn!(keys = ?ticket_keys, "ticket keys given but no ticket source is configured");
            (None, 0)
        }
        _ => (None, 0),
    };

    Ok((SuggestionRequest::new(target, summary, ticket), found))
}

/// Full run: compare, pick a ticket, extract, then suggest.
pub async fn compare_and_suggest(
    pipeline: &SuggestionPipeline,
    diff_source: &dyn DiffSource,
    ticket_source: Option<&dyn TicketSource>,
    ticket_keys: &[String],
    target: &CompareTarget,
) -> Result<SuggestionOutcome, PrSuggestError> {
    tracing::info!(
        owner = %target.owner,
        repo = %target.repo,
        base = %target.base,
        head = %target.head,
        tickets = ticket_keys.len(),
        "generating PR suggestion"
    );

    let (request, tickets_used) =
        prepare_request(diff_source, ticket_source, ticket_keys, target).await?;
    let (suggestion, degraded) = pipeline.suggest_with_status(&request).await;

    Ok(SuggestionOutcome {
        suggestion,
        has_ticket_context: request.ticket.is_some(),
        ticket: request.ticket,
        summary: request.summary,
        tickets_used,
        degraded,
    })
}
