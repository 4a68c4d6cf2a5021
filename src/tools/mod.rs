pub mod suggest;

use std::sync::Arc;

use crate::ai::AiHandler;
use crate::ai::openai::OpenAiCompatibleHandler;
use crate::config::types::Settings;
use crate::error::PrSuggestError;
use crate::ticket::TicketSource;
use crate::ticket::jira::JiraTicketSource;

/// Resolve the generation client: use the injected one or create from settings.
pub fn resolve_ai_handler(
    injected: &Option<Arc<dyn AiHandler>>,
    settings: &Settings,
) -> Result<Arc<dyn AiHandler>, PrSuggestError> {
    match injected {
        Some(ai) => Ok(ai.clone()),
        None => {
            if settings.openai.key.is_empty() {
                tracing::warn!("no generation API key configured, suggestions will use the fallback");
            }
            Ok(Arc::new(OpenAiCompatibleHandler::from_settings(settings)?))
        }
    }
}

/// The configured ticket source, if any.
pub fn resolve_ticket_source(settings: &Settings) -> Result<Option<Arc<dyn TicketSource>>, PrSuggestError> {
    Ok(JiraTicketSource::from_settings(settings)?.map(|s| Arc::new(s) as Arc<dyn TicketSource>))
}
