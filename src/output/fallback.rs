use super::suggestion_parser::Suggestion;
use crate::error::FailureKind;
use crate::processing::SuggestionRequest;

pub const AUTH_NOTICE: &str =
    "⚠️ Invalid generation API key. Check the openai.key setting or the GROQ_API_KEY environment variable.";
pub const RATE_LIMIT_NOTICE: &str = "⚠️ Generation API rate limit reached. Please wait and try again.";
pub const GENERIC_NOTICE: &str = "⚠️ Unable to generate AI suggestion. Using basic description.";

/// Warning line prefixed to a fallback description.
pub fn failure_notice(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Auth => AUTH_NOTICE,
        FailureKind::RateLimited => RATE_LIMIT_NOTICE,
        FailureKind::Provider | FailureKind::Timeout | FailureKind::Network => GENERIC_NOTICE,
    }
}

/// Build a template suggestion from the request alone.
///
/// Pure: the same request and failure kind always give the same output.
pub fn compose_fallback(request: &SuggestionRequest, kind: FailureKind) -> Suggestion {
    let title = match &request.ticket {
        Some(ticket) => format!("Update: {}", ticket.title),
        None => format!("Update {}", request.repo),
    };

    let mut description = String::new();
    description.push_str(failure_notice(kind));
    description.push_str("\n\n");
    if let Some(ticket) = &request.ticket {
        description.push_str(&format!("Related to: {}\n\n", ticket.title));
    }
    description.push_str(&format!(
        "Changes between {} and {}\n\n",
        request.base, request.head
    ));
    let summary = &request.summary;
    description.push_str(&format!(
        "{} files changed, +{} additions, -{} deletions",
        summary.files_changed, summary.additions, summary.deletions
    ));

    Suggestion { title, description }
}
