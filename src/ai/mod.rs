pub mod openai;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use types::ChatResponse;

use crate::error::GenerationError;

/// A text-generation backend.
///
/// Provider and model are configuration of the implementor, so the prompt
/// builder and reply parser never change when the backend does. Object-safe
/// for dynamic dispatch via `Arc<dyn AiHandler>`.
#[async_trait]
pub trait AiHandler: Send + Sync {
    /// Model identifier sent with every request.
    fn model(&self) -> &str;

    /// Send one chat completion request and wait for the full reply.
    ///
    /// An empty `system` prompt is not sent; `user` carries the rendered prompt.
    async fn chat_completion(&self, system: &str, user: &str) -> Result<ChatResponse, GenerationError>;
}

/// Run one completion, optionally bounded by `timeout`.
///
/// Expiry is reported as [`GenerationError::Timeout`]. No retries.
pub async fn complete_once(
    handler: &dyn AiHandler,
    system: &str,
    user: &str,
    timeout: Option<Duration>,
) -> Result<ChatResponse, GenerationError> {
    let call = handler.chat_completion(system, user);
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(GenerationError::Timeout)),
        None => call.await,
    };

    match &result {
        Ok(resp) => tracing::debug!(
            model = handler.model(),
            finish_reason = ?resp.finish_reason,
            chars = resp.content.len(),
            "generation completed"
        ),
        Err(e) => tracing::warn!(model = handler.model(), error = %e, "generation failed"),
    }

    result
}
