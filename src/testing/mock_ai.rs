use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::ai::AiHandler;
use crate::ai::types::{ChatResponse, FinishReason, Usage};
use crate::error::GenerationError;

/// A recorded generation call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedAiCall {
    pub system: String,
    pub user: String,
}

/// Mock generation client that returns pre-configured outcomes in order.
///
/// The last queued outcome is reused once the queue is down to one entry.
/// Records every call for assertions.
pub struct MockAiHandler {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    delay: Option<Duration>,
    pub call_count: Mutex<usize>,
    recorded_calls: Mutex<Vec<RecordedAiCall>>,
}

impl MockAiHandler {
    /// Create a mock that returns the same reply for every call.
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_outcomes(vec![Ok(response.into())])
    }

    /// Create a mock whose every call fails with `err`.
    pub fn failing(err: GenerationError) -> Self {
        Self::with_outcomes(vec![Err(err)])
    }

    /// Create a mock that returns outcomes in order (one per call).
    pub fn with_outcomes(outcomes: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            responses: Mutex::new(outcomes.into()),
            delay: None,
            call_count: Mutex::new(0),
            recorded_calls: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Get all recorded calls for test assertions.
    pub fn get_recorded_calls(&self) -> Vec<RecordedAiCall> {
        self.recorded_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiHandler for MockAiHandler {
    fn model(&self) -> &str {
        "mock"
    }

    async fn chat_completion(&self, system: &str, user: &str) -> Result<ChatResponse, GenerationError> {
        self.recorded_calls.lock().unwrap().push(RecordedAiCall {
            system: system.to_string(),
            user: user.to_string(),
        });
        *self.call_count.lock().unwrap() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = {
            let mut responses = self.responses.lock().unwrap();
            if responses.len() == 1 {
                responses.front().unwrap().clone()
            } else {
                responses
                    .pop_front()
                    .unwrap_or_else(|| Err(GenerationError::Provider("no more mock responses".into())))
            }
        };

        outcome.map(|content| ChatResponse {
            content,
            finish_reason: FinishReason::Stop,
            usage: Some(Usage {
                prompt_tokens: 100,
                completion_tokens: 200,
                total_tokens: 300,
            }),
        })
    }
}
