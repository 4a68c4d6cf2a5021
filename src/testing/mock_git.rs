use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::PrSuggestError;
use crate::git::DiffSource;
use crate::git::types::{CompareTarget, Comparison, FileChange};

/// Mock diff source returning a fixed file list or a fixed failure.
///
/// Captures every requested target for assertions.
pub struct MockDiffSource {
    files: Vec<FileChange>,
    unavailable: Option<String>,
    requests: Mutex<Vec<CompareTarget>>,
}

impl MockDiffSource {
    pub fn new(files: Vec<FileChange>) -> Self {
        Self {
            files,
            unavailable: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A source whose every comparison fails with `SourceUnavailable(message)`.
    pub fn unavailable(message: &str) -> Self {
        Self {
            files: Vec::new(),
            unavailable: Some(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompareTarget> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiffSource for MockDiffSource {
    async fn compare(&self, target: &CompareTarget) -> Result<Comparison, PrSuggestError> {
        self.requests.lock().unwrap().push(target.clone());
        if let Some(message) = &self.unavailable {
            return Err(PrSuggestError::SourceUnavailable(message.clone()));
        }
        Ok(Comparison {
            files: self.files.clone(),
        })
    }
}
