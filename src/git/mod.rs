pub mod github;
pub mod types;
pub mod url_parser;

use async_trait::async_trait;
use types::{CompareTarget, Comparison};

use crate::error::PrSuggestError;

/// Source of branch comparisons (GitHub today).
///
/// Implementations must report every failure as
/// [`PrSuggestError::SourceUnavailable`]; the pipeline never invents diff data.
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Fetch the per-file changes between `target.base` and `target.head`.
    async fn compare(&self, target: &CompareTarget) -> Result<Comparison, PrSuggestError>;
}
