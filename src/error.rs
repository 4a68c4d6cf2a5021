use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrSuggestError {
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// The branch comparison could not be retrieved. Fatal for the whole request.
    #[error("Diff unavailable: {0}")]
    SourceUnavailable(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Template rendering error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<figment::Error> for PrSuggestError {
    fn from(err: figment::Error) -> Self {
        PrSuggestError::Config(Box::new(err))
    }
}

/// Failure of the single text-generation call.
///
/// Never retried internally; every variant routes the pipeline to the
/// fallback composer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("credential rejected ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("generation request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

/// Plain classification of a [`GenerationError`], used to pick the fallback notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Auth,
    RateLimited,
    Provider,
    Timeout,
    Network,
}

impl GenerationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GenerationError::Auth { .. } => FailureKind::Auth,
            GenerationError::RateLimited { .. } => FailureKind::RateLimited,
            GenerationError::Provider(_) => FailureKind::Provider,
            GenerationError::Timeout => FailureKind::Timeout,
            GenerationError::Network(_) => FailureKind::Network,
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout
        } else if err.is_decode() {
            GenerationError::Provider(format!("malformed response body: {err}"))
        } else {
            GenerationError::Network(err.to_string())
        }
    }
}
