use serde::{Deserialize, Serialize};

/// Redact a secret string for Debug output. Shows "[REDACTED]" if non-empty, "[]" if empty.
fn redact(s: &str) -> &str {
    if s.is_empty() { "[]" } else { "[REDACTED]" }
}

// ── Top-level Settings ──────────────────────────────────────────────

/// Top-level configuration. Each field maps to a TOML `[section]`.
/// Uses `#[serde(default)]` so missing sections gracefully fall back.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    pub config: GlobalConfig,
    pub pr_suggestion: PrSuggestionConfig,
    pub github: GithubConfig,
    pub jira: JiraConfig,
    // Prompt template (loaded from pr_suggestion_prompts.toml)
    pub pr_suggestion_prompt: PromptTemplate,
    // Secrets (loaded from .secrets.toml or env vars)
    pub openai: OpenAiSecrets,
}

// ── [config] ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Transport timeout for every outbound HTTP client, in seconds.
    pub ai_timeout: u64,
    /// Optional bound around the single generation call, in seconds. 0 disables it.
    pub generation_timeout: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".into(),
            temperature: 0.7,
            max_tokens: 1500,
            ai_timeout: 120,
            generation_timeout: 0,
        }
    }
}

// ── [pr_suggestion] ─────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrSuggestionConfig {
    pub added_code_cap: usize,
    pub deleted_code_cap: usize,
    pub ticket_description_cap: usize,
}

impl Default for PrSuggestionConfig {
    fn default() -> Self {
        Self {
            added_code_cap: 2000,
            deleted_code_cap: 2000,
            ticket_description_cap: 800,
        }
    }
}

// ── [github] ────────────────────────────────────────────────────────

#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GithubConfig {
    pub base_url: String,
    pub ratelimit_retries: u32,
    /// User token for authentication (set via GITHUB_TOKEN env var).
    pub user_token: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".into(),
            ratelimit_retries: 5,
            user_token: String::new(),
        }
    }
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("base_url", &self.base_url)
            .field("ratelimit_retries", &self.ratelimit_retries)
            .field("user_token", &redact(&self.user_token))
            .finish()
    }
}

// ── [jira] ──────────────────────────────────────────────────────────

/// How requests to Jira are authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JiraAuthType {
    /// Username + API token against the site URL.
    #[default]
    Basic,
    /// OAuth access token against the Atlassian cloud gateway.
    Bearer,
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JiraConfig {
    /// Site URL for basic auth, e.g. `https://company.atlassian.net`.
    pub base_url: String,
    pub auth_type: JiraAuthType,
    pub username: String,
    pub api_token: String,
    pub oauth_access_token: String,
    pub cloud_id: String,
    /// Gateway used for bearer auth; `{cloud_id}` is appended.
    pub cloud_gateway_url: String,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_type: JiraAuthType::Basic,
            username: String::new(),
            api_token: String::new(),
            oauth_access_token: String::new(),
            cloud_id: String::new(),
            cloud_gateway_url: "https://api.atlassian.com/ex/jira".into(),
        }
    }
}

impl JiraConfig {
    /// Whether enough is configured to talk to Jira at all.
    pub fn is_configured(&self) -> bool {
        match self.auth_type {
            JiraAuthType::Basic => !self.base_url.is_empty() && !self.api_token.is_empty(),
            JiraAuthType::Bearer => {
                !self.cloud_id.is_empty() && !self.oauth_access_token.is_empty()
            }
        }
    }
}

impl std::fmt::Debug for JiraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraConfig")
            .field("base_url", &self.base_url)
            .field("auth_type", &self.auth_type)
            .field("username", &self.username)
            .field("api_token", &redact(&self.api_token))
            .field("oauth_access_token", &redact(&self.oauth_access_token))
            .field("cloud_id", &self.cloud_id)
            .field("cloud_gateway_url", &self.cloud_gateway_url)
            .finish()
    }
}

// ── Prompt templates ────────────────────────────────────────────────

/// A Jinja2 prompt template pair (system + user) loaded from TOML.
///
/// The suggestion prompt ships with an empty `system` part so the whole
/// prompt travels as a single user message.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PromptTemplate {
    pub system: String,
    pub user: String,
}

// ── Secrets ─────────────────────────────────────────────────────────

#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAiSecrets {
    pub key: String,
    pub api_base: String,
}

impl Default for OpenAiSecrets {
    fn default() -> Self {
        Self {
            key: String::new(),
            api_base: "https://api.groq.com/openai/v1".into(),
        }
    }
}

impl std::fmt::Debug for OpenAiSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSecrets")
            .field("key", &redact(&self.key))
            .field("api_base", &self.api_base)
            .finish()
    }
}
