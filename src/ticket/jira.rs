use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::TicketSource;
use super::types::{TicketContext, TicketLookup};
use crate::config::types::{JiraAuthType, JiraConfig, Settings};
use crate::error::PrSuggestError;

/// Credentials for one Jira site, resolved from `[jira]`.
#[derive(Clone)]
enum JiraAuth {
    Basic { username: String, api_token: String },
    Bearer { access_token: String },
}

/// Jira Cloud REST v3 ticket source.
pub struct JiraTicketSource {
    client: Client,
    /// Root the `rest/api/3/...` path is appended to.
    api_root: String,
    auth: JiraAuth,
}

impl JiraTicketSource {
    /// Basic auth: username + API token against the site URL.
    pub fn basic(
        site_url: impl Into<String>,
        username: impl Into<String>,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PrSuggestError> {
        Self::build(
            site_url.into(),
            JiraAuth::Basic {
                username: username.into(),
                api_token: api_token.into(),
            },
            timeout,
        )
    }

    /// OAuth bearer token against `{gateway}/{cloud_id}`.
    pub fn bearer(
        gateway_url: &str,
        cloud_id: &str,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PrSuggestError> {
        Self::build(
            format!("{}/{}", gateway_url.trim_end_matches('/'), cloud_id),
            JiraAuth::Bearer {
                access_token: access_token.into(),
            },
            timeout,
        )
    }

    fn build(api_root: String, auth: JiraAuth, timeout: Duration) -> Result<Self, PrSuggestError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PrSuggestError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_root,
            auth,
        })
    }

    /// Create a source from `[jira]`, or `None` when Jira is not configured.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>, PrSuggestError> {
        let jira: &JiraConfig = &settings.jira;
        if !jira.is_configured() {
            return Ok(None);
        }
        let timeout = Duration::from_secs(settings.config.ai_timeout);
        let source = match jira.auth_type {
            JiraAuthType::Basic => Self::basic(
                jira.base_url.clone(),
                jira.username.clone(),
                jira.api_token.clone(),
                timeout,
            )?,
            JiraAuthType::Bearer => Self::bearer(
                &jira.cloud_gateway_url,
                &jira.cloud_id,
                jira.oauth_access_token.clone(),
                timeout,
            )?,
        };
        Ok(Some(source))
    }

    fn issue_url(&self, key: &str) -> Result<Url, PrSuggestError> {
        let mut url = Url::parse(&self.api_root)
            .map_err(|e| PrSuggestError::InvalidInput(format!("invalid Jira URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| PrSuggestError::InvalidInput("Jira URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["rest", "api", "3", "issue", key]);
        Ok(url)
    }

    async fn try_fetch(&self, key: &str) -> Result<TicketContext, PrSuggestError> {
        let url = self.issue_url(key)?;
        let mut req = self
            .client
            .get(url.clone())
            .header("Accept", "application/json");
        req = match &self.auth {
            JiraAuth::Basic {
                username,
                api_token,
            } => req.basic_auth(username, Some(api_token)),
            JiraAuth::Bearer { access_token } => req.bearer_auth(access_token),
        };

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PrSuggestError::Other(format!("{status} from {url}")));
        }

        let data: Value = resp.json().await?;
        parse_issue(&data)
            .ok_or_else(|| PrSuggestError::Other("issue response has no fields".into()))
    }
}

#[async_trait]
impl TicketSource for JiraTicketSource {
    async fn fetch_ticket(&self, key: &str) -> TicketLookup {
        match self.try_fetch(key).await {
            Ok(ticket) => {
                tracing::info!(key, criteria = ticket.acceptance_criteria.len(), "ticket fetched");
                TicketLookup::found(ticket)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to fetch ticket");
                TicketLookup::unavailable(format!("Failed to fetch ticket: {e}"))
            }
        }
    }
}

/// Build a ticket from an issue response. `None` when `fields` is missing.
pub fn parse_issue(data: &Value) -> Option<TicketContext> {
    let fields = data.get("fields")?;
    let title = fields["summary"].as_str().unwrap_or_default().to_string();
    let description = match &fields["description"] {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        adf => flatten_adf(adf),
    };
    let acceptance_criteria = extract_acceptance_criteria(&description);

    Some(TicketContext {
        title,
        description,
        acceptance_criteria,
    })
}

/// Flatten an Atlassian Document Format node into plain text.
///
/// Text nodes are concatenated depth-first. A `paragraph`, `hardBreak` or
/// `listItem` ends its line unless the text already ends with a newline.
/// Only the final result is trimmed, so spacing between text runs survives.
pub fn flatten_adf(node: &Value) -> String {
    let mut out = String::new();
    collect_adf_text(node, &mut out);
    out.trim().to_string()
}

fn collect_adf_text(node: &Value, out: &mut String) {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        out.push_str(text);
    }

    let Some(children) = node.get("content").and_then(Value::as_array) else {
        return;
    };
    for child in children {
        collect_adf_text(child, out);
        let breaks_line = matches!(
            child.get("type").and_then(Value::as_str),
            Some("paragraph" | "hardBreak" | "listItem")
        );
        if breaks_line && !out.ends_with('\n') {
            out.push('\n');
        }
    }
}

/// Non-empty lines following an `Acceptance Criteria:` heading line.
pub fn extract_acceptance_criteria(description: &str) -> Vec<String> {
    description
        .lines()
        .skip_while(|line| !line.trim().eq_ignore_ascii_case("acceptance criteria:"))
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
