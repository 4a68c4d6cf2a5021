use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::DiffSource;
use super::types::{CompareTarget, Comparison, FileChange, FileStatus};
use crate::config::types::Settings;
use crate::error::PrSuggestError;

/// GitHub compare API client using raw reqwest for full API control.
pub struct GithubCompareSource {
    client: Client,
    /// Base URL for the GitHub API (supports Enterprise).
    base_url: String,
    /// Caller-supplied access token.
    token: String,
    ratelimit_retries: u32,
}

impl GithubCompareSource {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
        ratelimit_retries: u32,
    ) -> Result<Self, PrSuggestError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PrSuggestError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
            ratelimit_retries,
        })
    }

    /// Create a source from `[github]` settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, PrSuggestError> {
        Self::new(
            settings.github.base_url.clone(),
            settings.github.user_token.clone(),
            Duration::from_secs(settings.config.ai_timeout),
            settings.github.ratelimit_retries,
        )
    }

    /// `{base_url}/repos/{owner}/{repo}/compare/{base}...{head}`, with each ref
    /// percent-encoded so `#`, `%` and `?` in branch names stay part of the path.
    fn compare_url(&self, target: &CompareTarget) -> Result<Url, PrSuggestError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            PrSuggestError::SourceUnavailable(format!("invalid GitHub API URL: {e}"))
        })?;
        let basehead = format!("{}...{}", target.base, target.head);
        url.path_segments_mut()
            .map_err(|_| {
                PrSuggestError::SourceUnavailable("GitHub API URL cannot be a base".into())
            })?
            .pop_if_empty()
            .extend(["repos", target.owner.as_str(), target.repo.as_str(), "compare"])
            .extend(basehead.split('/'));
        Ok(url)
    }

    /// Send an authenticated GET with automatic retry on rate limits (429).
    ///
    /// Retries up to `ratelimit_retries` times, respecting `Retry-After`
    /// when present and backing off exponentially otherwise.
    async fn api_get_with_retry(&self, url: &str) -> Result<reqwest::Response, PrSuggestError> {
        for attempt in 0..=self.ratelimit_retries {
            let mut req = self
                .client
                .get(url)
                .header("Accept", "application/vnd.github+json")
                .header("User-Agent", "pr-suggest");
            if !self.token.is_empty() {
                req = req.bearer_auth(&self.token);
            }

            let resp = req.send().await.map_err(|e| {
                PrSuggestError::SourceUnavailable(format!("request to {url} failed: {e}"))
            })?;

            if resp.status().as_u16() == 429 {
                let retry_after = parse_retry_after(resp.headers()).unwrap_or(2u64.pow(attempt + 1));

                if attempt < self.ratelimit_retries {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max = self.ratelimit_retries,
                        retry_after_secs = retry_after,
                        url,
                        "GitHub API rate limited, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(retry_after)).await;
                    continue;
                }
            }

            return Ok(resp);
        }

        Err(PrSuggestError::SourceUnavailable(
            "GitHub API rate limit retries exhausted".into(),
        ))
    }
}

#[async_trait]
impl DiffSource for GithubCompareSource {
    async fn compare(&self, target: &CompareTarget) -> Result<Comparison, PrSuggestError> {
        let url = self.compare_url(target)?;
        tracing::debug!(%url, "fetching branch comparison");

        let resp = self.api_get_with_retry(url.as_str()).await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, %url, "GitHub compare failed");
            return Err(PrSuggestError::SourceUnavailable(if body.is_empty() {
                format!("{status} from {url}")
            } else {
                format!("{status} from {url}: {body}")
            }));
        }

        let data: serde_json::Value = resp.json().await.map_err(|e| {
            PrSuggestError::SourceUnavailable(format!("malformed compare response: {e}"))
        })?;

        let comparison = parse_comparison(&data);
        tracing::info!(
            owner = %target.owner,
            repo = %target.repo,
            files = comparison.files.len(),
            "branch comparison fetched"
        );
        Ok(comparison)
    }
}

/// Extract the file list from a compare response, preserving backend order.
fn parse_comparison(data: &serde_json::Value) -> Comparison {
    let files = data["files"]
        .as_array()
        .map(|files| {
            files
                .iter()
                .map(|file| FileChange {
                    filename: file["filename"].as_str().unwrap_or_default().to_string(),
                    status: FileStatus::from_github(file["status"].as_str().unwrap_or("modified")),
                    patch: file["patch"].as_str().map(String::from),
                    additions: reported_count(&file["additions"]),
                    deletions: reported_count(&file["deletions"]),
                })
                .collect()
        })
        .unwrap_or_default();

    Comparison { files }
}

/// A per-file line count, saturating at `u32::MAX`. Missing or negative counts are zero.
fn reported_count(value: &serde_json::Value) -> u32 {
    value
        .as_u64()
        .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{StatusCode, Uri};
    use std::sync::{Arc, Mutex};
    use axum::routing::get;
    use serde_json::json;

    use crate::testing::fixtures::spawn_server;

    #[test]
    fn test_parse_comparison_keeps_order_and_nullable_patch() {
        let data = json!({
            "files": [
                {"filename": "src/b.rs", "status": "modified", "patch": "@@ -1 +1 @@\n-a\n+b", "additions": 1, "deletions": 1},
                {"filename": "logo.png", "status": "added", "additions": 0, "deletions": 0},
                {"filename": "src/a.rs", "status": "renamed", "patch": "@@ -1 +1 @@\n+x", "additions": 1, "deletions": 0}
            ]
        });
        let cmp = parse_comparison(&data);
        let names: Vec<&str> = cmp.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["src/b.rs", "logo.png", "src/a.rs"]);
        assert_eq!(cmp.files[1].status, FileStatus::Added);
        assert!(cmp.files[1].patch.is_none());
        assert_eq!(cmp.files[2].status, FileStatus::Renamed);
    }

    #[test]
    fn test_parse_comparison_saturates_oversized_counts() {
        let data = json!({
            "files": [
                {"filename": "dump.sql", "status": "modified", "additions": 5_000_000_000u64, "deletions": -3}
            ]
        });
        let cmp = parse_comparison(&data);
        assert_eq!(cmp.files[0].additions, u32::MAX);
        assert_eq!(cmp.files[0].deletions, 0);
    }

    #[test]
    fn test_parse_comparison_without_files() {
        let cmp = parse_comparison(&json!({"status": "identical"}));
        assert!(cmp.files.is_empty());
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert("retry-after", "7".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(7));
    }

    #[tokio::test]
    async fn test_compare_fetches_files() {
        let app = Router::new().route(
            "/repos/{owner}/{repo}/compare/{basehead}",
            get(|| async {
                axum::Json(json!({
                    "files": [
                        {"filename": "src/lib.rs", "status": "modified", "patch": "@@ -1 +1,2 @@\n+pub mod x;"}
                    ]
                }))
            }),
        );
        let base_url = spawn_server(app).await;
        let source =
            GithubCompareSource::new(base_url, "token", Duration::from_secs(5), 0).unwrap();

        let cmp = source
            .compare(&CompareTarget::new("acme", "widgets", "main", "feature"))
            .await
            .unwrap();
        assert_eq!(cmp.files.len(), 1);
        assert_eq!(cmp.files[0].filename, "src/lib.rs");
    }

    #[test]
    fn test_compare_url_encodes_refs_and_keeps_api_prefix() {
        let source = GithubCompareSource::new(
            "https://ghe.example.com/api/v3/",
            "token",
            Duration::from_secs(5),
            0,
        )
        .unwrap();
        let url = source
            .compare_url(&CompareTarget::new("acme", "widgets", "release/1.0", "feature/#123-50%?"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/acme/widgets/compare/release/1.0...feature/%23123-50%25%3F"
        );
        assert!(url.fragment().is_none());
        assert!(url.query().is_none());
    }

    #[tokio::test]
    async fn test_compare_sends_full_ref_with_hash() {
        let seen = Arc::new(Mutex::new(None::<String>));
        let recorder = Arc::clone(&seen);
        let app = Router::new().fallback(move |uri: Uri| {
            let recorder = Arc::clone(&recorder);
            async move {
                *recorder.lock().unwrap() = Some(uri.path().to_string());
                axum::Json(json!({"files": []}))
            }
        });
        let base_url = spawn_server(app).await;
        let source =
            GithubCompareSource::new(base_url, "token", Duration::from_secs(5), 0).unwrap();

        source
            .compare(&CompareTarget::new("acme", "widgets", "main", "feature/#123-login"))
            .await
            .unwrap();
        assert_eq!(
            seen.lock().unwrap().as_deref(),
            Some("/repos/acme/widgets/compare/main...feature/%23123-login")
        );
    }

    #[tokio::test]
    async fn test_compare_bad_ref_is_source_unavailable() {
        let app = Router::new().route(
            "/repos/{owner}/{repo}/compare/{basehead}",
            get(|| async { (StatusCode::NOT_FOUND, "No common ancestor") }),
        );
        let base_url = spawn_server(app).await;
        let source =
            GithubCompareSource::new(base_url, "token", Duration::from_secs(5), 0).unwrap();

        let err = source
            .compare(&CompareTarget::new("acme", "widgets", "main", "missing"))
            .await
            .unwrap_err();
        match err {
            PrSuggestError::SourceUnavailable(msg) => {
                assert!(msg.contains("404"), "unexpected message: {msg}");
                assert!(msg.contains("main...missing"));
            }
            other => panic!("expected SourceUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_compare_unreachable_host_is_source_unavailable() {
        // Port 9 (discard) on localhost is essentially never listening.
        let source = GithubCompareSource::new(
            "http://127.0.0.1:9",
            "token",
            Duration::from_secs(2),
            0,
        )
        .unwrap();
        let err = source
            .compare(&CompareTarget::new("acme", "widgets", "main", "dev"))
            .await
            .unwrap_err();
        assert!(matches!(err, PrSuggestError::SourceUnavailable(_)));
    }
}
