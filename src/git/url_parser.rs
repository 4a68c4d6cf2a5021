use url::Url;

use super::types::CompareTarget;
use crate::error::PrSuggestError;

/// Parse a GitHub compare URL into owner/repo/base/head.
///
/// Accepts web URLs (`https://github.com/{owner}/{repo}/compare/{base}...{head}`)
/// and API URLs (`https://api.github.com/repos/{owner}/{repo}/compare/{base}...{head}`).
/// The two-dot form `base..head` is accepted too. Branch names may contain `/`.
pub fn parse_compare_url(compare_url: &str) -> Result<CompareTarget, PrSuggestError> {
    let url = Url::parse(compare_url)
        .map_err(|e| PrSuggestError::InvalidInput(format!("invalid URL: {e}")))?;

    let host = url
        .host_str()
        .ok_or_else(|| PrSuggestError::InvalidInput("URL has no host".into()))?;
    if !host.contains("github") {
        return Err(PrSuggestError::InvalidInput(format!(
            "not a GitHub URL: '{host}'"
        )));
    }

    // Clean path and strip the API prefixes
    let raw_path = url.path();
    let cleaned_path = raw_path.strip_prefix("/api/v3").unwrap_or(raw_path);
    let cleaned_path = cleaned_path
        .trim_matches('/')
        .strip_prefix("repos/")
        .unwrap_or(cleaned_path.trim_matches('/'));

    // owner / repo / "compare" / rest-of-path (the range, which may contain '/')
    let mut parts = cleaned_path.splitn(4, '/');
    let owner = parts.next().unwrap_or_default();
    let repo = parts.next().unwrap_or_default();
    let marker = parts.next().unwrap_or_default();
    let range = parts.next().unwrap_or_default();

    if owner.is_empty() || repo.is_empty() || marker != "compare" || range.is_empty() {
        return Err(PrSuggestError::InvalidInput(format!(
            "expected /{{owner}}/{{repo}}/compare/{{base}}...{{head}}, got '{raw_path}'"
        )));
    }

    let (base, head) = range
        .split_once("...")
        .or_else(|| range.split_once(".."))
        .ok_or_else(|| {
            PrSuggestError::InvalidInput(format!("compare range has no '...': '{range}'"))
        })?;

    if base.is_empty() || head.is_empty() {
        return Err(PrSuggestError::InvalidInput(format!(
            "compare range is missing a ref: '{range}'"
        )));
    }

    Ok(CompareTarget::new(owner, repo, base, head))
}
