use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Title used when the reply has no usable `TITLE:` line.
pub const DEFAULT_TITLE: &str = "Update code";
/// Description used when the reply has no usable `DESCRIPTION:` block.
pub const DEFAULT_DESCRIPTION: &str = "Code changes";

const TITLE_MARKER: &str = "TITLE:";
const DESCRIPTION_MARKER: &str = "DESCRIPTION:";

static EMPHASIS_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*_`#]").unwrap());

/// A pull-request title and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
}

/// Extract a [`Suggestion`] from a free-text generation reply.
///
/// Never fails. A reply with neither marker is passed through as the
/// description under the default title.
pub fn parse_suggestion(reply: &str) -> Suggestion {
    let mut title: Option<String> = None;
    let mut description: Option<Vec<&str>> = None;

    for line in reply.lines() {
        if let Some(lines) = description.as_mut() {
            lines.push(line);
            continue;
        }

        let marker_line = strip_leading_emphasis(line);
        if let Some(rest) = marker_line.strip_prefix(TITLE_MARKER) {
            title = Some(clean_title(rest));
        } else if let Some(rest) = marker_line.strip_prefix(DESCRIPTION_MARKER) {
            let first = rest.trim_start_matches(['*', '_']).trim();
            description = Some(if first.is_empty() { Vec::new() } else { vec![first] });
        }
    }

    if title.is_none() && description.is_none() {
        tracing::debug!("reply has no TITLE/DESCRIPTION markers, passing it through");
        return Suggestion {
            title: DEFAULT_TITLE.into(),
            description: if reply.trim().is_empty() {
                DEFAULT_DESCRIPTION.into()
            } else {
                reply.to_string()
            },
        };
    }

    let title = title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.into());
    let description = description
        .map(|lines| trim_blank_lines(&lines))
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.into());

    Suggestion { title, description }
}

/// Drop leading whitespace and markdown decoration so `**TITLE:**` and
/// `## DESCRIPTION:` are still recognised as markers.
fn strip_leading_emphasis(line: &str) -> &str {
    line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_' | '#'))
}

fn clean_title(raw: &str) -> String {
    EMPHASIS_CHARS.replace_all(raw, "").trim().to_string()
}

/// Join lines, dropping blank lines at either end but keeping inner ones.
fn trim_blank_lines(lines: &[&str]) -> String {
    let is_blank = |l: &&str| l.trim().is_empty();
    let start = lines.iter().position(|l| !is_blank(l)).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !is_blank(l)).map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}
