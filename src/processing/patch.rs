use serde::Serialize;

use crate::git::types::{FileChange, FileStatus};

/// Classification of a single unified-diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Added,
    Deleted,
    /// `+++`/`---` file headers. Never counted.
    Header,
    /// Everything else: unchanged lines, `@@` hunk headers, `\ No newline` markers.
    Context,
}

/// Classify one patch line. `+++`/`---` are headers, not changes.
pub fn classify_line(line: &str) -> LineKind {
    if line.starts_with("+++") || line.starts_with("---") {
        LineKind::Header
    } else if line.starts_with('+') {
        LineKind::Added
    } else if line.starts_with('-') {
        LineKind::Deleted
    } else {
        LineKind::Context
    }
}

/// Compact per-file view of a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub filename: String,
    pub status: FileStatus,
    pub additions: u32,
    pub deletions: u32,
    /// False for binary or oversized files the source sent without a patch.
    pub has_patch: bool,
}

/// Structural signal extracted from a whole comparison.
///
/// `additions`/`deletions` always equal the sums over `files`. The code
/// streams hold `"<filename>: <line>"` entries joined by `\n` and are empty
/// strings, never absent, when nothing was added or deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Per-file summaries in the order the source returned them.
    pub files: Vec<FileSummary>,
    pub files_changed: usize,
    pub additions: u32,
    pub deletions: u32,
    pub added_code: String,
    pub deleted_code: String,
}

/// Turn per-file unified diffs into a [`DiffSummary`].
///
/// Pure function of its input. Files without a patch contribute their
/// source-reported counts but nothing to the code streams.
pub fn extract_diff_summary(files: &[FileChange]) -> DiffSummary {
    let mut summary = DiffSummary {
        files: Vec::with_capacity(files.len()),
        files_changed: files.len(),
        ..Default::default()
    };

    for file in files {
        let (additions, deletions) = match file.patch.as_deref() {
            Some(patch) => collect_patch_lines(&file.filename, patch, &mut summary),
            None => (file.additions, file.deletions),
        };

        summary.additions = summary.additions.saturating_add(additions);
        summary.deletions = summary.deletions.saturating_add(deletions);
        summary.files.push(FileSummary {
            filename: file.filename.clone(),
            status: file.status,
            additions,
            deletions,
            has_patch: file.patch.is_some(),
        });
    }

    tracing::debug!(
        files = summary.files_changed,
        additions = summary.additions,
        deletions = summary.deletions,
        "diff summary extracted"
    );

    summary
}

/// Append one file's classified lines to the summary streams and return its counts.
fn collect_patch_lines(filename: &str, patch: &str, summary: &mut DiffSummary) -> (u32, u32) {
    let mut additions = 0u32;
    let mut deletions = 0u32;

    for line in patch.lines() {
        match classify_line(line) {
            LineKind::Added => {
                push_entry(&mut summary.added_code, filename, &line[1..]);
                additions = additions.saturating_add(1);
            }
            LineKind::Deleted => {
                push_entry(&mut summary.deleted_code, filename, &line[1..]);
                deletions = deletions.saturating_add(1);
            }
            LineKind::Header | LineKind::Context => {}
        }
    }

    (additions, deletions)
}

fn push_entry(stream: &mut String, filename: &str, content: &str) {
    if !stream.is_empty() {
        stream.push('\n');
    }
    stream.push_str(filename);
    stream.push_str(": ");
    stream.push_str(content);
}
