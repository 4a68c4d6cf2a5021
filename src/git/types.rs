use serde::{Deserialize, Serialize};

/// How a file was changed between the two refs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    #[default]
    Modified,
    Removed,
    Renamed,
}

impl FileStatus {
    /// Map a GitHub compare `status` string. Unknown values (`changed`,
    /// `copied`, `unchanged`) count as modifications.
    pub fn from_github(status: &str) -> Self {
        match status {
            "added" => FileStatus::Added,
            "removed" => FileStatus::Removed,
            "renamed" => FileStatus::Renamed,
            _ => FileStatus::Modified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Removed => "removed",
            FileStatus::Renamed => "renamed",
        }
    }
}

/// One changed file in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    /// File path in the repository.
    pub filename: String,
    pub status: FileStatus,
    /// Unified diff hunk text. `None` for binary or oversized files.
    pub patch: Option<String>,
    /// Added-line count reported by the source, used only when `patch` is absent.
    #[serde(default)]
    pub additions: u32,
    /// Deleted-line count reported by the source, used only when `patch` is absent.
    #[serde(default)]
    pub deletions: u32,
}

impl FileChange {
    pub fn new(filename: impl Into<String>, status: FileStatus, patch: Option<String>) -> Self {
        Self {
            filename: filename.into(),
            status,
            patch,
            additions: 0,
            deletions: 0,
        }
    }
}

/// Owner/repo plus the branch pair being compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareTarget {
    pub owner: String,
    pub repo: String,
    pub base: String,
    pub head: String,
}

impl CompareTarget {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        base: impl Into<String>,
        head: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            base: base.into(),
            head: head.into(),
        }
    }
}

/// Raw comparison as returned by a diff source, files in backend order.
#[derive(Debug, Clone, Default)]
pub struct Comparison {
    pub files: Vec<FileChange>,
}
