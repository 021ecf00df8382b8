use serde::Serialize;

/// Canonical change status of a file in a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl FileStatus {
    /// Map a `git diff --name-status` code (`A`, `M`, `D`, `R100`, ...) onto the canonical status
    pub fn from_git_code(code: &str) -> Self {
        match code.chars().next() {
            Some('A') => Self::Added,
            Some('D') => Self::Deleted,
            Some('R') => Self::Renamed,
            _ => Self::Modified,
        }
    }

    /// Map the GitHub pull request files API vocabulary onto the canonical status
    pub fn from_github(status: &str) -> Self {
        match status {
            "added" => Self::Added,
            "removed" => Self::Deleted,
            "renamed" => Self::Renamed,
            _ => Self::Modified,
        }
    }
}

/// One changed file with its unified patch
#[derive(Debug, Clone, Serialize)]
pub struct FileChange {
    pub filename: String,
    pub status: FileStatus,
    pub patch: String,
}

/// Normalized result of every fetcher
#[derive(Debug, Clone, Default)]
pub struct PrChanges {
    pub files: Vec<FileChange>,

    /// First line of each commit message, in the order the source reported them
    pub commit_messages: Vec<String>,
}

/// An issue referenced by a closing keyword in the PR description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedIssue {
    pub title: String,
    pub body: String,
    pub url: String,
}

/// The document handed to the review service
#[derive(Debug, Clone, Serialize)]
pub struct Payload {
    pub pr_title: Option<String>,
    pub pr_number: Option<String>,
    pub commit_sha: Option<String>,
    pub pr_description: String,
    pub branch_name: Option<String>,
    pub pr_url: Option<String>,
    pub creator: Option<String>,
    pub output_lang: String,
    pub reviewers: Vec<String>,
    pub files: Vec<FileChange>,
    pub commit_messages: Vec<String>,
    pub linked_issues: Vec<LinkedIssue>,
    pub repo_structure: Option<String>,
    pub dependencies: Option<String>,
    pub custom_instructions: Option<String>,
}

/// First line of a commit message
pub fn subject_line(message: &str) -> String {
    message.lines().next().unwrap_or_default().trim_end().to_owned()
}
