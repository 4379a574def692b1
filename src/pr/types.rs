use std::fmt;
use std::str::FromStr;

use super::PrError;

/// Snapshot of a pull request as consumed by the summarizer.
/// Built by a `PullRequestApi` from several GitHub endpoints; list fields
/// keep the order the provider returned them in.
#[derive(Debug, Clone)]
pub struct PullRequest {
    /// PR number (e.g., 42)
    pub number: u64,
    /// PR title
    pub title: String,
    /// PR description. GitHub returns null for an empty description.
    pub body: Option<String>,
    /// Commits in provider order
    pub commits: Vec<Commit>,
    /// Changed files in provider order
    pub files: Vec<ChangedFile>,
    /// Existing issue comments in provider order
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone)]
pub struct Commit {
    pub sha: String,
}

/// A single file touched by the PR.
#[derive(Debug, Clone)]
pub struct ChangedFile {
    /// File path (e.g., "src/auth/config.rs")
    pub filename: String,
    /// Unified diff for the file. Absent for binary or oversized files.
    pub patch: Option<String>,
    /// URL of the file's raw content at the head commit
    pub raw_url: String,
}

/// An issue comment on the PR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: u64,
    /// Author's GitHub login
    pub author: String,
    pub body: String,
}

/// Repository identifier in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoId {
    type Err = PrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, name) = s
            .split_once('/')
            .ok_or_else(|| PrError::InvalidRepo(s.to_string()))?;

        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(PrError::InvalidRepo(s.to_string()));
        }

        Ok(RepoId {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
