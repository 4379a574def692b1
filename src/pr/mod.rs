pub mod github;
pub mod types;

pub use github::GitHubClient;
pub use types::{ChangedFile, Comment, Commit, PullRequest, RepoId};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub API returned {status} for {url}: {body}")]
    ApiStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Invalid repository identifier (expected owner/name): {0}")]
    InvalidRepo(String),
}

/// Capability over the repository host, narrow enough to fake in tests.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    /// Fetch the PR along with its commits, changed files and issue comments.
    async fn fetch_pull_request(&self, number: u64) -> Result<PullRequest, PrError>;

    /// Create a new issue comment on the PR and return it.
    async fn create_comment(&self, number: u64, body: &str) -> Result<Comment, PrError>;

    /// Replace the body of an existing issue comment and return it.
    async fn edit_comment(&self, comment_id: u64, body: &str) -> Result<Comment, PrError>;
}
