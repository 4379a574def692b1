use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::types::{ChangedFile, Comment, Commit, PullRequest, RepoId};
use super::{PrError, PullRequestApi};
use crate::config::Settings;

const USER_AGENT: &str = "gemini-pr-summary";
const PER_PAGE: u32 = 100;

#[derive(Deserialize)]
struct User {
    login: String,
}

#[derive(Deserialize)]
struct PullResponse {
    number: u64,
    title: String,
    body: Option<String>,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
}

#[derive(Deserialize)]
struct FileResponse {
    filename: String,
    patch: Option<String>,
    raw_url: Option<String>,
}

#[derive(Deserialize)]
struct CommentResponse {
    id: u64,
    // null for comments left by deleted accounts
    user: Option<User>,
    body: Option<String>,
}

impl From<CommentResponse> for Comment {
    fn from(c: CommentResponse) -> Self {
        Comment {
            id: c.id,
            author: c.user.map(|u| u.login).unwrap_or_default(),
            body: c.body.unwrap_or_default(),
        }
    }
}

/// GitHub REST v3 implementation of `PullRequestApi`.
pub struct GitHubClient {
    client: Client,
    api_url: String,
    repo: RepoId,
    token: String,
}

impl GitHubClient {
    pub fn new(settings: &Settings) -> Result<Self, PrError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            repo: settings.repo_id.clone(),
            token: settings.token.clone(),
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url, self.repo.owner, self.repo.name, path
        )
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PrError> {
        let response = self.authed(self.client.get(url)).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// GET every page of a list endpoint, following `Link: rel="next"`.
    async fn get_all<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, PrError> {
        let mut items = Vec::new();
        let mut next = Some(format!("{}?per_page={}", url, PER_PAGE));

        while let Some(page_url) = next.take() {
            debug!(url = %page_url, "fetching page");
            let response = self.authed(self.client.get(&page_url)).send().await?;
            let response = check_status(response).await?;
            next = next_page(response.headers());
            let mut page = response.json::<Vec<T>>().await?;
            items.append(&mut page);
        }

        Ok(items)
    }
}

#[async_trait]
impl PullRequestApi for GitHubClient {
    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn fetch_pull_request(&self, number: u64) -> Result<PullRequest, PrError> {
        debug!("fetching PR metadata from GitHub API");
        let metadata: PullResponse = self.get_json(&self.repo_url(&format!("pulls/{}", number))).await?;
        debug!(title = %metadata.title, "received PR metadata");

        let commits: Vec<CommitResponse> = self
            .get_all(&self.repo_url(&format!("pulls/{}/commits", number)))
            .await?;
        let files: Vec<FileResponse> = self
            .get_all(&self.repo_url(&format!("pulls/{}/files", number)))
            .await?;
        let comments: Vec<CommentResponse> = self
            .get_all(&self.repo_url(&format!("issues/{}/comments", number)))
            .await?;
        debug!(
            commits = commits.len(),
            files = files.len(),
            comments = comments.len(),
            "received PR details"
        );

        Ok(PullRequest {
            number: metadata.number,
            title: metadata.title,
            body: metadata.body,
            commits: commits.into_iter().map(|c| Commit { sha: c.sha }).collect(),
            files: files
                .into_iter()
                .map(|f| ChangedFile {
                    filename: f.filename,
                    patch: f.patch,
                    raw_url: f.raw_url.unwrap_or_default(),
                })
                .collect(),
            comments: comments.into_iter().map(Comment::from).collect(),
        })
    }

    #[instrument(skip(self, body), fields(repo = %self.repo))]
    async fn create_comment(&self, number: u64, body: &str) -> Result<Comment, PrError> {
        let url = self.repo_url(&format!("issues/{}/comments", number));
        let response = self
            .authed(self.client.post(&url))
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;
        let created: CommentResponse = check_status(response).await?.json().await?;
        debug!(comment_id = created.id, "created comment");
        Ok(created.into())
    }

    #[instrument(skip(self, body), fields(repo = %self.repo))]
    async fn edit_comment(&self, comment_id: u64, body: &str) -> Result<Comment, PrError> {
        let url = self.repo_url(&format!("issues/comments/{}", comment_id));
        let response = self
            .authed(self.client.patch(&url))
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;
        let edited: CommentResponse = check_status(response).await?.json().await?;
        debug!(comment_id = edited.id, "edited comment");
        Ok(edited.into())
    }
}

async fn check_status(response: Response) -> Result<Response, PrError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(PrError::ApiStatus {
        status: status.as_u16(),
        url,
        body,
    })
}

/// Extract the `rel="next"` target from a GitHub `Link` header.
fn next_page(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim() == "rel=\"next\"");
        if !is_next {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Some(target.to_string())
    })
}
