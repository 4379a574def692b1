use std::fmt::Write;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::pr::PullRequest;

pub const FETCH_FAILED: &str = "Unable to fetch raw file content.";

#[derive(Debug, Error)]
#[error("Failed to fetch {url}: {source}")]
pub struct FetchError {
    pub url: String,
    pub source: reqwest::Error,
}

/// Plain GET of a URL's body text.
#[async_trait]
pub trait RawFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("gemini-pr-summary")
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RawFetcher for HttpFetcher {
    /// Any response counts, whatever its status; only transport failures error.
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let to_error = |source| FetchError {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(to_error)?;
        response.text().await.map_err(to_error)
    }
}

/// Build the prompt content for a pull request: title, description, then
/// each changed file with its diff, or its raw content when GitHub gave no
/// patch (binary or very large files).
#[instrument(skip_all, fields(pr = pr.number, files = pr.files.len()))]
pub async fn assemble(pr: &PullRequest, fetcher: &dyn RawFetcher) -> String {
    let mut content = String::new();

    // fmt::Write for String never fails
    let _ = writeln!(content, "Title: {}", pr.title);
    let _ = writeln!(
        content,
        "Pull Request Description: {}",
        pr.body.as_deref().unwrap_or("None")
    );
    content.push_str("\n--- Files Changed ---\n");

    for file in &pr.files {
        let _ = write!(content, "File name: {}\n\n", file.filename);

        match &file.patch {
            Some(patch) => {
                let _ = write!(content, "Code Diff:\n{}\n\n", patch);
            }
            None => match fetcher.fetch(&file.raw_url).await {
                Ok(raw) => {
                    debug!(file = %file.filename, bytes = raw.len(), "fetched raw content");
                    let _ = write!(content, "Raw File Content:\n`\n{}\n`\n\n", raw);
                }
                Err(e) => {
                    warn!(file = %file.filename, error = %e, "raw content fetch failed");
                    let _ = write!(content, "{}\n\n", FETCH_FAILED);
                }
            },
        }
    }

    content
}
