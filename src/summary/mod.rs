pub mod vertex;

pub use vertex::VertexClient;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub const SYSTEM_INSTRUCTION: &str = "You are an expert software engineer.";

pub const TASK: &str = "The following is the content of a GitHub Pull Request for a repository focused on Generative AI with Google Cloud. This content includes the Pull Request title, Pull Request description, a list of all of the files changed with the file name, the code diff and the raw file content. Your task is to output a summary of the Pull Request in Markdown format.";

/// Heading the model tends to echo; the comment header already carries it.
pub const REDUNDANT_HEADING: &str = "## Pull Request Summary";

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Model API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Model API error: HTTP {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Failed to obtain Google Cloud access token: {0}")]
    Auth(String),
}

/// One generation call: system instruction, sampling, and ordered prompt parts.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub temperature: f32,
    pub parts: Vec<String>,
}

/// Capability over the generative model provider.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, SummaryError>;
}

/// Prompt parts in the order the model receives them.
pub fn build_request(content: &str) -> GenerationRequest {
    GenerationRequest {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        temperature: 0.0,
        parts: vec![
            TASK.to_string(),
            "Content:".to_string(),
            content.to_string(),
            "Summary:".to_string(),
        ],
    }
}

/// Ask the model for a markdown summary of the assembled PR content.
#[instrument(skip_all, fields(content_bytes = content.len()))]
pub async fn summarize(content: &str, generator: &dyn TextGenerator) -> Result<String, SummaryError> {
    let request = build_request(content);
    debug!(prompt = ?request.parts, "---Prompt---");

    let response = generator.generate(&request).await?;
    debug!(response = %response, "---Gemini Response---");
    info!(summary_bytes = response.len(), "received summary");

    Ok(response.replace(REDUNDANT_HEADING, ""))
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns a canned response and records what it was asked.
    pub struct FakeGenerator {
        pub response: Result<String, ()>,
        pub requests: Mutex<Vec<GenerationRequest>>,
    }

    impl FakeGenerator {
        pub fn replying(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                response: Err(()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, SummaryError> {
            self.requests.lock().unwrap().push(request.clone());
            self.response.clone().map_err(|_| SummaryError::Api {
                status: 500,
                body: "internal".to_string(),
            })
        }
    }

    #[test]
    fn test_build_request_parts() {
        let request = build_request("Title: X");
        assert_eq!(request.system_instruction, "You are an expert software engineer.");
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.parts.len(), 4);
        assert!(request.parts[0].starts_with("The following is the content of a GitHub Pull Request"));
        assert_eq!(request.parts[1], "Content:");
        assert_eq!(request.parts[2], "Title: X");
        assert_eq!(request.parts[3], "Summary:");
    }

    #[tokio::test]
    async fn test_summarize_strips_redundant_heading() {
        let generator = FakeGenerator::replying("## Pull Request Summary\n\nAdds a login flow.");
        let summary = summarize("content", &generator).await.unwrap();
        assert_eq!(summary, "\n\nAdds a login flow.");
        assert!(!summary.contains(REDUNDANT_HEADING));
    }

    #[tokio::test]
    async fn test_summarize_strips_every_occurrence() {
        let generator =
            FakeGenerator::replying("## Pull Request Summary\nA\n## Pull Request Summary\nB");
        let summary = summarize("content", &generator).await.unwrap();
        assert_eq!(summary, "\nA\n\nB");
    }

    #[tokio::test]
    async fn test_summarize_passes_content() {
        let generator = FakeGenerator::replying("ok");
        summarize("Title: Fix typo", &generator).await.unwrap();
        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0], build_request("Title: Fix typo"));
    }

    #[tokio::test]
    async fn test_summarize_propagates_errors() {
        let generator = FakeGenerator::failing();
        let err = summarize("content", &generator).await.unwrap_err();
        assert!(matches!(err, SummaryError::Api { status: 500, .. }));
    }
}
